//! Which role may perform which transition
use super::config::EngineConfig;
use super::drug::Role;
use super::error::LedgerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Register,
    Ship,
    Receive,
    Recall,
    Track,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessPolicy {
    manufacturer: Role,
    regulator: Role,
}

impl AccessPolicy {
    pub fn new(manufacturer: Role, regulator: Role) -> Self {
        Self {
            manufacturer,
            regulator,
        }
    }
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(
            config.manufacturer_role.clone(),
            config.regulator_role.clone(),
        )
    }
    pub fn manufacturer(&self) -> &Role {
        &self.manufacturer
    }
    pub fn regulator(&self) -> &Role {
        &self.regulator
    }

    /// Role gate for `action`. `current_owner` is only consulted for `Ship`.
    ///
    /// Receive passes here for every caller; whether the drug is actually in
    /// transit to the caller is a state question and is answered by the engine.
    pub fn authorize(
        &self,
        action: Action,
        caller: &Role,
        current_owner: Option<&Role>,
    ) -> Result<(), LedgerError> {
        match action {
            Action::Register if *caller != self.manufacturer => Err(LedgerError::Unauthorized(
                format!("only {} can register drugs", self.manufacturer),
            )),
            Action::Ship if current_owner != Some(caller) => Err(LedgerError::Unauthorized(
                "only current owner can ship drug".into(),
            )),
            Action::Recall if *caller != self.regulator => Err(LedgerError::Unauthorized(
                "only regulators can recall drugs".into(),
            )),
            _ => Ok(()),
        }
    }
}
