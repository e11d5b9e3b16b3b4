//! Lifecycle transitions
//!
//! Every function here is pure: it takes the record as last read from the store
//! (or `None` when the key is absent), the caller's role, the request inputs and
//! the current time, and either rejects the request or returns the complete next
//! record. Nothing is written here. Because all checks run before a
//! [`Transition`] exists, a rejected request can never leave a partial update.
use super::config::EngineConfig;
use super::drug::{Drug, DrugRegistration, DrugStatus, Party, Role, TimeStamp};
use super::error::LedgerError;
use super::history::{AuditEntry, inspection_note};
use super::policy::{AccessPolicy, Action};
use chrono::Utc;

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    #[n(0)]
    Shipment {
        #[n(0)]
        id: String,
        #[n(1)]
        from: Role,
        #[n(2)]
        to: Role,
    },
    #[n(1)]
    Recall {
        #[n(0)]
        id: String,
        #[n(1)]
        reason: String,
    },
}

impl Notification {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Shipment { .. } => "Shipment",
            Self::Recall { .. } => "Recall",
        }
    }
    pub fn payload(&self) -> Result<Vec<u8>, LedgerError> {
        Ok(minicbor::to_vec(self)?)
    }
}

/// The next record plus whatever should be announced once it is committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub drug: Drug,
    pub notification: Option<Notification>,
}

#[derive(Debug, Clone)]
pub struct LifecycleEngine {
    policy: AccessPolicy,
    manufacturer_name: String,
}

impl LifecycleEngine {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            policy: AccessPolicy::from_config(config),
            manufacturer_name: config.manufacturer_name.clone(),
        }
    }
    pub fn policy(&self) -> &AccessPolicy {
        &self.policy
    }

    pub fn register(
        &self,
        caller: &Role,
        existing: Option<&Drug>,
        registration: DrugRegistration,
        now: TimeStamp<Utc>,
    ) -> Result<Transition, LedgerError> {
        self.policy.authorize(Action::Register, caller, None)?;
        registration.validate()?;
        if existing.is_some() {
            return Err(LedgerError::AlreadyExists(registration.id));
        }

        let owner = self.policy.manufacturer().clone();
        let drug = Drug {
            id: registration.id,
            name: registration.name,
            manufacturer: self.manufacturer_name.clone(),
            batch_number: registration.batch_number,
            mfg_date: registration.mfg_date,
            expiry_date: registration.expiry_date,
            composition: registration.composition,
            history: vec![AuditEntry::registered(now, Party::Org(owner.clone()))],
            current_owner: owner,
            status: DrugStatus::InProduction,
            is_recalled: false,
            inspection_notes: vec![],
        };

        Ok(Transition {
            drug,
            notification: None,
        })
    }

    /// Hands the drug to `destination`. Allowed from any non-terminal status,
    /// so a delivered drug can move on to the next hop. The destination is
    /// only parsed once the caller is known to own a shippable drug.
    pub fn ship(
        &self,
        caller: &Role,
        id: &str,
        current: Option<Drug>,
        destination: &str,
        now: TimeStamp<Utc>,
    ) -> Result<Transition, LedgerError> {
        let mut drug = current.ok_or_else(|| LedgerError::NotFound(id.to_owned()))?;
        self.policy
            .authorize(Action::Ship, caller, Some(&drug.current_owner))?;
        if drug.is_recalled || drug.status.is_terminal() {
            return Err(LedgerError::InvalidState(format!(
                "drug {id} has been recalled and cannot be shipped"
            )));
        }
        let destination = Role::parse(destination)?;

        // record the owner before reassignment, not after
        let from = std::mem::replace(&mut drug.current_owner, destination.clone());
        drug.status = DrugStatus::InTransit;
        drug.history.push(AuditEntry::shipped(
            now,
            Party::Org(from.clone()),
            Party::Org(destination.clone()),
        ));

        Ok(Transition {
            notification: Some(Notification::Shipment {
                id: drug.id.clone(),
                from,
                to: destination,
            }),
            drug,
        })
    }

    /// Confirms arrival. Ownership already moved when the drug was shipped.
    pub fn receive(
        &self,
        caller: &Role,
        id: &str,
        current: Option<Drug>,
        now: TimeStamp<Utc>,
    ) -> Result<Transition, LedgerError> {
        let mut drug = current.ok_or_else(|| LedgerError::NotFound(id.to_owned()))?;
        self.policy.authorize(Action::Receive, caller, None)?;
        if drug.status != DrugStatus::InTransit || drug.current_owner != *caller {
            return Err(LedgerError::InvalidState(
                "drug is not in transit to this organization".into(),
            ));
        }

        drug.status = DrugStatus::Delivered;
        drug.history.push(AuditEntry::received(
            now,
            Party::Org(drug.current_owner.clone()),
            Party::Org(caller.clone()),
        ));

        Ok(Transition {
            drug,
            notification: None,
        })
    }

    /// Terminal. Recalling an already recalled drug appends another
    /// history row and inspection note rather than being deduplicated.
    /// The reason is stored as given, an empty one included.
    pub fn recall(
        &self,
        caller: &Role,
        id: &str,
        current: Option<Drug>,
        reason: &str,
        now: TimeStamp<Utc>,
    ) -> Result<Transition, LedgerError> {
        self.policy.authorize(Action::Recall, caller, None)?;
        let mut drug = current.ok_or_else(|| LedgerError::NotFound(id.to_owned()))?;

        drug.is_recalled = true;
        drug.status = DrugStatus::Recalled;
        drug.inspection_notes.push(inspection_note(&now, reason));
        drug.history
            .push(AuditEntry::recalled(now, Party::Org(caller.clone()), reason));

        Ok(Transition {
            notification: Some(Notification::Recall {
                id: drug.id.clone(),
                reason: reason.to_owned(),
            }),
            drug,
        })
    }

    /// Provenance lookup is public, every role may track.
    pub fn track(
        &self,
        caller: &Role,
        id: &str,
        current: Option<Drug>,
    ) -> Result<Drug, LedgerError> {
        self.policy.authorize(Action::Track, caller, None)?;
        current.ok_or_else(|| LedgerError::NotFound(id.to_owned()))
    }
}
