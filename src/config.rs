//! Engine configuration: who manufactures, who regulates, where the ledger lives
use super::drug::Role;
use anyhow::Context;
use std::path::PathBuf;

pub const DEFAULT_MANUFACTURER_ROLE: &str = "CiplaMSP";
pub const DEFAULT_MANUFACTURER_NAME: &str = "Cipla";
pub const DEFAULT_REGULATOR_ROLE: &str = "CDSCOMSP";
pub const DEFAULT_DB_PATH: &str = "drug_ledger.db";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub manufacturer_role: Role,
    pub manufacturer_name: String, // recorded on the drug, not used for authorization
    pub regulator_role: Role,
    pub db_path: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            manufacturer_role: Role::trusted(DEFAULT_MANUFACTURER_ROLE),
            manufacturer_name: DEFAULT_MANUFACTURER_NAME.to_owned(),
            regulator_role: Role::trusted(DEFAULT_REGULATOR_ROLE),
            db_path: PathBuf::from(DEFAULT_DB_PATH),
        }
    }
}

impl EngineConfig {
    /// Loads `.env` when present, then reads the process environment.
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_env()
    }

    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Unset keys fall back to the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut config = Self::default();

        if let Some(role) = lookup("DRUG_MANUFACTURER_ROLE") {
            config.manufacturer_role =
                Role::parse(&role).context("DRUG_MANUFACTURER_ROLE is not a valid role")?;
        }
        if let Some(name) = lookup("DRUG_MANUFACTURER_NAME") {
            config.manufacturer_name = name;
        }
        if let Some(role) = lookup("DRUG_REGULATOR_ROLE") {
            config.regulator_role =
                Role::parse(&role).context("DRUG_REGULATOR_ROLE is not a valid role")?;
        }
        if let Some(path) = lookup("DRUG_DB_PATH") {
            config.db_path = PathBuf::from(path);
        }

        if config.manufacturer_role == config.regulator_role {
            anyhow::bail!(
                "manufacturer and regulator must be distinct roles, both are {}",
                config.regulator_role
            );
        }

        Ok(config)
    }
}
