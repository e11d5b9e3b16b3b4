//! Core drug record, lifecycle status and role types
use super::error::LedgerError;
use super::history::AuditEntry;
use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use std::fmt;

const MAX_ROLE_LEN: usize = 128;

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrugStatus {
    #[n(0)]
    InProduction,
    #[n(1)]
    InTransit,
    #[n(2)]
    Delivered,
    #[n(3)]
    Recalled,
}

impl DrugStatus {
    /// No transition leaves a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Recalled)
    }
}

impl fmt::Display for DrugStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::InProduction => "InProduction",
            Self::InTransit => "InTransit",
            Self::Delivered => "Delivered",
            Self::Recalled => "Recalled",
        };
        f.write_str(name)
    }
}

/// Organizational identity as supplied by the identity collaborator.
/// Compared by exact string equality, there is no hierarchy or wildcard.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Role(String);

impl Role {
    pub fn parse(value: &str) -> Result<Self, LedgerError> {
        if value.is_empty() {
            return Err(LedgerError::Validation("role identifier is empty".into()));
        }
        if value.chars().count() > MAX_ROLE_LEN {
            return Err(LedgerError::Validation(format!(
                "role identifier exceeds {MAX_ROLE_LEN} characters"
            )));
        }
        let valid = value
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.'));
        if !valid {
            return Err(LedgerError::Validation(format!(
                "role identifier {value:?} contains unsupported characters"
            )));
        }

        Ok(Self(value.to_owned()))
    }
    // constants known to satisfy `parse`
    pub(crate) fn trusted(value: &str) -> Self {
        Self(value.to_owned())
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<C> minicbor::Encode<C> for Role {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        e.str(&self.0)?.ok()
    }
}

impl<'b, C> minicbor::Decode<'b, C> for Role {
    fn decode(d: &mut minicbor::Decoder<'b>, _: &mut C) -> Result<Self, minicbor::decode::Error> {
        let raw = d.str()?;

        Role::parse(raw)
            .map_err(|_| minicbor::decode::Error::message("stored role identifier is invalid"))
    }
}

/// Either side of an audit entry.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq, Eq)]
pub enum Party {
    #[n(0)]
    System,
    #[n(1)]
    All,
    #[n(2)]
    Org(#[n(0)] Role),
}

impl fmt::Display for Party {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::System => f.write_str("SYSTEM"),
            Self::All => f.write_str("ALL"),
            Self::Org(role) => role.fmt(f),
        }
    }
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone)]
pub struct TimeStamp<T: TimeZone>(DateTime<T>);

impl TimeStamp<Utc> {
    pub fn new() -> Self {
        Self(Utc::now())
    }
    /// `None` when the fields do not name a real instant.
    pub fn new_with(
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        min: u32,
        sec: u32,
    ) -> Option<Self> {
        Utc.with_ymd_and_hms(year, month, day, hour, min, sec)
            .single()
            .map(Self)
    }
    pub fn to_datetime_utc(&self) -> DateTime<Utc> {
        self.0
    }
    /// ISO-8601 rendering embedded in history rows and inspection notes
    pub fn to_rfc3339(&self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

impl Default for TimeStamp<Utc> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: TimeZone> From<DateTime<T>> for TimeStamp<T> {
    fn from(value: DateTime<T>) -> Self {
        TimeStamp(value)
    }
}

impl fmt::Display for TimeStamp<Utc> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_rfc3339())
    }
}

impl<C> minicbor::Encode<C> for TimeStamp<Utc> {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        if let Some(nsec) = self.0.timestamp_nanos_opt() {
            return e.i64(nsec)?.ok();
        }

        Err(minicbor::encode::Error::message(
            "failed to encode timestamp. timestamp_nanos_opt returned None",
        ))
    }
}

impl<'b, C> minicbor::Decode<'b, C> for TimeStamp<Utc> {
    fn decode(d: &mut minicbor::Decoder<'b>, _: &mut C) -> Result<Self, minicbor::decode::Error> {
        let nsecs = d.i64()?;

        Ok(TimeStamp(DateTime::from_timestamp_nanos(nsecs)))
    }
}

/// The tracked unit. Keyed in the store by `id`.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq, Eq)]
pub struct Drug {
    #[n(0)]
    pub id: String,
    #[n(1)]
    pub name: String,
    #[n(2)]
    pub manufacturer: String,
    #[n(3)]
    pub batch_number: String,
    #[n(4)]
    pub mfg_date: String,
    #[n(5)]
    pub expiry_date: String,
    #[n(6)]
    pub composition: String,
    #[n(7)]
    pub current_owner: Role,
    #[n(8)]
    pub status: DrugStatus,
    #[n(9)]
    pub history: Vec<AuditEntry>, // append only, insertion order is the provenance chain
    #[n(10)]
    pub is_recalled: bool,
    #[n(11)]
    pub inspection_notes: Vec<String>,
}

impl Drug {
    pub fn encode(&self) -> Result<Vec<u8>, LedgerError> {
        Ok(minicbor::to_vec(self)?)
    }
    pub fn decode(bytes: &[u8]) -> Result<Self, LedgerError> {
        Ok(minicbor::decode(bytes)?)
    }
    /// sha256 hex digest of the CBOR encoding
    pub fn fingerprint(&self) -> Result<String, LedgerError> {
        let cbor = self.encode()?;
        Ok(sha256::digest(&cbor))
    }
    pub fn last_entry(&self) -> Option<&AuditEntry> {
        self.history.last()
    }
}

/// Register inputs, assembled with chained setters.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DrugRegistration {
    pub id: String,
    pub name: String,
    pub batch_number: String,
    pub mfg_date: String,
    pub expiry_date: String,
    pub composition: String,
}

impl DrugRegistration {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_owned(),
            ..Self::default()
        }
    }
    pub fn set_name(mut self, name: &str) -> Self {
        self.name = name.to_owned();
        self
    }
    pub fn set_batch_number(mut self, batch_number: &str) -> Self {
        self.batch_number = batch_number.to_owned();
        self
    }
    pub fn set_mfg_date(mut self, date: &str) -> Self {
        self.mfg_date = date.to_owned();
        self
    }
    pub fn set_expiry_date(mut self, date: &str) -> Self {
        self.expiry_date = date.to_owned();
        self
    }
    pub fn set_composition(mut self, composition: &str) -> Self {
        self.composition = composition.to_owned();
        self
    }
    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.id.trim().is_empty() {
            return Err(LedgerError::Validation("drug id is empty".into()));
        }
        if self.name.trim().is_empty() {
            return Err(LedgerError::Validation(format!(
                "drug {} has no name",
                self.id
            )));
        }
        Ok(())
    }
}
