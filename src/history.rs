//! Audit trail entries and their legacy row rendering
use super::drug::{Drug, Party, TimeStamp};
use chrono::Utc;
use std::fmt::{self, Write};

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditEvent {
    #[n(0)]
    Registered,
    #[n(1)]
    Shipped,
    #[n(2)]
    Received,
    #[n(3)]
    Recalled,
}

impl fmt::Display for AuditEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Registered => "Registered",
            Self::Shipped => "Shipped",
            Self::Received => "Received",
            Self::Recalled => "Recalled",
        };
        f.write_str(name)
    }
}

/// One immutable row of a drug's provenance chain.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq, Eq)]
pub struct AuditEntry {
    #[n(0)]
    pub timestamp: TimeStamp<Utc>,
    #[n(1)]
    pub event: AuditEvent,
    #[n(2)]
    pub from: Party,
    #[n(3)]
    pub to: Party,
    #[n(4)]
    pub details: String,
}

impl AuditEntry {
    pub fn new(
        timestamp: TimeStamp<Utc>,
        event: AuditEvent,
        from: Party,
        to: Party,
        details: String,
    ) -> Self {
        Self {
            timestamp,
            event,
            from,
            to,
            details,
        }
    }
    pub fn registered(timestamp: TimeStamp<Utc>, to: Party) -> Self {
        Self::new(
            timestamp,
            AuditEvent::Registered,
            Party::System,
            to,
            "Drug registered in system".into(),
        )
    }
    pub fn shipped(timestamp: TimeStamp<Utc>, from: Party, to: Party) -> Self {
        Self::new(
            timestamp,
            AuditEvent::Shipped,
            from,
            to,
            "Drug shipment initiated".into(),
        )
    }
    pub fn received(timestamp: TimeStamp<Utc>, from: Party, to: Party) -> Self {
        Self::new(
            timestamp,
            AuditEvent::Received,
            from,
            to,
            "Drug received".into(),
        )
    }
    pub fn recalled(timestamp: TimeStamp<Utc>, from: Party, reason: &str) -> Self {
        Self::new(
            timestamp,
            AuditEvent::Recalled,
            from,
            Party::All,
            reason.to_owned(),
        )
    }
}

// timestamp|event|from|to|details
impl fmt::Display for AuditEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}|{}|{}|{}|",
            self.timestamp, self.event, self.from, self.to
        )?;
        escape_details(f, &self.details)
    }
}

// roles cannot hold a `|`, free-text details can
fn escape_details(f: &mut fmt::Formatter<'_>, details: &str) -> fmt::Result {
    for c in details.chars() {
        match c {
            '\\' => f.write_str("\\\\")?,
            '|' => f.write_str("\\|")?,
            c => f.write_char(c)?,
        }
    }
    Ok(())
}

pub fn inspection_note(timestamp: &TimeStamp<Utc>, reason: &str) -> String {
    format!("Recall on {timestamp}: {reason}")
}

impl Drug {
    /// Rendered audit rows, oldest first.
    ///
    /// Each row is `timestamp|event|from|to|details`. A `|` or `\` inside
    /// the details is escaped with a backslash, so splitting on unescaped
    /// pipes always yields five fields.
    pub fn view_history(&self) -> Vec<String> {
        self.history
            .iter()
            .enumerate()
            .map(|(seq, entry)| {
                let row = entry.to_string();
                tracing::debug!(drug_id = %self.id, seq, "{row}");
                row
            })
            .collect()
    }
}
