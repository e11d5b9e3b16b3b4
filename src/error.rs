//! Failure taxonomy for ledger operations
use super::store::StoreError;

#[derive(thiserror::Error, Debug)]
pub enum LedgerError {
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("drug {0} already exists")]
    AlreadyExists(String),
    #[error("drug {0} does not exist")]
    NotFound(String),
    #[error("invalid state: {0}")]
    InvalidState(String),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("store failure: {0}")]
    StoreFailure(#[source] StoreError),
    // someone else committed to the same key between our read and write
    #[error("write conflict on drug {0}, retry from a fresh read")]
    WriteConflict(String),
    #[error("encoding failure: {0}")]
    EncodingFailure(String),
}

impl LedgerError {
    /// Whether the whole operation may be safely re-run from a fresh read.
    /// A write that landed without being flushed is not: re-running it would
    /// apply the transition twice.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::WriteConflict(_) => true,
            Self::StoreFailure(StoreError::NotDurable(_)) => false,
            Self::StoreFailure(_) => true,
            _ => false,
        }
    }
}

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(key) => Self::WriteConflict(key),
            other => Self::StoreFailure(other),
        }
    }
}

impl<E: std::fmt::Display> From<minicbor::encode::Error<E>> for LedgerError {
    fn from(err: minicbor::encode::Error<E>) -> Self {
        Self::EncodingFailure(err.to_string())
    }
}

impl From<minicbor::decode::Error> for LedgerError {
    fn from(err: minicbor::decode::Error) -> Self {
        Self::EncodingFailure(format!("stored record is unreadable: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_conflicts_and_store_failures_are_retryable() {
        assert!(LedgerError::WriteConflict("D1".into()).is_retryable());
        assert!(LedgerError::StoreFailure(StoreError::Poisoned).is_retryable());
        assert!(!LedgerError::NotFound("D1".into()).is_retryable());
        assert!(!LedgerError::Unauthorized("nope".into()).is_retryable());
        assert!(!LedgerError::EncodingFailure("bad".into()).is_retryable());
    }

    #[test]
    fn unflushed_write_is_a_store_failure_but_not_retryable() {
        let err: LedgerError =
            StoreError::NotDurable(sled::Error::Io(std::io::Error::other("disk full"))).into();
        assert!(matches!(err, LedgerError::StoreFailure(StoreError::NotDurable(_))));
        assert!(!err.is_retryable());

        let err: LedgerError =
            StoreError::Backend(sled::Error::Io(std::io::Error::other("disk full"))).into();
        assert!(err.is_retryable());
    }

    #[test]
    fn store_conflict_maps_to_write_conflict() {
        let err: LedgerError = StoreError::Conflict("D9".into()).into();
        assert!(matches!(err, LedgerError::WriteConflict(key) if key == "D9"));
    }
}
