//! Caller identity resolution
//!
//! Authentication happens upstream. By the time a request reaches the ledger the
//! caller is reduced to an opaque role string, which the ledger validates and then
//! compares by exact equality.

pub trait Identity {
    fn caller_role(&self) -> anyhow::Result<String>;
}

// an already authenticated role handed in directly
impl Identity for str {
    fn caller_role(&self) -> anyhow::Result<String> {
        Ok(self.to_owned())
    }
}

impl Identity for String {
    fn caller_role(&self) -> anyhow::Result<String> {
        Ok(self.clone())
    }
}

/// A caller whose identity could not be established.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnresolvedIdentity;

impl Identity for UnresolvedIdentity {
    fn caller_role(&self) -> anyhow::Result<String> {
        anyhow::bail!("failed to get client MSPID: no identity attached to the request")
    }
}
