//! Key-value persistence for drug records
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("value under {0} changed since it was read")]
    Conflict(String),
    #[error(transparent)]
    Backend(#[from] sled::Error),
    // the swap went through, only the flush did not
    #[error("value written but not flushed: {0}")]
    NotDurable(#[source] sled::Error),
    #[error("store lock poisoned")]
    Poisoned,
}

/// Single-key atomic storage.
///
/// `put` only succeeds when the live value still equals `expected`
/// (`None` meaning the key must be absent), which is what keeps two
/// concurrent transitions on the same drug from losing an update.
pub trait Store {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;
    fn put(&self, key: &str, expected: Option<&[u8]>, value: Vec<u8>) -> Result<(), StoreError>;
}

pub struct SledStore {
    instance: Arc<sled::Db>,
}

impl SledStore {
    pub fn new(instance: Arc<sled::Db>) -> Self {
        Self { instance }
    }
}

impl Store for SledStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let value = self.instance.get(key.as_bytes())?;
        Ok(value.map(|ivec| ivec.to_vec()))
    }

    fn put(&self, key: &str, expected: Option<&[u8]>, value: Vec<u8>) -> Result<(), StoreError> {
        let swapped = self
            .instance
            .compare_and_swap(key.as_bytes(), expected, Some(value))?;

        if swapped.is_err() {
            return Err(StoreError::Conflict(key.to_owned()));
        }
        // durable on return
        self.instance.flush().map_err(StoreError::NotDurable)?;

        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn len(&self) -> usize {
        self.entries.lock().map(|map| map.len()).unwrap_or(0)
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Store for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn put(&self, key: &str, expected: Option<&[u8]>, value: Vec<u8>) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;

        if entries.get(key).map(Vec::as_slice) != expected {
            return Err(StoreError::Conflict(key.to_owned()));
        }
        entries.insert(key.to_owned(), value);

        Ok(())
    }
}
