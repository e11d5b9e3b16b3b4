//! Service layer API for drug lifecycle operations
use super::clock::Clock;
use super::config::EngineConfig;
use super::drug::{Drug, DrugRegistration, Role};
use super::engine::{LifecycleEngine, Transition};
use super::error::LedgerError;
use super::events::EventSink;
use super::identity::Identity;
use super::store::{Store, StoreError};
use std::sync::Arc;

/// Bytes as last read from the store, kept so the write can be made
/// conditional on them.
struct Loaded {
    raw: Option<Vec<u8>>,
    drug: Option<Drug>,
}

pub struct DrugLedger<S: Store> {
    store: S,
    engine: LifecycleEngine,
    clock: Arc<dyn Clock + Send + Sync>,
    events: Arc<dyn EventSink + Send + Sync>,
}

impl<S: Store> DrugLedger<S> {
    pub fn new(
        store: S,
        config: &EngineConfig,
        clock: Arc<dyn Clock + Send + Sync>,
        events: Arc<dyn EventSink + Send + Sync>,
    ) -> Self {
        Self {
            store,
            engine: LifecycleEngine::new(config),
            clock,
            events,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
    pub fn engine(&self) -> &LifecycleEngine {
        &self.engine
    }

    fn resolve_caller<I: Identity + ?Sized>(&self, caller: &I) -> Result<Role, LedgerError> {
        let raw = caller
            .caller_role()
            .map_err(|err| LedgerError::Unauthorized(format!("{err:#}")))?;
        let role =
            Role::parse(&raw).map_err(|err| LedgerError::Unauthorized(err.to_string()))?;
        tracing::debug!(caller = %role, "caller resolved");
        Ok(role)
    }

    fn load(&self, drug_id: &str) -> Result<Loaded, LedgerError> {
        let raw = self.store.get(drug_id)?;
        let drug = raw.as_deref().map(Drug::decode).transpose()?;
        Ok(Loaded { raw, drug })
    }

    /// Encode, write conditionally on what was read, then announce.
    fn commit(&self, expected: Option<&[u8]>, transition: Transition) -> Result<Drug, LedgerError> {
        let Transition { drug, notification } = transition;
        // fail before the write if the announcement cannot be built either
        let announcement = notification
            .map(|n| n.payload().map(|payload| (n.name(), payload)))
            .transpose()?;

        let encoded = drug.encode()?;
        // a record that is live but not flushed is still announced
        let durability = match self.store.put(&drug.id, expected, encoded) {
            Ok(()) => Ok(()),
            Err(err @ StoreError::NotDurable(_)) => Err(LedgerError::from(err)),
            Err(err) => return Err(err.into()),
        };

        tracing::info!(
            drug_id = %drug.id,
            status = %drug.status,
            owner = %drug.current_owner,
            history_len = drug.history.len(),
            "transition committed"
        );
        if let Some((name, payload)) = announcement {
            self.events.emit(name, payload);
        }

        durability.map(|()| drug)
    }

    /// Register a new drug; only the manufacturer may.
    #[tracing::instrument(skip_all, fields(drug_id = %registration.id), err(level = "warn"))]
    pub fn register_drug<I: Identity + ?Sized>(
        &self,
        caller: &I,
        registration: DrugRegistration,
    ) -> Result<Drug, LedgerError> {
        let role = self.resolve_caller(caller)?;
        let loaded = self.load(&registration.id)?;
        let transition = self.engine.register(
            &role,
            loaded.drug.as_ref(),
            registration,
            self.clock.now(),
        )?;
        self.commit(loaded.raw.as_deref(), transition)
    }

    /// Hand the drug over to `destination`; only the current owner may.
    #[tracing::instrument(skip(self, caller), err(level = "warn"))]
    pub fn ship_drug<I: Identity + ?Sized>(
        &self,
        caller: &I,
        drug_id: &str,
        destination: &str,
    ) -> Result<Drug, LedgerError> {
        let role = self.resolve_caller(caller)?;
        let loaded = self.load(drug_id)?;
        let transition =
            self.engine
                .ship(&role, drug_id, loaded.drug, destination, self.clock.now())?;
        self.commit(loaded.raw.as_deref(), transition)
    }

    /// Confirm arrival of a drug shipped to the caller.
    #[tracing::instrument(skip(self, caller), err(level = "warn"))]
    pub fn receive_drug<I: Identity + ?Sized>(
        &self,
        caller: &I,
        drug_id: &str,
    ) -> Result<Drug, LedgerError> {
        let role = self.resolve_caller(caller)?;
        let loaded = self.load(drug_id)?;
        let transition = self
            .engine
            .receive(&role, drug_id, loaded.drug, self.clock.now())?;
        self.commit(loaded.raw.as_deref(), transition)
    }

    /// Permanently withdraw a drug; only the regulator may.
    #[tracing::instrument(skip(self, caller), err(level = "warn"))]
    pub fn recall_drug<I: Identity + ?Sized>(
        &self,
        caller: &I,
        drug_id: &str,
        reason: &str,
    ) -> Result<Drug, LedgerError> {
        let role = self.resolve_caller(caller)?;
        let loaded = self.load(drug_id)?;
        let transition =
            self.engine
                .recall(&role, drug_id, loaded.drug, reason, self.clock.now())?;
        self.commit(loaded.raw.as_deref(), transition)
    }

    /// Full current record, history and inspection notes included.
    #[tracing::instrument(skip(self, caller))]
    pub fn track_drug<I: Identity + ?Sized>(
        &self,
        caller: &I,
        drug_id: &str,
    ) -> Result<Drug, LedgerError> {
        let role = self.resolve_caller(caller)?;
        let loaded = self.load(drug_id)?;
        self.engine.track(&role, drug_id, loaded.drug)
    }

    /// The record exactly as stored.
    pub fn track_drug_raw<I: Identity + ?Sized>(
        &self,
        caller: &I,
        drug_id: &str,
    ) -> Result<Vec<u8>, LedgerError> {
        let role = self.resolve_caller(caller)?;
        let Loaded { raw, drug } = self.load(drug_id)?;
        self.engine.track(&role, drug_id, drug)?;
        raw.ok_or_else(|| LedgerError::NotFound(drug_id.to_owned()))
    }

    /// Rendered audit rows, oldest first.
    pub fn drug_history<I: Identity + ?Sized>(
        &self,
        caller: &I,
        drug_id: &str,
    ) -> Result<Vec<String>, LedgerError> {
        Ok(self.track_drug(caller, drug_id)?.view_history())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::drug::{DrugStatus, TimeStamp};
    use crate::events::{NoopEvents, RecordingEvents};
    use crate::identity::UnresolvedIdentity;
    use crate::store::MemoryStore;

    fn ledger() -> DrugLedger<MemoryStore> {
        DrugLedger::new(
            MemoryStore::new(),
            &EngineConfig::default(),
            Arc::new(FixedClock(TimeStamp::new_with(2024, 1, 1, 0, 0, 0).unwrap())),
            Arc::new(NoopEvents),
        )
    }

    #[test]
    fn unresolved_identity_is_unauthorized() {
        let ledger = ledger();
        let err = ledger
            .register_drug(&UnresolvedIdentity, DrugRegistration::new("D1").set_name("x"))
            .unwrap_err();
        assert!(matches!(err, LedgerError::Unauthorized(_)));
    }

    #[test]
    fn malformed_caller_role_is_unauthorized() {
        let ledger = ledger();
        let err = ledger.track_drug("not a role", "D1").unwrap_err();
        assert!(matches!(err, LedgerError::Unauthorized(_)));
    }

    #[test]
    fn destination_is_checked_after_existence_and_ownership() {
        let ledger = ledger();
        let err = ledger.ship_drug("Nobody", "D404", "bad role").unwrap_err();
        assert!(matches!(err, LedgerError::NotFound(_)));

        ledger
            .register_drug("CiplaMSP", DrugRegistration::new("D1").set_name("Paracetamol"))
            .unwrap();
        let err = ledger.ship_drug("Nobody", "D1", "bad role").unwrap_err();
        assert!(matches!(err, LedgerError::Unauthorized(_)));
    }

    #[test]
    fn malformed_destination_is_rejected_before_any_write() {
        let ledger = ledger();
        ledger
            .register_drug("CiplaMSP", DrugRegistration::new("D1").set_name("Paracetamol"))
            .unwrap();
        let before = ledger.track_drug_raw("CiplaMSP", "D1").unwrap();

        let err = ledger.ship_drug("CiplaMSP", "D1", "").unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
        assert_eq!(ledger.track_drug_raw("CiplaMSP", "D1").unwrap(), before);
    }

    #[test]
    fn events_follow_committed_writes_only() {
        let events = Arc::new(RecordingEvents::new());
        let ledger = DrugLedger::new(
            MemoryStore::new(),
            &EngineConfig::default(),
            Arc::new(FixedClock(TimeStamp::new_with(2024, 1, 1, 0, 0, 0).unwrap())),
            events.clone(),
        );

        ledger
            .register_drug("CiplaMSP", DrugRegistration::new("D1").set_name("Paracetamol"))
            .unwrap();
        // rejected, nothing emitted
        let _ = ledger.ship_drug("MedlifeMSP", "D1", "ApolloMSP");
        let drug = ledger.ship_drug("CiplaMSP", "D1", "MedlifeMSP").unwrap();
        assert_eq!(drug.status, DrugStatus::InTransit);

        let emitted = events.emitted();
        assert_eq!(emitted.len(), 1);
        assert_eq!(emitted[0].0, "Shipment");
    }

    /// Applies every write but reports that it never reached disk.
    struct UnflushedStore(MemoryStore);

    impl Store for UnflushedStore {
        fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
            self.0.get(key)
        }
        fn put(
            &self,
            key: &str,
            expected: Option<&[u8]>,
            value: Vec<u8>,
        ) -> Result<(), StoreError> {
            self.0.put(key, expected, value)?;
            Err(StoreError::NotDurable(sled::Error::Io(std::io::Error::other(
                "disk full",
            ))))
        }
    }

    #[test]
    fn unflushed_commit_is_announced_and_not_retryable() {
        let events = Arc::new(RecordingEvents::new());
        let ledger = DrugLedger::new(
            UnflushedStore(MemoryStore::new()),
            &EngineConfig::default(),
            Arc::new(FixedClock(TimeStamp::new_with(2024, 1, 1, 0, 0, 0).unwrap())),
            events.clone(),
        );
        let registration = DrugRegistration::new("D1").set_name("Paracetamol");
        assert!(ledger.register_drug("CiplaMSP", registration).is_err());
        assert!(ledger.track_drug("CiplaMSP", "D1").is_ok());

        let err = ledger.ship_drug("CiplaMSP", "D1", "MedlifeMSP").unwrap_err();
        assert!(matches!(err, LedgerError::StoreFailure(StoreError::NotDurable(_))));
        assert!(!err.is_retryable());

        // the swap happened, so the shipment is live and announced
        let drug = ledger.track_drug("MedlifeMSP", "D1").unwrap();
        assert_eq!(drug.status, DrugStatus::InTransit);
        assert_eq!(drug.history.len(), 2);
        let emitted = events.emitted();
        assert_eq!(emitted.len(), 1);
        assert_eq!(emitted[0].0, "Shipment");
    }
}
