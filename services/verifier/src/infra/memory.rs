use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};

use crate::domain::repository::{IdentityRepository, OtpRepository};
use crate::domain::types::{Identity, OtpRecord};
use crate::domain::validation::EmailAddress;
use crate::error::VerifierError;

/// Everything stored for one address. Guarded by its own mutex so operations
/// on different addresses never wait on each other.
#[derive(Debug, Default)]
struct AddressSlot {
    identity: Option<Identity>,
    records: Vec<OtpRecord>,
}

type Slot = Arc<Mutex<AddressSlot>>;

/// Process-local store used when no database is configured, and in tests.
/// Contents are lost on restart.
#[derive(Clone, Default)]
pub struct MemoryStore {
    slots: Arc<Mutex<HashMap<EmailAddress, Slot>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // Slot updates never panic halfway, so a poisoned lock still holds consistent data.
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The slot map lock is held only for the lookup, never while a slot is locked.
    fn slot(&self, address: &EmailAddress) -> Slot {
        let mut slots = lock(&self.slots);
        Arc::clone(slots.entry(address.clone()).or_default())
    }

    fn existing_slot(&self, address: &EmailAddress) -> Option<Slot> {
        lock(&self.slots).get(address).cloned()
    }

    fn all_slots(&self) -> Vec<Slot> {
        lock(&self.slots).values().cloned().collect()
    }

    /// Every stored identity, ordered by address.
    pub fn identities(&self) -> Vec<Identity> {
        let mut identities: Vec<Identity> = self
            .all_slots()
            .iter()
            .filter_map(|slot| lock(slot).identity.clone())
            .collect();
        identities.sort_by(|a, b| a.address.cmp(&b.address));
        identities
    }

    /// Every stored record for the address, oldest first.
    pub fn records(&self, address: &EmailAddress) -> Vec<OtpRecord> {
        self.existing_slot(address)
            .map(|slot| lock(&slot).records.clone())
            .unwrap_or_default()
    }
}

impl AddressSlot {
    fn identity_or_create(&mut self, address: &EmailAddress, now: DateTime<Utc>) -> &mut Identity {
        self.identity
            .get_or_insert_with(|| Identity::new(address.clone(), now))
    }
}

impl OtpRepository for MemoryStore {
    async fn replace_active(&self, record: &OtpRecord) -> Result<(), VerifierError> {
        let slot = self.slot(&record.address);
        let mut slot = lock(&slot);
        slot.identity_or_create(&record.address, record.created_at);
        // Retired records are dropped outright; consumed ones are kept until they expire.
        slot.records
            .retain(|r| r.consumed && r.expires_at > record.created_at);
        slot.records.push(record.clone());
        Ok(())
    }

    async fn find_unconsumed(
        &self,
        address: &EmailAddress,
    ) -> Result<Option<OtpRecord>, VerifierError> {
        let Some(slot) = self.existing_slot(address) else {
            return Ok(None);
        };
        let slot = lock(&slot);
        Ok(slot
            .records
            .iter()
            .filter(|r| !r.consumed)
            .max_by_key(|r| r.created_at)
            .cloned())
    }

    async fn consume(&self, record: &OtpRecord, now: DateTime<Utc>) -> Result<bool, VerifierError> {
        let slot = self.slot(&record.address);
        let mut slot = lock(&slot);
        let Some(stored) = slot
            .records
            .iter_mut()
            .find(|r| r.id == record.id && !r.consumed)
        else {
            return Ok(false);
        };
        stored.consumed = true;
        slot.identity_or_create(&record.address, now).verified = true;
        Ok(true)
    }

    async fn purge_expired(&self, before: DateTime<Utc>) -> Result<u64, VerifierError> {
        let mut purged = 0;
        for slot in self.all_slots() {
            let mut slot = lock(&slot);
            let len = slot.records.len();
            slot.records.retain(|r| r.expires_at >= before);
            purged += (len - slot.records.len()) as u64;
        }
        Ok(purged)
    }
}

impl IdentityRepository for MemoryStore {
    async fn find(&self, address: &EmailAddress) -> Result<Option<Identity>, VerifierError> {
        Ok(self
            .existing_slot(address)
            .and_then(|slot| lock(&slot).identity.clone()))
    }

    async fn get_or_create(
        &self,
        address: &EmailAddress,
        now: DateTime<Utc>,
    ) -> Result<Identity, VerifierError> {
        let slot = self.slot(address);
        let mut slot = lock(&slot);
        Ok(slot.identity_or_create(address, now).clone())
    }

    async fn mark_verified(
        &self,
        address: &EmailAddress,
        now: DateTime<Utc>,
    ) -> Result<(), VerifierError> {
        let slot = self.slot(address);
        let mut slot = lock(&slot);
        slot.identity_or_create(address, now).verified = true;
        Ok(())
    }
}
