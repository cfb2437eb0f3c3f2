//! In-process progress store.
//!
//! Used by tests and by embedders that keep progress elsewhere and only need the
//! engine's derivation rules. The availability switch simulates an outage so
//! `StoreUnavailable` handling can be exercised without a real backend.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::progress::errors::StoreError;
use crate::progress::storage::ProgressStore;
use crate::progress::types::ProgressRecord;

#[derive(Debug, Default)]
pub struct MemoryProgressStore {
    records: Mutex<HashMap<String, HashMap<String, ProgressRecord>>>,
    unavailable: AtomicBool,
    reads: AtomicU64,
    writes: AtomicU64,
}

impl MemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle the simulated outage. While unavailable every call fails.
    pub fn set_available(&self, available: bool) {
        self.unavailable.store(!available, Ordering::SeqCst);
    }

    /// Number of `read_all` calls that reached the store.
    pub fn read_count(&self) -> u64 {
        self.reads.load(Ordering::Relaxed)
    }

    /// Number of successful `upsert` calls.
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                "memory store marked unavailable".to_string(),
            ));
        }
        Ok(())
    }

    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<String, HashMap<String, ProgressRecord>>>, StoreError>
    {
        self.records
            .lock()
            .map_err(|_| StoreError::Internal("memory store mutex poisoned".to_string()))
    }
}

#[async_trait]
impl ProgressStore for MemoryProgressStore {
    async fn read_all(&self, user_id: &str) -> Result<Vec<ProgressRecord>, StoreError> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        self.check_available()?;
        let guard = self.lock()?;
        Ok(guard
            .get(user_id)
            .map(|records| records.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn upsert(&self, user_id: &str, record: &ProgressRecord) -> Result<(), StoreError> {
        self.check_available()?;
        let mut guard = self.lock()?;
        guard
            .entry(user_id.to_string())
            .or_default()
            .insert(record.module_id.clone(), record.clone());
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
