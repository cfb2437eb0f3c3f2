use std::path::{Path, PathBuf};

use async_trait::async_trait;
use log::debug;
use sled::IVec;

use crate::logutil::escape_log;
use crate::progress::errors::StoreError;
use crate::progress::types::{ProgressRecord, PROGRESS_SCHEMA_VERSION};

const TREE_PROGRESS: &str = "progress";

/// Keyed persistence for progress records, one record per (user, module).
///
/// Implementations surface every failure as a [`StoreError`]; timeouts belong to
/// the implementation, not to the engine.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// Every record stored for `user_id`, in no particular order.
    async fn read_all(&self, user_id: &str) -> Result<Vec<ProgressRecord>, StoreError>;

    /// Insert or replace the record for `(user_id, record.module_id)`.
    async fn upsert(&self, user_id: &str, record: &ProgressRecord) -> Result<(), StoreError>;
}

/// Helper builder so tests can easily create throwaway stores with custom paths.
pub struct SledProgressStoreBuilder {
    path: PathBuf,
    temporary: bool,
}

impl SledProgressStoreBuilder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            temporary: false,
        }
    }

    /// Remove the database files when the store is dropped.
    pub fn temporary(mut self) -> Self {
        self.temporary = true;
        self
    }

    pub fn open(self) -> Result<SledProgressStore, StoreError> {
        SledProgressStore::open_with_options(self.path, self.temporary)
    }
}

/// Sled-backed progress persistence.
pub struct SledProgressStore {
    _db: sled::Db,
    progress: sled::Tree,
}

impl SledProgressStore {
    /// Open (or create) the progress store rooted at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        Self::open_with_options(path, false)
    }

    fn open_with_options<P: AsRef<Path>>(path: P, temporary: bool) -> Result<Self, StoreError> {
        let path_ref = path.as_ref();
        std::fs::create_dir_all(path_ref)?;
        let db = sled::Config::new()
            .path(path_ref)
            .temporary(temporary)
            .open()?;
        let progress = db.open_tree(TREE_PROGRESS)?;
        debug!("opened progress store at {}", path_ref.display());
        Ok(Self { _db: db, progress })
    }

    fn user_prefix(user_id: &str) -> Vec<u8> {
        format!("progress:{}:", user_id).into_bytes()
    }

    fn record_key(user_id: &str, module_id: &str) -> Vec<u8> {
        format!("progress:{}:{}", user_id, module_id).into_bytes()
    }

    fn serialize(record: &ProgressRecord) -> Result<Vec<u8>, StoreError> {
        Ok(bincode::serialize(record)?)
    }

    fn deserialize(bytes: IVec) -> Result<ProgressRecord, StoreError> {
        let record: ProgressRecord = bincode::deserialize(&bytes)?;
        if record.schema_version != PROGRESS_SCHEMA_VERSION {
            return Err(StoreError::SchemaMismatch {
                entity: "progress",
                expected: PROGRESS_SCHEMA_VERSION,
                found: record.schema_version,
            });
        }
        Ok(record)
    }

    fn read_all_blocking(tree: &sled::Tree, user_id: &str) -> Result<Vec<ProgressRecord>, StoreError> {
        let mut records = Vec::new();
        for entry in tree.scan_prefix(Self::user_prefix(user_id)) {
            let (_, bytes) = entry?;
            records.push(Self::deserialize(bytes)?);
        }
        Ok(records)
    }

    fn upsert_blocking(
        tree: &sled::Tree,
        user_id: &str,
        mut record: ProgressRecord,
    ) -> Result<(), StoreError> {
        record.schema_version = PROGRESS_SCHEMA_VERSION;
        let key = Self::record_key(user_id, &record.module_id);
        let bytes = Self::serialize(&record)?;
        tree.insert(key, bytes)?;
        tree.flush()?;
        Ok(())
    }

    /// List every user id with at least one stored record.
    pub fn list_user_ids(&self) -> Result<Vec<String>, StoreError> {
        let mut ids: Vec<String> = Vec::new();
        for entry in self.progress.scan_prefix(b"progress:") {
            let (key, _) = entry?;
            let text = String::from_utf8_lossy(&key);
            if let Some(rest) = text.strip_prefix("progress:") {
                if let Some((user, _module)) = rest.split_once(':') {
                    ids.push(user.to_string());
                }
            }
        }
        ids.sort();
        ids.dedup();
        Ok(ids)
    }

    /// Delete every record for `user_id`. Returns how many records were removed.
    pub fn clear_user(&self, user_id: &str) -> Result<usize, StoreError> {
        let mut removed = 0usize;
        for entry in self.progress.scan_prefix(Self::user_prefix(user_id)) {
            let (key, _) = entry?;
            self.progress.remove(key)?;
            removed += 1;
        }
        self.progress.flush()?;
        Ok(removed)
    }
}

#[async_trait]
impl ProgressStore for SledProgressStore {
    async fn read_all(&self, user_id: &str) -> Result<Vec<ProgressRecord>, StoreError> {
        let tree = self.progress.clone();
        let user = user_id.to_string();
        let records = tokio::task::spawn_blocking(move || Self::read_all_blocking(&tree, &user))
            .await
            .map_err(|e| StoreError::Internal(format!("read task failed: {}", e)))??;
        debug!(
            "read {} progress records for {}",
            records.len(),
            escape_log(user_id)
        );
        Ok(records)
    }

    async fn upsert(&self, user_id: &str, record: &ProgressRecord) -> Result<(), StoreError> {
        let tree = self.progress.clone();
        let user = user_id.to_string();
        let record = record.clone();
        tokio::task::spawn_blocking(move || Self::upsert_blocking(&tree, &user, record))
            .await
            .map_err(|e| StoreError::Internal(format!("write task failed: {}", e)))?
    }
}
