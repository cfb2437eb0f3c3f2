//! Progression engine: per-user unlock state derived from the catalog and stored progress.
//!
//! The engine caches one session at a time (the signed-in user, or an anonymous
//! visitor). The cache is an immutable snapshot behind an `Arc` and is swapped
//! whole, so readers never observe a half-updated unlock chain. Writes are
//! serialized through an async gate; a store failure leaves the previous
//! snapshot in place.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use chrono::Utc;
use log::{debug, info, warn};
use tokio::sync::Mutex;

use crate::logutil::escape_log;
use crate::progress::activity::ActivityOutcome;
use crate::progress::catalog::ModuleCatalog;
use crate::progress::derive::{anonymous_view, derive_view, index_records};
use crate::progress::errors::ProgressError;
use crate::progress::storage::ProgressStore;
use crate::progress::types::{
    ModuleStage, ModuleViewState, ProgressRecord, ProgressSummary, MAX_SCORE,
};
use crate::validation::validate_user_id;

#[derive(Debug)]
struct SessionSnapshot {
    /// `None` for an anonymous visitor.
    user_id: Option<String>,
    records: HashMap<String, ProgressRecord>,
    view: Vec<ModuleViewState>,
}

impl SessionSnapshot {
    fn module(&self, module_id: &str) -> Option<&ModuleViewState> {
        self.view.iter().find(|m| m.id == module_id)
    }
}

pub struct ProgressionEngine {
    catalog: Arc<ModuleCatalog>,
    store: Arc<dyn ProgressStore>,
    session: RwLock<Option<Arc<SessionSnapshot>>>,
    write_gate: Mutex<()>,
}

impl ProgressionEngine {
    pub fn new(catalog: Arc<ModuleCatalog>, store: Arc<dyn ProgressStore>) -> Self {
        Self {
            catalog,
            store,
            session: RwLock::new(None),
            write_gate: Mutex::new(()),
        }
    }

    pub fn catalog(&self) -> &ModuleCatalog {
        &self.catalog
    }

    fn snapshot(&self) -> Option<Arc<SessionSnapshot>> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn replace_snapshot(&self, snapshot: Option<SessionSnapshot>) {
        let mut guard = self.session.write().unwrap_or_else(PoisonError::into_inner);
        *guard = snapshot.map(Arc::new);
    }

    /// Load (or reload) progression for `user_id`, or the anonymous view for `None`.
    ///
    /// Switching to a different identity discards the previous user's cache before
    /// any I/O. If the store read fails the error is returned and nothing new is
    /// derived.
    pub async fn load_progression(
        &self,
        user_id: Option<&str>,
    ) -> Result<Vec<ModuleViewState>, ProgressError> {
        let _gate = self.write_gate.lock().await;

        let Some(user_id) = user_id else {
            let view = anonymous_view(&self.catalog);
            self.replace_snapshot(Some(SessionSnapshot {
                user_id: None,
                records: HashMap::new(),
                view: view.clone(),
            }));
            debug!("loaded anonymous progression ({} modules)", view.len());
            return Ok(view);
        };

        let user_id = validate_user_id(user_id).map_err(|e| {
            warn!(target: "security", "rejected user id {}: {}", escape_log(user_id), e);
            e
        })?;

        let cached_user = self.snapshot().and_then(|s| s.user_id.clone());
        if cached_user.as_deref() != Some(user_id) {
            self.replace_snapshot(None);
        }

        let records = match self.store.read_all(user_id).await {
            Ok(records) => index_records(records),
            Err(e) => {
                warn!(
                    "failed to load progress for {}: {}",
                    escape_log(user_id),
                    e
                );
                return Err(e.into());
            }
        };

        let view = derive_view(&self.catalog, &records);
        info!(
            "loaded progression for {}: {} records, {} modules unlocked",
            escape_log(user_id),
            records.len(),
            view.iter().filter(|m| m.unlocked).count()
        );
        self.replace_snapshot(Some(SessionSnapshot {
            user_id: Some(user_id.to_string()),
            records,
            view: view.clone(),
        }));
        Ok(view)
    }

    /// Persist a finished attempt and return the recomputed view.
    ///
    /// Any attempt marks the module completed; only a passing score opens the
    /// successor. Attempts on a module that is still locked are refused with
    /// [`ProgressError::ModuleLocked`] before anything is written. The store
    /// write happens before the cache is touched, so a failed write leaves the
    /// previous snapshot intact.
    pub async fn record_completion(
        &self,
        user_id: Option<&str>,
        module_id: &str,
        score: u32,
    ) -> Result<Vec<ModuleViewState>, ProgressError> {
        let Some(user_id) = user_id else {
            warn!(
                target: "security",
                "rejected anonymous completion for module {}",
                escape_log(module_id)
            );
            return Err(ProgressError::UnauthenticatedWrite);
        };
        let user_id = validate_user_id(user_id)?;
        self.catalog.require(module_id)?;
        if score > u32::from(MAX_SCORE) {
            return Err(ProgressError::InvalidScore(score));
        }
        let score = score as u8;

        let _gate = self.write_gate.lock().await;

        let mut records = match self.snapshot() {
            Some(snapshot) if snapshot.user_id.as_deref() == Some(user_id) => {
                snapshot.records.clone()
            }
            _ => index_records(self.store.read_all(user_id).await?),
        };

        let open = derive_view(&self.catalog, &records)
            .iter()
            .any(|m| m.id == module_id && m.unlocked);
        if !open {
            warn!(
                target: "security",
                "rejected completion of locked module {} for {}",
                module_id,
                escape_log(user_id)
            );
            return Err(ProgressError::ModuleLocked(module_id.to_string()));
        }

        let record = ProgressRecord::attempt(module_id, score, Utc::now());
        if let Err(e) = self.store.upsert(user_id, &record).await {
            warn!(
                "failed to save progress for {} on {}: {}",
                escape_log(user_id),
                module_id,
                e
            );
            return Err(e.into());
        }
        records.insert(module_id.to_string(), record);

        let view = derive_view(&self.catalog, &records);
        let stage = view
            .iter()
            .find(|m| m.id == module_id)
            .map(ModuleViewState::stage)
            .unwrap_or(ModuleStage::Locked);
        info!(
            "recorded {} on {} for {} ({})",
            score,
            module_id,
            escape_log(user_id),
            stage.label()
        );
        self.replace_snapshot(Some(SessionSnapshot {
            user_id: Some(user_id.to_string()),
            records,
            view: view.clone(),
        }));
        Ok(view)
    }

    /// Route an activity result. Only scored outcomes reach the store; bare
    /// completions of unscored games return `Ok(None)` without I/O.
    pub async fn record_outcome(
        &self,
        user_id: Option<&str>,
        module_id: &str,
        outcome: ActivityOutcome,
    ) -> Result<Option<Vec<ModuleViewState>>, ProgressError> {
        match outcome.score() {
            Some(score) => self
                .record_completion(user_id, module_id, u32::from(score))
                .await
                .map(Some),
            None => {
                self.catalog.require(module_id)?;
                Ok(None)
            }
        }
    }

    /// Refresh the cached unlock state of `from_module_id`'s successor without I/O.
    ///
    /// The successor opens only when the cached record for `from_module_id` is
    /// completed with a passing score, the same rule `load_progression` applies.
    /// Returns whether the successor is unlocked afterwards; `false` when there
    /// is no successor or no session is loaded. Repeated calls are no-ops.
    pub fn advance_unlock(&self, from_module_id: &str) -> Result<bool, ProgressError> {
        self.catalog.require(from_module_id)?;
        let Some(successor) = self.catalog.successor(from_module_id) else {
            return Ok(false);
        };
        let Some(snapshot) = self.snapshot() else {
            return Ok(false);
        };

        let view = if snapshot.user_id.is_some() {
            derive_view(&self.catalog, &snapshot.records)
        } else {
            anonymous_view(&self.catalog)
        };
        let unlocked = view
            .iter()
            .find(|m| m.id == successor.id)
            .map(|m| m.unlocked)
            .unwrap_or(false);

        if view != snapshot.view {
            self.replace_snapshot(Some(SessionSnapshot {
                user_id: snapshot.user_id.clone(),
                records: snapshot.records.clone(),
                view,
            }));
        }
        Ok(unlocked)
    }

    /// Cached unlock flag. Unknown modules and unloaded sessions read as locked.
    pub fn is_unlocked(&self, module_id: &str) -> bool {
        self.snapshot()
            .and_then(|s| s.module(module_id).map(|m| m.unlocked))
            .unwrap_or(false)
    }

    /// Cached progress record for `module_id`, if one has been stored.
    pub fn progress_of(&self, module_id: &str) -> Option<ProgressRecord> {
        self.snapshot()
            .and_then(|s| s.records.get(module_id).cloned())
    }

    /// The cached derived view, or `None` before a successful load.
    pub fn view(&self) -> Option<Vec<ModuleViewState>> {
        self.snapshot().map(|s| s.view.clone())
    }

    pub fn stage_of(&self, module_id: &str) -> Option<ModuleStage> {
        self.snapshot()
            .and_then(|s| s.module(module_id).map(ModuleViewState::stage))
    }

    pub fn summary(&self) -> Option<ProgressSummary> {
        self.snapshot().map(|s| ProgressSummary::from_view(&s.view))
    }

    /// Identity of the cached session; `None` when anonymous or nothing is loaded.
    pub fn current_user(&self) -> Option<String> {
        self.snapshot().and_then(|s| s.user_id.clone())
    }

    /// Drop all cached state. Call when the authentication collaborator signs the user out.
    pub fn sign_out(&self) {
        if let Some(user) = self.current_user() {
            info!("discarding cached progression for {}", escape_log(&user));
        }
        self.replace_snapshot(None);
    }
}
