//! Module progression: catalog, progress persistence and unlock derivation.
//!
//! A learner works through an ordered catalog of modules. Finishing a module's
//! quiz stores a progress record; a passing score (see [`PASS_THRESHOLD`]) opens
//! the next module. Unlock state is always derived, never stored.

pub mod activity;
pub mod catalog;
pub mod derive;
pub mod engine;
pub mod errors;
pub mod memory;
pub mod seed_loader;
pub mod storage;
pub mod types;

pub use activity::{quiz_score, ActivityKind, ActivityOutcome};
pub use catalog::{ModuleCatalog, STANDARD_MODULE_IDS};
pub use derive::{anonymous_view, derive_view};
pub use engine::ProgressionEngine;
pub use errors::{ProgressError, StoreError};
pub use memory::MemoryProgressStore;
pub use seed_loader::{load_catalog_from_json, parse_catalog_json};
pub use storage::{ProgressStore, SledProgressStore, SledProgressStoreBuilder};
pub use types::*;
