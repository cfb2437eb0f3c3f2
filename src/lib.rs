//! # hivlearn - Module Progression for HIV/AIDS Awareness Learning
//!
//! hivlearn is the progression core of an interactive HIV/AIDS awareness program.
//! Learners read content, play short activities and take a quiz per module; a
//! quiz score of at least [`progress::PASS_THRESHOLD`] percent opens the next module.
//!
//! ## Features
//!
//! - **Ordered Catalog**: Validated, 1-based module sequence, built in or loaded from JSON.
//! - **Derived Unlocks**: Unlock flags are recomputed from stored scores on every load and update.
//! - **Pluggable Storage**: Async [`progress::ProgressStore`] trait with Sled and in-memory backends.
//! - **Session Cache**: One signed-in (or anonymous) session cached and swapped atomically.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use hivlearn::progress::{ModuleCatalog, ProgressionEngine, SledProgressStore};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = Arc::new(SledProgressStore::open("./data/progress")?);
//!     let engine = ProgressionEngine::new(Arc::new(ModuleCatalog::standard()), store);
//!
//!     engine.load_progression(Some("learner-1")).await?;
//!     let view = engine.record_completion(Some("learner-1"), "what-is-hiv-aids", 80).await?;
//!     assert!(view[1].unlocked);
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`progress`] - Catalog, progress records, stores and the progression engine
//! - [`config`] - Configuration management and validation
//! - [`validation`] - Identifier validation for storage keys
//! - [`logutil`] - Single-line log escaping

pub mod config;
pub mod logutil;
pub mod progress;
pub mod validation;
