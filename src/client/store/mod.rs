//! # Offline-First Data Stores
//!
//! The stores encapsulate the offline-aware sync orchestration the UI
//! drives: each mutation decides whether to call the server, keep only
//! local state, or fall back to local persistence after a failed call,
//! and how to reconcile once connectivity returns.
//!
//! ## Key Components
//!
//! - `workout.rs`: active session store and sync orchestrator
//! - `history.rs`: append-only completed-workout snapshots
//! - `catalog.rs`: server exercise catalog with an offline cache
//! - `prefs.rs`: local-first preferences with profile sync

pub mod catalog;
pub mod history;
pub mod prefs;
pub mod workout;

pub use catalog::{is_bodyweight_name, ExerciseCatalog};
pub use history::HistoryStore;
pub use prefs::PreferencesStore;
pub use workout::WorkoutStore;
