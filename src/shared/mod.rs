//! Shared types and data structures
//!
//! Domain models, error types and base configuration used across the
//! client core.

pub mod config;
pub mod error;
pub mod models;

pub use config::{AppConfig, AppConfigBuilder, ConfigError, Platform};
pub use error::{ApiError, ErrorCause, StoreError};
pub use models::{
    CatalogExercise, ConnectionType, ConnectivityState, Exercise, ExerciseSet, UserPreferences,
    WeightUnit, WorkoutHistoryItem, WorkoutSession, MAX_TITLE_LEN,
};
