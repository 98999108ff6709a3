//! Domain Models
//!
//! Core data structures for workout sessions, exercises, history
//! snapshots, connectivity state and user preferences. All types are
//! plain serde structs; behavior that must hold invariants (title cap,
//! strong-connection implication, history aggregates) lives in the
//! constructors and methods here rather than in the stores.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Maximum length of a workout title, in characters.
pub const MAX_TITLE_LEN: usize = 30;

/// Underlying connection medium as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionType {
    Wifi,
    Cellular,
    Ethernet,
    Unknown,
    None,
}

/// Normalized connectivity snapshot.
///
/// Recomputed on every platform connectivity event and on manual probe.
/// Transient; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectivityState {
    /// Whether the device reports an active network interface
    pub is_connected: bool,
    /// Whether the internet is reachable, when the platform knows
    pub is_internet_reachable: Option<bool>,
    /// Connection medium
    pub connection_type: ConnectionType,
    /// Connected over a medium considered strong (wifi/ethernet, or
    /// cellular with confirmed reachability)
    pub has_strong_connection: bool,
    /// When this snapshot was computed
    pub last_checked: DateTime<Utc>,
}

impl ConnectivityState {
    /// Normalize raw platform signals into a consistent snapshot.
    ///
    /// Enforces the invariant `has_strong_connection => is_connected`:
    /// strength is recomputed here and never taken from the platform
    /// directly.
    pub fn normalized(
        is_connected: bool,
        is_internet_reachable: Option<bool>,
        connection_type: ConnectionType,
    ) -> Self {
        let reachable = is_internet_reachable.unwrap_or(is_connected);
        let has_strong_connection = is_connected
            && reachable
            && matches!(
                connection_type,
                ConnectionType::Wifi | ConnectionType::Ethernet | ConnectionType::Cellular
            );

        Self {
            is_connected,
            is_internet_reachable,
            connection_type,
            has_strong_connection,
            last_checked: Utc::now(),
        }
    }

    /// Pessimistic offline state, used when platform signals are missing
    /// or malformed.
    pub fn offline() -> Self {
        Self {
            is_connected: false,
            is_internet_reachable: Some(false),
            connection_type: ConnectionType::None,
            has_strong_connection: false,
            last_checked: Utc::now(),
        }
    }

    /// Whether the device is online.
    pub fn is_online(&self) -> bool {
        self.is_connected && self.is_internet_reachable.unwrap_or(true)
    }

    /// Whether the device is offline.
    pub fn is_offline(&self) -> bool {
        !self.is_online()
    }
}

/// A single set of an exercise: weight, reps and free-text notes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseSet {
    /// Weight lifted, in the user's unit
    pub weight: f64,
    /// Repetition count
    pub reps: u32,
    /// Free-text notes ("slow negatives", band color, etc.)
    #[serde(default)]
    pub notes: String,
}

impl ExerciseSet {
    /// Whether this set counts as completed for the end-workout gate.
    ///
    /// A set is meaningful when it has reps, and either carries weight,
    /// belongs to a bodyweight movement, or has notes describing it.
    pub fn is_completed(&self, is_bodyweight: bool) -> bool {
        self.reps > 0 && (self.weight > 0.0 || is_bodyweight || !self.notes.trim().is_empty())
    }
}

/// An exercise within a session: catalog id, name and its ordered sets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    /// Catalog exercise id
    pub id: i64,
    /// Exercise name
    pub name: String,
    /// Ordered sets
    #[serde(default)]
    pub sets: Vec<ExerciseSet>,
}

impl Exercise {
    /// Create an exercise with no sets yet.
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            sets: Vec::new(),
        }
    }
}

/// The current in-progress workout session on this device.
///
/// Created when the first exercise is added; reset on save or discard.
/// `server_workout_id` is set only after a successful create-on-server
/// round trip and means "this local session has a durable server twin".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkoutSession {
    /// Ordered exercises
    pub exercises: Vec<Exercise>,
    /// Session title, at most [`MAX_TITLE_LEN`] characters
    pub title: String,
    /// When the session started
    pub start_time: Option<DateTime<Utc>>,
    /// Whether a session is currently in progress
    pub is_active: bool,
    /// Whether local edits have not yet been confirmed by the server
    pub has_unsaved_changes: bool,
    /// Server-assigned workout id, once the create round trip succeeded
    pub server_workout_id: Option<String>,
}

impl WorkoutSession {
    /// Start a fresh, empty session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the session holds any exercise at all.
    pub fn is_empty(&self) -> bool {
        self.exercises.is_empty()
    }
}

/// Immutable snapshot of a completed workout, plus computed aggregates.
///
/// Append-only: once created, only the title may be edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutHistoryItem {
    /// Client-generated id for this history entry
    pub id: Uuid,
    /// Title at completion time
    pub title: String,
    /// When the workout was completed
    pub completed_at: DateTime<Utc>,
    /// When the workout started, if known
    pub start_time: Option<DateTime<Utc>>,
    /// Server-assigned workout id, when the session had a server twin
    pub server_workout_id: Option<String>,
    /// Exercises as they were at completion
    pub exercises: Vec<Exercise>,
    /// Total number of sets across all exercises
    pub total_sets: usize,
    /// Total repetitions across all sets
    pub total_reps: u64,
    /// Maximum weight per exercise name
    pub max_weights: HashMap<String, f64>,
}

impl WorkoutHistoryItem {
    /// Snapshot a session into an immutable history item, computing the
    /// aggregates.
    pub fn from_session(session: &WorkoutSession) -> Self {
        let total_sets = session.exercises.iter().map(|e| e.sets.len()).sum();
        let total_reps = session
            .exercises
            .iter()
            .flat_map(|e| e.sets.iter())
            .map(|s| u64::from(s.reps))
            .sum();

        let mut max_weights = HashMap::new();
        for exercise in &session.exercises {
            let max = exercise
                .sets
                .iter()
                .map(|s| s.weight)
                .fold(f64::NEG_INFINITY, f64::max);
            if max.is_finite() {
                max_weights.insert(exercise.name.clone(), max);
            }
        }

        Self {
            id: Uuid::new_v4(),
            title: session.title.clone(),
            completed_at: Utc::now(),
            start_time: session.start_time,
            server_workout_id: session.server_workout_id.clone(),
            exercises: session.exercises.clone(),
            total_sets,
            total_reps,
            max_weights,
        }
    }
}

/// Weight unit preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightUnit {
    Kg,
    Lb,
}

/// User preferences, synced to the server profile and persisted locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPreferences {
    /// Display/input unit for weights
    pub unit: WeightUnit,
    /// Default rest timer between sets, in seconds
    pub default_rest_seconds: u32,
    /// Whether haptic feedback is enabled
    pub haptics_enabled: bool,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            unit: WeightUnit::Kg,
            default_rest_seconds: 90,
            haptics_enabled: true,
        }
    }
}

/// An exercise catalog entry as served by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogExercise {
    /// Catalog id
    pub id: i64,
    /// Exercise name
    pub name: String,
    /// Targeted body part
    pub body_part: String,
    /// Required equipment, if any
    #[serde(default)]
    pub equipment: Option<String>,
    /// Whether this is a bodyweight movement
    #[serde(default)]
    pub is_bodyweight: bool,
}
