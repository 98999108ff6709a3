//! # Local Persistence Layer
//!
//! Debounced, versioned read/write of client state to on-device SQLite,
//! used both as a fast-path cache and as the offline source of truth.
//!
//! ## Architecture
//!
//! Each persisted concern lives under its own key (current workout,
//! history, preferences, exercise catalog) and is independently
//! debounced: rapid writes within the debounce window coalesce into one
//! write of the latest value. Every key runs an explicit little state
//! machine, `Idle -> Pending -> Writing -> Idle`, so cancellation and
//! flush-on-exit are defined operations rather than incidental timer
//! closures.
//!
//! ## Failure Semantics
//!
//! Persistence failures are logged and swallowed. Losing a write-behind
//! cache entry must never crash the app or block the in-memory state
//! transition that triggered it. Reads return `None` on missing data,
//! version mismatch, or parse failure; callers supply their defaults.

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Schema version stamped on every document. Documents written by an
/// incompatible schema read back as absent.
const SCHEMA_VERSION: i64 = 1;

/// Default debounce window for write-behind persistence.
const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(750);

/// Persisted keys used by the stores.
pub mod keys {
    pub const CURRENT_WORKOUT: &str = "workout.current";
    pub const WORKOUT_HISTORY: &str = "workout.history";
    pub const USER_PREFS: &str = "user.prefs";
    pub const EXERCISE_CATALOG: &str = "exercise.catalog";
}

/// Per-key write state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriteState {
    Idle,
    Pending,
    Writing,
}

#[derive(Debug)]
struct KeyState {
    /// Latest value awaiting a write; newer writes replace it in place
    latest: Option<String>,
    state: WriteState,
}

/// Debounced key/value persistence over SQLite.
#[derive(Debug)]
pub struct Persistor {
    pool: SqlitePool,
    debounce: Duration,
    keys: Mutex<HashMap<String, Arc<Mutex<KeyState>>>>,
}

impl Persistor {
    /// Open the on-device database at the platform data directory.
    pub async fn open() -> Result<Self, sqlx::Error> {
        Self::open_at(&Self::default_db_path()).await
    }

    /// Open a database at an explicit path (used by tests).
    pub async fn open_at(path: &Path) -> Result<Self, sqlx::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;

        Self::from_pool(pool).await
    }

    /// Open an in-memory database (used by tests). Capped to a single
    /// connection so every handle sees the same memory database.
    pub async fn in_memory() -> Result<Self, sqlx::Error> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        Self::from_pool(pool).await
    }

    async fn from_pool(pool: SqlitePool) -> Result<Self, sqlx::Error> {
        sqlx::query("PRAGMA journal_mode=WAL").execute(&pool).await?;
        sqlx::query("PRAGMA synchronous=NORMAL").execute(&pool).await?;
        sqlx::query(include_str!("schema.sql")).execute(&pool).await?;

        Ok(Self {
            pool,
            debounce: DEFAULT_DEBOUNCE,
            keys: Mutex::new(HashMap::new()),
        })
    }

    /// Platform-specific path for the local database file.
    fn default_db_path() -> PathBuf {
        let mut path = dirs::data_dir().unwrap_or_else(std::env::temp_dir);
        path.push("liftlog");
        path.push("local.db");
        path
    }

    /// Override the debounce window.
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Schedule a debounced write of `value` under `key`. Multiple calls
    /// within the window coalesce into one write of the latest value.
    /// Serialization failures are logged and dropped.
    pub async fn persist<T: Serialize>(&self, key: &str, value: &T) {
        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(key, "failed to serialize for persistence: {e}");
                return;
            }
        };

        let entry = self.key_entry(key).await;
        let mut st = entry.lock().await;
        st.latest = Some(json);

        if st.state == WriteState::Idle {
            st.state = WriteState::Pending;
            let pool = self.pool.clone();
            let key = key.to_string();
            let entry = Arc::clone(&entry);
            let debounce = self.debounce;
            tokio::spawn(async move {
                debounced_write(pool, key, entry, debounce).await;
            });
        }
    }

    /// Load and deserialize the value under `key`. Returns `None` on
    /// missing data, schema-version mismatch, or parse failure; the
    /// caller supplies its documented default.
    pub async fn load<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let row: Option<(i64, String)> =
            sqlx::query_as("SELECT version, value FROM documents WHERE key = ?")
                .bind(key)
                .fetch_optional(&self.pool)
                .await
                .unwrap_or_else(|e| {
                    tracing::warn!(key, "failed to load persisted value: {e}");
                    None
                });

        let (version, value) = row?;
        if version != SCHEMA_VERSION {
            tracing::warn!(key, version, "persisted value has incompatible version");
            return None;
        }

        match serde_json::from_str(&value) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                tracing::warn!(key, "failed to parse persisted value: {e}");
                None
            }
        }
    }

    /// Write any pending value for `key` immediately.
    pub async fn flush(&self, key: &str) {
        let entry = self.key_entry(key).await;
        let mut st = entry.lock().await;
        if let Some(json) = st.latest.take() {
            st.state = WriteState::Writing;
            if let Err(e) = write_document(&self.pool, key, &json).await {
                tracing::warn!(key, "flush write failed: {e}");
            }
            st.state = WriteState::Idle;
        }
    }

    /// Flush every key with a pending write. The defined flush-on-exit
    /// operation.
    pub async fn flush_all(&self) {
        let keys: Vec<String> = self.keys.lock().await.keys().cloned().collect();
        for key in keys {
            self.flush(&key).await;
        }
    }

    /// Cancel any pending write for `key` without persisting it.
    pub async fn cancel(&self, key: &str) {
        let entry = self.key_entry(key).await;
        entry.lock().await.latest = None;
    }

    /// Delete the persisted value under `key`.
    pub async fn remove(&self, key: &str) {
        self.cancel(key).await;
        if let Err(e) = sqlx::query("DELETE FROM documents WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
        {
            tracing::warn!(key, "failed to remove persisted value: {e}");
        }
    }

    async fn key_entry(&self, key: &str) -> Arc<Mutex<KeyState>> {
        let mut keys = self.keys.lock().await;
        Arc::clone(keys.entry(key.to_string()).or_insert_with(|| {
            Arc::new(Mutex::new(KeyState {
                latest: None,
                state: WriteState::Idle,
            }))
        }))
    }
}

/// One debounce cycle: sleep, then write whatever is latest. If new
/// values arrive while writing, the lock makes them wait; the next
/// `persist` call observes `Idle` and schedules a fresh cycle.
async fn debounced_write(
    pool: SqlitePool,
    key: String,
    entry: Arc<Mutex<KeyState>>,
    debounce: Duration,
) {
    tokio::time::sleep(debounce).await;

    let mut st = entry.lock().await;
    let Some(json) = st.latest.take() else {
        // Flushed or cancelled while we slept
        st.state = WriteState::Idle;
        return;
    };

    st.state = WriteState::Writing;
    if let Err(e) = write_document(&pool, &key, &json).await {
        tracing::warn!(key, "local persistence write failed: {e}");
    }
    st.state = WriteState::Idle;
}

async fn write_document(pool: &SqlitePool, key: &str, json: &str) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO documents (key, version, value, updated_at) VALUES (?, ?, ?, ?) \
         ON CONFLICT(key) DO UPDATE SET version = excluded.version, \
         value = excluded.value, updated_at = excluded.updated_at",
    )
    .bind(key)
    .bind(SCHEMA_VERSION)
    .bind(json)
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await?;
    Ok(())
}
