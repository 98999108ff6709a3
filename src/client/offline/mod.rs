//! # Offline Sync Queue
//!
//! Tracks mutations whose server counterpart has not yet been confirmed.
//! An entry is created when an online mutation attempt fails with a
//! network-classified error, and cleared when a later attempt succeeds
//! or the user discards the session.
//!
//! ## Retry Policy
//!
//! Deferred entries are replayed exactly once per reconnect event (or
//! explicit save attempt). A repeated failure re-queues the entry with
//! its last error rather than entering an unbounded retry loop; entries
//! are never dropped silently.

use crate::shared::error::ApiError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Per-session synchronization state machine.
///
/// `LocalOnly -> ServerPending -> ServerConfirmed` is the success path;
/// a network failure drops `ServerPending` to `SyncFailed`, which is
/// treated as local-only with a deferred-sync marker until the next
/// reconnect or explicit save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncState {
    /// No server twin exists or is being created
    LocalOnly,
    /// A server call for this session is in flight
    ServerPending,
    /// The server confirmed the latest local state
    ServerConfirmed,
    /// The last server call failed on the network; sync is deferred
    SyncFailed,
}

/// The kind of deferred mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncOperation {
    /// Create the workout on the server
    Create,
    /// Push the current session state to the existing server twin
    Update,
    /// Mark the workout completed on the server
    Complete,
}

/// A mutation awaiting server confirmation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncQueueEntry {
    /// Entry id
    pub id: Uuid,
    /// What to replay
    pub operation: SyncOperation,
    /// Serialized request payload captured at mutation time
    pub payload: serde_json::Value,
    /// When the entry was queued
    pub queued_at: DateTime<Utc>,
    /// When a replay was last attempted
    pub attempted_at: Option<DateTime<Utc>>,
    /// Error from the last failed attempt
    pub last_error: Option<ApiError>,
}

/// Queue of mutations deferred by network failures.
#[derive(Debug, Default)]
pub struct SyncQueue {
    entries: RwLock<VecDeque<SyncQueueEntry>>,
}

impl SyncQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a deferred mutation. An existing entry for the same
    /// operation is replaced: the later payload supersedes it, so a
    /// reconnect replays only the newest state for each operation.
    pub async fn enqueue(
        &self,
        operation: SyncOperation,
        payload: serde_json::Value,
        last_error: Option<ApiError>,
    ) -> Uuid {
        let entry = SyncQueueEntry {
            id: Uuid::new_v4(),
            operation,
            payload,
            queued_at: Utc::now(),
            attempted_at: None,
            last_error,
        };
        let id = entry.id;

        let mut entries = self.entries.write().await;
        entries.retain(|e| e.operation != operation);
        entries.push_back(entry);
        id
    }

    /// Drain every entry for a replay pass, stamping the attempt time.
    /// Entries that fail again must be re-queued with [`requeue`].
    ///
    /// [`requeue`]: Self::requeue
    pub async fn take_for_replay(&self) -> Vec<SyncQueueEntry> {
        let mut entries = self.entries.write().await;
        let now = Utc::now();
        entries
            .drain(..)
            .map(|mut e| {
                e.attempted_at = Some(now);
                e
            })
            .collect()
    }

    /// Put a failed entry back, recording the error. It stays pending
    /// for the next reconnect; no further retry happens this pass.
    pub async fn requeue(&self, mut entry: SyncQueueEntry, error: ApiError) {
        entry.last_error = Some(error);
        let mut entries = self.entries.write().await;
        entries.retain(|e| e.operation != entry.operation);
        entries.push_back(entry);
    }

    /// Number of pending entries.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Snapshot of pending entries, for UI inspection of chronically
    /// unsynced state.
    pub async fn entries(&self) -> Vec<SyncQueueEntry> {
        self.entries.read().await.iter().cloned().collect()
    }

    /// Drop every pending entry (session discarded).
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }
}
