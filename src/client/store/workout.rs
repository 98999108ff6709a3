//! # Workout Store
//!
//! The offline-aware sync orchestrator. Every state-changing user
//! action succeeds locally first; server calls are attempted for
//! signed-in users and their failures are routed through the error
//! classifier:
//!
//! - network failure: keep the optimistic local state silently, queue a
//!   deferred entry, and proceed as if the mutation succeeded
//! - anything else: surface a titled error and do not pretend success
//!
//! Deferred entries are replayed exactly once per reconnect event or
//! explicit save attempt. Guest sessions never touch the server, and a
//! guest save discards the session instead of recording history.
//!
//! Per-mutation state machine: `LocalOnly -> ServerPending ->
//! ServerConfirmed`, with `ServerPending -> SyncFailed` on network
//! failure re-entering the local-only path with a deferred-sync marker.

use crate::client::classify::classify;
use crate::client::http::ApiClient;
use crate::client::network::ConnectivityMonitor;
use crate::client::offline::{SyncOperation, SyncQueue, SyncQueueEntry, SyncState};
use crate::client::persist::{keys, Persistor};
use crate::client::store::catalog::is_bodyweight_name;
use crate::client::store::history::HistoryStore;
use crate::client::types::WorkoutPayload;
use crate::shared::error::{ApiError, StoreError};
use crate::shared::models::{
    Exercise, ExerciseSet, WorkoutHistoryItem, WorkoutSession, MAX_TITLE_LEN,
};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::RwLock;

/// The active workout session and its sync orchestration.
#[derive(Debug)]
pub struct WorkoutStore {
    client: Arc<ApiClient>,
    session: RwLock<WorkoutSession>,
    sync_state: RwLock<SyncState>,
    queue: SyncQueue,
    persistor: Option<Arc<Persistor>>,
    history: Option<Arc<HistoryStore>>,
    error: RwLock<Option<StoreError>>,
}

impl WorkoutStore {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self {
            client,
            session: RwLock::new(WorkoutSession::new()),
            sync_state: RwLock::new(SyncState::LocalOnly),
            queue: SyncQueue::new(),
            persistor: None,
            history: None,
            error: RwLock::new(None),
        }
    }

    /// Attach local persistence for the in-progress session.
    pub fn with_persistor(mut self, persistor: Arc<Persistor>) -> Self {
        self.persistor = Some(persistor);
        self
    }

    /// Attach the history store that receives completed workouts.
    pub fn with_history(mut self, history: Arc<HistoryStore>) -> Self {
        self.history = Some(history);
        self
    }

    /// Restore an interrupted session from local storage.
    pub async fn hydrate(&self) {
        if let Some(persistor) = &self.persistor {
            if let Some(session) = persistor.load::<WorkoutSession>(keys::CURRENT_WORKOUT).await {
                if session.is_active {
                    *self.session.write().await = session;
                }
            }
        }
    }

    /// Snapshot of the current session.
    pub async fn session(&self) -> WorkoutSession {
        self.session.read().await.clone()
    }

    /// Current sync state of the session.
    pub async fn sync_state(&self) -> SyncState {
        *self.sync_state.read().await
    }

    /// Last surfaced error, if any.
    pub async fn error(&self) -> Option<StoreError> {
        self.error.read().await.clone()
    }

    pub async fn clear_error(&self) {
        *self.error.write().await = None;
    }

    /// Number of mutations awaiting server confirmation.
    pub async fn pending_sync_count(&self) -> usize {
        self.queue.len().await
    }

    /// Pending deferred mutations, for UI inspection.
    pub async fn pending_entries(&self) -> Vec<SyncQueueEntry> {
        self.queue.entries().await
    }

    /// Add picked exercises to the session, starting it if necessary.
    /// Exercises are copied out of the picker selection; edits to the
    /// session never touch the catalog.
    ///
    /// For signed-in users the session is created or synced on the
    /// server; a network failure is silent and the local session stays
    /// authoritative.
    pub async fn add_exercises(&self, picked: Vec<Exercise>) -> Result<(), StoreError> {
        self.clear_error().await;
        {
            let mut session = self.session.write().await;
            if !session.is_active {
                session.is_active = true;
                session.start_time = Some(Utc::now());
            }
            session.exercises.extend(picked);
            session.has_unsaved_changes = true;
        }
        self.persist_session().await;

        if !self.client.tokens().is_authenticated().await {
            // Guest sessions stay local; no server call is attempted
            return Ok(());
        }

        let has_twin = self.session.read().await.server_workout_id.is_some();
        if has_twin {
            self.sync_workout_to_server().await
        } else {
            self.create_workout_on_server().await
        }
    }

    /// Set the session title. Titles beyond the cap are rejected, not
    /// truncated; the stored title is left unchanged.
    pub async fn set_title(&self, title: &str) -> Result<(), StoreError> {
        if title.chars().count() > MAX_TITLE_LEN {
            return Err(StoreError::new(
                "Invalid Title",
                format!("Titles are limited to {MAX_TITLE_LEN} characters."),
            ));
        }

        {
            let mut session = self.session.write().await;
            session.title = title.to_string();
            session.has_unsaved_changes = true;
        }
        self.persist_session().await;
        Ok(())
    }

    /// Replace the sets of one exercise in the session.
    pub async fn update_exercise_sets(
        &self,
        exercise_id: i64,
        sets: Vec<ExerciseSet>,
    ) -> Result<(), StoreError> {
        self.clear_error().await;
        {
            let mut session = self.session.write().await;
            let Some(exercise) = session.exercises.iter_mut().find(|e| e.id == exercise_id)
            else {
                return Err(StoreError::new(
                    "Error Updating Sets",
                    "Exercise not found in the current workout.",
                ));
            };
            exercise.sets = sets;
            session.has_unsaved_changes = true;
        }
        self.persist_session().await;

        if !self.client.tokens().is_authenticated().await {
            return Ok(());
        }
        if self.session.read().await.server_workout_id.is_some() {
            self.sync_workout_to_server().await
        } else {
            Ok(())
        }
    }

    /// Remove every exercise from the session. Idempotent: calling this
    /// twice leaves the same empty-session state as calling it once.
    pub async fn clear_all_exercises(&self) {
        {
            let mut session = self.session.write().await;
            session.exercises.clear();
            session.has_unsaved_changes = true;
        }
        self.persist_session().await;
    }

    /// Create the session's server twin.
    ///
    /// On success the server-assigned id is adopted into local state.
    /// A network-classified failure silently defers the create; other
    /// failures surface as "Error Creating Workout".
    pub async fn create_workout_on_server(&self) -> Result<(), StoreError> {
        if !self.client.tokens().is_authenticated().await {
            return Ok(());
        }

        let payload = WorkoutPayload::from_session(&self.session().await, false);
        *self.sync_state.write().await = SyncState::ServerPending;

        match self.client.create_workout(&payload).await {
            Ok(response) => {
                {
                    let mut session = self.session.write().await;
                    session.server_workout_id = Some(response.id);
                    session.has_unsaved_changes = false;
                }
                *self.sync_state.write().await = SyncState::ServerConfirmed;
                self.persist_session().await;
                Ok(())
            }
            Err(e) => self.route_failure(SyncOperation::Create, payload_value(&payload), e, "Error Creating Workout").await,
        }
    }

    /// Push the current session state to the existing server twin.
    /// Falls back to a create when no twin exists yet.
    pub async fn sync_workout_to_server(&self) -> Result<(), StoreError> {
        if !self.client.tokens().is_authenticated().await {
            return Ok(());
        }

        let session = self.session().await;
        let Some(workout_id) = session.server_workout_id.clone() else {
            return self.create_workout_on_server().await;
        };

        let payload = WorkoutPayload::from_session(&session, false);
        *self.sync_state.write().await = SyncState::ServerPending;

        match self.client.update_workout(&workout_id, &payload).await {
            Ok(_) => {
                self.session.write().await.has_unsaved_changes = false;
                *self.sync_state.write().await = SyncState::ServerConfirmed;
                self.persist_session().await;
                Ok(())
            }
            Err(e) => {
                self.route_failure(
                    SyncOperation::Update,
                    update_value(&workout_id, &payload),
                    e,
                    "Error Saving Workout",
                )
                .await
            }
        }
    }

    /// End the current workout.
    ///
    /// The session may only be ended when at least one exercise has a
    /// completed set: `reps > 0` and either weight, a recognized
    /// bodyweight movement, or notes. Otherwise the store error is set
    /// and the workout stays active.
    pub async fn end_workout(&self) -> Result<Option<WorkoutHistoryItem>, StoreError> {
        self.clear_error().await;

        let session = self.session().await;
        if !has_completed_sets(&session) {
            let err = StoreError::new(
                "Cannot End Workout",
                "No exercises with completed sets. Log at least one set before finishing.",
            );
            *self.error.write().await = Some(err.clone());
            return Err(err);
        }

        if self.client.tokens().is_authenticated().await {
            self.complete_on_server(&session).await?;
        }

        self.save_workout().await
    }

    /// Snapshot the session into history and reset it.
    ///
    /// For guests the session is discarded instead: nothing is recorded
    /// and `None` is returned.
    pub async fn save_workout(&self) -> Result<Option<WorkoutHistoryItem>, StoreError> {
        if !self.client.tokens().is_authenticated().await {
            self.reset_session().await;
            self.queue.clear().await;
            return Ok(None);
        }

        let item = WorkoutHistoryItem::from_session(&self.session().await);
        if let Some(history) = &self.history {
            history.append(item.clone()).await;
        }
        self.reset_session().await;
        Ok(Some(item))
    }

    /// Discard the current session without recording history. Pending
    /// sync entries for it are dropped. Returns the would-be snapshot
    /// so a caller can offer an export before it is gone.
    pub async fn discard_workout(&self) -> Option<WorkoutHistoryItem> {
        let session = self.session().await;
        let snapshot = if session.is_active {
            Some(WorkoutHistoryItem::from_session(&session))
        } else {
            None
        };

        self.queue.clear().await;
        self.reset_session().await;
        snapshot
    }

    /// Rebuild an active session from a history item. The exercises are
    /// copied; the reconstructed session is a new local workout with no
    /// server twin.
    pub async fn load_workout_from_history(&self, item: &WorkoutHistoryItem) {
        {
            let mut session = self.session.write().await;
            *session = WorkoutSession {
                exercises: item.exercises.clone(),
                title: item.title.clone(),
                start_time: Some(Utc::now()),
                is_active: true,
                has_unsaved_changes: true,
                server_workout_id: None,
            };
        }
        *self.sync_state.write().await = SyncState::LocalOnly;
        self.persist_session().await;
    }

    /// Replay every deferred mutation exactly once. Called on reconnect
    /// and before explicit saves; entries that fail again stay queued
    /// for the next event. Returns the number of confirmed entries.
    pub async fn replay_deferred(&self) -> usize {
        if !self.client.tokens().is_authenticated().await {
            return 0;
        }

        let entries = self.queue.take_for_replay().await;
        let mut confirmed = 0;

        for entry in entries {
            match self.replay_entry(&entry).await {
                Ok(()) => {
                    confirmed += 1;
                }
                Err(e) => {
                    tracing::debug!(
                        operation = ?entry.operation,
                        "deferred sync replay failed: {}",
                        e.message
                    );
                    self.queue.requeue(entry, e).await;
                }
            }
        }

        if confirmed > 0 && self.queue.is_empty().await {
            *self.sync_state.write().await = SyncState::ServerConfirmed;
        }
        confirmed
    }

    /// Spawn a background task replaying deferred mutations whenever
    /// connectivity returns. Fire-and-forget: it may confirm entries
    /// after the triggering UI is gone.
    pub fn spawn_reconnect_listener(
        self: &Arc<Self>,
        monitor: &ConnectivityMonitor,
    ) -> tokio::task::JoinHandle<()> {
        let store = Arc::clone(self);
        let mut reconnects = monitor.subscribe_reconnect();
        tokio::spawn(async move {
            while reconnects.recv().await.is_ok() {
                let replayed = store.replay_deferred().await;
                if replayed > 0 {
                    tracing::debug!(replayed, "deferred workout sync confirmed on reconnect");
                }
            }
        })
    }

    async fn replay_entry(&self, entry: &SyncQueueEntry) -> Result<(), ApiError> {
        match entry.operation {
            SyncOperation::Create => {
                let payload: WorkoutPayload = serde_json::from_value(entry.payload.clone())?;
                let response = self.client.create_workout(&payload).await?;
                let mut session = self.session.write().await;
                if session.is_active && session.server_workout_id.is_none() {
                    session.server_workout_id = Some(response.id);
                    session.has_unsaved_changes = false;
                }
                Ok(())
            }
            SyncOperation::Update | SyncOperation::Complete => {
                let workout_id = entry.payload["workout_id"]
                    .as_str()
                    .ok_or_else(|| ApiError::unknown("Deferred entry missing workout id"))?
                    .to_string();
                let payload: WorkoutPayload =
                    serde_json::from_value(entry.payload["workout"].clone())?;
                self.client.update_workout(&workout_id, &payload).await?;
                Ok(())
            }
        }
    }

    /// Mark the workout completed on the server, deferring on network
    /// failure. When the session has no twin yet (create itself is
    /// deferred), the completed payload supersedes the queued create so
    /// a single replay creates the finished workout.
    async fn complete_on_server(&self, session: &WorkoutSession) -> Result<(), StoreError> {
        let payload = WorkoutPayload::from_session(session, true);

        match &session.server_workout_id {
            Some(workout_id) => {
                *self.sync_state.write().await = SyncState::ServerPending;
                match self.client.update_workout(workout_id, &payload).await {
                    Ok(_) => {
                        *self.sync_state.write().await = SyncState::ServerConfirmed;
                        Ok(())
                    }
                    Err(e) => {
                        self.route_failure(
                            SyncOperation::Complete,
                            update_value(workout_id, &payload),
                            e,
                            "Error Saving Workout",
                        )
                        .await
                    }
                }
            }
            None => {
                *self.sync_state.write().await = SyncState::ServerPending;
                match self.client.create_workout(&payload).await {
                    Ok(_) => {
                        *self.sync_state.write().await = SyncState::ServerConfirmed;
                        Ok(())
                    }
                    Err(e) => {
                        self.route_failure(
                            SyncOperation::Create,
                            payload_value(&payload),
                            e,
                            "Error Saving Workout",
                        )
                        .await
                    }
                }
            }
        }
    }

    /// The single routing point for failed server mutations: network
    /// failures defer silently, everything else surfaces.
    async fn route_failure(
        &self,
        operation: SyncOperation,
        payload: serde_json::Value,
        error: ApiError,
        title: &str,
    ) -> Result<(), StoreError> {
        if classify(Some(&error)).is_network {
            *self.sync_state.write().await = SyncState::SyncFailed;
            self.queue.enqueue(operation, payload, Some(error)).await;
            tracing::debug!(?operation, "server sync deferred (offline)");
            Ok(())
        } else {
            *self.sync_state.write().await = SyncState::LocalOnly;
            let store_err = StoreError::from_api(title, &error);
            *self.error.write().await = Some(store_err.clone());
            Err(store_err)
        }
    }

    async fn reset_session(&self) {
        *self.session.write().await = WorkoutSession::new();
        *self.sync_state.write().await = SyncState::LocalOnly;
        if let Some(persistor) = &self.persistor {
            persistor.remove(keys::CURRENT_WORKOUT).await;
        }
    }

    async fn persist_session(&self) {
        if let Some(persistor) = &self.persistor {
            let session = self.session.read().await.clone();
            persistor.persist(keys::CURRENT_WORKOUT, &session).await;
        }
    }
}

/// Whether any exercise has a set that passes the completion gate.
fn has_completed_sets(session: &WorkoutSession) -> bool {
    session.exercises.iter().any(|exercise| {
        let bodyweight = is_bodyweight_name(&exercise.name);
        exercise.sets.iter().any(|set| set.is_completed(bodyweight))
    })
}

fn payload_value(payload: &WorkoutPayload) -> serde_json::Value {
    serde_json::to_value(payload).unwrap_or_else(|_| json!({}))
}

fn update_value(workout_id: &str, payload: &WorkoutPayload) -> serde_json::Value {
    json!({ "workout_id": workout_id, "workout": payload })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::config::Config;
    use crate::shared::config::AppConfig;

    fn guest_store() -> WorkoutStore {
        // Port 1 is never serving; any accidental server call fails fast
        let config = Config::with_builder(AppConfig::builder().dev_url("http://127.0.0.1:1"))
            .expect("test config");
        WorkoutStore::new(Arc::new(ApiClient::new(config)))
    }

    fn bench_press_session() -> Vec<Exercise> {
        vec![Exercise {
            id: 1,
            name: "Bench Press".into(),
            sets: vec![ExerciseSet {
                weight: 60.0,
                reps: 8,
                notes: String::new(),
            }],
        }]
    }

    #[tokio::test]
    async fn test_add_exercises_starts_session() {
        let store = guest_store();
        store.add_exercises(bench_press_session()).await.unwrap();

        let session = store.session().await;
        assert!(session.is_active);
        assert!(session.start_time.is_some());
        assert_eq!(session.exercises.len(), 1);
        assert!(session.has_unsaved_changes);
        assert!(session.server_workout_id.is_none());
    }

    #[tokio::test]
    async fn test_title_cap_rejects_not_truncates() {
        let store = guest_store();
        store.set_title("Push day").await.unwrap();

        let long = "y".repeat(MAX_TITLE_LEN + 5);
        let result = store.set_title(&long).await;
        assert!(result.is_err());
        assert_eq!(store.session().await.title, "Push day");

        let exactly = "z".repeat(MAX_TITLE_LEN);
        store.set_title(&exactly).await.unwrap();
        assert_eq!(store.session().await.title, exactly);
    }

    #[tokio::test]
    async fn test_clear_all_exercises_is_idempotent() {
        let store = guest_store();
        store.add_exercises(bench_press_session()).await.unwrap();

        store.clear_all_exercises().await;
        let once = store.session().await;
        store.clear_all_exercises().await;
        let twice = store.session().await;

        assert!(once.exercises.is_empty());
        assert_eq!(once, twice);
    }

    #[tokio::test]
    async fn test_end_workout_requires_completed_sets() {
        let store = guest_store();
        store
            .add_exercises(vec![Exercise::new(1, "Bench Press")])
            .await
            .unwrap();

        let result = store.end_workout().await;
        assert!(result.is_err());

        let error = store.error().await.expect("error surfaced");
        assert!(error.message.contains("No exercises with completed sets"));
        assert!(store.session().await.is_active);
    }

    #[tokio::test]
    async fn test_end_workout_accepts_bodyweight_by_name() {
        let store = guest_store();
        store
            .add_exercises(vec![Exercise {
                id: 9,
                name: "Push Up".into(),
                sets: vec![ExerciseSet {
                    weight: 0.0,
                    reps: 15,
                    notes: String::new(),
                }],
            }])
            .await
            .unwrap();

        // Guest save discards: no history item comes back
        let saved = store.end_workout().await.unwrap();
        assert!(saved.is_none());
        assert!(!store.session().await.is_active);
    }

    #[tokio::test]
    async fn test_guest_save_discards_session() {
        let store = guest_store();
        store.add_exercises(bench_press_session()).await.unwrap();

        let saved = store.save_workout().await.unwrap();
        assert!(saved.is_none());
        assert!(store.session().await.is_empty());
        assert_eq!(store.pending_sync_count().await, 0);
    }

    #[tokio::test]
    async fn test_discard_returns_snapshot() {
        let store = guest_store();
        store.add_exercises(bench_press_session()).await.unwrap();
        store.set_title("Doomed").await.unwrap();

        let snapshot = store.discard_workout().await.expect("snapshot");
        assert_eq!(snapshot.title, "Doomed");
        assert!(store.session().await.is_empty());

        // Discarding an inactive session yields nothing
        assert!(store.discard_workout().await.is_none());
    }

    #[tokio::test]
    async fn test_load_workout_from_history_reconstructs() {
        let store = guest_store();
        store.add_exercises(bench_press_session()).await.unwrap();
        store.set_title("Rerun me").await.unwrap();

        let item = WorkoutHistoryItem::from_session(&store.session().await);
        store.discard_workout().await;

        store.load_workout_from_history(&item).await;
        let session = store.session().await;
        assert!(session.is_active);
        assert_eq!(session.title, "Rerun me");
        assert_eq!(session.exercises.len(), 1);
        assert_eq!(session.exercises[0].name, "Bench Press");
        assert_eq!(session.exercises[0].sets[0].reps, 8);
        assert!(session.server_workout_id.is_none());
    }

    #[tokio::test]
    async fn test_update_sets_unknown_exercise_errors() {
        let store = guest_store();
        store.add_exercises(bench_press_session()).await.unwrap();

        let result = store
            .update_exercise_sets(
                999,
                vec![ExerciseSet {
                    weight: 1.0,
                    reps: 1,
                    notes: String::new(),
                }],
            )
            .await;
        assert!(result.is_err());
    }
}
