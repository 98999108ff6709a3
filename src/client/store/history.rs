//! # Workout History Store
//!
//! Append-only list of completed workout snapshots. Items are immutable
//! once recorded except for their titles; aggregates are computed at
//! snapshot time by [`WorkoutHistoryItem::from_session`].

use crate::client::persist::{keys, Persistor};
use crate::shared::error::StoreError;
use crate::shared::models::{WorkoutHistoryItem, MAX_TITLE_LEN};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Store of completed workouts, newest first.
#[derive(Debug, Default)]
pub struct HistoryStore {
    items: RwLock<Vec<WorkoutHistoryItem>>,
    persistor: Option<Arc<Persistor>>,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach local persistence for the history list.
    pub fn with_persistor(mut self, persistor: Arc<Persistor>) -> Self {
        self.persistor = Some(persistor);
        self
    }

    /// Restore history from local storage.
    pub async fn hydrate(&self) {
        if let Some(persistor) = &self.persistor {
            if let Some(items) = persistor
                .load::<Vec<WorkoutHistoryItem>>(keys::WORKOUT_HISTORY)
                .await
            {
                *self.items.write().await = items;
            }
        }
    }

    /// Record a completed workout.
    pub async fn append(&self, item: WorkoutHistoryItem) {
        {
            let mut items = self.items.write().await;
            items.insert(0, item);
        }
        self.persist().await;
    }

    /// Snapshot of all history items, newest first.
    pub async fn items(&self) -> Vec<WorkoutHistoryItem> {
        self.items.read().await.clone()
    }

    /// Look up one history item.
    pub async fn item(&self, id: Uuid) -> Option<WorkoutHistoryItem> {
        self.items.read().await.iter().find(|i| i.id == id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }

    /// Edit a history item's title. The only mutation history allows;
    /// titles over the cap are rejected, not truncated.
    pub async fn update_title(&self, id: Uuid, title: &str) -> Result<(), StoreError> {
        if title.chars().count() > MAX_TITLE_LEN {
            return Err(StoreError::new(
                "Invalid Title",
                format!("Titles are limited to {MAX_TITLE_LEN} characters."),
            ));
        }

        {
            let mut items = self.items.write().await;
            let Some(item) = items.iter_mut().find(|i| i.id == id) else {
                return Err(StoreError::new("Workout Not Found", "This workout no longer exists."));
            };
            item.title = title.to_string();
        }
        self.persist().await;
        Ok(())
    }

    async fn persist(&self) {
        if let Some(persistor) = &self.persistor {
            let items = self.items.read().await.clone();
            persistor.persist(keys::WORKOUT_HISTORY, &items).await;
        }
    }
}
