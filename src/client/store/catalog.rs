//! # Exercise Catalog Store
//!
//! Server-backed exercise catalog with a local cache. Search and filter
//! parameters pass through to the backend; when the network is down,
//! searches fall back to filtering the cached catalog locally. On
//! reconnect, a cache older than the staleness threshold is refreshed
//! so stale reads are not silently served.

use crate::client::classify::classify;
use crate::client::http::ApiClient;
use crate::client::network::{ConnectivityMonitor, STALENESS_THRESHOLD};
use crate::client::persist::{keys, Persistor};
use crate::client::types::CatalogQuery;
use crate::shared::error::ApiError;
use crate::shared::models::CatalogExercise;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Movements recognized as bodyweight by name. A set with no weight
/// still counts as completed when its exercise matches one of these.
const BODYWEIGHT_EXERCISES: &[&str] = &[
    "push up",
    "push-up",
    "pushup",
    "pull up",
    "pull-up",
    "pullup",
    "chin up",
    "chin-up",
    "dip",
    "plank",
    "sit up",
    "sit-up",
    "crunch",
    "leg raise",
    "lunge",
    "burpee",
    "mountain climber",
    "air squat",
    "pistol squat",
    "handstand",
    "muscle up",
    "muscle-up",
    "inverted row",
];

/// Whether an exercise name denotes a bodyweight movement.
pub fn is_bodyweight_name(name: &str) -> bool {
    let lowered = name.to_lowercase();
    BODYWEIGHT_EXERCISES.iter().any(|bw| lowered.contains(bw))
}

/// Cached catalog plus its fetch time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct CatalogCache {
    exercises: Vec<CatalogExercise>,
    fetched_at: Option<DateTime<Utc>>,
}

/// Offline-tolerant view of the backend exercise catalog.
#[derive(Debug)]
pub struct ExerciseCatalog {
    client: Arc<ApiClient>,
    persistor: Option<Arc<Persistor>>,
    cache: RwLock<CatalogCache>,
}

impl ExerciseCatalog {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self {
            client,
            persistor: None,
            cache: RwLock::new(CatalogCache::default()),
        }
    }

    /// Attach local persistence for the catalog cache.
    pub fn with_persistor(mut self, persistor: Arc<Persistor>) -> Self {
        self.persistor = Some(persistor);
        self
    }

    /// Restore the cached catalog from local storage.
    pub async fn hydrate(&self) {
        if let Some(persistor) = &self.persistor {
            if let Some(cache) = persistor.load::<CatalogCache>(keys::EXERCISE_CATALOG).await {
                *self.cache.write().await = cache;
            }
        }
    }

    /// Search the catalog. Query parameters pass through to the server;
    /// a network-classified failure falls back to filtering the local
    /// cache, so the picker keeps working offline.
    pub async fn search(&self, query: &CatalogQuery) -> Result<Vec<CatalogExercise>, ApiError> {
        match self.client.list_exercises(query).await {
            Ok(exercises) => {
                if is_unfiltered(query) {
                    self.update_cache(exercises.clone()).await;
                }
                Ok(exercises)
            }
            Err(e) if classify(Some(&e)).is_network => {
                tracing::debug!("catalog fetch failed on network, serving cache: {}", e.message);
                Ok(self.filter_cached(query).await)
            }
            Err(e) => Err(e),
        }
    }

    /// Look up one exercise, cache-first.
    pub async fn get(&self, id: i64) -> Result<CatalogExercise, ApiError> {
        if let Some(found) = self
            .cache
            .read()
            .await
            .exercises
            .iter()
            .find(|e| e.id == id)
        {
            return Ok(found.clone());
        }
        self.client.get_exercise(id).await
    }

    /// Cached catalog snapshot.
    pub async fn cached(&self) -> Vec<CatalogExercise> {
        self.cache.read().await.exercises.clone()
    }

    /// Whether the cache is older than `threshold` (or was never filled).
    pub async fn is_stale(&self, threshold: std::time::Duration) -> bool {
        let cache = self.cache.read().await;
        match cache.fetched_at {
            Some(fetched_at) => {
                let age = Utc::now() - fetched_at;
                age > ChronoDuration::from_std(threshold).unwrap_or(ChronoDuration::zero())
            }
            None => true,
        }
    }

    /// Refresh the cache if it is stale. Called on reconnect; failures
    /// are logged and left for the next reconnect.
    pub async fn refresh_if_stale(&self) {
        if !self.is_stale(STALENESS_THRESHOLD).await {
            return;
        }
        match self.client.list_exercises(&CatalogQuery::default()).await {
            Ok(exercises) => self.update_cache(exercises).await,
            Err(e) => {
                tracing::debug!("catalog refresh on reconnect failed: {}", e.message);
            }
        }
    }

    /// Spawn a background task that refreshes the stale cache whenever
    /// connectivity returns. Fire-and-forget; the task ends when the
    /// monitor is dropped.
    pub fn spawn_reconnect_listener(
        self: &Arc<Self>,
        monitor: &ConnectivityMonitor,
    ) -> tokio::task::JoinHandle<()> {
        let catalog = Arc::clone(self);
        let mut reconnects = monitor.subscribe_reconnect();
        tokio::spawn(async move {
            while reconnects.recv().await.is_ok() {
                catalog.refresh_if_stale().await;
            }
        })
    }

    async fn update_cache(&self, exercises: Vec<CatalogExercise>) {
        let cache = CatalogCache {
            exercises,
            fetched_at: Some(Utc::now()),
        };
        *self.cache.write().await = cache.clone();

        if let Some(persistor) = &self.persistor {
            persistor.persist(keys::EXERCISE_CATALOG, &cache).await;
        }
    }

    async fn filter_cached(&self, query: &CatalogQuery) -> Vec<CatalogExercise> {
        let cache = self.cache.read().await;
        let mut matches: Vec<CatalogExercise> = cache
            .exercises
            .iter()
            .filter(|e| {
                let search_ok = query
                    .search
                    .as_ref()
                    .map_or(true, |s| e.name.to_lowercase().contains(&s.to_lowercase()));
                let body_ok = query
                    .body_part
                    .as_ref()
                    .map_or(true, |b| e.body_part.eq_ignore_ascii_case(b));
                let equipment_ok = query.equipment.as_ref().map_or(true, |q| {
                    e.equipment
                        .as_deref()
                        .is_some_and(|eq| eq.eq_ignore_ascii_case(q))
                });
                search_ok && body_ok && equipment_ok
            })
            .cloned()
            .collect();

        let offset = query.offset.unwrap_or(0) as usize;
        if offset < matches.len() {
            matches.drain(..offset);
        } else {
            matches.clear();
        }
        if let Some(limit) = query.limit {
            matches.truncate(limit as usize);
        }
        matches
    }
}

fn is_unfiltered(query: &CatalogQuery) -> bool {
    query.search.is_none()
        && query.body_part.is_none()
        && query.equipment.is_none()
        && query.offset.is_none()
}
