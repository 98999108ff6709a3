//! # Preferences Store
//!
//! Local-first user preferences, mirrored to the server profile when a
//! user is signed in. Network failures during sync are silent: the
//! local value is authoritative and the next successful profile update
//! carries it.

use crate::client::classify::classify;
use crate::client::http::ApiClient;
use crate::client::persist::{keys, Persistor};
use crate::shared::error::StoreError;
use crate::shared::models::UserPreferences;
use std::sync::Arc;
use tokio::sync::RwLock;

/// User preference store with profile sync.
#[derive(Debug)]
pub struct PreferencesStore {
    client: Arc<ApiClient>,
    persistor: Option<Arc<Persistor>>,
    prefs: RwLock<UserPreferences>,
}

impl PreferencesStore {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self {
            client,
            persistor: None,
            prefs: RwLock::new(UserPreferences::default()),
        }
    }

    /// Attach local persistence for preferences.
    pub fn with_persistor(mut self, persistor: Arc<Persistor>) -> Self {
        self.persistor = Some(persistor);
        self
    }

    /// Restore preferences from local storage; defaults when absent.
    pub async fn hydrate(&self) {
        if let Some(persistor) = &self.persistor {
            if let Some(prefs) = persistor.load::<UserPreferences>(keys::USER_PREFS).await {
                *self.prefs.write().await = prefs;
            }
        }
    }

    /// Current preferences snapshot.
    pub async fn get(&self) -> UserPreferences {
        self.prefs.read().await.clone()
    }

    /// Update preferences: local state and persistence always succeed;
    /// the profile sync is attempted for signed-in users and a
    /// network-classified failure is swallowed.
    pub async fn update(&self, prefs: UserPreferences) -> Result<(), StoreError> {
        *self.prefs.write().await = prefs.clone();
        if let Some(persistor) = &self.persistor {
            persistor.persist(keys::USER_PREFS, &prefs).await;
        }

        if !self.client.tokens().is_authenticated().await {
            return Ok(());
        }

        match self.client.update_profile(&prefs).await {
            Ok(()) => Ok(()),
            Err(e) if classify(Some(&e)).is_network => {
                tracing::debug!("profile sync deferred (offline): {}", e.message);
                Ok(())
            }
            Err(e) => Err(StoreError::from_api("Error Saving Preferences", &e)),
        }
    }
}
