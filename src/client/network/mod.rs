//! # Connectivity Monitor
//!
//! Normalizes platform connectivity signals into a consistent
//! online/offline/strength state and exposes a one-shot "is the network
//! currently usable" probe against the backend health endpoint.
//!
//! ## Features
//!
//! - **Connectivity Detection**: online/offline status with medium and
//!   strength, recomputed on every platform event and manual probe
//! - **Subscription**: subscribers receive the current state immediately,
//!   then every transition in detection order
//! - **Reconnect Events**: offline-to-online transitions are broadcast so
//!   stores can replay deferred mutations and invalidate stale caches
//! - **Probe**: short-timeout `GET /health` used to decide whether to
//!   work offline
//!
//! The monitor never errors: malformed or failed platform input maps to
//! a pessimistic offline state.

use crate::client::config::Config;
use crate::shared::models::{ConnectionType, ConnectivityState};
use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::sync::{broadcast, watch};

/// Server-derived data older than this is invalidated when connectivity
/// returns, so stale reads are refreshed rather than silently served.
pub const STALENESS_THRESHOLD: Duration = Duration::from_secs(30);

/// UI-facing connectivity view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkState {
    pub is_online: bool,
    pub is_offline: bool,
    pub connection_type: ConnectionType,
    pub has_strong_connection: bool,
}

impl From<&ConnectivityState> for NetworkState {
    fn from(state: &ConnectivityState) -> Self {
        Self {
            is_online: state.is_online(),
            is_offline: state.is_offline(),
            connection_type: state.connection_type,
            has_strong_connection: state.has_strong_connection,
        }
    }
}

/// Monitors connectivity and publishes normalized state transitions.
#[derive(Debug)]
pub struct ConnectivityMonitor {
    config: Config,
    http: reqwest::Client,
    state_tx: watch::Sender<ConnectivityState>,
    reconnect_tx: broadcast::Sender<DateTime<Utc>>,
}

impl ConnectivityMonitor {
    /// Create a monitor starting from a pessimistic offline state; the
    /// first platform report or probe corrects it.
    pub fn new(config: Config) -> Self {
        let (state_tx, _) = watch::channel(ConnectivityState::offline());
        let (reconnect_tx, _) = broadcast::channel(16);
        Self {
            config,
            http: reqwest::Client::new(),
            state_tx,
            reconnect_tx,
        }
    }

    /// Subscribe to connectivity transitions. The receiver observes the
    /// current state immediately, then every subsequent change.
    pub fn subscribe(&self) -> watch::Receiver<ConnectivityState> {
        self.state_tx.subscribe()
    }

    /// Subscribe to offline-to-online transition events.
    pub fn subscribe_reconnect(&self) -> broadcast::Receiver<DateTime<Utc>> {
        self.reconnect_tx.subscribe()
    }

    /// Current state snapshot.
    pub fn current(&self) -> ConnectivityState {
        self.state_tx.borrow().clone()
    }

    /// Current state as the UI-facing view.
    pub fn network_state(&self) -> NetworkState {
        NetworkState::from(&*self.state_tx.borrow())
    }

    /// Feed a platform connectivity event into the monitor.
    pub fn report(
        &self,
        is_connected: bool,
        is_internet_reachable: Option<bool>,
        connection_type: ConnectionType,
    ) {
        let state =
            ConnectivityState::normalized(is_connected, is_internet_reachable, connection_type);
        self.transition(state);
    }

    /// Record that the platform failed to deliver a usable signal.
    /// Mapped to a pessimistic offline state; never errors.
    pub fn report_failure(&self) {
        self.transition(ConnectivityState::offline());
    }

    /// Probe the backend health endpoint.
    ///
    /// Resolves `true` (work offline) when the request errors, times
    /// out, or returns non-2xx; `false` (online) otherwise. The result
    /// is also fed back into the monitor state.
    pub async fn probe(&self, timeout: Option<Duration>) -> bool {
        let timeout = timeout.unwrap_or_else(|| self.config.probe_timeout());
        let url = self.config.api_url("/health");

        let ok = match self.http.get(&url).timeout(timeout).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::debug!("health probe failed: {e}");
                false
            }
        };

        if ok {
            let previous_type = self.state_tx.borrow().connection_type;
            let medium = if previous_type == ConnectionType::None {
                ConnectionType::Unknown
            } else {
                previous_type
            };
            self.transition(ConnectivityState::normalized(true, Some(true), medium));
        } else {
            self.transition(ConnectivityState::offline());
        }

        !ok
    }

    /// UI-facing alias for [`probe`](Self::probe): should the app skip
    /// server calls right now?
    pub async fn should_work_offline(&self, timeout: Option<Duration>) -> bool {
        self.probe(timeout).await
    }

    fn transition(&self, next: ConnectivityState) {
        let was_offline = self.state_tx.borrow().is_offline();
        let now_online = next.is_online();

        let _ = self.state_tx.send(next);

        if was_offline && now_online {
            tracing::debug!("connectivity restored");
            let _ = self.reconnect_tx.send(Utc::now());
        }
    }
}
