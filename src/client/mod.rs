//! # Client Core
//!
//! The offline-first client: configuration, error classification, the
//! authenticated HTTP client, connectivity monitoring, the sync queue,
//! local persistence, and the data stores that tie them together.
//!
//! ## Architecture
//!
//! Control flow for a mutation: UI action -> store decides the
//! online/offline path -> [`ApiClient`] attempts the request ->
//! [`classify`] routes the failure -> on success the server response is
//! merged into the store and mirrored to persistence; on a network
//! failure local state stays authoritative and the mutation is queued
//! for the next reconnect event raised by [`ConnectivityMonitor`].

pub mod auth;
pub mod classify;
pub mod config;
pub mod http;
pub mod network;
pub mod offline;
pub mod persist;
pub mod store;
pub mod types;

pub use auth::{AuthState, AuthToken, TokenStore};
pub use classify::{classify, is_network_error, Classification};
pub use config::Config;
pub use http::ApiClient;
pub use network::{ConnectivityMonitor, NetworkState, STALENESS_THRESHOLD};
pub use offline::{SyncOperation, SyncQueue, SyncQueueEntry, SyncState};
pub use persist::Persistor;
