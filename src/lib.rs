//! LiftLog - Client Core Library
//!
//! LiftLog is the offline-first client core for a workout tracker. It
//! implements the synchronization and network-resilience layer that a UI
//! (out of scope for this crate) drives through a small typed interface:
//! connectivity monitoring, error classification, an authenticated HTTP
//! client with token lifecycle, offline-aware data stores, and debounced
//! local persistence.
//!
//! # Overview
//!
//! This library provides the core functionality for the LiftLog client,
//! including:
//! - Connectivity monitoring with a one-shot "is the network usable" probe
//! - Error classification into network / auth / application failures
//! - Authenticated HTTP client with bearer-token refresh
//! - Offline-first workout, history, catalog and preference stores
//! - Debounced, versioned local persistence over SQLite
//!
//! # Module Structure
//!
//! The library is organized into two main modules:
//!
//! - **`shared`** - Types shared across the client
//!   - Domain models (sessions, exercises, history snapshots)
//!   - Error types
//!   - Base application configuration
//!
//! - **`client`** - The client core
//!   - HTTP client and auth flows
//!   - Connectivity monitor
//!   - Error classifier
//!   - Offline sync queue and data stores
//!   - Local persistence
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use liftlog::client::{ApiClient, Config};
//! use liftlog::client::store::WorkoutStore;
//!
//! # async fn example() {
//! let config = Config::new();
//! let client = Arc::new(ApiClient::new(config));
//! let store = WorkoutStore::new(client);
//!
//! let _ = store.add_exercises(vec![]).await;
//! # }
//! ```
//!
//! # Offline-First Behavior
//!
//! Every state-changing user action succeeds locally first. Server calls
//! are attempted when a token is present; failures classified as network
//! problems are suppressed and replayed once per reconnect, while
//! validation and server errors always surface to the caller. Guest
//! sessions never touch the server.
//!
//! # Thread Safety
//!
//! All stores use `Arc<tokio::sync::RwLock<_>>` internally and are safe
//! to share across tasks. Mutations follow a single-writer convention:
//! UI actions are user-paced, and rapid successive edits resolve
//! last-write-wins through debounced persistence.

/// Shared types and data structures
pub mod shared;

/// Client core: HTTP, connectivity, offline stores, persistence
pub mod client;
