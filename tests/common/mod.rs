//! Shared helpers for integration tests
//!
//! Builds clients against a wiremock server, signs in test users and
//! provides sample workout data.

#![allow(dead_code)]

use chrono::{Duration, Utc};
use liftlog::client::auth::AuthToken;
use liftlog::client::{ApiClient, Config};
use liftlog::shared::config::AppConfig;
use liftlog::shared::models::{Exercise, ExerciseSet};
use std::sync::Arc;
use wiremock::MockServer;

/// Client pointed at the given mock server.
pub fn client_for(server: &MockServer) -> Arc<ApiClient> {
    let config = Config::with_builder(AppConfig::builder().dev_url(server.uri()))
        .expect("mock server config");
    Arc::new(ApiClient::new(config))
}

/// Client pointed at an address nothing listens on, so every request
/// fails at the transport layer.
pub fn unreachable_client() -> Arc<ApiClient> {
    let config = Config::with_builder(AppConfig::builder().dev_url("http://127.0.0.1:1"))
        .expect("dead-port config");
    Arc::new(ApiClient::new(config))
}

/// Client pointed at an arbitrary URL.
pub fn client_at(url: &str) -> Arc<ApiClient> {
    let config =
        Config::with_builder(AppConfig::builder().dev_url(url)).expect("explicit url config");
    Arc::new(ApiClient::new(config))
}

/// Put a valid token pair into the client, simulating a signed-in user.
pub async fn sign_in(client: &ApiClient) {
    client
        .tokens()
        .store(AuthToken {
            access_token: "test-access".into(),
            token_type: "bearer".into(),
            expires_at: Utc::now() + Duration::hours(1),
            refresh_token: "test-refresh".into(),
        })
        .await;
}

/// A bench press with one working set.
pub fn bench_press() -> Exercise {
    Exercise {
        id: 1,
        name: "Bench Press".into(),
        sets: vec![ExerciseSet {
            weight: 60.0,
            reps: 8,
            notes: String::new(),
        }],
    }
}

/// An exercise with no sets logged yet.
pub fn empty_exercise() -> Exercise {
    Exercise::new(2, "Overhead Press")
}

/// JSON body for a created workout.
pub fn workout_created_body(id: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "title": "",
        "completed": false,
        "created_at": Utc::now().to_rfc3339(),
    })
}
