//! # HTTP Client with Token Lifecycle
//!
//! Issues authenticated requests against the LiftLog backend, attaching
//! and refreshing bearer tokens, and mapping every failure to a typed
//! [`ApiError`]. Raw transport errors never escape this module.
//!
//! ## Policies
//!
//! - **Base URL**: resolved once per client from [`Config`].
//! - **Auth**: `Authorization: Bearer` is attached unless the endpoint
//!   is in the public table. A missing token on a non-public endpoint
//!   fails before any request is sent.
//! - **401**: at most one token refresh per request (single-flight
//!   across concurrent requests), then exactly one retry. A failed
//!   refresh clears all tokens and signals sign-out.
//! - **5xx on mutations**: one bounded retry with exponential backoff
//!   (1s base, 30s cap). Network failures are never auto-retried here;
//!   that is the sync orchestrator's job, to avoid duplicate writes.

use crate::client::auth::{AuthToken, TokenStore};
use crate::client::config::Config;
use crate::client::types::{
    AuthResponse, CatalogQuery, ErrorBody, RefreshRequest, WorkoutPayload, WorkoutResponse,
};
use crate::shared::error::ApiError;
use crate::shared::models::{CatalogExercise, UserPreferences};
use reqwest::{Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Endpoints that are attempted without a bearer token.
const PUBLIC_PATHS: &[&str] = &["/health", "/auth/login", "/auth/google", "/auth/refresh"];

/// Base delay for the bounded server-error retry
const RETRY_BASE: Duration = Duration::from_secs(1);

/// Cap for the server-error retry backoff
const RETRY_CAP: Duration = Duration::from_secs(30);

/// Authenticated HTTP client for the LiftLog backend.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    config: Config,
    tokens: Arc<TokenStore>,
}

impl ApiClient {
    pub fn new(config: Config) -> Self {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .expect("HTTP client construction with static settings");

        Self {
            http,
            config,
            tokens: Arc::new(TokenStore::new()),
        }
    }

    /// The token store backing this client.
    pub fn tokens(&self) -> &Arc<TokenStore> {
        &self.tokens
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Issue a request and deserialize the JSON response.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<T, ApiError> {
        let response = self.send_with_policies(&method, path, body.as_ref()).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::unknown(format!("Failed to parse response: {e}")))
    }

    /// Issue a request, discarding any response body (204-style endpoints).
    pub async fn request_no_content(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<(), ApiError> {
        self.send_with_policies(&method, path, body.as_ref()).await?;
        Ok(())
    }

    /// Apply the 401-refresh and 5xx-retry policies around a send.
    async fn send_with_policies(
        &self,
        method: &Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Response, ApiError> {
        let mut response = self.send_once(method, path, body).await?;

        if response.status() == StatusCode::UNAUTHORIZED && !is_public(path) {
            match self.refresh_tokens().await {
                Ok(()) => {
                    response = self.send_once(method, path, body).await?;
                }
                Err(refresh_err) => {
                    // Surface the original 401 unless the refresh itself
                    // hit the network; that distinction matters to the
                    // classifier.
                    let original = error_from_response(response).await;
                    return Err(if refresh_err.http_status.is_none() {
                        refresh_err
                    } else {
                        original
                    });
                }
            }
        }

        if response.status().is_server_error() && is_mutation(method) {
            let delay = retry_backoff(0);
            tracing::debug!(
                path,
                status = %response.status(),
                "transient server error, retrying once after {delay:?}"
            );
            tokio::time::sleep(delay).await;
            response = self.send_once(method, path, body).await?;
        }

        if response.status().is_success() {
            Ok(response)
        } else {
            Err(error_from_response(response).await)
        }
    }

    /// Send exactly one request. Transport failures are wrapped as
    /// network errors here; non-2xx responses are returned as-is for
    /// the policy layer to inspect.
    async fn send_once(
        &self,
        method: &Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Response, ApiError> {
        let url = self.config.api_url(path);
        let mut request = self.http.request(method.clone(), &url);

        if !is_public(path) {
            match self.tokens.access_token().await {
                Some(token) => {
                    request = request.header("Authorization", format!("Bearer {token}"));
                }
                None => {
                    return Err(ApiError::auth("Not authenticated"));
                }
            }
        }

        if let Some(body) = body {
            request = request.json(body);
        }

        request.send().await.map_err(ApiError::from)
    }

    /// Refresh the token pair, single-flight.
    ///
    /// Snapshot-then-lock: if the access token changed while waiting for
    /// the guard, another request already refreshed and this call
    /// returns immediately. A rejected refresh clears all tokens and
    /// signals sign-out; a transport failure during refresh leaves the
    /// tokens alone (the next reconnect can still try again).
    pub async fn refresh_tokens(&self) -> Result<(), ApiError> {
        let before = self.tokens.access_token().await;
        let _guard = self.tokens.refresh_guard().lock().await;
        if self.tokens.access_token().await != before {
            return Ok(());
        }

        let refresh_token = self
            .tokens
            .refresh_token()
            .await
            .ok_or_else(|| ApiError::auth("No refresh token"))?;

        let body = serde_json::to_value(RefreshRequest { refresh_token })?;
        let response = self.send_once(&Method::POST, "/auth/refresh", Some(&body)).await?;

        if response.status().is_success() {
            let auth: AuthResponse = response
                .json()
                .await
                .map_err(|e| ApiError::unknown(format!("Failed to parse refresh response: {e}")))?;
            self.tokens.store(AuthToken::from_response(auth)).await;
            Ok(())
        } else {
            let err = error_from_response(response).await;
            tracing::warn!("token refresh rejected, signing out: {}", err.message);
            self.tokens.force_sign_out().await;
            Err(err)
        }
    }
}

/// Typed endpoint surface.
impl ApiClient {
    pub async fn list_workouts(&self) -> Result<Vec<WorkoutResponse>, ApiError> {
        self.request(Method::GET, "/workouts", None).await
    }

    pub async fn create_workout(&self, payload: &WorkoutPayload) -> Result<WorkoutResponse, ApiError> {
        self.request(Method::POST, "/workouts", Some(serde_json::to_value(payload)?))
            .await
    }

    pub async fn get_workout(&self, id: &str) -> Result<WorkoutResponse, ApiError> {
        self.request(Method::GET, &format!("/workouts/{id}"), None).await
    }

    pub async fn update_workout(
        &self,
        id: &str,
        payload: &WorkoutPayload,
    ) -> Result<WorkoutResponse, ApiError> {
        self.request(
            Method::PUT,
            &format!("/workouts/{id}"),
            Some(serde_json::to_value(payload)?),
        )
        .await
    }

    pub async fn delete_workout(&self, id: &str) -> Result<(), ApiError> {
        self.request_no_content(Method::DELETE, &format!("/workouts/{id}"), None)
            .await
    }

    pub async fn list_exercises(&self, query: &CatalogQuery) -> Result<Vec<CatalogExercise>, ApiError> {
        let mut path = "/exercises".to_string();
        let pairs = query.to_pairs();
        if !pairs.is_empty() {
            let qs = pairs
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join("&");
            path = format!("{path}?{qs}");
        }
        self.request(Method::GET, &path, None).await
    }

    pub async fn get_exercise(&self, id: i64) -> Result<CatalogExercise, ApiError> {
        self.request(Method::GET, &format!("/exercises/{id}"), None).await
    }

    pub async fn add_set(
        &self,
        workout_id: &str,
        exercise_id: i64,
        body: Value,
    ) -> Result<(), ApiError> {
        self.request_no_content(
            Method::POST,
            &format!("/workouts/{workout_id}/exercises/{exercise_id}/sets"),
            Some(body),
        )
        .await
    }

    pub async fn update_set(
        &self,
        workout_id: &str,
        exercise_id: i64,
        set_id: &str,
        body: Value,
    ) -> Result<(), ApiError> {
        self.request_no_content(
            Method::PUT,
            &format!("/workouts/{workout_id}/exercises/{exercise_id}/sets/{set_id}"),
            Some(body),
        )
        .await
    }

    pub async fn delete_set(
        &self,
        workout_id: &str,
        exercise_id: i64,
        set_id: &str,
    ) -> Result<(), ApiError> {
        self.request_no_content(
            Method::DELETE,
            &format!("/workouts/{workout_id}/exercises/{exercise_id}/sets/{set_id}"),
            None,
        )
        .await
    }

    pub async fn update_profile(&self, prefs: &UserPreferences) -> Result<(), ApiError> {
        self.request_no_content(
            Method::PUT,
            "/users/profile",
            Some(serde_json::to_value(prefs)?),
        )
        .await
    }
}

/// Build an [`ApiError`] from a non-2xx response, reading the backend's
/// `{detail, error_code}` body when present.
async fn error_from_response(response: Response) -> ApiError {
    let status = response.status().as_u16();
    let body: ErrorBody = response.json().await.unwrap_or_default();
    ApiError::from_response(status, body.detail, body.error_code)
}

fn is_public(path: &str) -> bool {
    PUBLIC_PATHS.contains(&path)
}

fn is_mutation(method: &Method) -> bool {
    *method == Method::POST || *method == Method::PUT || *method == Method::DELETE
}

fn retry_backoff(attempt: u32) -> Duration {
    let exponential = RETRY_BASE.saturating_mul(2u32.saturating_pow(attempt));
    exponential.min(RETRY_CAP)
}
