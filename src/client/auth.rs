/**
 * Authentication Module
 *
 * Token storage and the login/refresh/logout flows. The token pair is
 * the one piece of state concurrent requests share; refresh is
 * single-flight so concurrent 401s await one outstanding refresh call.
 */

use crate::client::http::ApiClient;
use crate::client::types::{AuthResponse, GoogleAuthRequest, LoginRequest, UserInfo};
use crate::shared::error::ApiError;
use chrono::{DateTime, Duration, Utc};
use reqwest::Method;
use tokio::sync::{watch, Mutex, RwLock};

/// The access/refresh token pair with its expiry.
///
/// Owned exclusively by [`TokenStore`]; mutated only by login, refresh
/// and logout flows.
#[derive(Debug, Clone)]
pub struct AuthToken {
    pub access_token: String,
    pub token_type: String,
    pub expires_at: DateTime<Utc>,
    pub refresh_token: String,
}

impl AuthToken {
    /// Build from an auth response, resolving `expires_in` to an instant.
    pub fn from_response(response: AuthResponse) -> Self {
        Self {
            access_token: response.access_token,
            token_type: response.token_type,
            expires_at: Utc::now() + Duration::seconds(response.expires_in),
            refresh_token: response.refresh_token,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }

    /// Whether the token expires within the next minute.
    pub fn expires_soon(&self) -> bool {
        self.expires_at <= Utc::now() + Duration::seconds(60)
    }
}

/// Holds the token pair and the sign-out signal.
#[derive(Debug)]
pub struct TokenStore {
    token: RwLock<Option<AuthToken>>,
    /// Serializes refresh attempts. Held for the duration of a refresh
    /// call so concurrent 401s wait instead of issuing their own.
    refresh_guard: Mutex<()>,
    signed_out_tx: watch::Sender<bool>,
}

impl TokenStore {
    pub fn new() -> Self {
        let (signed_out_tx, _) = watch::channel(false);
        Self {
            token: RwLock::new(None),
            refresh_guard: Mutex::new(()),
            signed_out_tx,
        }
    }

    /// Store a fresh token pair (login or refresh).
    pub async fn store(&self, token: AuthToken) {
        *self.token.write().await = Some(token);
        let _ = self.signed_out_tx.send(false);
    }

    /// Current access token, if any.
    pub async fn access_token(&self) -> Option<String> {
        self.token
            .read()
            .await
            .as_ref()
            .map(|t| t.access_token.clone())
    }

    /// Current refresh token, if any.
    pub async fn refresh_token(&self) -> Option<String> {
        self.token
            .read()
            .await
            .as_ref()
            .map(|t| t.refresh_token.clone())
    }

    /// Whether a token pair is present.
    pub async fn is_authenticated(&self) -> bool {
        self.token.read().await.is_some()
    }

    /// Drop the token pair without signalling sign-out (explicit logout).
    pub async fn clear(&self) {
        *self.token.write().await = None;
    }

    /// Drop the token pair and signal sign-out to subscribers. Used when
    /// a refresh fails unrecoverably.
    pub async fn force_sign_out(&self) {
        *self.token.write().await = None;
        let _ = self.signed_out_tx.send(true);
    }

    /// Subscribe to the sign-out signal.
    pub fn subscribe_signed_out(&self) -> watch::Receiver<bool> {
        self.signed_out_tx.subscribe()
    }

    /// Lock guarding refresh single-flight. Callers snapshot the access
    /// token before acquiring; if it changed while waiting, another task
    /// already refreshed.
    pub(crate) fn refresh_guard(&self) -> &Mutex<()> {
        &self.refresh_guard
    }
}

impl Default for TokenStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Authentication state for the UI layer.
#[derive(Debug, Clone, Default)]
pub struct AuthState {
    pub authenticated: bool,
    pub user: Option<UserInfo>,
    pub error: Option<String>,
    pub loading: bool,
}

impl AuthState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub fn set_error(&mut self, error: String) {
        self.error = Some(error);
    }
}

impl ApiClient {
    /// Login with email and password. Stores the token pair on success
    /// and returns the signed-in user.
    pub async fn login(&self, email: String, password: String) -> Result<UserInfo, ApiError> {
        let request = LoginRequest { email, password };
        let response: AuthResponse = self
            .request(Method::POST, "/auth/login", Some(serde_json::to_value(&request)?))
            .await?;

        self.tokens().store(AuthToken::from_response(response)).await;
        self.me().await
    }

    /// Login with a Google id token.
    pub async fn login_with_google(&self, id_token: String) -> Result<UserInfo, ApiError> {
        let request = GoogleAuthRequest { id_token };
        let response: AuthResponse = self
            .request(Method::POST, "/auth/google", Some(serde_json::to_value(&request)?))
            .await?;

        self.tokens().store(AuthToken::from_response(response)).await;
        self.me().await
    }

    /// Get the current user.
    pub async fn me(&self) -> Result<UserInfo, ApiError> {
        self.request(Method::GET, "/auth/me", None).await
    }

    /// Logout: drop the local token pair. The server holds no session
    /// state beyond the refresh token's validity.
    pub async fn logout(&self) {
        self.tokens().clear().await;
    }
}
