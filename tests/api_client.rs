//! Integration tests for the HTTP client: error mapping, token
//! lifecycle and the bounded retry policy.

mod common;

use common::{client_for, sign_in, unreachable_client, workout_created_body};
use liftlog::client::types::WorkoutPayload;
use liftlog::shared::error::ErrorCause;
use liftlog::shared::models::WorkoutSession;
use pretty_assertions::assert_eq;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn empty_payload() -> WorkoutPayload {
    WorkoutPayload::from_session(&WorkoutSession::new(), false)
}

#[tokio::test]
async fn transport_failure_maps_to_network_error_without_status() {
    let client = unreachable_client();
    sign_in(&client).await;

    let err = client.list_workouts().await.unwrap_err();
    assert_eq!(err.cause, ErrorCause::Network);
    assert!(err.http_status.is_none());
}

#[tokio::test]
async fn non_2xx_maps_detail_and_error_code() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/workouts"))
        .respond_with(ResponseTemplate::new(422).set_body_json(serde_json::json!({
            "detail": "Title too long",
            "error_code": "VALIDATION_ERROR",
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    sign_in(&client).await;

    let err = client.create_workout(&empty_payload()).await.unwrap_err();
    assert_eq!(err.http_status, Some(422));
    assert_eq!(err.message, "Title too long");
    assert_eq!(err.error_code.as_deref(), Some("VALIDATION_ERROR"));
    assert_eq!(err.cause, ErrorCause::Validation);
}

#[tokio::test]
async fn missing_token_on_private_endpoint_fails_before_sending() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/workouts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.list_workouts().await.unwrap_err();
    assert!(err.is_auth());
}

#[tokio::test]
async fn refresh_on_401_retries_once_with_new_token() {
    let server = MockServer::start().await;

    // First call with the stale token is rejected
    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .and(header("authorization", "Bearer test-access"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "detail": "Token expired",
            "error_code": "TOKEN_EXPIRED",
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "fresh-access",
            "token_type": "bearer",
            "expires_in": 3600,
            "refresh_token": "fresh-refresh",
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .and(header("authorization", "Bearer fresh-access"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "u1",
            "email": "test@liftlog.app",
            "display_name": "Test",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    sign_in(&client).await;

    let user = client.me().await.expect("retried with refreshed token");
    assert_eq!(user.email, "test@liftlog.app");
    assert_eq!(
        client.tokens().access_token().await.as_deref(),
        Some("fresh-access")
    );
}

#[tokio::test]
async fn failed_refresh_clears_tokens_and_signals_sign_out() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "detail": "Token expired",
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "detail": "Refresh token revoked",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    sign_in(&client).await;
    let mut signed_out = client.tokens().subscribe_signed_out();

    let err = client.me().await.unwrap_err();
    assert!(err.is_auth());
    assert!(!client.tokens().is_authenticated().await);

    signed_out.changed().await.unwrap();
    assert!(*signed_out.borrow());
}

#[tokio::test]
async fn concurrent_401s_share_a_single_refresh() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .and(header("authorization", "Bearer test-access"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "detail": "Token expired",
        })))
        .expect(2)
        .mount(&server)
        .await;

    // The single-flight guard must keep this at exactly one call even
    // though both requests hit a 401.
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(std::time::Duration::from_millis(100))
                .set_body_json(serde_json::json!({
                    "access_token": "fresh-access",
                    "token_type": "bearer",
                    "expires_in": 3600,
                    "refresh_token": "fresh-refresh",
                })),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .and(header("authorization", "Bearer fresh-access"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "u1",
            "email": "test@liftlog.app",
            "display_name": null,
        })))
        .expect(2)
        .mount(&server)
        .await;

    let client = client_for(&server);
    sign_in(&client).await;

    let (a, b) = tokio::join!(client.me(), client.me());
    assert!(a.is_ok());
    assert!(b.is_ok());
}

#[tokio::test]
async fn server_error_on_mutation_gets_one_bounded_retry() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/workouts"))
        .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
            "detail": "Internal error",
        })))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/workouts"))
        .respond_with(ResponseTemplate::new(201).set_body_json(workout_created_body("w1")))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    sign_in(&client).await;

    let created = client
        .create_workout(&empty_payload())
        .await
        .expect("second attempt succeeds");
    assert_eq!(created.id, "w1");
}

#[tokio::test]
async fn persistent_server_error_surfaces_after_single_retry() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/workouts"))
        .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
            "detail": "Still broken",
        })))
        .expect(2)
        .mount(&server)
        .await;

    let client = client_for(&server);
    sign_in(&client).await;

    let err = client.create_workout(&empty_payload()).await.unwrap_err();
    assert_eq!(err.cause, ErrorCause::Server);
    assert_eq!(err.http_status, Some(500));
}

#[tokio::test]
async fn validation_error_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/workouts"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "detail": "Bad request",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    sign_in(&client).await;

    let err = client.create_workout(&empty_payload()).await.unwrap_err();
    assert_eq!(err.cause, ErrorCause::Validation);
}

#[tokio::test]
async fn catalog_query_parameters_pass_through() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/exercises"))
        .and(wiremock::matchers::query_param("search", "press"))
        .and(wiremock::matchers::query_param("limit", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{
            "id": 1,
            "name": "Bench Press",
            "body_part": "chest",
            "equipment": "barbell",
            "is_bodyweight": false,
        }])))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    sign_in(&client).await;

    let query = liftlog::client::types::CatalogQuery {
        search: Some("press".into()),
        limit: Some(10),
        ..Default::default()
    };
    let found = client.list_exercises(&query).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "Bench Press");
}
