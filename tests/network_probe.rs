//! Integration tests for the connectivity monitor's health probe.

mod common;

use liftlog::client::network::ConnectivityMonitor;
use liftlog::client::Config;
use liftlog::shared::config::AppConfig;
use liftlog::shared::models::ConnectionType;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn monitor_for(uri: &str) -> ConnectivityMonitor {
    let config =
        Config::with_builder(AppConfig::builder().dev_url(uri)).expect("probe test config");
    ConnectivityMonitor::new(config)
}

#[tokio::test]
async fn probe_is_online_when_health_is_ok() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": "ok"})))
        .mount(&server)
        .await;

    let monitor = monitor_for(&server.uri());
    let offline = monitor.should_work_offline(None).await;
    assert!(!offline);
    assert!(monitor.current().is_online());
}

#[tokio::test]
async fn probe_is_offline_when_health_is_not_ok() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let monitor = monitor_for(&server.uri());
    assert!(monitor.should_work_offline(None).await);
    assert!(monitor.current().is_offline());
}

#[tokio::test]
async fn probe_is_offline_when_connection_is_refused() {
    let monitor = monitor_for("http://127.0.0.1:1");
    assert!(monitor.should_work_offline(None).await);
}

#[tokio::test]
async fn probe_is_offline_when_health_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(
            ResponseTemplate::new(200).set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let monitor = monitor_for(&server.uri());
    let offline = monitor
        .should_work_offline(Some(Duration::from_millis(100)))
        .await;
    assert!(offline);
}

#[tokio::test]
async fn probe_success_raises_reconnect_for_subscribers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let monitor = monitor_for(&server.uri());
    let mut reconnects = monitor.subscribe_reconnect();

    // Monitor starts pessimistic-offline; a successful probe is an
    // offline-to-online transition
    assert!(!monitor.probe(None).await);
    assert!(reconnects.try_recv().is_ok());

    // Probing again while already online raises nothing
    assert!(!monitor.probe(None).await);
    assert!(reconnects.try_recv().is_err());
}

#[tokio::test]
async fn platform_reports_flow_through_subscription() {
    let monitor = monitor_for("http://127.0.0.1:1");
    let mut rx = monitor.subscribe();
    assert!(rx.borrow_and_update().is_offline());

    monitor.report(true, Some(true), ConnectionType::Wifi);
    rx.changed().await.unwrap();
    let state = rx.borrow_and_update().clone();
    assert!(state.is_online());
    assert!(state.has_strong_connection);
}
