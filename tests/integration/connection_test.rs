//! Connection integration tests.
//!
//! Tests the session lifecycle and reconnect behavior through the public API.

use opensky_impala::config::{Config, ServerConfig};
use opensky_impala::connection::{ConnectionManager, ConnectionState};
use opensky_impala::error::ImpalaError;
use opensky_impala::query::{QueryEngine, QueryParams, RecordKind};
use opensky_impala::shell::{MockShellTransport, SshTransport};

use chrono::{TimeZone, Utc};

fn server() -> ServerConfig {
    ServerConfig::with_credentials("pilot", "secret")
}

#[tokio::test]
async fn test_probe_failure_triggers_single_reconnect() {
    let transport = MockShellTransport::new().with_response("SHOW TABLES", "| state_vectors_data4 |");
    let mut manager = ConnectionManager::new(server(), Box::new(transport.clone())).unwrap();

    manager.ensure_connected().await.unwrap();
    assert_eq!(manager.state(), ConnectionState::Connected);

    transport.drop_sessions();
    manager.ensure_connected().await.unwrap();

    assert_eq!(transport.open_count(), 2);
    assert_eq!(manager.reconnect_count(), 1);
    let out = manager.run("-q SHOW TABLES").await.unwrap();
    assert_eq!(out, "| state_vectors_data4 |");
}

#[tokio::test]
async fn test_engine_recovers_between_queries() {
    let transport = MockShellTransport::new()
        .with_response("COUNT(*)", "| count(*) |\n| 1 |\n")
        .with_response("SELECT *", "| time | icao24 | hour |\n| 1530450000 | 3c6444 | 1530450000 |\n");
    let config = Config { server: server() };
    let mut engine = QueryEngine::with_transport(&config, Box::new(transport.clone())).unwrap();

    let params = QueryParams::new(
        RecordKind::StateVectors,
        Utc.with_ymd_and_hms(2018, 7, 1, 13, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2018, 7, 1, 13, 30, 0).unwrap(),
    );

    assert!(!engine.query(&params).await.unwrap().is_empty());
    transport.drop_sessions();
    assert!(!engine.query(&params).await.unwrap().is_empty());

    assert_eq!(transport.open_count(), 2);
    assert_eq!(engine.connection().reconnect_count(), 1);
    assert_eq!(transport.commands().len(), 4);
}

#[tokio::test]
async fn test_failed_reconnect_is_not_retried() {
    let transport = MockShellTransport::new();
    let mut manager = ConnectionManager::new(server(), Box::new(transport.clone())).unwrap();

    manager.ensure_connected().await.unwrap();
    transport.drop_sessions();
    transport.fail_next_opens(5);

    let err = manager.ensure_connected().await.unwrap_err();
    assert!(matches!(err, ImpalaError::Connection(_)));
    assert_eq!(transport.open_count(), 2);
    assert_eq!(manager.reconnect_count(), 0);
    assert_eq!(manager.state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn test_run_after_disconnect_is_refused() {
    let transport = MockShellTransport::new();
    let mut manager = ConnectionManager::new(server(), Box::new(transport.clone())).unwrap();

    manager.ensure_connected().await.unwrap();
    manager.disconnect().await.unwrap();

    assert!(manager.run("-q SELECT 1").await.is_err());
    assert!(transport.commands().is_empty());
}

#[tokio::test(flavor = "current_thread")]
async fn test_ssh_connect_to_closed_port_fails() {
    let config = ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 1, // Nothing listens here
        username: "pilot".to_string(),
        password: "secret".to_string(),
    };
    let mut manager = ConnectionManager::new(config, Box::new(SshTransport::new())).unwrap();

    let err = manager.ensure_connected().await.unwrap_err();
    assert!(matches!(err, ImpalaError::Connection(_)));
    assert!(!manager.is_connected());
}
