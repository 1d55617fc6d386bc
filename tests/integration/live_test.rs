//! Live server tests.
//!
//! These talk to the real OpenSky Impala shell and only run when
//! OPENSKY_USERNAME and OPENSKY_PASSWORD are set.

use opensky_impala::config::{Config, ServerConfig};
use opensky_impala::connection::ConnectionManager;
use opensky_impala::query::{QueryEngine, QueryOutcome, QueryParams, RecordKind};
use opensky_impala::shell::SshTransport;

use chrono::{TimeZone, Utc};

/// Helper to get credentials from the environment.
fn live_config() -> Option<Config> {
    let mut server = ServerConfig::default();
    server.apply_env_overrides();
    server.validate().ok()?;
    Some(Config { server })
}

#[tokio::test]
async fn test_live_state_vector_query() {
    let Some(config) = live_config() else {
        eprintln!("Skipping test: OPENSKY_USERNAME/OPENSKY_PASSWORD not set");
        return;
    };

    let mut engine = QueryEngine::ssh(&config).unwrap();
    let params = QueryParams::new(
        RecordKind::StateVectors,
        Utc.with_ymd_and_hms(2018, 7, 1, 13, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2018, 7, 1, 13, 1, 0).unwrap(),
    )
    .with_icao24("4ca7b5");

    match engine.query(&params).await.unwrap() {
        QueryOutcome::Records(records) => {
            assert!(records.has_column("time"));
            assert!(records.has_column("icao24"));
        }
        QueryOutcome::NoData => eprintln!("No data for this aircraft in the window"),
    }

    engine.close().await.unwrap();
}

#[tokio::test]
async fn test_live_probe_keeps_healthy_session() {
    let Some(config) = live_config() else {
        eprintln!("Skipping test: OPENSKY_USERNAME/OPENSKY_PASSWORD not set");
        return;
    };

    let mut manager = ConnectionManager::new(config.server, Box::new(SshTransport::new())).unwrap();
    manager.ensure_connected().await.unwrap();

    // Back-to-back probes each need a channel round trip.
    manager.ensure_connected().await.unwrap();
    manager.ensure_connected().await.unwrap();
    assert_eq!(manager.reconnect_count(), 0);

    manager.disconnect().await.unwrap();
}
