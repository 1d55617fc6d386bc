//! Query execution integration tests.
//!
//! Drives the full count-then-fetch protocol against scripted shell output.

use opensky_impala::config::{Config, ServerConfig};
use opensky_impala::error::ImpalaError;
use opensky_impala::query::{
    IcaoFilter, QueryEngine, QueryOutcome, QueryParams, RecordKind, Value,
};
use opensky_impala::shell::MockShellTransport;

use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;

fn engine(transport: &MockShellTransport) -> QueryEngine {
    let config = Config {
        server: ServerConfig::with_credentials("pilot", "secret"),
    };
    QueryEngine::with_transport(&config, Box::new(transport.clone())).unwrap()
}

fn window(kind: RecordKind) -> QueryParams {
    QueryParams::new(
        kind,
        Utc.with_ymd_and_hms(2018, 7, 1, 13, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2018, 7, 1, 14, 0, 0).unwrap(),
    )
}

/// A long state-vector result: the shell repeats the header after 12 rows.
fn paginated_state_vectors() -> String {
    let header = "+------------+--------+----------+------------+\n\
                  | time       | icao24 | callsign | hour       |\n\
                  +------------+--------+----------+------------+\n";
    let mut out = String::from("Query: select * from state_vectors_data4\n");
    out.push_str(header);
    for i in (0..12).rev() {
        out.push_str(&format!("| {} | 000{:03} | KLM{:<4} | 1530450000 |\n", 1_530_450_000 + i, i, i));
    }
    out.push_str(header);
    for i in 12..15 {
        out.push_str(&format!("| {} | 000{:03} | KLM{:<4} | 1530450000 |\n", 1_530_450_000 + i, i, i));
    }
    out.push_str("+------------+--------+----------+------------+\nFetched 15 row(s) in 1.2s\n");
    out
}

#[tokio::test]
async fn test_state_vectors_full_protocol() {
    let transport = MockShellTransport::new()
        .with_response(
            "COUNT(*)",
            "+----------+\n| count(*) |\n+----------+\n| 15       |\n+----------+\n",
        )
        .with_response("SELECT *", paginated_state_vectors());
    let mut engine = engine(&transport);

    let params = window(RecordKind::StateVectors)
        .with_icao24(IcaoFilter::set(["ABC123", "def456"]))
        .with_bounds(vec![54.0, 3.0, 50.0, 8.0]);
    let records = engine.query(&params).await.unwrap().into_records().unwrap();

    assert_eq!(records.len(), 15);
    let names: Vec<_> = records.columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["time", "icao24", "callsign", "hour"]);
    assert_eq!(records.columns[1].data_type, "string");

    let times: Vec<i64> = records
        .column_values("time")
        .into_iter()
        .map(|v| match v {
            Value::Int(t) => *t,
            other => panic!("unexpected time value {other:?}"),
        })
        .collect();
    let mut sorted = times.clone();
    sorted.sort_unstable();
    assert_eq!(times, sorted);
    assert_eq!(records.value(0, "icao24"), Some(&Value::from("000000")));

    let commands = transport.commands();
    assert_eq!(commands.len(), 2);
    assert_eq!(
        commands[1],
        "-q SELECT * FROM state_vectors_data4 WHERE hour>=1530450000 AND hour<1530457200 \
         AND time>=1530450000 AND time<1530453600 AND icao24 in ('abc123','def456') \
         AND lat>=50 AND lat<=54 AND lon>=3 AND lon<=8 "
    );
}

#[tokio::test]
async fn test_rollcall_sorted_by_mintime() {
    let fetch = "\
+------------+------------+--------+----------------+------------+
| mintime    | maxtime    | icao24 | rawmsg         | hour       |
+------------+------------+--------+----------------+------------+
| 1530450002.5 | 1530450003 | 3c6444 | 5d3c6444a1b2c3 | 1530450000 |
| 1530450001.25 | 1530450001 | 3c6444 | 5d3c6444d4e5f6 | 1530450000 |
+------------+------------+--------+----------------+------------+
";
    let transport = MockShellTransport::new().with_response("SELECT *", fetch);
    let mut engine = engine(&transport);

    let params = window(RecordKind::RollcallReplies)
        .with_icao24("3C6444")
        .with_count_first(false);
    let outcome = engine.query(&params).await.unwrap();

    let QueryOutcome::Records(records) = outcome else {
        panic!("expected records");
    };
    assert_eq!(records.value(0, "mintime"), Some(&Value::Float(1_530_450_001.25)));
    assert_eq!(records.value(0, "rawmsg"), Some(&Value::from("5d3c6444d4e5f6")));
    assert!(transport.commands()[0].contains("FROM rollcall_replies_data4"));
    assert!(transport.commands()[0].contains("AND icao24='3c6444' "));
}

#[tokio::test]
async fn test_empty_count_returns_no_data() {
    let transport = MockShellTransport::new()
        .with_response("COUNT(*)", "count(*)\n--------\n0\n")
        .with_response("SELECT *", paginated_state_vectors());
    let mut engine = engine(&transport);

    let outcome = engine.query(&window(RecordKind::StateVectors)).await.unwrap();

    assert_eq!(outcome, QueryOutcome::NoData);
    assert_eq!(transport.commands().len(), 1);
}

#[tokio::test]
async fn test_empty_window_returns_no_data() {
    let transport = MockShellTransport::new()
        .with_response("COUNT(*)", "+----------+\n| count(*) |\n+----------+\n| 0        |\n+----------+\n");
    let mut engine = engine(&transport);

    let instant = Utc.with_ymd_and_hms(2018, 7, 1, 13, 0, 0).unwrap();
    let params = QueryParams::new(RecordKind::StateVectors, instant, instant);
    let outcome = engine.query(&params).await.unwrap();

    assert_eq!(outcome, QueryOutcome::NoData);
    let commands = transport.commands();
    assert_eq!(commands.len(), 1);
    assert!(commands[0].contains("AND time>=1530450000 AND time<1530450000 "));
}

#[tokio::test]
async fn test_non_finite_bounds_rejected_before_io() {
    let transport = MockShellTransport::new();
    let mut engine = engine(&transport);

    let bounds = vec![f64::NAN, 1.0, 2.0, f64::INFINITY];
    let err = engine
        .query(&window(RecordKind::StateVectors).with_bounds(bounds))
        .await
        .unwrap_err();

    assert!(matches!(err, ImpalaError::Config(_)));
    assert_eq!(transport.open_count(), 0);
}

#[tokio::test]
async fn test_bounds_arity_checked_before_io() {
    for bounds in [vec![], vec![1.0], vec![1.0, 2.0, 3.0], vec![1.0, 2.0, 3.0, 4.0, 5.0]] {
        let transport = MockShellTransport::new();
        let mut engine = engine(&transport);

        let err = engine
            .query(&window(RecordKind::StateVectors).with_bounds(bounds))
            .await
            .unwrap_err();

        assert!(matches!(err, ImpalaError::Config(_)));
        assert_eq!(transport.open_count(), 0);
        assert_eq!(transport.probe_count(), 0);
    }
}

#[tokio::test]
async fn test_unparseable_count_is_an_error() {
    let transport = MockShellTransport::new()
        .with_response("COUNT(*)", "ERROR: AnalysisException: Could not resolve table reference");
    let mut engine = engine(&transport);

    let err = engine.query(&window(RecordKind::StateVectors)).await.unwrap_err();
    assert!(matches!(err, ImpalaError::Parse(_)));
    assert_eq!(transport.commands().len(), 1);
}
