//! Integration tests for opensky-impala.

pub mod connection_test;
pub mod live_test;
pub mod query_test;
