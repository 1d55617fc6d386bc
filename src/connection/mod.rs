//! Connection management for opensky-impala.
//!
//! Centralizes the remote shell session lifecycle: connect, liveness probe,
//! reconnect and disconnect.

pub mod manager;

pub use manager::{ConnectionManager, ConnectionState};
