//! opensky-impala - query historical OpenSky data through the Impala shell.
//!
//! This library exposes the core modules for use by the binary and by
//! integration tests.

pub mod config;
pub mod connection;
pub mod error;
pub mod logging;
pub mod output;
pub mod query;
pub mod shell;
