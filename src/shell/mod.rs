//! Remote shell abstraction for opensky-impala.
//!
//! The Impala service is only reachable through an interactive shell, so the
//! rest of the crate talks to it through this narrow trait pair: a transport
//! that opens sessions, and a session that can be probed, asked to run one
//! command, and closed.

mod mock;
mod ssh;

pub use mock::{MockShellSession, MockShellTransport};
pub use ssh::{SshSession, SshTransport};

use crate::config::ServerConfig;
use crate::error::Result;
use async_trait::async_trait;

/// Opens remote shell sessions.
#[async_trait]
pub trait ShellTransport: Send + Sync {
    /// Performs the full handshake and authentication against `server`.
    async fn open(&self, server: &ServerConfig) -> Result<Box<dyn ShellSession>>;
}

/// A live remote shell session.
#[async_trait]
pub trait ShellSession: Send + Sync {
    /// Sends a zero-effect message; fails if the session has been dropped.
    async fn probe(&self) -> Result<()>;

    /// Runs one command and returns its captured standard output.
    async fn invoke(&self, command: &str) -> Result<String>;

    /// Closes the session.
    async fn close(&self) -> Result<()>;
}
