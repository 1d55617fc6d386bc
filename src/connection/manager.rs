//! Connection manager for the remote shell session lifecycle.

use std::fmt;

use tracing::{debug, info, warn};

use crate::config::ServerConfig;
use crate::error::{ImpalaError, Result};
use crate::shell::{ShellSession, ShellTransport};

/// Whether the manager currently holds a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No session; commands are refused.
    Disconnected,
    /// A session is open (it may still have died silently since the last probe).
    Connected,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "disconnected"),
            Self::Connected => write!(f, "connected"),
        }
    }
}

/// Owns the persistent shell session and reestablishes it when it dies.
///
/// Every method takes `&mut self`, so one command is in flight at a time.
pub struct ConnectionManager {
    server: ServerConfig,
    transport: Box<dyn ShellTransport>,
    session: Option<Box<dyn ShellSession>>,
    reconnects: u32,
}

impl ConnectionManager {
    /// Creates a disconnected manager.
    ///
    /// Fails if the credentials are missing; no I/O happens here.
    pub fn new(server: ServerConfig, transport: Box<dyn ShellTransport>) -> Result<Self> {
        server.validate()?;
        Ok(Self {
            server,
            transport,
            session: None,
            reconnects: 0,
        })
    }

    /// Makes sure a live session exists.
    ///
    /// An existing session is probed first; if the probe fails the session is
    /// discarded and exactly one fresh handshake is attempted. Handshake
    /// failures propagate to the caller.
    pub async fn ensure_connected(&mut self) -> Result<()> {
        let Some(session) = &self.session else {
            return self.connect().await;
        };

        match session.probe().await {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!("Connection lost ({e}), reconnecting...");
                // Dead session: nothing useful to say to the server.
                self.session = None;
                self.connect().await?;
                self.reconnects += 1;
                Ok(())
            }
        }
    }

    async fn connect(&mut self) -> Result<()> {
        debug!("Connecting to {}", self.server.display_string());
        let session = self.transport.open(&self.server).await?;
        self.session = Some(session);
        info!("Connected to {}", self.server.display_string());
        Ok(())
    }

    /// Runs one shell command and returns its full output.
    ///
    /// Requires a prior [`ensure_connected`](Self::ensure_connected).
    pub async fn run(&mut self, command: &str) -> Result<String> {
        let session = self.session.as_ref().ok_or_else(|| {
            ImpalaError::connection("Not connected: call ensure_connected before running commands")
        })?;
        session.invoke(command).await
    }

    /// Closes the session, if any.
    pub async fn disconnect(&mut self) -> Result<()> {
        if let Some(session) = self.session.take() {
            session.close().await?;
            debug!("Disconnected from {}", self.server.display_string());
        }
        Ok(())
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        if self.session.is_some() {
            ConnectionState::Connected
        } else {
            ConnectionState::Disconnected
        }
    }

    /// Check if there's an open session.
    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    /// Number of times a dead session was replaced.
    pub fn reconnect_count(&self) -> u32 {
        self.reconnects
    }

    /// Display-safe `user@host:port` of the target server.
    pub fn display_target(&self) -> String {
        self.server.display_string()
    }
}
