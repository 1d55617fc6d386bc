//! Scripted shell transport for testing.
//!
//! Replays canned shell output keyed by command substrings and records every
//! handshake, probe and command so tests can assert on the traffic.

use super::{ShellSession, ShellTransport};
use crate::config::ServerConfig;
use crate::error::{ImpalaError, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct MockState {
    /// (needle, output) pairs; the first needle contained in a command wins.
    responses: Vec<(String, String)>,
    next_session_id: u64,
    /// Sessions with an id below this value have been dropped by the "server".
    dropped_below: u64,
    failing_opens: usize,
    opens: usize,
    probes: usize,
    commands: Vec<String>,
}

/// A transport whose sessions answer from a script.
///
/// Clones share state, so a test can keep one clone for inspection while the
/// connection manager owns another.
#[derive(Debug, Clone, Default)]
pub struct MockShellTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockShellTransport {
    /// Creates a transport that answers every command with empty output.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a canned output for commands containing `needle`.
    pub fn with_response(self, needle: impl Into<String>, output: impl Into<String>) -> Self {
        self.lock().responses.push((needle.into(), output.into()));
        self
    }

    /// Silently drops every session opened so far, like an idle timeout.
    pub fn drop_sessions(&self) {
        let mut state = self.lock();
        state.dropped_below = state.next_session_id;
    }

    /// Makes the next `n` handshakes fail.
    pub fn fail_next_opens(&self, n: usize) {
        self.lock().failing_opens = n;
    }

    /// Number of handshakes attempted.
    pub fn open_count(&self) -> usize {
        self.lock().opens
    }

    /// Number of liveness probes received.
    pub fn probe_count(&self) -> usize {
        self.lock().probes
    }

    /// Commands received, in order.
    pub fn commands(&self) -> Vec<String> {
        self.lock().commands.clone()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl ShellTransport for MockShellTransport {
    async fn open(&self, server: &ServerConfig) -> Result<Box<dyn ShellSession>> {
        let mut state = self.lock();
        state.opens += 1;

        if state.failing_opens > 0 {
            state.failing_opens -= 1;
            return Err(ImpalaError::connection(format!(
                "Failed to connect to {}:{}: connection refused",
                server.host, server.port
            )));
        }

        let id = state.next_session_id;
        state.next_session_id += 1;

        Ok(Box::new(MockShellSession {
            id,
            state: Arc::clone(&self.state),
        }))
    }
}

/// A session handed out by [`MockShellTransport`].
#[derive(Debug)]
pub struct MockShellSession {
    id: u64,
    state: Arc<Mutex<MockState>>,
}

impl MockShellSession {
    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl ShellSession for MockShellSession {
    async fn probe(&self) -> Result<()> {
        let mut state = self.lock();
        state.probes += 1;
        if self.id < state.dropped_below {
            return Err(ImpalaError::connection("session closed by remote host"));
        }
        Ok(())
    }

    async fn invoke(&self, command: &str) -> Result<String> {
        let mut state = self.lock();
        if self.id < state.dropped_below {
            return Err(ImpalaError::connection("session closed by remote host"));
        }
        state.commands.push(command.to_string());

        let output = state
            .responses
            .iter()
            .find(|(needle, _)| command.contains(needle.as_str()))
            .map(|(_, output)| output.clone())
            .unwrap_or_default();
        Ok(output)
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
