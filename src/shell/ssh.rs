//! SSH transport for the Impala shell.
//!
//! Implements [`ShellTransport`] and [`ShellSession`] on top of `ssh2`. The
//! `ssh2` API is blocking, so every call runs on tokio's blocking pool.

use super::{ShellSession, ShellTransport};
use crate::config::ServerConfig;
use crate::error::{ImpalaError, Result};
use async_trait::async_trait;
use ssh2::Session;
use std::io::Read;
use std::net::TcpStream;
use std::sync::Arc;
use tracing::debug;

/// Opens password-authenticated SSH sessions.
#[derive(Debug, Clone, Copy, Default)]
pub struct SshTransport;

impl SshTransport {
    /// Creates a new SSH transport.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ShellTransport for SshTransport {
    async fn open(&self, server: &ServerConfig) -> Result<Box<dyn ShellSession>> {
        let server = server.clone();
        let session = run_blocking(move || connect_session(&server)).await?;
        Ok(Box::new(SshSession {
            session: Arc::new(session),
        }))
    }
}

/// An authenticated SSH session to the Impala shell.
pub struct SshSession {
    session: Arc<Session>,
}

#[async_trait]
impl ShellSession for SshSession {
    async fn probe(&self) -> Result<()> {
        let session = Arc::clone(&self.session);
        run_blocking(move || probe_session(&session)).await
    }

    async fn invoke(&self, command: &str) -> Result<String> {
        let session = Arc::clone(&self.session);
        let command = command.to_string();
        run_blocking(move || exec_command(&session, &command)).await
    }

    async fn close(&self) -> Result<()> {
        let session = Arc::clone(&self.session);
        run_blocking(move || {
            session
                .disconnect(None, "closing", None)
                .map_err(map_ssh_error)
        })
        .await
    }
}

/// Runs a blocking closure on the blocking pool and flattens the join error.
async fn run_blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ImpalaError::internal(format!("SSH task failed: {e}")))?
}

fn connect_session(server: &ServerConfig) -> Result<Session> {
    debug!("Opening SSH session to {}", server.display_string());

    let tcp = TcpStream::connect((server.host.as_str(), server.port)).map_err(|e| {
        ImpalaError::connection(format!(
            "Failed to connect to {}:{}: {e}",
            server.host, server.port
        ))
    })?;

    let mut session = Session::new()
        .map_err(|_| ImpalaError::internal("Failed to create SSH session"))?;
    session.set_compress(true);
    session.set_tcp_stream(tcp);
    session.handshake().map_err(map_ssh_error)?;

    // Password only: no agent, no key files.
    session
        .userauth_password(&server.username, &server.password)
        .map_err(map_ssh_error)?;
    if !session.authenticated() {
        return Err(ImpalaError::connection("SSH authentication failed"));
    }

    debug!("SSH session established");
    Ok(session)
}

/// Opens and closes an empty channel. Opening waits for the server's
/// confirmation, so a connection the server already dropped fails here.
fn probe_session(session: &Session) -> Result<()> {
    let mut channel = session.channel_session().map_err(map_ssh_error)?;
    channel.close().map_err(map_ssh_error)?;
    channel.wait_close().map_err(map_ssh_error)
}

fn exec_command(session: &Session, command: &str) -> Result<String> {
    let mut channel = session.channel_session().map_err(map_ssh_error)?;
    channel.exec(command).map_err(map_ssh_error)?;

    let mut stdout = Vec::new();
    channel
        .read_to_end(&mut stdout)
        .map_err(|e| ImpalaError::connection(format!("SSH stdout read failed: {e}")))?;

    let mut stderr = Vec::new();
    if channel.stderr().read_to_end(&mut stderr).is_ok() && !stderr.is_empty() {
        debug!("Remote stderr: {}", String::from_utf8_lossy(&stderr).trim());
    }

    channel.wait_close().map_err(map_ssh_error)?;
    Ok(String::from_utf8_lossy(&stdout).into_owned())
}

fn map_ssh_error(err: ssh2::Error) -> ImpalaError {
    let io_err: std::io::Error = err.into();
    match io_err.kind() {
        std::io::ErrorKind::TimedOut => ImpalaError::connection("SSH operation timed out"),
        _ => ImpalaError::connection(format!("SSH error: {io_err}")),
    }
}
