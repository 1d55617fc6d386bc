//! Query execution over the remote shell.
//!
//! Builds the statements, runs the optional count round trip, fetches and
//! parses the records. Isolated from the CLI so it can be driven by a mock
//! transport in tests.

use std::time::{Duration, Instant};

use tracing::info;

use crate::config::Config;
use crate::connection::ConnectionManager;
use crate::error::Result;
use crate::shell::{ShellTransport, SshTransport};

use super::builder::QueryPlan;
use super::params::QueryParams;
use super::parser::{parse_count, parse_records};
use super::types::RecordSet;

/// Result of a query that reached the server.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    /// Parsed records, ordered by time.
    Records(RecordSet),
    /// The count round trip reported zero matching rows; nothing was fetched.
    NoData,
}

impl QueryOutcome {
    /// The records, or `None` for [`QueryOutcome::NoData`].
    pub fn into_records(self) -> Option<RecordSet> {
        match self {
            Self::Records(records) => Some(records),
            Self::NoData => None,
        }
    }

    /// Returns true if no records came back, either way.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Records(records) => records.is_empty(),
            Self::NoData => true,
        }
    }
}

/// Runs structured queries against the Impala shell.
pub struct QueryEngine {
    connection: ConnectionManager,
    last_duration: Option<Duration>,
}

impl QueryEngine {
    /// Creates an engine over an existing connection manager.
    pub fn new(connection: ConnectionManager) -> Self {
        Self {
            connection,
            last_duration: None,
        }
    }

    /// Creates an engine over the given transport. No connection is made yet.
    pub fn with_transport(config: &Config, transport: Box<dyn ShellTransport>) -> Result<Self> {
        let connection = ConnectionManager::new(config.server.clone(), transport)?;
        Ok(Self::new(connection))
    }

    /// Creates an engine talking SSH to the configured server.
    pub fn ssh(config: &Config) -> Result<Self> {
        Self::with_transport(config, Box::new(SshTransport::new()))
    }

    /// Builds the statements for `params` without touching the network.
    pub fn plan(&self, params: &QueryParams) -> Result<QueryPlan> {
        QueryPlan::build(params)
    }

    /// Runs a query.
    ///
    /// Parameter errors are reported before any connection attempt. With
    /// `count_first`, a zero count returns [`QueryOutcome::NoData`] without
    /// issuing the fetch.
    pub async fn query(&mut self, params: &QueryParams) -> Result<QueryOutcome> {
        let plan = QueryPlan::build(params)?;
        let started = Instant::now();

        if params.count_first {
            info!("Sending count request: [{}]", plan.count_sql);
            let output = self.run(&plan.count_command()).await?;
            let count = parse_count(&output)?;
            info!("OpenSky Impala: {} records found", count);

            if count == 0 {
                info!("No record found");
                self.last_duration = Some(started.elapsed());
                return Ok(QueryOutcome::NoData);
            }
        }

        info!("Sending query request: [{}]", plan.select_sql);
        let output = self.run(&plan.select_command()).await?;

        info!("Processing query result");
        let records = parse_records(&output)?;
        let elapsed = started.elapsed();
        self.last_duration = Some(elapsed);
        info!("{} records downloaded in {:?}", records.len(), elapsed);

        Ok(QueryOutcome::Records(records))
    }

    async fn run(&mut self, command: &str) -> Result<String> {
        self.connection.ensure_connected().await?;
        self.connection.run(command).await
    }

    /// Wall time of the last completed query.
    pub fn last_duration(&self) -> Option<Duration> {
        self.last_duration
    }

    /// The underlying connection manager.
    pub fn connection(&self) -> &ConnectionManager {
        &self.connection
    }

    /// Closes the remote session.
    pub async fn close(&mut self) -> Result<()> {
        self.connection.disconnect().await
    }
}
