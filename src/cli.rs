//! Command-line argument parsing for opensky-impala.
//!
//! Uses clap to turn arguments into [`QueryParams`].

use clap::Parser;
use opensky_impala::config::Config;
use opensky_impala::error::{ImpalaError, Result};
use opensky_impala::output::OutputFormat;
use opensky_impala::query::{parse_utc_timestamp, IcaoFilter, QueryParams, RecordKind};
use std::path::PathBuf;

/// Query historical OpenSky ADS-B and Mode-S data through the Impala shell.
#[derive(Parser, Debug)]
#[command(name = "opensky-impala")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Record kind: adsb (state vectors) or raw (rollcall replies)
    #[arg(short = 'k', long, value_name = "KIND", default_value = "adsb")]
    pub kind: String,

    /// Start of the time window (UTC), e.g. "2018-07-01 13:00:00"
    #[arg(short = 's', long, value_name = "TIME")]
    pub start: String,

    /// End of the time window (UTC, exclusive)
    #[arg(short = 'e', long, value_name = "TIME")]
    pub end: String,

    /// Aircraft ICAO 24-bit address(es), comma-separated
    #[arg(short = 'i', long, value_name = "ICAO24")]
    pub icao24: Option<String>,

    /// Bounding box as lat1,lon1,lat2,lon2
    #[arg(short = 'b', long, value_name = "BOUNDS", allow_hyphen_values = true)]
    pub bounds: Option<String>,

    /// Skip the row count and fetch directly
    #[arg(long)]
    pub no_count: bool,

    /// Output format: table, csv or json
    #[arg(short = 'f', long, value_name = "FORMAT", default_value = "table")]
    pub format: String,

    /// Print the query that would be sent, without connecting
    #[arg(long)]
    pub dry_run: bool,

    /// Config file path
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Write logs to this file instead of stderr
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Returns the config file path to use.
    ///
    /// Uses the --config argument if provided, otherwise the default path.
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(Config::default_path)
    }

    /// Parses the output format from the --format argument.
    pub fn output_format(&self) -> Result<OutputFormat> {
        self.format.parse().map_err(ImpalaError::config)
    }

    /// Builds query parameters from the arguments.
    pub fn to_query_params(&self) -> Result<QueryParams> {
        let kind: RecordKind = self.kind.parse().map_err(ImpalaError::config)?;
        let start = parse_utc_timestamp(&self.start)?;
        let end = parse_utc_timestamp(&self.end)?;

        let mut params = QueryParams::new(kind, start, end).with_count_first(!self.no_count);

        if let Some(icao24) = &self.icao24 {
            params = params.with_icao24(parse_icao_list(icao24)?);
        }
        if let Some(bounds) = &self.bounds {
            params = params.with_bounds(parse_bounds(bounds)?);
        }

        Ok(params)
    }
}

/// One identifier becomes a single filter, several become a set.
fn parse_icao_list(text: &str) -> Result<IcaoFilter> {
    let mut ids: Vec<String> = text
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect();

    match ids.len() {
        0 => Err(ImpalaError::config("--icao24 must name at least one aircraft")),
        1 => Ok(IcaoFilter::Single(ids.remove(0))),
        _ => Ok(IcaoFilter::Set(ids)),
    }
}

/// Splits the bounds list. Arity is checked later, when the query is built.
fn parse_bounds(text: &str) -> Result<Vec<f64>> {
    text.split(',')
        .map(|part| {
            part.trim()
                .parse::<f64>()
                .map_err(|_| ImpalaError::config(format!("Invalid bound value: '{}'", part.trim())))
        })
        .collect()
}
