//! Impala query text construction.
//!
//! Turns [`QueryParams`] into the SELECT and COUNT statements sent through the
//! shell. No I/O happens here, so every rejection is reported before the
//! connection is touched.

use crate::error::{ImpalaError, Result};

use super::params::{BoundingBox, HourRange, IcaoFilter, QueryParams, RecordKind};

/// Flag asking impala-shell to run one query non-interactively.
pub const SHELL_QUERY_FLAG: &str = "-q";

/// Name of the hour partition column shared by all record tables.
pub const PARTITION_COLUMN: &str = "hour";

/// A fully built query, ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPlan {
    /// Record table being queried.
    pub kind: RecordKind,
    /// Partitions scanned.
    pub hour_range: HourRange,
    /// `SELECT *` statement.
    pub select_sql: String,
    /// `SELECT COUNT(*)` statement with the same filters.
    pub count_sql: String,
}

impl QueryPlan {
    /// Builds the statements for `params`.
    pub fn build(params: &QueryParams) -> Result<Self> {
        let bbox = params.bounding_box()?;

        let hour_range = params.hour_range();
        let time_col = params.kind.time_column();

        let mut filters = format!(
            "WHERE {PARTITION_COLUMN}>={} AND {PARTITION_COLUMN}<{} AND {time_col}>={} AND {time_col}<{} ",
            hour_range.start,
            hour_range.end,
            params.start_literal(),
            params.end_literal()
        );
        filters.push_str(&icao_filter(&params.icao24)?);
        if let Some(bbox) = bbox {
            filters.push_str(&bound_filter(&bbox));
        }

        let table = params.kind.table();
        Ok(Self {
            kind: params.kind,
            hour_range,
            select_sql: format!("SELECT * FROM {table} {filters}"),
            count_sql: format!("SELECT COUNT(*) FROM {table} {filters}"),
        })
    }

    /// Shell command running the full fetch.
    pub fn select_command(&self) -> String {
        shell_command(&self.select_sql)
    }

    /// Shell command running the row count.
    pub fn count_command(&self) -> String {
        shell_command(&self.count_sql)
    }

    /// Column the parsed records are ordered by.
    pub fn time_column(&self) -> &'static str {
        self.kind.time_column()
    }
}

/// Frames a statement as a single non-interactive shell invocation.
pub fn shell_command(sql: &str) -> String {
    format!("{SHELL_QUERY_FLAG} {sql}")
}

/// Identifier clause, lower-cased. Empty when there is no restriction.
pub fn icao_filter(filter: &IcaoFilter) -> Result<String> {
    match filter {
        IcaoFilter::Any => Ok(String::new()),
        IcaoFilter::Single(id) => Ok(format!("AND icao24={} ", quote_icao(id))),
        IcaoFilter::Set(ids) if ids.is_empty() => Err(ImpalaError::config(
            "icao24 set filter must contain at least one identifier",
        )),
        IcaoFilter::Set(ids) => {
            let list = ids
                .iter()
                .map(|id| quote_icao(id))
                .collect::<Vec<_>>()
                .join(",");
            Ok(format!("AND icao24 in ({list}) "))
        }
    }
}

fn quote_icao(id: &str) -> String {
    format!("'{}'", id.trim().to_lowercase().replace('\'', "''"))
}

/// Latitude/longitude clause.
///
/// Latitude is always a closed interval. Longitude is a closed interval when
/// `lon1 < lon2`, otherwise `lon>=lon1 OR lon<=lon2` joined without
/// parentheses, exactly as the remote filter has always been written.
pub fn bound_filter(bbox: &BoundingBox) -> String {
    let mut clause = format!("AND lat>={} AND lat<={} ", bbox.lat_min(), bbox.lat_max());
    if bbox.crosses_antimeridian() {
        clause.push_str(&format!("AND lon>={} OR lon<={} ", bbox.lon1, bbox.lon2));
    } else {
        clause.push_str(&format!("AND lon>={} AND lon<={} ", bbox.lon1, bbox.lon2));
    }
    clause
}
