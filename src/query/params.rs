//! Structured query parameters.
//!
//! Everything a caller can ask for: which table, which time window, which
//! aircraft and which area. Validation that must happen before any network
//! activity lives here too.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{ImpalaError, Result};

/// Width of one `hour` partition in seconds.
pub const SECONDS_PER_HOUR: i64 = 3600;

/// Which record table to query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// Decoded ADS-B state vectors.
    StateVectors,
    /// Raw Mode-S rollcall replies.
    RollcallReplies,
}

impl RecordKind {
    /// Physical table name on the Impala side.
    pub fn table(&self) -> &'static str {
        match self {
            Self::StateVectors => "state_vectors_data4",
            Self::RollcallReplies => "rollcall_replies_data4",
        }
    }

    /// Column holding the record timestamp (epoch seconds).
    pub fn time_column(&self) -> &'static str {
        match self {
            Self::StateVectors => "time",
            Self::RollcallReplies => "mintime",
        }
    }

    /// Short name used on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StateVectors => "adsb",
            Self::RollcallReplies => "raw",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "adsb" | "state_vectors" | "statevectors" => Ok(Self::StateVectors),
            "raw" | "rollcall" | "rollcall_replies" => Ok(Self::RollcallReplies),
            _ => Err(format!("Invalid record kind: {s}. Expected: adsb or raw")),
        }
    }
}

/// Aircraft identifier (ICAO 24-bit address) restriction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum IcaoFilter {
    /// No restriction.
    #[default]
    Any,
    /// Exactly one aircraft.
    Single(String),
    /// Any aircraft in the set.
    Set(Vec<String>),
}

impl IcaoFilter {
    /// Builds a set filter from any collection of identifiers.
    pub fn set<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Set(ids.into_iter().map(Into::into).collect())
    }

    /// Returns true if no restriction applies.
    pub fn is_any(&self) -> bool {
        matches!(self, Self::Any)
    }
}

impl From<&str> for IcaoFilter {
    fn from(id: &str) -> Self {
        Self::Single(id.to_string())
    }
}

impl From<String> for IcaoFilter {
    fn from(id: String) -> Self {
        Self::Single(id)
    }
}

impl From<Vec<String>> for IcaoFilter {
    fn from(ids: Vec<String>) -> Self {
        Self::Set(ids)
    }
}

impl From<Vec<&str>> for IcaoFilter {
    fn from(ids: Vec<&str>) -> Self {
        Self::set(ids)
    }
}

/// Geographic box given as two corners `(lat1, lon1)` and `(lat2, lon2)`.
///
/// `lon1 >= lon2` is read as a box crossing the antimeridian.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub lat1: f64,
    pub lon1: f64,
    pub lat2: f64,
    pub lon2: f64,
}

impl BoundingBox {
    /// Unpacks `[lat1, lon1, lat2, lon2]`. Every value must be finite.
    pub fn from_slice(values: &[f64]) -> Result<Self> {
        if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
            return Err(ImpalaError::config(format!(
                "bound values must be finite numbers, got {bad}"
            )));
        }
        match *values {
            [lat1, lon1, lat2, lon2] => Ok(Self {
                lat1,
                lon1,
                lat2,
                lon2,
            }),
            _ => Err(ImpalaError::config(format!(
                "bound format must be [lat1, lon1, lat2, lon2], got {} values",
                values.len()
            ))),
        }
    }

    /// Smaller of the two latitudes.
    pub fn lat_min(&self) -> f64 {
        self.lat1.min(self.lat2)
    }

    /// Larger of the two latitudes.
    pub fn lat_max(&self) -> f64 {
        self.lat1.max(self.lat2)
    }

    /// True when the longitude range wraps past 180°.
    pub fn crosses_antimeridian(&self) -> bool {
        self.lon1 >= self.lon2
    }
}

/// Hour partitions covering a time window: `[start, end)` in epoch seconds,
/// both multiples of [`SECONDS_PER_HOUR`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HourRange {
    pub start: i64,
    pub end: i64,
}

impl HourRange {
    /// Floors `start_secs` and moves past the hour containing `end_secs`.
    pub fn covering(start_secs: i64, end_secs: i64) -> Self {
        Self {
            start: start_secs.div_euclid(SECONDS_PER_HOUR) * SECONDS_PER_HOUR,
            end: (end_secs.div_euclid(SECONDS_PER_HOUR) + 1) * SECONDS_PER_HOUR,
        }
    }
}

/// A complete query request.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryParams {
    /// Table to read.
    pub kind: RecordKind,
    /// Inclusive start of the time window.
    pub start: DateTime<Utc>,
    /// Exclusive end of the time window.
    pub end: DateTime<Utc>,
    /// Aircraft restriction.
    pub icao24: IcaoFilter,
    /// Raw `[lat1, lon1, lat2, lon2]`; validated when the query is built.
    pub bounds: Option<Vec<f64>>,
    /// Run a row count before fetching, and skip the fetch when it is zero.
    pub count_first: bool,
}

impl QueryParams {
    /// Creates parameters for a whole time window, counting first.
    pub fn new(kind: RecordKind, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            kind,
            start,
            end,
            icao24: IcaoFilter::Any,
            bounds: None,
            count_first: true,
        }
    }

    /// Restricts the query to one or more aircraft.
    pub fn with_icao24(mut self, filter: impl Into<IcaoFilter>) -> Self {
        self.icao24 = filter.into();
        self
    }

    /// Restricts the query to a bounding box.
    pub fn with_bounds(mut self, bounds: Vec<f64>) -> Self {
        self.bounds = Some(bounds);
        self
    }

    /// Enables or disables the count-first round trip.
    pub fn with_count_first(mut self, count_first: bool) -> Self {
        self.count_first = count_first;
        self
    }

    /// Validated bounding box, if one was given.
    pub fn bounding_box(&self) -> Result<Option<BoundingBox>> {
        self.bounds
            .as_deref()
            .map(BoundingBox::from_slice)
            .transpose()
    }

    /// Start of the window in epoch seconds.
    pub fn start_secs(&self) -> i64 {
        self.start.timestamp()
    }

    /// End of the window in epoch seconds.
    pub fn end_secs(&self) -> i64 {
        self.end.timestamp()
    }

    /// Start of the window as a SQL epoch literal, keeping sub-second precision.
    pub fn start_literal(&self) -> String {
        epoch_literal(&self.start)
    }

    /// End of the window as a SQL epoch literal, keeping sub-second precision.
    pub fn end_literal(&self) -> String {
        epoch_literal(&self.end)
    }

    /// Partition range covering the window.
    pub fn hour_range(&self) -> HourRange {
        HourRange::covering(self.start_secs(), self.end_secs())
    }
}

/// Epoch seconds as written into a filter: an integer for whole seconds,
/// a decimal otherwise.
pub fn epoch_literal(t: &DateTime<Utc>) -> String {
    match t.timestamp_subsec_nanos() {
        0 => t.timestamp().to_string(),
        nanos => format!("{}", t.timestamp() as f64 + f64::from(nanos) / 1e9),
    }
}

/// Parses a UTC instant from command-line text.
///
/// Accepts RFC 3339, `YYYY-MM-DD HH:MM[:SS]`, `YYYY-MM-DDTHH:MM[:SS]`,
/// `YYYY-MM-DD` and epoch seconds. Inputs without an offset are UTC.
pub fn parse_utc_timestamp(input: &str) -> Result<DateTime<Utc>> {
    let text = input.trim();

    if let Ok(secs) = text.parse::<i64>() {
        return DateTime::from_timestamp(secs, 0)
            .ok_or_else(|| ImpalaError::config(format!("Timestamp out of range: {text}")));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt.with_timezone(&Utc));
    }

    const FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ];
    for format in FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(naive.and_utc());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(naive.and_utc());
        }
    }

    Err(ImpalaError::config(format!(
        "Invalid time '{text}'. Expected RFC 3339, 'YYYY-MM-DD HH:MM:SS', 'YYYY-MM-DD' or epoch seconds"
    )))
}
