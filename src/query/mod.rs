//! Structured queries against the OpenSky Impala shell.
//!
//! This module isolates query construction, execution and output parsing
//! from the connection layer and the CLI.

pub mod builder;
pub mod engine;
pub mod params;
pub mod parser;
pub mod types;

pub use builder::QueryPlan;
pub use engine::{QueryEngine, QueryOutcome};
pub use params::{
    parse_utc_timestamp, BoundingBox, HourRange, IcaoFilter, QueryParams, RecordKind,
};
pub use parser::{parse_count, parse_records};
pub use types::{ColumnInfo, RecordSet, Row, Value};
