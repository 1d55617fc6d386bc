//! Error types for opensky-impala.
//!
//! Defines the main error enum used throughout the crate.

use thiserror::Error;

/// Main error type for Impala shell operations.
#[derive(Error, Debug)]
pub enum ImpalaError {
    /// Configuration errors (missing credentials, malformed bounds, bad config file, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transport errors (handshake failed, auth rejected, session not open, etc.)
    #[error("Connection error: {0}")]
    Connection(String),

    /// Shell output that could not be interpreted as a count or a table.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Internal errors (unexpected states, background task failures, etc.)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ImpalaError {
    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a connection error with the given message.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a parse error with the given message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config(_) => "Configuration Error",
            Self::Connection(_) => "Connection Error",
            Self::Parse(_) => "Parse Error",
            Self::Internal(_) => "Internal Error",
        }
    }

    /// Returns true for errors raised before any network activity.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

/// Result type alias using ImpalaError.
pub type Result<T> = std::result::Result<T, ImpalaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_config() {
        let err = ImpalaError::config("bound format must be [lat1, lon1, lat2, lon2]");
        assert_eq!(
            err.to_string(),
            "Configuration error: bound format must be [lat1, lon1, lat2, lon2]"
        );
        assert_eq!(err.category(), "Configuration Error");
        assert!(err.is_config());
    }

    #[test]
    fn test_error_display_connection() {
        let err = ImpalaError::connection("Cannot connect to data.opensky-network.org:2230");
        assert_eq!(
            err.to_string(),
            "Connection error: Cannot connect to data.opensky-network.org:2230"
        );
        assert_eq!(err.category(), "Connection Error");
        assert!(!err.is_config());
    }

    #[test]
    fn test_error_display_parse() {
        let err = ImpalaError::parse("no row count in output");
        assert_eq!(err.to_string(), "Parse error: no row count in output");
        assert_eq!(err.category(), "Parse Error");
    }

    #[test]
    fn test_error_display_internal() {
        let err = ImpalaError::internal("unexpected state");
        assert_eq!(err.to_string(), "Internal error: unexpected state");
        assert_eq!(err.category(), "Internal Error");
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ImpalaError>();
    }
}
