//! Telemetry errors.

use thiserror::Error;

/// Errors raised while configuring or installing logging.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The subscriber could not be installed, or the filter did not parse.
    #[error("failed to initialize logging: {0}")]
    LoggingInit(String),

    /// A configuration value is invalid.
    #[error("invalid telemetry configuration: {0}")]
    InvalidConfig(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TelemetryError::LoggingInit("already set".to_string());
        assert_eq!(err.to_string(), "failed to initialize logging: already set");

        let err = TelemetryError::InvalidConfig("unknown log format `xml`".to_string());
        assert!(err.to_string().contains("xml"));
    }
}
