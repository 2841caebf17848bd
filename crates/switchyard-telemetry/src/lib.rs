//! # Switchyard Telemetry
//!
//! Structured logging setup for Switchyard services.
//!
//! The dispatcher and server emit `tracing` events with the field names in
//! [`logging::fields`]. This crate installs the subscriber that renders them.
//!
//! ```rust,no_run
//! use switchyard_telemetry::{init_logging, LogConfig, LogFormat};
//!
//! let config = LogConfig::development().with_format(LogFormat::Compact);
//! init_logging(&config)?;
//! # Ok::<(), switchyard_telemetry::TelemetryError>(())
//! ```

#![doc(html_root_url = "https://docs.rs/switchyard-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod logging;

mod error;

pub use error::TelemetryError;
pub use logging::{create_env_filter, fields, init_logging, LogConfig, LogFormat};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
