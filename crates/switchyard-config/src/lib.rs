//! Typed configuration for Switchyard processes.
//!
//! - TOML and JSON configuration files
//! - Environment variable overrides
//! - Strict validation (fails on unknown fields)
//! - Layered configuration (defaults → file → env)
//!
//! # Example
//!
//! ```no_run
//! use switchyard_config::ConfigLoader;
//!
//! # fn main() -> Result<(), switchyard_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_defaults()
//!     .with_optional_file("switchyard.toml")?
//!     .with_env_prefix("SWITCHYARD")
//!     .load()?;
//!
//! let server = config.server_config();
//! println!("workers per listener: {}", server.workers());
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [server]
//! verbose = true
//! reuse_port = true
//! workers = 0
//! shutdown_timeout_secs = 5
//! read_timeout_ms = 5000
//! write_timeout_ms = 10000
//! idle_timeout_secs = 120
//! header_read_timeout_ms = 2000
//! ready_path = "/ready"
//! prefix = "/api"
//!
//! [[server.listeners]]
//! addr = "0.0.0.0:8080"
//! label = "public"
//!
//! [logging]
//! level = "info"
//! format = "json"
//! ```
//!
//! # Environment Variable Overrides
//!
//! Values can be overridden with `PREFIX__SECTION__KEY` variables:
//!
//! - `SWITCHYARD__SERVER__WORKERS=4`
//! - `SWITCHYARD__SERVER__LISTENERS=public=0.0.0.0:80,admin=127.0.0.1:9000`
//! - `SWITCHYARD__LOGGING__LEVEL=debug`

#![warn(missing_docs)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::SwitchyardConfig;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::{ListenerEntry, LoggingSection, ServerSection};
