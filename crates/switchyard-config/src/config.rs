//! The root [`SwitchyardConfig`] and its conversions into runtime settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use switchyard_server::{DispatcherBuilder, ListenerSpec, ServerConfig};
use switchyard_telemetry::{LogConfig, LogFormat};

use crate::{ConfigError, LoggingSection, ServerSection};

/// Complete Switchyard process configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load it from files and
/// environment variables.
///
/// ```
/// use switchyard_config::SwitchyardConfig;
///
/// let config = SwitchyardConfig::default();
/// assert!(config.validate().is_ok());
/// assert_eq!(config.server_config().read_timeout().as_secs(), 5);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct SwitchyardConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerSection,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSection,
}

impl SwitchyardConfig {
    /// Checks the loaded values.
    ///
    /// # Errors
    ///
    /// - no listener is configured
    /// - a listen address is not `host:port`
    /// - a timeout is zero
    /// - the readiness path or prefix does not start with `/`
    /// - the log level does not parse as a filter
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.listeners.is_empty() {
            return Err(ConfigError::validation_error(
                "server.listeners must contain at least one entry",
            ));
        }

        for (i, listener) in self.server.listeners.iter().enumerate() {
            if let Err(reason) = check_host_port(&listener.addr) {
                return Err(ConfigError::invalid_value(
                    format!("server.listeners[{i}].addr"),
                    format!("`{}`: {reason}", listener.addr),
                ));
            }
        }

        let timeouts = [
            ("server.shutdown_timeout_secs", self.server.shutdown_timeout_secs),
            ("server.read_timeout_ms", self.server.read_timeout_ms),
            ("server.write_timeout_ms", self.server.write_timeout_ms),
            ("server.idle_timeout_secs", self.server.idle_timeout_secs),
            ("server.header_read_timeout_ms", self.server.header_read_timeout_ms),
        ];
        if let Some((field, _)) = timeouts.iter().find(|(_, value)| *value == 0) {
            return Err(ConfigError::invalid_value(*field, "must be greater than zero"));
        }

        for (field, value) in [
            ("server.ready_path", &self.server.ready_path),
            ("server.prefix", &self.server.prefix),
        ] {
            if !value.is_empty() && !value.starts_with('/') {
                return Err(ConfigError::invalid_value(field, "must start with `/`"));
            }
        }

        if self.logging.enabled {
            switchyard_telemetry::create_env_filter(&self.logging.level)
                .map_err(|e| ConfigError::invalid_value("logging.level", e.to_string()))?;
        }

        Ok(())
    }

    /// Debug logging, pretty output and verbose request lines.
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();
        config.server.verbose = true;
        config.logging.level = "debug".to_string();
        config.logging.format = LogFormat::Pretty;
        config
    }

    /// Info logging as JSON lines.
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();
        config.logging.level = "info".to_string();
        config.logging.format = LogFormat::Json;
        config
    }

    /// Builds the server settings.
    pub fn server_config(&self) -> ServerConfig {
        let server = &self.server;
        ServerConfig::builder()
            .listeners(
                server
                    .listeners
                    .iter()
                    .map(|l| ListenerSpec::new(l.addr.clone(), l.label.clone())),
            )
            .reuse_port(server.reuse_port)
            .workers(server.workers)
            .shutdown_timeout(Duration::from_secs(server.shutdown_timeout_secs))
            .read_timeout(Duration::from_millis(server.read_timeout_ms))
            .write_timeout(Duration::from_millis(server.write_timeout_ms))
            .idle_timeout(Duration::from_secs(server.idle_timeout_secs))
            .header_read_timeout(Duration::from_millis(server.header_read_timeout_ms))
            .verbose(server.verbose)
            .build()
    }

    /// Builds the logging settings, starting from the preset that matches
    /// the configured format.
    pub fn log_config(&self) -> LogConfig {
        let base = match self.logging.format {
            LogFormat::Json => LogConfig::production(),
            LogFormat::Pretty | LogFormat::Compact => LogConfig::development(),
        };
        LogConfig {
            enabled: self.logging.enabled,
            ..base
        }
        .with_level(self.logging.level.clone())
        .with_format(self.logging.format)
    }

    /// Applies the dispatcher-level settings: mount prefix, readiness
    /// endpoint and verbose request logging.
    pub fn apply_to(&self, builder: DispatcherBuilder) -> DispatcherBuilder {
        let mut builder = builder.verbose(self.server.verbose);
        if !self.server.prefix.is_empty() {
            builder = builder.prefix(&self.server.prefix);
        }
        if !self.server.ready_path.is_empty() {
            builder = builder.ready_endpoint(self.server.ready_path.clone());
        }
        builder
    }
}

fn check_host_port(addr: &str) -> Result<(), &'static str> {
    let (host, port) = addr.rsplit_once(':').ok_or("expected host:port")?;
    if host.is_empty() {
        return Err("missing host");
    }
    if host.starts_with('[') != host.ends_with(']') {
        return Err("unbalanced brackets around IPv6 host");
    }
    port.parse::<u16>().map(|_| ()).map_err(|_| "port must be 0-65535")
}
