//! Configuration loader with layered approach.
//!
//! This module provides the [`ConfigLoader`] for loading configuration from
//! multiple sources: defaults, files, and environment variables.

use std::env;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use switchyard_telemetry::LogFormat;

use crate::{ConfigError, ListenerEntry, SwitchyardConfig};

/// Configuration loader with layered approach.
///
/// The loader applies configuration in layers, with later layers overriding
/// earlier ones:
/// 1. Default values (built into the code)
/// 2. Configuration file (TOML or JSON)
/// 3. Environment variables
///
/// # Example
///
/// ```no_run
/// use switchyard_config::ConfigLoader;
///
/// # fn main() -> Result<(), switchyard_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_defaults()
///     .with_file("switchyard.toml")?
///     .with_env_prefix("SWITCHYARD")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: SwitchyardConfig,
    env_prefix: Option<String>,
    file_loaded: bool,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new configuration loader.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: SwitchyardConfig::default(),
            env_prefix: None,
            file_loaded: false,
        }
    }

    /// Start with default configuration values.
    ///
    /// This is called automatically by `new()`, but can be chained for clarity.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        self.config = SwitchyardConfig::default();
        self
    }

    /// Start with the development preset.
    ///
    /// ```
    /// use switchyard_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new().with_development().load().unwrap();
    /// assert!(config.server.verbose);
    /// assert_eq!(config.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = SwitchyardConfig::development();
        self
    }

    /// Start with the production preset.
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = SwitchyardConfig::production();
        self
    }

    /// Load configuration from a file.
    ///
    /// The format is chosen by extension: `.toml` or `.json`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - The file does not exist
    /// - The file cannot be read
    /// - The file contains invalid TOML/JSON
    /// - The file contains unknown fields
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;

        self.config = Self::parse_file(&content, path)?;
        self.file_loaded = true;

        Ok(self)
    }

    /// Load configuration from a file if it exists.
    ///
    /// # Errors
    ///
    /// Same as [`with_file`](Self::with_file) once the file exists.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Load configuration from a string in the given format (`toml` or `json`).
    ///
    /// ```
    /// use switchyard_config::ConfigLoader;
    ///
    /// let toml = r#"
    ///     [[server.listeners]]
    ///     addr = "0.0.0.0:3000"
    ///     label = "public"
    /// "#;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string(toml, "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.server.listeners[0].label, "public");
    /// ```
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        self.config = match format.to_lowercase().as_str() {
            "toml" => toml::from_str(content)?,
            "json" => serde_json::from_str(content)?,
            _ => {
                return Err(ConfigError::validation_error(format!(
                    "unsupported configuration format: {format}"
                )))
            }
        };
        Ok(self)
    }

    /// Set environment variable prefix for overrides.
    ///
    /// Variables use the format `PREFIX__SECTION__KEY`, for example
    /// `SWITCHYARD__SERVER__WORKERS=4` or `SWITCHYARD__LOGGING__FORMAT=pretty`.
    /// `PREFIX__SERVER__LISTENERS` replaces the listener list with a
    /// comma-separated list of `label=addr` or bare `addr` entries.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Whether a configuration file was loaded.
    #[must_use]
    pub fn file_loaded(&self) -> bool {
        self.file_loaded
    }

    /// Finalize and return the loaded configuration.
    ///
    /// Applies environment variable overrides (if a prefix was set) and
    /// validates the final configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if an override does not parse or validation fails.
    pub fn load(mut self) -> Result<SwitchyardConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            self.apply_env_overrides(&prefix, env::vars())?;
        }

        self.config.validate()?;

        Ok(self.config)
    }

    /// Finalize without validation.
    #[must_use]
    pub fn load_unvalidated(self) -> SwitchyardConfig {
        self.config
    }

    // Parse configuration file based on extension
    fn parse_file(content: &str, path: &Path) -> Result<SwitchyardConfig, ConfigError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);

        match extension.as_deref() {
            Some("toml") => Ok(toml::from_str(content)?),
            Some("json") => Ok(serde_json::from_str(content)?),
            _ => Err(ConfigError::validation_error(format!(
                "unsupported configuration file format: {}",
                path.display()
            ))),
        }
    }

    fn apply_env_overrides(
        &mut self,
        prefix: &str,
        vars: impl IntoIterator<Item = (String, String)>,
    ) -> Result<(), ConfigError> {
        let scoped = format!("{prefix}__");
        let mut matching: Vec<(String, String)> = vars
            .into_iter()
            .filter(|(k, _)| k.starts_with(&scoped))
            .collect();
        // Deterministic order for error reporting.
        matching.sort();

        for (key, value) in matching {
            self.apply_env_var(&key, &value, prefix)?;
        }

        Ok(())
    }

    fn apply_env_var(&mut self, key: &str, value: &str, prefix: &str) -> Result<(), ConfigError> {
        let key_without_prefix = key
            .strip_prefix(prefix)
            .and_then(|k| k.strip_prefix("__"))
            .ok_or_else(|| ConfigError::env_parse_error(key, "invalid key format"))?;

        let parts: Vec<&str> = key_without_prefix.split("__").collect();
        let server = &mut self.config.server;
        let logging = &mut self.config.logging;

        match parts.as_slice() {
            ["SERVER", "LISTENERS"] => server.listeners = parse_listeners(key, value)?,
            ["SERVER", "VERBOSE"] => server.verbose = parse_bool_var(key, value)?,
            ["SERVER", "REUSE_PORT"] => server.reuse_port = parse_bool_var(key, value)?,
            ["SERVER", "WORKERS"] => server.workers = parse_number(key, value)?,
            ["SERVER", "SHUTDOWN_TIMEOUT_SECS"] => server.shutdown_timeout_secs = parse_number(key, value)?,
            ["SERVER", "READ_TIMEOUT_MS"] => server.read_timeout_ms = parse_number(key, value)?,
            ["SERVER", "WRITE_TIMEOUT_MS"] => server.write_timeout_ms = parse_number(key, value)?,
            ["SERVER", "IDLE_TIMEOUT_SECS"] => server.idle_timeout_secs = parse_number(key, value)?,
            ["SERVER", "HEADER_READ_TIMEOUT_MS"] => {
                server.header_read_timeout_ms = parse_number(key, value)?;
            }
            ["SERVER", "READY_PATH"] => server.ready_path = value.to_string(),
            ["SERVER", "PREFIX"] => server.prefix = value.to_string(),

            ["LOGGING", "ENABLED"] => logging.enabled = parse_bool_var(key, value)?,
            ["LOGGING", "LEVEL"] => logging.level = value.to_string(),
            ["LOGGING", "FORMAT"] => {
                logging.format = LogFormat::from_str(value)
                    .map_err(|_| ConfigError::env_parse_error(key, "expected 'json', 'pretty' or 'compact'"))?;
            }

            // Unknown keys are ignored so unrelated variables can share the prefix.
            _ => {}
        }

        Ok(())
    }
}

fn parse_listeners(key: &str, value: &str) -> Result<Vec<ListenerEntry>, ConfigError> {
    let listeners: Vec<ListenerEntry> = value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| match entry.split_once('=') {
            Some((label, addr)) => ListenerEntry::new(addr.trim(), label.trim()),
            None => ListenerEntry::new(entry, "default"),
        })
        .collect();

    if listeners.is_empty() {
        return Err(ConfigError::env_parse_error(key, "expected at least one listener"));
    }
    Ok(listeners)
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::env_parse_error(key, "expected integer"))
}

fn parse_bool_var(key: &str, value: &str) -> Result<bool, ConfigError> {
    parse_bool(value).ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))
}

/// Parse a boolean from a string.
fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_loader_new() {
        let config = ConfigLoader::new().load().unwrap();
        assert_eq!(config, SwitchyardConfig::default());
    }

    #[test]
    fn test_loader_with_production() {
        let config = ConfigLoader::new().with_production().load().unwrap();
        assert_eq!(config.logging.format, LogFormat::Json);
        assert!(!config.server.verbose);
    }

    #[test]
    fn test_loader_with_string_json() {
        let json = r#"{"server": {"listeners": [{"addr": "127.0.0.1:3000", "label": "api"}], "workers": 2}}"#;

        let config = ConfigLoader::new()
            .with_string(json, "json")
            .unwrap()
            .load()
            .unwrap();

        assert_eq!(config.server.listeners[0].addr, "127.0.0.1:3000");
        assert_eq!(config.server.workers, 2);
    }

    #[test]
    fn test_loader_rejects_unknown_format() {
        assert!(ConfigLoader::new().with_string("", "yaml").is_err());
    }

    #[test]
    fn test_loader_with_file_not_found() {
        let result = ConfigLoader::new().with_file("/nonexistent/switchyard.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound { .. })));
    }

    #[test]
    fn test_loader_with_optional_file_not_found() {
        let loader = ConfigLoader::new()
            .with_optional_file("/nonexistent/switchyard.toml")
            .unwrap();
        assert!(!loader.file_loaded());
        assert_eq!(loader.load().unwrap(), SwitchyardConfig::default());
    }

    #[test]
    fn test_loader_with_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
            [server]
            verbose = true
            reuse_port = false
            shutdown_timeout_secs = 10
            read_timeout_ms = 1500
            prefix = "/api"

            [[server.listeners]]
            addr = "0.0.0.0:8080"
            label = "public"

            [[server.listeners]]
            addr = "127.0.0.1:9090"
            label = "admin"

            [logging]
            level = "switchyard_server=debug,info"
            format = "pretty"
            "#
        )
        .unwrap();

        let loader = ConfigLoader::new().with_file(file.path()).unwrap();
        assert!(loader.file_loaded());
        let config = loader.load().unwrap();

        assert!(config.server.verbose);
        assert!(!config.server.reuse_port);
        assert_eq!(config.server.listeners.len(), 2);
        assert_eq!(config.server.listeners[1], ListenerEntry::new("127.0.0.1:9090", "admin"));
        assert_eq!(config.server.read_timeout_ms, 1500);
        assert_eq!(config.server.write_timeout_ms, 10_000);
        assert_eq!(config.server.prefix, "/api");
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_loader_rejects_unknown_field_in_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[server]\nmax_connections = 10").unwrap();

        let result = ConfigLoader::new().with_file(file.path());
        assert!(matches!(result, Err(ConfigError::TomlError(_))));
    }

    #[test]
    fn test_loader_rejects_unsupported_extension() {
        let file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        let result = ConfigLoader::new().with_file(file.path());
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_load_validates() {
        let result = ConfigLoader::new()
            .with_string("[server]\nidle_timeout_secs = 0", "toml")
            .unwrap()
            .load();
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("on"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("No"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
        assert_eq!(parse_bool(""), None);
    }

    // Overrides are fed explicitly; mutating the process environment
    // requires unsafe code, which the workspace forbids.

    #[test]
    fn test_env_overrides() {
        let mut loader = ConfigLoader::new();
        loader
            .apply_env_overrides(
                "TEST",
                vars(&[
                    ("TEST__SERVER__WORKERS", "4"),
                    ("TEST__SERVER__VERBOSE", "yes"),
                    ("TEST__SERVER__READ_TIMEOUT_MS", "750"),
                    ("TEST__SERVER__PREFIX", "/v1"),
                    ("TEST__LOGGING__FORMAT", "compact"),
                    ("TEST__LOGGING__LEVEL", "warn"),
                    ("OTHER__SERVER__WORKERS", "9"),
                    ("TEST__SERVER__UNKNOWN", "ignored"),
                ]),
            )
            .unwrap();

        let config = loader.load_unvalidated();
        assert_eq!(config.server.workers, 4);
        assert!(config.server.verbose);
        assert_eq!(config.server.read_timeout_ms, 750);
        assert_eq!(config.server.prefix, "/v1");
        assert_eq!(config.logging.format, LogFormat::Compact);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_env_listeners() {
        let mut loader = ConfigLoader::new();
        loader
            .apply_env_var(
                "TEST__SERVER__LISTENERS",
                "public=0.0.0.0:80, 127.0.0.1:9000",
                "TEST",
            )
            .unwrap();

        let config = loader.load_unvalidated();
        assert_eq!(
            config.server.listeners,
            vec![
                ListenerEntry::new("0.0.0.0:80", "public"),
                ListenerEntry::new("127.0.0.1:9000", "default"),
            ]
        );
    }

    #[test]
    fn test_env_empty_listeners_rejected() {
        let mut loader = ConfigLoader::new();
        assert!(loader.apply_env_var("TEST__SERVER__LISTENERS", " , ", "TEST").is_err());
    }

    #[test]
    fn test_env_invalid_values() {
        let mut loader = ConfigLoader::new();
        assert!(loader.apply_env_var("TEST__SERVER__WORKERS", "many", "TEST").is_err());
        assert!(loader.apply_env_var("TEST__SERVER__REUSE_PORT", "perhaps", "TEST").is_err());
        assert!(loader.apply_env_var("TEST__LOGGING__FORMAT", "xml", "TEST").is_err());
    }
}
