//! Configuration schema types.
//!
//! Every section rejects unknown fields and fills missing ones with the
//! defaults below.

use serde::{Deserialize, Serialize};
use switchyard_telemetry::LogFormat;

/// One listening address.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ListenerEntry {
    /// `host:port` to bind.
    pub addr: String,

    /// Name used in log lines.
    #[serde(default = "default_label")]
    pub label: String,
}

impl ListenerEntry {
    /// Creates a listener entry.
    pub fn new(addr: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            label: label.into(),
        }
    }
}

fn default_label() -> String {
    "default".to_string()
}

/// `[server]` section.
///
/// ```
/// use switchyard_config::ServerSection;
///
/// let server = ServerSection::default();
/// assert_eq!(server.listeners[0].addr, "127.0.0.1:8080");
/// assert_eq!(server.read_timeout_ms, 5_000);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    /// Addresses to serve on.
    #[serde(default = "default_listeners")]
    pub listeners: Vec<ListenerEntry>,

    /// Per-request log lines and startup banners.
    #[serde(default)]
    pub verbose: bool,

    /// Open one port-sharing socket per worker.
    #[serde(default = "default_reuse_port")]
    pub reuse_port: bool,

    /// Worker count override. `0` uses the number of CPU cores.
    #[serde(default)]
    pub workers: usize,

    /// Drain deadline after shutdown begins.
    #[serde(default = "default_shutdown_timeout_secs")]
    pub shutdown_timeout_secs: u64,

    /// Deadline for reading a request body.
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,

    /// Deadline for producing a response.
    #[serde(default = "default_write_timeout_ms")]
    pub write_timeout_ms: u64,

    /// Keep-alive idle limit.
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,

    /// Deadline for reading request headers.
    #[serde(default = "default_header_read_timeout_ms")]
    pub header_read_timeout_ms: u64,

    /// Readiness endpoint path. Empty disables it.
    #[serde(default = "default_ready_path")]
    pub ready_path: String,

    /// Mount prefix stripped before routing. Empty means none.
    #[serde(default)]
    pub prefix: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listeners: default_listeners(),
            verbose: false,
            reuse_port: default_reuse_port(),
            workers: 0,
            shutdown_timeout_secs: default_shutdown_timeout_secs(),
            read_timeout_ms: default_read_timeout_ms(),
            write_timeout_ms: default_write_timeout_ms(),
            idle_timeout_secs: default_idle_timeout_secs(),
            header_read_timeout_ms: default_header_read_timeout_ms(),
            ready_path: default_ready_path(),
            prefix: String::new(),
        }
    }
}

fn default_listeners() -> Vec<ListenerEntry> {
    vec![ListenerEntry::new(
        switchyard_server::config::DEFAULT_ADDR,
        default_label(),
    )]
}

fn default_reuse_port() -> bool {
    cfg!(unix)
}

fn default_shutdown_timeout_secs() -> u64 {
    5
}

fn default_read_timeout_ms() -> u64 {
    5_000
}

fn default_write_timeout_ms() -> u64 {
    10_000
}

fn default_idle_timeout_secs() -> u64 {
    120
}

fn default_header_read_timeout_ms() -> u64 {
    2_000
}

fn default_ready_path() -> String {
    switchyard_server::DEFAULT_READY_PATH.to_string()
}

/// `[logging]` section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingSection {
    /// Enable logging.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Filter directives (trace, debug, info, warn, error, or per-target).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Line format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}
