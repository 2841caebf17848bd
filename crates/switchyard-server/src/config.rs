//! Server configuration.
//!
//! [`ServerConfig`] describes which addresses to listen on and the
//! timeouts applied to every connection. Build one with
//! [`ServerConfig::builder`].
//!
//! # Example
//!
//! ```rust
//! use switchyard_server::ServerConfig;
//! use std::time::Duration;
//!
//! let config = ServerConfig::builder()
//!     .listen("0.0.0.0:8080", "public")
//!     .listen("127.0.0.1:9090", "admin")
//!     .shutdown_timeout(Duration::from_secs(10))
//!     .build();
//!
//! assert_eq!(config.listeners().len(), 2);
//! assert_eq!(config.listeners()[1].label, "admin");
//! ```

use std::num::NonZeroUsize;
use std::time::Duration;

/// Default listen address when none is configured.
pub const DEFAULT_ADDR: &str = "127.0.0.1:8080";

/// Default time allowed to read a request body.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Default time allowed to produce a response.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(10);

/// Default time a keep-alive connection may sit idle.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(120);

/// Default time allowed to read request headers.
pub const DEFAULT_HEADER_READ_TIMEOUT: Duration = Duration::from_secs(2);

/// Default drain deadline after a shutdown signal.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// One address to serve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerSpec {
    /// `host:port` to bind
    pub addr: String,
    /// Name used in log output
    pub label: String,
}

impl ListenerSpec {
    /// Creates a listener spec.
    pub fn new(addr: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            label: label.into(),
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    listeners: Vec<ListenerSpec>,
    reuse_port: bool,
    workers: Option<NonZeroUsize>,
    read_timeout: Duration,
    write_timeout: Duration,
    idle_timeout: Duration,
    header_read_timeout: Duration,
    shutdown_timeout: Duration,
    verbose: bool,
}

impl ServerConfig {
    /// Creates a configuration builder.
    #[must_use]
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }

    /// The configured listeners, or the default address if none were set.
    #[must_use]
    pub fn listeners(&self) -> &[ListenerSpec] {
        &self.listeners
    }

    /// Whether to open one port-sharing listener per worker.
    #[must_use]
    pub fn reuse_port(&self) -> bool {
        self.reuse_port
    }

    /// Listeners opened per address when port sharing is available.
    ///
    /// Defaults to the available CPU parallelism.
    #[must_use]
    pub fn workers(&self) -> usize {
        self.workers.map_or_else(
            || std::thread::available_parallelism().map_or(1, NonZeroUsize::get),
            NonZeroUsize::get,
        )
    }

    /// Time allowed to read a request body.
    #[must_use]
    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    /// Time allowed to produce a response.
    #[must_use]
    pub fn write_timeout(&self) -> Duration {
        self.write_timeout
    }

    /// Time a keep-alive connection may sit idle between requests.
    #[must_use]
    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    /// Time allowed to read request headers.
    #[must_use]
    pub fn header_read_timeout(&self) -> Duration {
        self.header_read_timeout
    }

    /// Drain deadline after a shutdown signal.
    #[must_use]
    pub fn shutdown_timeout(&self) -> Duration {
        self.shutdown_timeout
    }

    /// Whether to log startup banners.
    #[must_use]
    pub fn verbose(&self) -> bool {
        self.verbose
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Builder for [`ServerConfig`].
#[derive(Debug, Clone)]
pub struct ServerConfigBuilder {
    listeners: Vec<ListenerSpec>,
    reuse_port: bool,
    workers: Option<NonZeroUsize>,
    read_timeout: Duration,
    write_timeout: Duration,
    idle_timeout: Duration,
    header_read_timeout: Duration,
    shutdown_timeout: Duration,
    verbose: bool,
}

impl Default for ServerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerConfigBuilder {
    /// Creates a builder with the default timeouts and no listeners.
    #[must_use]
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
            reuse_port: cfg!(unix),
            workers: None,
            read_timeout: DEFAULT_READ_TIMEOUT,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            header_read_timeout: DEFAULT_HEADER_READ_TIMEOUT,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
            verbose: false,
        }
    }

    /// Adds an address to serve.
    #[must_use]
    pub fn listen(mut self, addr: impl Into<String>, label: impl Into<String>) -> Self {
        self.listeners.push(ListenerSpec::new(addr, label));
        self
    }

    /// Adds several listener specs.
    #[must_use]
    pub fn listeners(mut self, listeners: impl IntoIterator<Item = ListenerSpec>) -> Self {
        self.listeners.extend(listeners);
        self
    }

    /// Enables or disables port-sharing listeners.
    ///
    /// Enabled by default on Unix. When the socket option is unavailable
    /// the server falls back to one listener per address either way.
    #[must_use]
    pub fn reuse_port(mut self, enabled: bool) -> Self {
        self.reuse_port = enabled;
        self
    }

    /// Overrides the number of listeners per address. Zero means the
    /// available parallelism.
    #[must_use]
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = NonZeroUsize::new(workers);
        self
    }

    /// Sets the request body read timeout.
    #[must_use]
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Sets the response timeout.
    #[must_use]
    pub fn write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    /// Sets the keep-alive idle timeout.
    #[must_use]
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Sets the header read timeout.
    #[must_use]
    pub fn header_read_timeout(mut self, timeout: Duration) -> Self {
        self.header_read_timeout = timeout;
        self
    }

    /// Sets the drain deadline.
    #[must_use]
    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Enables startup banners.
    #[must_use]
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Builds the configuration.
    ///
    /// With no listeners configured, serves [`DEFAULT_ADDR`].
    #[must_use]
    pub fn build(self) -> ServerConfig {
        let listeners = if self.listeners.is_empty() {
            vec![ListenerSpec::new(DEFAULT_ADDR, "default")]
        } else {
            self.listeners
        };

        ServerConfig {
            listeners,
            reuse_port: self.reuse_port,
            workers: self.workers,
            read_timeout: self.read_timeout,
            write_timeout: self.write_timeout,
            idle_timeout: self.idle_timeout,
            header_read_timeout: self.header_read_timeout,
            shutdown_timeout: self.shutdown_timeout,
            verbose: self.verbose,
        }
    }
}
