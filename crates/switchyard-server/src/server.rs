//! Multi-listener HTTP server.
//!
//! A [`Server`] serves one [`Dispatcher`] on every configured address.
//! Each address gets a group of listening sockets from
//! [`bind_listeners`](crate::listener::bind_listeners): one per worker when
//! port sharing is available, otherwise one. Each socket runs its own
//! accept loop, and each accepted connection runs as its own task over
//! Hyper's HTTP/1 connection driver.
//!
//! # Timeouts
//!
//! | Timeout | Applies to |
//! |---------|------------|
//! | header read | reading the request line and headers |
//! | read | collecting the request body |
//! | write | producing the response |
//! | idle | a keep-alive connection with no request in flight |
//!
//! # Shutdown
//!
//! When the shutdown signal fires, the readiness flag is cleared, accept
//! loops stop, and every connection is asked to finish its in-flight
//! request and close. Connections still open when the shutdown deadline
//! expires are dropped.
//!
//! # Example
//!
//! ```rust,no_run
//! use switchyard_server::{Dispatcher, Server, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let dispatcher = Dispatcher::builder().ready_endpoint("/ready").build()?;
//!     let config = ServerConfig::builder().listen("0.0.0.0:8080", "public").build();
//!
//!     Server::new(dispatcher, config).serve().await?;
//!     Ok(())
//! }
//! ```

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use http::header::CONNECTION;
use http::{HeaderValue, StatusCode};
use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};
use switchyard_core::{RemoteAddr, Request, Response, ResponseExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinSet;
use tokio::time::Instant;

use crate::config::ServerConfig;
use crate::dispatcher::Dispatcher;
use crate::error::ServerError;
use crate::listener::{bind_listeners, resolve_addr, ListenerGroup};
use crate::shutdown::{ConnectionTracker, ShutdownSignal};

/// Pause after a failed `accept` before trying again.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(50);

/// How long to wait for force-closed connections to unwind.
const FORCE_CLOSE_GRACE: Duration = Duration::from_secs(1);

/// An HTTP server for one [`Dispatcher`].
#[derive(Debug)]
pub struct Server {
    dispatcher: Arc<Dispatcher>,
    config: ServerConfig,
}

impl Server {
    /// Creates a server.
    #[must_use]
    pub fn new(dispatcher: Dispatcher, config: ServerConfig) -> Self {
        Self::from_shared(Arc::new(dispatcher), config)
    }

    /// Creates a server for a dispatcher that is also used elsewhere.
    #[must_use]
    pub fn from_shared(dispatcher: Arc<Dispatcher>, config: ServerConfig) -> Self {
        Self { dispatcher, config }
    }

    /// The dispatcher being served.
    #[must_use]
    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// The server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Binds every configured listener.
    ///
    /// All addresses are bound before any is served, so a bad address
    /// fails setup without leaving other listeners running.
    pub fn bind(self) -> Result<BoundServer, ServerError> {
        if self.config.listeners().is_empty() {
            return Err(ServerError::NoListeners);
        }

        let workers = self.config.workers();
        if self.config.verbose() {
            tracing::info!(workers, "using {workers} CPU core{}", if workers == 1 { "" } else { "s" });
        }

        let mut groups = Vec::with_capacity(self.config.listeners().len());
        for spec in self.config.listeners() {
            let addr = resolve_addr(&spec.addr)?;
            let group = bind_listeners(addr, workers, self.config.reuse_port())?;
            tracing::info!(
                listener = %spec.label,
                addr = %group.local_addr(),
                sockets = group.len(),
                reuse_port = group.is_shared(),
                "listening"
            );
            groups.push((spec.label.clone(), group));
        }

        Ok(BoundServer {
            dispatcher: self.dispatcher,
            config: self.config,
            groups,
        })
    }

    /// Serves until `SIGTERM` or `SIGINT`, then drains.
    pub async fn serve(self) -> Result<(), ServerError> {
        self.serve_with_shutdown(ShutdownSignal::with_os_signals()).await
    }

    /// Serves until `shutdown` is triggered, then drains.
    pub async fn serve_with_shutdown(self, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        self.bind()?.serve_with_shutdown(shutdown).await
    }
}

/// A server whose listeners are bound but not yet accepting.
#[derive(Debug)]
pub struct BoundServer {
    dispatcher: Arc<Dispatcher>,
    config: ServerConfig,
    groups: Vec<(String, ListenerGroup)>,
}

impl BoundServer {
    /// The bound address of each configured listener, in order.
    #[must_use]
    pub fn local_addrs(&self) -> Vec<SocketAddr> {
        self.groups.iter().map(|(_, group)| group.local_addr()).collect()
    }

    /// Total number of listening sockets.
    #[must_use]
    pub fn socket_count(&self) -> usize {
        self.groups.iter().map(|(_, group)| group.len()).sum()
    }

    /// Serves until `shutdown` is triggered, then drains.
    pub async fn serve_with_shutdown(self, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let Self {
            dispatcher,
            config,
            groups,
        } = self;

        let settings = ConnectionSettings::from(&config);
        let tracker = ConnectionTracker::new();
        let force = ShutdownSignal::new();
        let mut loops = JoinSet::new();

        for (label, group) in groups {
            let label: Arc<str> = label.into();
            for socket in group.into_listeners() {
                let acceptor = Acceptor {
                    listener: TcpListener::from_std(socket)?,
                    label: Arc::clone(&label),
                    dispatcher: Arc::clone(&dispatcher),
                    settings,
                    tracker: tracker.clone(),
                    shutdown: shutdown.clone(),
                    force: force.clone(),
                };
                loops.spawn(acceptor.run());
            }
        }

        shutdown.recv().await;
        dispatcher.readiness().set_ready(false);
        tracing::info!(
            active = tracker.active_connections(),
            deadline_ms = u64::try_from(config.shutdown_timeout().as_millis()).unwrap_or(u64::MAX),
            "shutdown signal received, draining connections"
        );

        let drained = tokio::time::timeout(config.shutdown_timeout(), async {
            while loops.join_next().await.is_some() {}
            tracker.wait_idle().await;
        })
        .await;

        match drained {
            Ok(()) => tracing::info!("all connections closed"),
            Err(_) => {
                tracing::warn!(
                    active = tracker.active_connections(),
                    "shutdown deadline reached, closing remaining connections"
                );
                force.trigger();
                loops.abort_all();
                let _ = tokio::time::timeout(FORCE_CLOSE_GRACE, tracker.wait_idle()).await;
            }
        }

        tracing::info!("server stopped");
        Ok(())
    }
}

/// Per-connection timeouts.
#[derive(Debug, Clone, Copy)]
struct ConnectionSettings {
    read_timeout: Duration,
    write_timeout: Duration,
    idle_timeout: Duration,
    header_read_timeout: Duration,
}

impl From<&ServerConfig> for ConnectionSettings {
    fn from(config: &ServerConfig) -> Self {
        Self {
            read_timeout: config.read_timeout(),
            write_timeout: config.write_timeout(),
            idle_timeout: config.idle_timeout(),
            header_read_timeout: config.header_read_timeout(),
        }
    }
}

/// One accept loop.
struct Acceptor {
    listener: TcpListener,
    label: Arc<str>,
    dispatcher: Arc<Dispatcher>,
    settings: ConnectionSettings,
    tracker: ConnectionTracker,
    shutdown: ShutdownSignal,
    force: ShutdownSignal,
}

impl Acceptor {
    async fn run(self) {
        loop {
            tokio::select! {
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, remote)) => self.spawn_connection(stream, remote),
                    Err(error) => {
                        tracing::warn!(listener = %self.label, error = %error, "accept failed");
                        tokio::time::sleep(ACCEPT_BACKOFF).await;
                    }
                },
                () = self.shutdown.recv() => break,
            }
        }
        tracing::debug!(listener = %self.label, "accept loop stopped");
    }

    fn spawn_connection(&self, stream: TcpStream, remote: SocketAddr) {
        let token = self.tracker.acquire();
        let connection = Connection {
            dispatcher: Arc::clone(&self.dispatcher),
            settings: self.settings,
            remote,
            shutdown: self.shutdown.clone(),
            force: self.force.clone(),
        };
        tokio::spawn(async move {
            connection.serve(stream).await;
            drop(token);
        });
    }
}

/// One accepted connection.
struct Connection {
    dispatcher: Arc<Dispatcher>,
    settings: ConnectionSettings,
    remote: SocketAddr,
    shutdown: ShutdownSignal,
    force: ShutdownSignal,
}

impl Connection {
    async fn serve(self, stream: TcpStream) {
        let Self {
            dispatcher,
            settings,
            remote,
            shutdown,
            force,
        } = self;
        let activity = Arc::new(Activity::new());

        let service = {
            let activity = Arc::clone(&activity);
            service_fn(move |request: http::Request<Incoming>| {
                let dispatcher = Arc::clone(&dispatcher);
                let activity = Arc::clone(&activity);
                async move {
                    let _busy = Activity::begin(&activity);
                    Ok::<_, Infallible>(handle_request(&dispatcher, request, remote, settings).await)
                }
            })
        };

        let mut builder = http1::Builder::new();
        builder
            .timer(TokioTimer::new())
            .header_read_timeout(settings.header_read_timeout);
        let conn = builder.serve_connection(TokioIo::new(stream), service);
        tokio::pin!(conn);

        let mut draining = false;
        loop {
            tokio::select! {
                result = conn.as_mut() => {
                    if let Err(error) = result {
                        tracing::debug!(remote = %remote, error = %error, "connection error");
                    }
                    return;
                }
                () = shutdown.recv(), if !draining => {
                    draining = true;
                    conn.as_mut().graceful_shutdown();
                }
                () = activity.idle_for(settings.idle_timeout), if !draining => {
                    tracing::debug!(remote = %remote, "closing idle connection");
                    draining = true;
                    conn.as_mut().graceful_shutdown();
                }
                () = force.recv() => {
                    tracing::debug!(remote = %remote, "connection force-closed");
                    return;
                }
            }
        }
    }
}

/// Request activity on one connection, for the idle timeout.
struct Activity {
    opened: Instant,
    last_ms: AtomicU64,
    in_flight: AtomicUsize,
}

impl Activity {
    fn new() -> Self {
        Self {
            opened: Instant::now(),
            last_ms: AtomicU64::new(0),
            in_flight: AtomicUsize::new(0),
        }
    }

    fn touch(&self) {
        let elapsed = u64::try_from(self.opened.elapsed().as_millis()).unwrap_or(u64::MAX);
        self.last_ms.store(elapsed, Ordering::Relaxed);
    }

    fn begin(this: &Arc<Self>) -> Busy {
        this.in_flight.fetch_add(1, Ordering::SeqCst);
        this.touch();
        Busy(Arc::clone(this))
    }

    /// Resolves once no request has been in flight for `limit`.
    async fn idle_for(&self, limit: Duration) {
        loop {
            let last = self.opened + Duration::from_millis(self.last_ms.load(Ordering::Relaxed));
            let quiet = Instant::now().saturating_duration_since(last);
            if self.in_flight.load(Ordering::SeqCst) == 0 && quiet >= limit {
                return;
            }
            tokio::time::sleep(limit.saturating_sub(quiet).max(Duration::from_millis(10))).await;
        }
    }
}

/// Marks a request in flight until dropped.
struct Busy(Arc<Activity>);

impl Drop for Busy {
    fn drop(&mut self) {
        self.0.touch();
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Buffers the body, attaches the peer address, and dispatches.
async fn handle_request(
    dispatcher: &Dispatcher,
    request: http::Request<Incoming>,
    remote: SocketAddr,
    settings: ConnectionSettings,
) -> Response {
    let (mut parts, body) = request.into_parts();

    let body = match tokio::time::timeout(settings.read_timeout, body.collect()).await {
        Ok(Ok(collected)) => collected.to_bytes(),
        Ok(Err(error)) => {
            tracing::debug!(remote = %remote, error = %error, "failed to read request body");
            return closing(StatusCode::BAD_REQUEST, "400 bad request");
        }
        Err(_) => {
            tracing::debug!(remote = %remote, "request body read timed out");
            return closing(StatusCode::REQUEST_TIMEOUT, "408 request timeout");
        }
    };

    parts.extensions.insert(RemoteAddr(remote));
    let request = Request::from_parts(parts, body);

    match tokio::time::timeout(settings.write_timeout, dispatcher.dispatch(request)).await {
        Ok(response) => response,
        Err(_) => {
            tracing::warn!(remote = %remote, "response not produced before the write timeout");
            closing(StatusCode::SERVICE_UNAVAILABLE, "503 service unavailable")
        }
    }
}

/// A plain-text response that also closes the connection.
fn closing(status: StatusCode, body: &'static str) -> Response {
    let mut response = Response::text(status, body);
    response
        .headers_mut()
        .insert(CONNECTION, HeaderValue::from_static("close"));
    response
}
