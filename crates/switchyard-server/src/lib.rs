//! # Switchyard Server
//!
//! Request dispatch and the HTTP server for Switchyard.
//!
//! - [`Dispatcher`] - routes one request to its handler through the
//!   middleware chain, with panic containment and 404/405 handling
//! - [`Server`] - serves a dispatcher on one or more addresses, with
//!   port-sharing listener groups and graceful shutdown
//! - [`bind_listeners`] - the listener factory behind the server
//! - [`Readiness`] - the shared flag behind the readiness endpoint
//!
//! ## Example
//!
//! ```rust,no_run
//! use switchyard_core::{handler_fn, Response, ResponseExt};
//! use switchyard_server::{Dispatcher, Server, ServerConfig, ShutdownSignal};
//! use http::StatusCode;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let dispatcher = Dispatcher::builder()
//!         .route("/hello/<name>", "GET", handler_fn(|ctx, _req| {
//!             Box::pin(async move {
//!                 let name = ctx.param("name").unwrap_or("world").to_string();
//!                 Response::text(StatusCode::OK, format!("hello {name}"))
//!             })
//!         }))?
//!         .use_defaults()
//!         .ready_endpoint("/ready")
//!         .build()?;
//!
//!     let config = ServerConfig::builder().listen("127.0.0.1:8080", "local").build();
//!     let shutdown = ShutdownSignal::with_os_signals();
//!     Server::new(dispatcher, config).serve_with_shutdown(shutdown).await?;
//!     Ok(())
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/switchyard-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod dispatcher;
pub mod listener;
pub mod readiness;
pub mod server;
pub mod shutdown;

mod error;

pub use config::{ListenerSpec, ServerConfig, ServerConfigBuilder};
pub use dispatcher::{Dispatcher, DispatcherBuilder, DEFAULT_READY_PATH};
pub use error::ServerError;
pub use listener::{bind_listeners, resolve_addr, ListenerGroup};
pub use readiness::Readiness;
pub use server::{BoundServer, Server};
pub use shutdown::{ConnectionToken, ConnectionTracker, ShutdownReceiver, ShutdownSignal};
