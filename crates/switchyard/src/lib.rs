//! # Switchyard
//!
//! **An embeddable HTTP dispatch engine.**
//!
//! - Radix-tree routing with typed path segments (`<id:isDigits>`,
//!   `<slug:[a-z0-9\-]+>`, `<rest:.*>`) and an O(1) static-path table
//! - Correct 404/405 handling with a computed `Allow` header
//! - A middleware chain wrapping matched routes, plus stock stages
//! - Pooled per-request contexts
//! - Panic containment: a failing handler becomes a 500 (or a custom
//!   recovery response) without touching other requests
//! - Multi-listener serving with port-sharing socket groups and graceful
//!   shutdown
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use switchyard::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let dispatcher = Dispatcher::builder()
//!         .route("/user/<id:isDigits>", "GET", handler_fn(|ctx, _req| {
//!             Box::pin(async move {
//!                 let id = ctx.param("id").unwrap_or_default().to_string();
//!                 Response::text(StatusCode::OK, id)
//!             })
//!         }))?
//!         .use_chain(stages::defaults())
//!         .build()?;
//!
//!     let config = ServerConfig::builder().listen("0.0.0.0:8080", "public").build();
//!     Server::new(dispatcher, config).serve().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Request flow
//!
//! ```text
//! accept → Context from pool → strip prefix → resolve
//!            ├─ Matched          → middleware → handler   (panic guarded)
//!            ├─ MethodNotAllowed → 405 + Allow
//!            └─ NotFound         → custom handler or 404   (panic guarded)
//!        → Context back to pool
//! ```

#![doc(html_root_url = "https://docs.rs/switchyard/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub use switchyard_config as config;
pub use switchyard_core as core;
pub use switchyard_middleware as middleware;
pub use switchyard_router as router;
pub use switchyard_server as server;
pub use switchyard_telemetry as telemetry;

/// Common imports.
///
/// ```rust
/// use switchyard::prelude::*;
/// ```
pub mod prelude {
    pub use http::{Method, StatusCode};

    pub use switchyard_config::{ConfigLoader, SwitchyardConfig};
    pub use switchyard_core::{
        handler_fn, BoxFuture, Context, Handler, RemoteAddr, Request, Response, ResponseExt,
    };
    pub use switchyard_middleware::{stages, FnMiddleware, Middleware, MiddlewareChain, Next};
    pub use switchyard_router::{MethodSet, RouteError};
    pub use switchyard_server::{
        Dispatcher, DispatcherBuilder, Server, ServerConfig, ServerError, ShutdownSignal,
    };
    pub use switchyard_telemetry::{init_logging, LogConfig, LogFormat};
}
