//! # Switchyard Core
//!
//! Core types shared by the Switchyard dispatch engine:
//!
//! - [`Request`] / [`Response`] - buffered HTTP request and response types
//! - [`Handler`] - the handler trait, with [`handler_fn`] for closures
//! - [`Context`] - per-request state: routed path, parameters, extension data
//! - [`ContextPool`] - free-list pool handing out [`PooledContext`] guards
//! - [`catch_panic`] - converts a panicking handler future into a [`PanicError`]

#![doc(html_root_url = "https://docs.rs/switchyard-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod context;
mod error;
mod handler;
mod pool;
mod recovery;
mod types;

pub use context::{Context, CAPACITY_CEILING};
pub use error::{PanicError, PanicSite};
pub use handler::{handler_fn, BoxedHandler, FnHandler, Handler};
pub use pool::{ContextPool, ContextProvider, PoolStats, PooledContext, UnpooledProvider, DEFAULT_MAX_IDLE};
pub use recovery::{catch_panic, from_payload};
pub use types::{BoxFuture, RemoteAddr, Request, Response, ResponseExt};

/// Re-exported so handlers can name routing types without a direct dependency.
pub use switchyard_router as router;
