//! # Switchyard Middleware
//!
//! The middleware chain for Switchyard, plus a set of stock stages.
//!
//! Middleware wraps a matched route's handler. Registration order is
//! nesting order: the first middleware registered sees the request first
//! and the response last.
//!
//! ```text
//! Request → m1 → m2 → handler
//!                        ↓
//! Response ← m1 ← m2 ←──┘
//! ```
//!
//! A middleware may answer on its own instead of calling [`Next::run`].
//! Doing so does not stop anything by itself; stages that short-circuit
//! call [`Context::abort`](switchyard_core::Context::abort) so that
//! downstream observers can tell.
//!
//! ## Stock stages
//!
//! | Stage | Purpose |
//! |-------|---------|
//! | [`GetHead`](stages::GetHead) | rewrite `HEAD` to `GET` |
//! | [`CleanPath`](stages::CleanPath) | normalize the path the handler sees |
//! | [`RequestId`](stages::RequestId) | propagate or generate `X-Request-ID` |
//! | [`RealIp`](stages::RealIp) | resolve the client address |
//! | [`NoCache`](stages::NoCache) | uncacheable responses |
//! | [`AllowContentType`](stages::AllowContentType) | 415 for other media types |
//! | [`ContentCharset`](stages::ContentCharset) | 415 for other charsets |
//! | [`Cors`](stages::Cors) | CORS headers and preflight |
//! | [`RateLimit`](stages::RateLimit) | 429 for rapid repeats |
//! | `Compress` | gzip bodies (feature `compression`) |
//!
//! ## Example
//!
//! ```
//! use switchyard_middleware::{stages, MiddlewareChain};
//! use std::time::Duration;
//!
//! let mut chain = stages::defaults();
//! chain.push(stages::RateLimit::new(Duration::from_millis(250)));
//! assert_eq!(chain.names()[0], "get_head");
//! ```

#![doc(html_root_url = "https://docs.rs/switchyard-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod chain;
pub mod middleware;
pub mod stages;

pub use chain::MiddlewareChain;
pub use middleware::{BoxedMiddleware, FnMiddleware, Middleware, Next};
