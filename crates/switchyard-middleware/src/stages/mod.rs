//! Stock middleware stages.
//!
//! None of these run unless registered. [`defaults`] returns the common
//! baseline:
//!
//! 1. [`GetHead`] - serve `HEAD` through `GET` handlers
//! 2. [`RequestId`] - propagate or generate `X-Request-ID`
//! 3. [`RealIp`] - resolve the client address
//! 4. [`NoCache`] - mark responses uncacheable
//!
//! The remaining stages are opt-in: [`CleanPath`], [`AllowContentType`],
//! [`ContentCharset`], [`Cors`], [`RateLimit`], and (with the
//! `compression` feature) [`Compress`].

#[cfg(feature = "compression")]
pub mod compression;
pub mod clean_path;
pub mod content_type;
pub mod cors;
pub mod get_head;
pub mod no_cache;
pub mod rate_limit;
pub mod real_ip;
pub mod request_id;

#[cfg(feature = "compression")]
pub use compression::Compress;
pub use clean_path::CleanPath;
pub use content_type::{AllowContentType, ContentCharset};
pub use cors::{Cors, CorsBuilder};
pub use get_head::GetHead;
pub use no_cache::NoCache;
pub use rate_limit::{RateLimit, RateLimitBuilder};
pub use real_ip::{real_ip, RealIp, REAL_IP_KEY};
pub use request_id::{request_id, RequestId, REQUEST_ID_HEADER, REQUEST_ID_KEY};

use crate::chain::MiddlewareChain;

/// The baseline chain: [`GetHead`], [`RequestId`], [`RealIp`], [`NoCache`].
#[must_use]
pub fn defaults() -> MiddlewareChain {
    let mut chain = MiddlewareChain::new();
    chain.push(GetHead);
    chain.push(RequestId::new());
    chain.push(RealIp);
    chain.push(NoCache);
    chain
}
