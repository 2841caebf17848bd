//! Repeat-request throttling.
//!
//! [`RateLimit`] rejects a request when the same client sent the same
//! method and path less than a threshold ago. The rejected request does
//! not refresh the timestamp, so a client that keeps retrying is let
//! through once the threshold has passed since its last accepted request.
//!
//! ## Client identity
//!
//! The client is the socket peer address. When the peer belongs to a
//! trusted proxy network, the first `X-Forwarded-For` hop is used instead,
//! falling back to `X-Real-IP`. Proxy headers from untrusted peers are
//! ignored.
//!
//! ## Example
//!
//! ```
//! use switchyard_middleware::stages::RateLimit;
//! use std::time::Duration;
//!
//! let limit = RateLimit::builder()
//!     .threshold(Duration::from_millis(500))
//!     .trusted_proxies(["10.0.0.0/8", "127.0.0.1"])
//!     .build();
//! # let _ = limit;
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use http::header::RETRY_AFTER;
use http::{HeaderValue, StatusCode};
use ipnet::IpNet;
use serde::Serialize;
use switchyard_core::{BoxFuture, Context, RemoteAddr, Request, Response, ResponseExt};
use tokio::time::Instant;

use crate::middleware::{Middleware, Next};

/// Default minimum spacing between identical requests.
pub const DEFAULT_THRESHOLD: Duration = Duration::from_secs(1);

/// Body of a `429` response.
#[derive(Debug, Serialize)]
struct Rejection {
    title: &'static str,
    message: &'static str,
    source: &'static str,
    error: &'static str,
    #[serde(rename = "statusCode")]
    status_code: u16,
}

const REJECTION: Rejection = Rejection {
    title: "too_many_requests",
    message: "Please slow down.",
    source: "",
    error: "",
    status_code: 429,
};

/// Rate limiting middleware.
#[derive(Debug)]
pub struct RateLimit {
    threshold: Duration,
    trusted: Vec<IpNet>,
    last_seen: DashMap<String, Instant>,
    started: Instant,
    last_prune_ms: AtomicU64,
}

/// Builder for [`RateLimit`].
#[derive(Debug, Clone)]
pub struct RateLimitBuilder {
    threshold: Duration,
    trusted: Vec<IpNet>,
}

impl Default for RateLimitBuilder {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            trusted: Vec::new(),
        }
    }
}

impl RateLimitBuilder {
    /// Creates a builder with [`DEFAULT_THRESHOLD`] and no trusted proxies.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the minimum spacing between identical requests.
    #[must_use]
    pub fn threshold(mut self, threshold: Duration) -> Self {
        self.threshold = threshold;
        self
    }

    /// Trusts proxy headers from peers in these networks.
    ///
    /// Accepts CIDR notation or bare addresses. Entries that parse as
    /// neither are skipped with a warning.
    #[must_use]
    pub fn trusted_proxies<I, S>(mut self, networks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for network in networks {
            let network = network.as_ref().trim();
            let parsed = network
                .parse::<IpNet>()
                .ok()
                .or_else(|| network.parse::<std::net::IpAddr>().ok().map(IpNet::from));
            match parsed {
                Some(net) => self.trusted.push(net),
                None => tracing::warn!(network, "ignoring unparsable trusted proxy network"),
            }
        }
        self
    }

    /// Builds the middleware.
    #[must_use]
    pub fn build(self) -> RateLimit {
        RateLimit {
            threshold: self.threshold,
            trusted: self.trusted,
            last_seen: DashMap::new(),
            started: Instant::now(),
            last_prune_ms: AtomicU64::new(0),
        }
    }
}

impl Default for RateLimit {
    fn default() -> Self {
        RateLimitBuilder::new().build()
    }
}

impl RateLimit {
    /// Creates a new rate limit builder.
    #[must_use]
    pub fn builder() -> RateLimitBuilder {
        RateLimitBuilder::new()
    }

    /// Creates a limiter with the given threshold and no trusted proxies.
    #[must_use]
    pub fn new(threshold: Duration) -> Self {
        RateLimitBuilder::new().threshold(threshold).build()
    }

    /// Resolves the client address used in the limiter key.
    fn client(&self, request: &Request) -> String {
        let peer = request.extensions().get::<RemoteAddr>().map(|RemoteAddr(addr)| addr.ip());

        if peer.is_some_and(|ip| self.trusted.iter().any(|net| net.contains(&ip))) {
            let header = |name: &str| {
                request
                    .headers()
                    .get(name)
                    .and_then(|v| v.to_str().ok())
                    .filter(|v| !v.is_empty())
            };
            if let Some(xff) = header("x-forwarded-for") {
                return xff.split(',').next().unwrap_or_default().trim().to_string();
            }
            if let Some(real) = header("x-real-ip") {
                return real.trim().to_string();
            }
        }

        peer.map(|ip| ip.to_string()).unwrap_or_default()
    }

    fn key(&self, request: &Request) -> String {
        let client = self.client(request);
        let method = request.method().as_str();
        let path = request.uri().path();

        let mut key = String::with_capacity(method.len() + client.len() + path.len() + 2);
        key.push_str(method);
        key.push('|');
        key.push_str(&client);
        key.push('|');
        key.push_str(path);
        key
    }

    /// Records the request and returns true if it is allowed.
    pub fn check(&self, request: &Request) -> bool {
        let now = Instant::now();
        let key = self.key(request);

        let limited = match self.last_seen.entry(key) {
            Entry::Occupied(mut seen) => {
                if now.duration_since(*seen.get()) < self.threshold {
                    true
                } else {
                    seen.insert(now);
                    false
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(now);
                false
            }
        };

        if !limited {
            self.prune(now);
        }
        !limited
    }

    /// Drops keys idle for more than twice the threshold.
    ///
    /// Runs at most once per threshold interval.
    fn prune(&self, now: Instant) {
        let elapsed = millis(now.duration_since(self.started));
        let last = self.last_prune_ms.load(Ordering::Relaxed);
        if elapsed.saturating_sub(last) < millis(self.threshold) {
            return;
        }
        if self
            .last_prune_ms
            .compare_exchange(last, elapsed, Ordering::Relaxed, Ordering::Relaxed)
            .is_err()
        {
            return;
        }

        let ttl = self.threshold * 2;
        self.last_seen
            .retain(|_, seen| now.duration_since(*seen) < ttl);
    }

    /// Number of tracked keys.
    #[must_use]
    pub fn tracked(&self) -> usize {
        self.last_seen.len()
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl Middleware for RateLimit {
    fn name(&self) -> &'static str {
        "rate_limit"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut Context,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        if self.check(&request) {
            return Box::pin(next.run(ctx, request));
        }

        tracing::debug!(
            http.method = %request.method(),
            http.path = request.uri().path(),
            "request rate limited"
        );
        ctx.abort();
        let mut response = Response::json(StatusCode::TOO_MANY_REQUESTS, &REJECTION);
        response
            .headers_mut()
            .insert(RETRY_AFTER, HeaderValue::from_static("1"));
        Box::pin(async move { response })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use switchyard_core::handler_fn;

    fn request(method: &str, path: &str, peer: &str, xff: Option<&str>) -> Request {
        let mut builder = http::Request::builder().method(method).uri(path);
        if let Some(xff) = xff {
            builder = builder.header("x-forwarded-for", xff);
        }
        let mut request = builder.body(Bytes::new()).unwrap();
        request
            .extensions_mut()
            .insert(RemoteAddr(peer.parse().unwrap()));
        request
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeat_within_threshold_rejected() {
        let limit = RateLimit::new(Duration::from_millis(100));
        let peer = "192.0.2.1:4000";

        assert!(limit.check(&request("GET", "/a", peer, None)));
        assert!(!limit.check(&request("GET", "/a", peer, None)));

        tokio::time::advance(Duration::from_millis(101)).await;
        assert!(limit.check(&request("GET", "/a", peer, None)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_key_includes_method_and_path() {
        let limit = RateLimit::new(Duration::from_secs(1));
        let peer = "192.0.2.1:4000";

        assert!(limit.check(&request("GET", "/a", peer, None)));
        assert!(limit.check(&request("POST", "/a", peer, None)));
        assert!(limit.check(&request("GET", "/b", peer, None)));
        assert!(limit.check(&request("GET", "/a", "192.0.2.2:4000", None)));
        assert_eq!(limit.tracked(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_forwarded_header_only_from_trusted_peer() {
        let limit = RateLimit::builder()
            .threshold(Duration::from_secs(1))
            .trusted_proxies(["10.0.0.0/8", "not-a-network"])
            .build();

        // Untrusted peer: header ignored, both requests share the peer key
        assert!(limit.check(&request("GET", "/", "192.0.2.1:1", Some("203.0.113.1"))));
        assert!(!limit.check(&request("GET", "/", "192.0.2.1:1", Some("203.0.113.2"))));

        // Trusted proxy: each forwarded client has its own key
        assert!(limit.check(&request("GET", "/", "10.1.2.3:1", Some("203.0.113.1, 10.1.2.3"))));
        assert!(limit.check(&request("GET", "/", "10.1.2.3:1", Some("203.0.113.2"))));
        assert!(!limit.check(&request("GET", "/", "10.1.2.3:1", Some("203.0.113.2"))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_keys_pruned() {
        let limit = RateLimit::new(Duration::from_millis(100));
        assert!(limit.check(&request("GET", "/old", "192.0.2.1:1", None)));

        tokio::time::advance(Duration::from_millis(250)).await;
        assert!(limit.check(&request("GET", "/new", "192.0.2.1:1", None)));
        assert_eq!(limit.tracked(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejection_response() {
        let limit = RateLimit::new(Duration::from_secs(1));
        let handler =
            handler_fn(|_ctx, _req| Box::pin(async { Response::text(StatusCode::OK, "ok") }));

        let mut ctx = Context::new();
        let first = limit
            .process(&mut ctx, request("GET", "/", "192.0.2.1:1", None), Next::handler(&handler))
            .await;
        assert_eq!(first.status(), StatusCode::OK);

        let mut ctx = Context::new();
        let second = limit
            .process(&mut ctx, request("GET", "/", "192.0.2.1:1", None), Next::handler(&handler))
            .await;
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(second.headers()[RETRY_AFTER], "1");
        assert!(ctx.is_aborted());

        let body: serde_json::Value = serde_json::from_slice(&second.body_bytes().await).unwrap();
        assert_eq!(body["title"], "too_many_requests");
        assert_eq!(body["statusCode"], 429);
    }
}
