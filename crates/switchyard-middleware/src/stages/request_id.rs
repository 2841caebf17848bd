//! Request ID middleware.
//!
//! Every request gets an identifier used for log correlation and support
//! references.
//!
//! ## Request ID Sources
//!
//! 1. **X-Request-ID header**: if present and usable, the incoming ID is kept
//! 2. **Generated UUID v7**: otherwise a new, time-ordered ID is generated
//!
//! The ID is stored in the [`Context`] under [`REQUEST_ID_KEY`] and echoed on
//! the response in the `X-Request-ID` header.

use http::HeaderValue;
use switchyard_core::{BoxFuture, Context, Request, Response};
use uuid::Uuid;

use crate::middleware::{Middleware, Next};

/// The header name for request ID propagation.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Context key holding the request ID as a `String`.
pub const REQUEST_ID_KEY: &str = "request_id";

/// Incoming IDs longer than this are replaced.
const MAX_INCOMING_LEN: usize = 128;

/// Returns the request ID stored by [`RequestId`], if the stage ran.
#[must_use]
pub fn request_id(ctx: &Context) -> Option<&str> {
    ctx.get::<String>(REQUEST_ID_KEY).map(String::as_str)
}

/// Middleware that propagates or generates request IDs.
///
/// # Behavior
///
/// 1. Check for an `X-Request-ID` header
/// 2. If present, non-empty, and trusted, use it
/// 3. Otherwise generate a UUID v7
/// 4. Store the ID in the context
/// 5. Add the ID to the response headers
///
/// # Example
///
/// ```
/// use switchyard_middleware::stages::RequestId;
///
/// // Propagates incoming IDs
/// let propagate = RequestId::new();
///
/// // Always mints a fresh ID, for edge services facing untrusted clients
/// let mint = RequestId::generate_only();
/// # let _ = (propagate, mint);
/// ```
#[derive(Debug, Clone)]
pub struct RequestId {
    trust_incoming: bool,
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestId {
    /// Creates a middleware that keeps incoming `X-Request-ID` values.
    #[must_use]
    pub fn new() -> Self {
        Self { trust_incoming: true }
    }

    /// Creates a middleware that ignores incoming IDs.
    #[must_use]
    pub fn generate_only() -> Self {
        Self {
            trust_incoming: false,
        }
    }

    fn incoming(&self, request: &Request) -> Option<String> {
        if !self.trust_incoming {
            return None;
        }

        request
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|id| !id.is_empty() && id.len() <= MAX_INCOMING_LEN)
            .map(String::from)
    }
}

impl Middleware for RequestId {
    fn name(&self) -> &'static str {
        "request_id"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut Context,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let id = self
                .incoming(&request)
                .unwrap_or_else(|| Uuid::now_v7().to_string());
            let header = HeaderValue::from_str(&id);
            ctx.set(REQUEST_ID_KEY, id);

            let mut response = next.run(ctx, request).await;

            if let Ok(value) = header {
                response.headers_mut().insert(REQUEST_ID_HEADER, value);
            }
            response
        })
    }
}
