//! Cache suppression headers.

use http::header::{CACHE_CONTROL, EXPIRES, PRAGMA};
use http::HeaderValue;
use switchyard_core::{BoxFuture, Context, Request, Response};

use crate::middleware::{Middleware, Next};

const NO_CACHE_CONTROL: &str = "no-store, no-cache, must-revalidate, max-age=0";

/// Marks every response as uncacheable.
///
/// Sets `Cache-Control`, `Pragma` and `Expires` unless the handler already
/// set them.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCache;

impl Middleware for NoCache {
    fn name(&self) -> &'static str {
        "no_cache"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut Context,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let mut response = next.run(ctx, request).await;
            let headers = response.headers_mut();
            headers
                .entry(CACHE_CONTROL)
                .or_insert(HeaderValue::from_static(NO_CACHE_CONTROL));
            headers
                .entry(PRAGMA)
                .or_insert(HeaderValue::from_static("no-cache"));
            headers.entry(EXPIRES).or_insert(HeaderValue::from_static("0"));
            response
        })
    }
}
