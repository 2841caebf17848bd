//! Gzip response compression.
//!
//! Compresses a response body with gzip when:
//!
//! - the request accepts `gzip` (with a non-zero quality value)
//! - the request method is not `HEAD`
//! - the response status is 2xx and not `204 No Content`
//! - the response has no `Content-Encoding` yet
//! - the response media type is one of the configured types
//!
//! ## Example
//!
//! ```
//! use switchyard_middleware::stages::Compress;
//!
//! let json = Compress::new(6, ["application/json"]);
//! let web = Compress::default_types();
//! # let _ = (json, web);
//! ```

use std::collections::HashSet;
use std::io::Write;

use bytes::Bytes;
use flate2::write::GzEncoder;
use flate2::Compression;
use http::header::{ACCEPT_ENCODING, CONTENT_ENCODING, CONTENT_LENGTH, CONTENT_TYPE, VARY};
use http::{HeaderValue, Method, StatusCode};
use http_body_util::{BodyExt, Full};
use switchyard_core::{BoxFuture, Context, Request, Response};

use crate::middleware::{Middleware, Next};

/// Media types compressed by [`Compress::default_types`].
pub const DEFAULT_TYPES: [&str; 5] = [
    "text/html",
    "text/plain",
    "text/css",
    "application/javascript",
    "text/javascript",
];

/// Gzip compression middleware.
///
/// # Headers
///
/// - Reads: `Accept-Encoding` from the request
/// - Writes: `Content-Encoding: gzip` and `Vary: Accept-Encoding`
/// - Removes: `Content-Length`, which no longer matches the body
#[derive(Debug, Clone)]
pub struct Compress {
    level: Compression,
    types: HashSet<String>,
}

impl Compress {
    /// Creates the stage with a gzip `level` (clamped to 0-9) and the media
    /// types to compress.
    pub fn new<I, S>(level: u32, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            level: Compression::new(level.min(9)),
            types: types
                .into_iter()
                .map(|t| t.as_ref().trim().to_ascii_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
        }
    }

    /// Default level over [`DEFAULT_TYPES`].
    #[must_use]
    pub fn default_types() -> Self {
        Self {
            level: Compression::default(),
            types: DEFAULT_TYPES.iter().map(|t| (*t).to_string()).collect(),
        }
    }

    /// Returns true if `header` lists gzip with a non-zero quality.
    fn accepts_gzip(header: &str) -> bool {
        header.split(',').any(|part| {
            let mut pieces = part.split(';');
            let coding = pieces.next().unwrap_or_default().trim();
            if !coding.eq_ignore_ascii_case("gzip") {
                return false;
            }
            pieces
                .filter_map(|param| param.trim().strip_prefix("q="))
                .all(|q| q.trim().parse::<f32>().map_or(true, |q| q > 0.0))
        })
    }

    fn compressible(&self, response: &Response) -> bool {
        let status = response.status();
        if !status.is_success() || status == StatusCode::NO_CONTENT {
            return false;
        }
        if response.headers().contains_key(CONTENT_ENCODING) {
            return false;
        }
        let essence = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(|ct| ct.split(';').next())
            .map(|ct| ct.trim().to_ascii_lowercase())
            .unwrap_or_default();
        self.types.contains(&essence)
    }

    fn gzip(&self, data: &[u8]) -> std::io::Result<Vec<u8>> {
        let mut encoder = GzEncoder::new(Vec::with_capacity(data.len() / 2), self.level);
        encoder.write_all(data)?;
        encoder.finish()
    }
}

impl Middleware for Compress {
    fn name(&self) -> &'static str {
        "compress"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut Context,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        let wanted = request.method() != Method::HEAD
            && request
                .headers()
                .get(ACCEPT_ENCODING)
                .and_then(|v| v.to_str().ok())
                .is_some_and(Self::accepts_gzip);

        if !wanted {
            return Box::pin(next.run(ctx, request));
        }

        Box::pin(async move {
            let response = next.run(ctx, request).await;
            if !self.compressible(&response) {
                return response;
            }

            let (mut parts, body) = response.into_parts();
            let body = match body.collect().await {
                Ok(collected) => collected.to_bytes(),
                Err(never) => match never {},
            };

            match self.gzip(&body) {
                Ok(compressed) => {
                    parts.headers.remove(CONTENT_LENGTH);
                    parts
                        .headers
                        .insert(CONTENT_ENCODING, HeaderValue::from_static("gzip"));
                    parts
                        .headers
                        .append(VARY, HeaderValue::from_static("Accept-Encoding"));
                    Response::from_parts(parts, Full::new(Bytes::from(compressed)))
                }
                Err(error) => {
                    tracing::warn!(error = %error, "gzip compression failed, sending identity body");
                    Response::from_parts(parts, Full::new(body))
                }
            }
        })
    }
}
