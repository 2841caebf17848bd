//! Request media type and charset filters.
//!
//! Both stages reject with `415 Unsupported Media Type` and mark the
//! context aborted. Requests without a `Content-Type` header pass.

use std::collections::HashSet;

use http::header::CONTENT_TYPE;
use http::StatusCode;
use switchyard_core::{BoxFuture, Context, Request, Response, ResponseExt};

use crate::middleware::{Middleware, Next};

fn content_type(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .filter(|ct| !ct.trim().is_empty())
}

fn reject(ctx: &mut Context, body: &'static str) -> Response {
    ctx.abort();
    Response::text(StatusCode::UNSUPPORTED_MEDIA_TYPE, body)
}

fn is_token(s: &str) -> bool {
    !s.is_empty()
        && s.bytes().all(|b| {
            b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
        })
}

/// A parsed `Content-Type` value.
#[derive(Debug, PartialEq, Eq)]
struct MediaType {
    essence: String,
    charset: Option<String>,
}

/// Parses `type/subtype; key=value; ...`, lowercasing the essence and the
/// charset. Returns `None` for malformed values.
fn parse_media_type(value: &str) -> Option<MediaType> {
    let mut parts = value.split(';');
    let essence = parts.next()?.trim().to_ascii_lowercase();
    let valid_essence = match essence.split_once('/') {
        Some((kind, subtype)) => is_token(kind) && is_token(subtype),
        None => is_token(&essence),
    };
    if !valid_essence {
        return None;
    }

    let mut charset = None;
    for param in parts {
        let param = param.trim();
        if param.is_empty() {
            continue;
        }
        let (key, raw) = param.split_once('=')?;
        let key = key.trim();
        if !is_token(key) {
            return None;
        }
        let raw = raw.trim();
        let value = match raw.strip_prefix('"') {
            Some(quoted) => quoted.strip_suffix('"')?,
            None if is_token(raw) => raw,
            None => return None,
        };
        if key.eq_ignore_ascii_case("charset") {
            charset = Some(value.to_ascii_lowercase());
        }
    }

    Some(MediaType { essence, charset })
}

/// Allows only the listed request media types.
///
/// Parameters such as `charset` are ignored when comparing.
///
/// # Example
///
/// ```
/// use switchyard_middleware::stages::AllowContentType;
///
/// let json_only = AllowContentType::new(["application/json"]);
/// # let _ = json_only;
/// ```
#[derive(Debug, Clone)]
pub struct AllowContentType {
    allowed: HashSet<String>,
}

impl AllowContentType {
    /// Creates the stage from a list of media types.
    pub fn new<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            allowed: types
                .into_iter()
                .map(|t| t.as_ref().trim().to_ascii_lowercase())
                .collect(),
        }
    }

    fn allows(&self, content_type: &str) -> bool {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        self.allowed.contains(&essence)
    }
}

impl Middleware for AllowContentType {
    fn name(&self) -> &'static str {
        "allow_content_type"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut Context,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        if let Some(ct) = content_type(&request) {
            if !self.allows(ct) {
                tracing::debug!(content_type = ct, "rejected request media type");
                let response = reject(ctx, "Unsupported Content-Type");
                return Box::pin(async move { response });
            }
        }
        Box::pin(next.run(ctx, request))
    }
}

/// Allows only the listed request charsets.
///
/// A `Content-Type` without a `charset` parameter is compared as the empty
/// charset, so list `""` to accept it. Malformed media types are rejected.
#[derive(Debug, Clone)]
pub struct ContentCharset {
    allowed: HashSet<String>,
}

impl ContentCharset {
    /// Creates the stage from a list of charsets, matched case-insensitively.
    pub fn new<I, S>(charsets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            allowed: charsets
                .into_iter()
                .map(|c| c.as_ref().to_ascii_lowercase())
                .collect(),
        }
    }
}

impl Middleware for ContentCharset {
    fn name(&self) -> &'static str {
        "content_charset"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut Context,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        if let Some(ct) = content_type(&request) {
            let accepted = parse_media_type(ct).is_some_and(|media| {
                self.allowed
                    .contains(media.charset.as_deref().unwrap_or_default())
            });
            if !accepted {
                tracing::debug!(content_type = ct, "rejected request charset");
                let response = reject(ctx, "Unsupported Media Type");
                return Box::pin(async move { response });
            }
        }
        Box::pin(next.run(ctx, request))
    }
}
