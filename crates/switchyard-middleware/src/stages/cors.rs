//! CORS (Cross-Origin Resource Sharing) middleware.
//!
//! Requests without an `Origin` header, or from an origin that is not on the
//! allow-list, pass through untouched. For allowed origins the origin is
//! echoed in `Access-Control-Allow-Origin` and `Vary: Origin` is added.
//!
//! ## Origin patterns
//!
//! - `*` allows every origin
//! - a trailing `*` is a prefix match (`https://app-*` allows
//!   `https://app-eu.example.com`)
//! - anything else must match exactly
//!
//! Matching is case-insensitive.
//!
//! ## Preflight Requests
//!
//! An allowed `OPTIONS` request is answered here with `204 No Content` and
//! never reaches the handler. When it carries
//! `Access-Control-Request-Method`, the response also lists the allowed
//! methods and headers and the max age.
//!
//! ## Example
//!
//! ```
//! use switchyard_middleware::stages::Cors;
//! use http::Method;
//! use std::time::Duration;
//!
//! let cors = Cors::builder()
//!     .allow_origin("https://app.example.com")
//!     .allow_origin("https://preview-*")
//!     .allow_methods([Method::GET, Method::POST])
//!     .allow_headers(["Content-Type", "Authorization"])
//!     .allow_credentials(true)
//!     .max_age(Duration::from_secs(600))
//!     .build();
//! # let _ = cors;
//! ```

use std::time::Duration;

use http::header::{HeaderMap, HeaderValue, VARY};
use http::{Method, StatusCode};
use switchyard_core::{BoxFuture, Context, Request, Response, ResponseExt};

use crate::middleware::{Middleware, Next};

/// CORS header names.
pub mod headers {
    /// `Access-Control-Allow-Origin` header.
    pub const ALLOW_ORIGIN: &str = "access-control-allow-origin";
    /// `Access-Control-Allow-Methods` header.
    pub const ALLOW_METHODS: &str = "access-control-allow-methods";
    /// `Access-Control-Allow-Headers` header.
    pub const ALLOW_HEADERS: &str = "access-control-allow-headers";
    /// `Access-Control-Allow-Credentials` header.
    pub const ALLOW_CREDENTIALS: &str = "access-control-allow-credentials";
    /// `Access-Control-Max-Age` header.
    pub const MAX_AGE: &str = "access-control-max-age";
    /// `Access-Control-Expose-Headers` header.
    pub const EXPOSE_HEADERS: &str = "access-control-expose-headers";
    /// `Access-Control-Request-Method` header (preflight).
    pub const REQUEST_METHOD: &str = "access-control-request-method";
    /// `Origin` header.
    pub const ORIGIN: &str = "origin";
}

/// CORS middleware. Build one with [`Cors::builder`].
#[derive(Debug, Clone)]
pub struct Cors {
    origins: Vec<String>,
    allow_methods: Option<HeaderValue>,
    allow_headers: Option<HeaderValue>,
    expose_headers: Option<HeaderValue>,
    allow_credentials: bool,
    max_age: Option<HeaderValue>,
}

/// Builder for [`Cors`].
#[derive(Debug, Clone, Default)]
pub struct CorsBuilder {
    origins: Vec<String>,
    methods: Vec<Method>,
    headers: Vec<String>,
    expose: Vec<String>,
    allow_credentials: bool,
    max_age: Option<Duration>,
}

impl CorsBuilder {
    /// Creates a builder that allows no origins.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an allowed origin pattern.
    #[must_use]
    pub fn allow_origin(mut self, origin: impl Into<String>) -> Self {
        self.origins.push(origin.into());
        self
    }

    /// Adds several allowed origin patterns.
    #[must_use]
    pub fn allow_origins<I, S>(mut self, origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.origins.extend(origins.into_iter().map(Into::into));
        self
    }

    /// Sets the methods listed in preflight responses, in order.
    #[must_use]
    pub fn allow_methods<I>(mut self, methods: I) -> Self
    where
        I: IntoIterator<Item = Method>,
    {
        self.methods = methods.into_iter().collect();
        self
    }

    /// Sets the request headers listed in preflight responses.
    #[must_use]
    pub fn allow_headers<I, S>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.headers = headers.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the response headers exposed to scripts.
    #[must_use]
    pub fn expose_headers<I, S>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.expose = headers.into_iter().map(Into::into).collect();
        self
    }

    /// Sets whether credentials (cookies, authorization) are allowed.
    #[must_use]
    pub fn allow_credentials(mut self, allow: bool) -> Self {
        self.allow_credentials = allow;
        self
    }

    /// Sets how long browsers may cache preflight results.
    ///
    /// A zero duration omits the header.
    #[must_use]
    pub fn max_age(mut self, duration: Duration) -> Self {
        self.max_age = Some(duration);
        self
    }

    /// Builds the middleware.
    ///
    /// List values that are not valid header values are dropped with a
    /// warning.
    #[must_use]
    pub fn build(self) -> Cors {
        let methods: Vec<&str> = self.methods.iter().map(Method::as_str).collect();
        Cors {
            origins: self
                .origins
                .iter()
                .map(|o| o.trim().to_ascii_lowercase())
                .collect(),
            allow_methods: joined(headers::ALLOW_METHODS, &methods),
            allow_headers: joined(headers::ALLOW_HEADERS, &self.headers),
            expose_headers: joined(headers::EXPOSE_HEADERS, &self.expose),
            allow_credentials: self.allow_credentials,
            max_age: self
                .max_age
                .map(|age| age.as_secs())
                .filter(|secs| *secs > 0)
                .map(HeaderValue::from),
        }
    }
}

fn joined<S: AsRef<str>>(header: &'static str, items: &[S]) -> Option<HeaderValue> {
    if items.is_empty() {
        return None;
    }
    let value = items.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(", ");
    match HeaderValue::from_str(&value) {
        Ok(value) => Some(value),
        Err(error) => {
            tracing::warn!(header, value = %value, error = %error, "invalid CORS header value dropped");
            None
        }
    }
}

impl Cors {
    /// Creates a new CORS builder.
    #[must_use]
    pub fn builder() -> CorsBuilder {
        CorsBuilder::new()
    }

    /// Creates a CORS middleware that allows any origin and method.
    ///
    /// Intended for development.
    #[must_use]
    pub fn permissive() -> Self {
        CorsBuilder::new()
            .allow_origin("*")
            .allow_methods([
                Method::GET,
                Method::HEAD,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::PATCH,
                Method::OPTIONS,
            ])
            .allow_headers(["*"])
            .max_age(Duration::from_secs(86400))
            .build()
    }

    /// Returns true if `origin` matches one of the allowed patterns.
    #[must_use]
    pub fn is_allowed(&self, origin: &str) -> bool {
        if origin.is_empty() {
            return false;
        }
        let origin = origin.to_ascii_lowercase();
        self.origins.iter().any(|pattern| {
            if pattern == "*" {
                return true;
            }
            match pattern.strip_suffix('*') {
                Some(prefix) => origin.starts_with(prefix),
                None => origin == *pattern,
            }
        })
    }

    fn apply_origin(&self, map: &mut HeaderMap, origin: HeaderValue) {
        map.append(VARY, HeaderValue::from_static("Origin"));
        map.insert(headers::ALLOW_ORIGIN, origin);
        if self.allow_credentials {
            map.insert(headers::ALLOW_CREDENTIALS, HeaderValue::from_static("true"));
        }
    }

    fn preflight(&self, request: &Request, origin: HeaderValue) -> Response {
        let mut response = Response::empty(StatusCode::NO_CONTENT);
        let map = response.headers_mut();
        self.apply_origin(map, origin);

        if request.headers().contains_key(headers::REQUEST_METHOD) {
            for (name, value) in [
                (headers::ALLOW_METHODS, &self.allow_methods),
                (headers::ALLOW_HEADERS, &self.allow_headers),
                (headers::MAX_AGE, &self.max_age),
            ] {
                if let Some(value) = value {
                    map.insert(name, value.clone());
                }
            }
        }
        response
    }
}

impl Middleware for Cors {
    fn name(&self) -> &'static str {
        "cors"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut Context,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        let origin = request
            .headers()
            .get(headers::ORIGIN)
            .filter(|value| value.to_str().is_ok_and(|origin| self.is_allowed(origin)))
            .cloned();

        let Some(origin) = origin else {
            return Box::pin(next.run(ctx, request));
        };

        if request.method() == Method::OPTIONS {
            let response = self.preflight(&request, origin);
            return Box::pin(async move { response });
        }

        Box::pin(async move {
            let mut response = next.run(ctx, request).await;
            let map = response.headers_mut();
            self.apply_origin(map, origin);
            if let Some(expose) = &self.expose_headers {
                map.insert(headers::EXPOSE_HEADERS, expose.clone());
            }
            response
        })
    }
}
