//! Request dispatch.
//!
//! A [`Dispatcher`] owns the immutable route table, the middleware chain,
//! and the fallback handlers. [`Dispatcher::dispatch`] turns one request
//! into exactly one response:
//!
//! 1. borrow a [`Context`] from the context provider
//! 2. strip the mount prefix, if any
//! 3. percent-decode the path (`400` if it is not UTF-8), then resolve it:
//!    static map first, then the radix tree
//! 4. on a match, run the middleware chain and handler under a panic guard
//! 5. otherwise answer `405` with an `Allow` header, or `404`
//!
//! The context goes back to its provider when the borrow guard drops,
//! which happens on every exit path.
//!
//! # Panics in handlers
//!
//! A panicking handler is logged with its location and backtrace, then
//! answered by the recovery handler if one is registered, otherwise by a
//! generic `500`. The recovery handler runs under a second guard; if it
//! panics too, a fixed `500` is sent.
//!
//! # Example
//!
//! ```rust
//! use switchyard_core::{handler_fn, Response, ResponseExt};
//! use switchyard_server::Dispatcher;
//! use http::StatusCode;
//!
//! # fn main() -> Result<(), switchyard_router::RouteError> {
//! let dispatcher = Dispatcher::builder()
//!     .route("/users/<id:isDigits>", "GET", handler_fn(|ctx, _req| {
//!         Box::pin(async move {
//!             let id = ctx.param("id").unwrap_or_default().to_string();
//!             Response::text(StatusCode::OK, id)
//!         })
//!     }))?
//!     .use_defaults()
//!     .ready_endpoint("/ready")
//!     .build()?;
//!
//! assert_eq!(dispatcher.route_count(), 2);
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use http::header::ALLOW;
use http::uri::{PathAndQuery, Uri};
use http::{HeaderValue, Method, StatusCode};
use percent_encoding::percent_decode_str;
use switchyard_core::{
    catch_panic, BoxFuture, BoxedHandler, Context, ContextPool, ContextProvider, Handler,
    PanicError, PooledContext, Request, Response, ResponseExt,
};
use switchyard_middleware::{stages, Middleware, MiddlewareChain};
use switchyard_router::{MethodSet, Resolution, RouteError, RouteTable};

use crate::readiness::Readiness;

/// Path of the readiness endpoint when enabled with defaults.
pub const DEFAULT_READY_PATH: &str = "/ready";

const BAD_PATH_BODY: &str = "400 bad request: path is not valid UTF-8";
const NOT_FOUND_BODY: &str = "404 page not found";
const METHOD_NOT_ALLOWED_BODY: &str = "405 method not allowed";
const INTERNAL_ERROR_BODY: &str = "Internal Server Error";
const RECOVERY_FAILED_BODY: &str =
    "Recovery middleware failed: an error occurred while executing the recovery handler.";

/// Builder for [`Dispatcher`].
pub struct DispatcherBuilder {
    table: RouteTable<BoxedHandler>,
    chain: MiddlewareChain,
    not_found: Option<BoxedHandler>,
    recovery: Option<BoxedHandler>,
    prefix: Option<String>,
    ready_path: Option<String>,
    readiness: Readiness,
    verbose: bool,
    contexts: Option<Arc<dyn ContextProvider>>,
}

impl Default for DispatcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DispatcherBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            table: RouteTable::new(),
            chain: MiddlewareChain::new(),
            not_found: None,
            recovery: None,
            prefix: None,
            ready_path: None,
            readiness: Readiness::new(),
            verbose: false,
            contexts: None,
        }
    }

    /// Registers `handler` for `template` under the methods in `methods`.
    ///
    /// `methods` is a comma- or space-separated list drawn from `GET`,
    /// `POST`, `PUT`, `DELETE`, `PATCH`, `HEAD`, `OPTIONS` and `ANY`.
    /// Registering the same template twice keeps both entries; the first
    /// one registered is tried first.
    pub fn route<H: Handler>(self, template: &str, methods: &str, handler: H) -> Result<Self, RouteError> {
        self.route_shared(template, methods, Arc::new(handler))
    }

    /// Registers an already shared handler.
    pub fn route_shared(
        mut self,
        template: &str,
        methods: &str,
        handler: BoxedHandler,
    ) -> Result<Self, RouteError> {
        self.table.insert(template, methods, handler)?;
        tracing::debug!(route = template, methods, "route registered");
        Ok(self)
    }

    /// Appends a middleware. Middleware wraps matched routes only.
    #[must_use]
    pub fn use_middleware<M: Middleware>(mut self, middleware: M) -> Self {
        self.chain.push(middleware);
        self
    }

    /// Appends every middleware of `chain`, keeping its order.
    #[must_use]
    pub fn use_chain(mut self, chain: MiddlewareChain) -> Self {
        self.chain.extend(chain);
        self
    }

    /// Appends the stock stages from [`stages::defaults`].
    #[must_use]
    pub fn use_defaults(self) -> Self {
        self.use_chain(stages::defaults())
    }

    /// Answers unmatched paths with `handler` instead of the built-in 404.
    #[must_use]
    pub fn not_found<H: Handler>(mut self, handler: H) -> Self {
        self.not_found = Some(Arc::new(handler));
        self
    }

    /// Answers requests whose handler panicked.
    #[must_use]
    pub fn recovery<H: Handler>(mut self, handler: H) -> Self {
        self.recovery = Some(Arc::new(handler));
        self
    }

    /// Mounts every route under `prefix`.
    ///
    /// A request for exactly `prefix` is routed as `/`, a request under
    /// `prefix/` is routed with the prefix removed, and anything else is
    /// routed unchanged. An empty prefix or `/` disables mounting.
    #[must_use]
    pub fn prefix(mut self, prefix: &str) -> Self {
        self.prefix = normalize_prefix(prefix);
        self
    }

    /// Serves `GET path` with `200 ok` while ready and `503 shutting down`
    /// once shutdown has begun.
    #[must_use]
    pub fn ready_endpoint(mut self, path: impl Into<String>) -> Self {
        self.ready_path = Some(path.into());
        self
    }

    /// Uses `readiness` as the shared flag instead of a fresh one.
    #[must_use]
    pub fn readiness(mut self, readiness: Readiness) -> Self {
        self.readiness = readiness;
        self
    }

    /// Logs one line per request.
    #[must_use]
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Borrows contexts from `provider` instead of a [`ContextPool`].
    #[must_use]
    pub fn context_provider(mut self, provider: Arc<dyn ContextProvider>) -> Self {
        self.contexts = Some(provider);
        self
    }

    /// Finishes setup.
    ///
    /// Fails only if the readiness path is not a valid route template.
    pub fn build(mut self) -> Result<Dispatcher, RouteError> {
        if let Some(path) = self.ready_path.take() {
            let probe = ReadyHandler {
                readiness: self.readiness.clone(),
            };
            self = self.route(&path, "GET", probe)?;
        }

        Ok(Dispatcher {
            table: self.table,
            chain: self.chain,
            not_found: self.not_found,
            recovery: self.recovery,
            prefix: self.prefix,
            readiness: self.readiness,
            verbose: self.verbose,
            contexts: self
                .contexts
                .unwrap_or_else(|| Arc::new(ContextPool::new())),
        })
    }
}

impl fmt::Debug for DispatcherBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatcherBuilder")
            .field("routes", &self.table.len())
            .field("middleware", &self.chain)
            .field("prefix", &self.prefix)
            .field("ready_path", &self.ready_path)
            .finish_non_exhaustive()
    }
}

fn normalize_prefix(prefix: &str) -> Option<String> {
    let trimmed = prefix.trim_end_matches('/');
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.starts_with('/') {
        Some(trimmed.to_string())
    } else {
        Some(format!("/{trimmed}"))
    }
}

/// The readiness probe handler.
struct ReadyHandler {
    readiness: Readiness,
}

impl Handler for ReadyHandler {
    fn call<'a>(&'a self, _ctx: &'a mut Context, _request: Request) -> BoxFuture<'a, Response> {
        let response = if self.readiness.is_ready() {
            Response::text(StatusCode::OK, "ok")
        } else {
            Response::text(StatusCode::SERVICE_UNAVAILABLE, "shutting down")
        };
        Box::pin(async move { response })
    }
}

/// What a guarded call runs.
enum Target<'a> {
    /// A matched route, wrapped by the middleware chain
    Route(&'a dyn Handler),
    /// The custom not-found handler, called directly
    Fallback(&'a dyn Handler),
}

/// Routes requests to handlers.
///
/// Immutable once built; share it across connections behind an `Arc`.
pub struct Dispatcher {
    table: RouteTable<BoxedHandler>,
    chain: MiddlewareChain,
    not_found: Option<BoxedHandler>,
    recovery: Option<BoxedHandler>,
    prefix: Option<String>,
    readiness: Readiness,
    verbose: bool,
    contexts: Arc<dyn ContextProvider>,
}

impl Dispatcher {
    /// Creates a dispatcher builder.
    #[must_use]
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::new()
    }

    /// Produces the response for `request`.
    ///
    /// Never panics: handler panics become `500` responses.
    pub async fn dispatch(&self, mut request: Request) -> Response {
        let started = self.verbose.then(Instant::now);
        let mut ctx = PooledContext::new(self.contexts.as_ref());

        self.strip_prefix(&mut request);
        let method = request.method().clone();

        // Routing and params see the decoded path; the URI stays as received
        let resolution = percent_decode_str(request.uri().path())
            .decode_utf8()
            .ok()
            .map(|path| ctx.resolve(&self.table, &method, &path));

        let response = match resolution {
            Some(Resolution::Matched(id)) => {
                let handler = self.table.entry(id).handler().as_ref();
                self.guarded(&mut ctx, request, Target::Route(handler)).await
            }
            Some(Resolution::MethodNotAllowed(allowed)) => method_not_allowed(allowed),
            Some(Resolution::NotFound) => match &self.not_found {
                Some(handler) => self.guarded(&mut ctx, request, Target::Fallback(handler.as_ref())).await,
                None => Response::text(StatusCode::NOT_FOUND, NOT_FOUND_BODY),
            },
            None => {
                tracing::debug!(http.path = request.uri().path(), "path is not valid UTF-8 once decoded");
                Response::text(StatusCode::BAD_REQUEST, BAD_PATH_BODY)
            }
        };

        if let Some(started) = started {
            tracing::info!(
                http.method = %method,
                http.path = ctx.path(),
                http.status = response.status().as_u16(),
                route = ctx.route_template().unwrap_or("-"),
                elapsed_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX),
                "request"
            );
        }
        response
    }

    /// Runs `target` under the panic guard.
    async fn guarded(&self, ctx: &mut Context, request: Request, target: Target<'_>) -> Response {
        let method = request.method().clone();
        let spare = self.recovery.as_ref().map(|_| duplicate(&request));

        let outcome = match target {
            Target::Route(handler) => catch_panic(Box::pin(self.chain.run(ctx, request, handler))).await,
            Target::Fallback(handler) => catch_panic(handler.call(ctx, request)).await,
        };

        match outcome {
            Ok(response) => response,
            Err(error) => {
                log_panic(&method, ctx.path(), &error, "handler panicked");
                match (&self.recovery, spare) {
                    (Some(recovery), Some(request)) => self.recover(ctx, recovery.as_ref(), request).await,
                    _ => Response::text(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_BODY),
                }
            }
        }
    }

    /// Runs the recovery handler under its own guard.
    async fn recover(&self, ctx: &mut Context, recovery: &dyn Handler, request: Request) -> Response {
        let method = request.method().clone();
        match catch_panic(recovery.call(ctx, request)).await {
            Ok(response) => response,
            Err(error) => {
                log_panic(&method, ctx.path(), &error, "recovery handler panicked");
                Response::text(StatusCode::INTERNAL_SERVER_ERROR, RECOVERY_FAILED_BODY)
            }
        }
    }

    fn strip_prefix(&self, request: &mut Request) {
        let Some(prefix) = self.prefix.as_deref() else {
            return;
        };

        let path = request.uri().path();
        let routed = if path == prefix {
            "/"
        } else {
            match path.strip_prefix(prefix) {
                Some(rest) if rest.starts_with('/') => rest,
                _ => return,
            }
        };

        let path_and_query = match request.uri().query() {
            Some(query) => format!("{routed}?{query}"),
            None => routed.to_string(),
        };
        let mut parts = request.uri().clone().into_parts();
        let Ok(path_and_query) = PathAndQuery::try_from(path_and_query) else {
            return;
        };
        parts.path_and_query = Some(path_and_query);
        if let Ok(uri) = Uri::from_parts(parts) {
            *request.uri_mut() = uri;
        }
    }

    /// The shared readiness flag.
    #[must_use]
    pub fn readiness(&self) -> &Readiness {
        &self.readiness
    }

    /// Number of registered routes, including the readiness endpoint.
    #[must_use]
    pub fn route_count(&self) -> usize {
        self.table.len()
    }

    /// The mount prefix, if any.
    #[must_use]
    pub fn mount_prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Whether per-request logging is on.
    #[must_use]
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("routes", &self.table.len())
            .field("middleware", &self.chain)
            .field("prefix", &self.prefix)
            .field("readiness", &self.readiness)
            .field("verbose", &self.verbose)
            .finish_non_exhaustive()
    }
}

fn method_not_allowed(allowed: MethodSet) -> Response {
    let mut response = Response::text(StatusCode::METHOD_NOT_ALLOWED, METHOD_NOT_ALLOWED_BODY);
    if let Ok(value) = HeaderValue::from_str(&allowed.allow_header()) {
        response.headers_mut().insert(ALLOW, value);
    }
    response
}

fn log_panic(method: &Method, path: &str, error: &PanicError, message: &'static str) {
    let backtrace = error.site().map_or("", |site| site.backtrace.as_str());
    tracing::error!(
        http.method = %method,
        http.path = path,
        error = %error,
        location = error.location().unwrap_or("unknown"),
        backtrace,
        "{message}"
    );
}

/// Copies a request for the recovery handler.
fn duplicate(request: &Request) -> Request {
    let mut copy = Request::new(request.body().clone());
    *copy.method_mut() = request.method().clone();
    *copy.uri_mut() = request.uri().clone();
    *copy.version_mut() = request.version();
    *copy.headers_mut() = request.headers().clone();
    *copy.extensions_mut() = request.extensions().clone();
    copy
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use bytes::Bytes;
    use switchyard_core::handler_fn;
    use switchyard_middleware::FnMiddleware;

    #[derive(Default)]
    struct CountingProvider {
        acquired: AtomicUsize,
        released: AtomicUsize,
    }

    impl ContextProvider for CountingProvider {
        fn acquire(&self) -> Context {
            self.acquired.fetch_add(1, Ordering::SeqCst);
            Context::new()
        }

        fn release(&self, _ctx: Context) {
            self.released.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn text(body: &'static str) -> impl Handler {
        handler_fn(move |_ctx, _req| Box::pin(async move { Response::text(StatusCode::OK, body) }))
    }

    fn explode(message: &str) -> Response {
        panic!("{message}")
    }

    fn panicking(message: &'static str) -> impl Handler {
        handler_fn(move |_ctx, _req| Box::pin(async move { explode(message) }))
    }

    fn request(method: Method, uri: &str) -> Request {
        http::Request::builder()
            .method(method)
            .uri(uri)
            .body(Bytes::new())
            .unwrap()
    }

    async fn body(response: Response) -> String {
        String::from_utf8_lossy(&response.body_bytes().await).into_owned()
    }

    #[tokio::test]
    async fn test_static_route_and_405() {
        let dispatcher = Dispatcher::builder()
            .route("/users", "GET", text("list"))
            .unwrap()
            .build()
            .unwrap();

        let ok = dispatcher.dispatch(request(Method::GET, "/users")).await;
        assert_eq!(ok.status(), StatusCode::OK);
        assert_eq!(body(ok).await, "list");

        let head = dispatcher.dispatch(request(Method::HEAD, "/users")).await;
        assert_eq!(head.status(), StatusCode::OK);

        let denied = dispatcher.dispatch(request(Method::POST, "/users")).await;
        assert_eq!(denied.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(denied.headers()[ALLOW], "GET, HEAD, OPTIONS");
        assert_eq!(body(denied).await, METHOD_NOT_ALLOWED_BODY);
    }

    #[tokio::test]
    async fn test_allow_is_union_of_structural_matches() {
        let dispatcher = Dispatcher::builder()
            .route("/items/<id>", "PUT", text("put"))
            .unwrap()
            .route("/items/<id>", "DELETE", text("delete"))
            .unwrap()
            .build()
            .unwrap();

        let response = dispatcher.dispatch(request(Method::GET, "/items/7")).await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[ALLOW], "PUT, DELETE, OPTIONS");
    }

    #[tokio::test]
    async fn test_not_found_builtin_and_custom() {
        let plain = Dispatcher::builder().build().unwrap();
        let response = plain.dispatch(request(Method::GET, "/missing")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body(response).await, NOT_FOUND_BODY);

        let custom = Dispatcher::builder()
            .not_found(handler_fn(|ctx, _req| {
                Box::pin(async move { Response::text(StatusCode::NOT_FOUND, format!("no {}", ctx.path())) })
            }))
            .build()
            .unwrap();
        let response = custom.dispatch(request(Method::GET, "/missing")).await;
        assert_eq!(body(response).await, "no /missing");
    }

    #[tokio::test]
    async fn test_middleware_wraps_matched_routes_only() {
        let tag = FnMiddleware::new("tag", |ctx, req, next| {
            Box::pin(async move {
                let mut response = next.run(ctx, req).await;
                response
                    .headers_mut()
                    .insert("x-tag", HeaderValue::from_static("1"));
                response
            })
        });
        let dispatcher = Dispatcher::builder()
            .route("/a", "GET", text("a"))
            .unwrap()
            .use_middleware(tag)
            .build()
            .unwrap();

        let matched = dispatcher.dispatch(request(Method::GET, "/a")).await;
        assert_eq!(matched.headers()["x-tag"], "1");

        let missing = dispatcher.dispatch(request(Method::GET, "/b")).await;
        assert!(missing.headers().get("x-tag").is_none());
    }

    #[tokio::test]
    async fn test_panic_yields_generic_500_and_single_release() {
        let provider = Arc::new(CountingProvider::default());
        let dispatcher = Dispatcher::builder()
            .route("/boom", "GET", panicking("secret detail"))
            .unwrap()
            .context_provider(provider.clone())
            .build()
            .unwrap();

        let response = dispatcher.dispatch(request(Method::GET, "/boom")).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let text = body(response).await;
        assert_eq!(text, INTERNAL_ERROR_BODY);
        assert!(!text.contains("secret"));

        assert_eq!(provider.acquired.load(Ordering::SeqCst), 1);
        assert_eq!(provider.released.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_recovery_handler() {
        let dispatcher = Dispatcher::builder()
            .route("/boom", "GET", panicking("boom"))
            .unwrap()
            .recovery(handler_fn(|_ctx, req| {
                Box::pin(async move {
                    Response::text(StatusCode::SERVICE_UNAVAILABLE, format!("recovered {}", req.uri().path()))
                })
            }))
            .build()
            .unwrap();

        let response = dispatcher.dispatch(request(Method::GET, "/boom")).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body(response).await, "recovered /boom");
    }

    #[tokio::test]
    async fn test_panicking_recovery_handler() {
        let provider = Arc::new(CountingProvider::default());
        let dispatcher = Dispatcher::builder()
            .route("/boom", "GET", panicking("first"))
            .unwrap()
            .recovery(panicking("second"))
            .context_provider(provider.clone())
            .build()
            .unwrap();

        let response = dispatcher.dispatch(request(Method::GET, "/boom")).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body(response).await, RECOVERY_FAILED_BODY);
        assert_eq!(provider.released.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_panicking_not_found_handler_is_contained() {
        let dispatcher = Dispatcher::builder()
            .not_found(panicking("nf"))
            .build()
            .unwrap();
        let response = dispatcher.dispatch(request(Method::GET, "/x")).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_prefix() {
        let dispatcher = Dispatcher::builder()
            .route("/", "GET", text("root"))
            .unwrap()
            .route("/users", "GET", handler_fn(|_ctx, req| {
                Box::pin(async move {
                    Response::text(StatusCode::OK, req.uri().query().unwrap_or_default().to_string())
                })
            }))
            .unwrap()
            .prefix("api/")
            .build()
            .unwrap();
        assert_eq!(dispatcher.mount_prefix(), Some("/api"));

        assert_eq!(body(dispatcher.dispatch(request(Method::GET, "/api")).await).await, "root");
        assert_eq!(
            body(dispatcher.dispatch(request(Method::GET, "/api/users?page=2")).await).await,
            "page=2"
        );
        // Not under the mount point: routed as is
        assert_eq!(
            dispatcher.dispatch(request(Method::GET, "/apiusers")).await.status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            dispatcher.dispatch(request(Method::GET, "/users")).await.status(),
            StatusCode::OK
        );
    }

    #[test]
    fn test_normalize_prefix() {
        assert_eq!(normalize_prefix(""), None);
        assert_eq!(normalize_prefix("/"), None);
        assert_eq!(normalize_prefix("v1"), Some("/v1".to_string()));
        assert_eq!(normalize_prefix("/v1//"), Some("/v1".to_string()));
    }

    #[tokio::test]
    async fn test_ready_endpoint() {
        let dispatcher = Dispatcher::builder()
            .ready_endpoint(DEFAULT_READY_PATH)
            .build()
            .unwrap();

        let ready = dispatcher.dispatch(request(Method::GET, "/ready")).await;
        assert_eq!(ready.status(), StatusCode::OK);
        assert_eq!(body(ready).await, "ok");

        dispatcher.readiness().set_ready(false);
        let draining = dispatcher.dispatch(request(Method::GET, "/ready")).await;
        assert_eq!(draining.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body(draining).await, "shutting down");
    }

    #[tokio::test]
    async fn test_first_registration_wins() {
        let dispatcher = Dispatcher::builder()
            .route("/dup/<x>", "GET", text("first"))
            .unwrap()
            .route("/dup/<x>", "GET", text("second"))
            .unwrap()
            .build()
            .unwrap();
        let response = dispatcher.dispatch(request(Method::GET, "/dup/1")).await;
        assert_eq!(body(response).await, "first");
    }

    #[test]
    fn test_bad_route_is_setup_error() {
        let err = Dispatcher::builder()
            .route("/x", "GET FETCH", text("x"))
            .unwrap_err();
        assert!(err.is_method_error());

        assert!(Dispatcher::builder()
            .route("/x/<id:[unclosed>", "GET", text("x"))
            .is_err());
    }
}
