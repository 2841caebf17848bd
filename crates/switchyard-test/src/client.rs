//! In-memory test client.

use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http::Method;
use serde::Serialize;
use switchyard_server::Dispatcher;

use crate::error::TestError;
use crate::request::{TestRequest, TestRequestBuilder};
use crate::response::TestResponse;

/// Peer address used when a request does not set one.
pub const DEFAULT_REMOTE_ADDR: SocketAddr = SocketAddr::V4(std::net::SocketAddrV4::new(
    std::net::Ipv4Addr::LOCALHOST,
    40_000,
));

/// Drives a [`Dispatcher`] without sockets.
///
/// Requests run through the same path as served traffic: mount prefix,
/// route resolution, middleware, panic containment and 404/405 handling.
///
/// # Example
///
/// ```
/// use http::StatusCode;
/// use switchyard_core::{handler_fn, Response, ResponseExt};
/// use switchyard_server::Dispatcher;
/// use switchyard_test::TestClient;
///
/// # tokio_test_block(async {
/// let dispatcher = Dispatcher::builder()
///     .route("/users", "GET", handler_fn(|_ctx, _req| {
///         Box::pin(async { Response::text(StatusCode::OK, "users") })
///     }))
///     .unwrap()
///     .build()
///     .unwrap();
///
/// let client = TestClient::new(dispatcher);
/// client.get("/users").send().await.assert_status(StatusCode::OK);
/// client
///     .post("/users")
///     .send()
///     .await
///     .assert_status(StatusCode::METHOD_NOT_ALLOWED)
///     .assert_header("allow", "GET, HEAD, OPTIONS");
/// # });
/// # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
/// # }
/// ```
#[must_use]
pub struct TestClient {
    dispatcher: Arc<Dispatcher>,
    default_headers: Vec<(String, String)>,
    remote_addr: SocketAddr,
}

impl TestClient {
    /// Creates a client for `dispatcher`.
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self::from_shared(Arc::new(dispatcher))
    }

    /// Creates a client for a shared dispatcher.
    pub fn from_shared(dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            dispatcher,
            default_headers: Vec::new(),
            remote_addr: DEFAULT_REMOTE_ADDR,
        }
    }

    /// The dispatcher under test.
    #[must_use]
    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Adds a header sent with every request.
    pub fn with_default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    /// Sets the peer address for requests that do not set their own.
    pub fn with_remote_addr(mut self, addr: SocketAddr) -> Self {
        self.remote_addr = addr;
        self
    }

    /// Creates a GET request.
    pub fn get(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::GET, uri)
    }

    /// Creates a HEAD request.
    pub fn head(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::HEAD, uri)
    }

    /// Creates a POST request.
    pub fn post(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::POST, uri)
    }

    /// Creates a PUT request.
    pub fn put(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::PUT, uri)
    }

    /// Creates a PATCH request.
    pub fn patch(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::PATCH, uri)
    }

    /// Creates a DELETE request.
    pub fn delete(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::DELETE, uri)
    }

    /// Creates an OPTIONS request.
    pub fn options(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::OPTIONS, uri)
    }

    /// Creates a request with any method.
    pub fn request(&self, method: Method, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        let mut builder = TestRequestBuilder::new(method, uri).remote_addr(self.remote_addr);
        for (name, value) in &self.default_headers {
            builder = builder.header(name, value);
        }
        TestClientRequest { client: self, builder }
    }

    /// Dispatches a prepared request.
    pub async fn dispatch(&self, request: TestRequest) -> Result<TestResponse, TestError> {
        let response = self.dispatcher.dispatch(request.into_request()).await;
        TestResponse::from_response(response).await
    }
}

impl std::fmt::Debug for TestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestClient")
            .field("dispatcher", &self.dispatcher)
            .field("remote_addr", &self.remote_addr)
            .finish_non_exhaustive()
    }
}

/// A request bound to a [`TestClient`].
#[must_use]
pub struct TestClientRequest<'a> {
    client: &'a TestClient,
    builder: TestRequestBuilder,
}

impl TestClientRequest<'_> {
    /// Appends a header.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.builder = self.builder.header(name, value);
        self
    }

    /// Sets the Content-Type header.
    pub fn content_type(mut self, content_type: impl AsRef<str>) -> Self {
        self.builder = self.builder.content_type(content_type);
        self
    }

    /// Overrides the peer address.
    pub fn remote_addr(mut self, addr: SocketAddr) -> Self {
        self.builder = self.builder.remote_addr(addr);
        self
    }

    /// Sets the raw request body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.builder = self.builder.body(body);
        self
    }

    /// Sets the request body as JSON.
    pub fn json<T: Serialize>(mut self, value: &T) -> Self {
        self.builder = self.builder.json(value);
        self
    }

    /// Sends the request.
    ///
    /// # Panics
    ///
    /// Panics if the request could not be built; use
    /// [`try_send`](Self::try_send) to inspect the error instead.
    pub async fn send(self) -> TestResponse {
        match self.try_send().await {
            Ok(response) => response,
            Err(e) => panic!("test request failed: {e}"),
        }
    }

    /// Sends the request and returns build errors.
    pub async fn try_send(self) -> Result<TestResponse, TestError> {
        let request = self.builder.build()?;
        self.client.dispatch(request).await
    }
}

#[cfg(test)]
mod tests {
    use http::StatusCode;
    use switchyard_core::{handler_fn, RemoteAddr, Response, ResponseExt};

    use super::*;

    fn client() -> TestClient {
        let dispatcher = Dispatcher::builder()
            .route(
                "/whoami",
                "GET",
                handler_fn(|_ctx, req| {
                    Box::pin(async move {
                        let peer = req
                            .extensions()
                            .get::<RemoteAddr>()
                            .map(|RemoteAddr(addr)| addr.to_string())
                            .unwrap_or_default();
                        let tenant = req
                            .headers()
                            .get("x-tenant")
                            .and_then(|v| v.to_str().ok())
                            .unwrap_or("none")
                            .to_string();
                        Response::text(StatusCode::OK, format!("{peer} {tenant}"))
                    })
                }),
            )
            .unwrap()
            .route(
                "/echo",
                "POST",
                handler_fn(|_ctx, req| Box::pin(async move { Response::text(StatusCode::OK, req.into_body()) })),
            )
            .unwrap()
            .build()
            .unwrap();
        TestClient::new(dispatcher)
    }

    #[tokio::test]
    async fn test_default_peer_and_headers() {
        let client = client().with_default_header("X-Tenant", "acme");
        client
            .get("/whoami")
            .send()
            .await
            .assert_body_eq("127.0.0.1:40000 acme");
    }

    #[tokio::test]
    async fn test_peer_override() {
        let client = client().with_remote_addr("10.1.2.3:9999".parse().unwrap());
        client.get("/whoami").send().await.assert_body_eq("10.1.2.3:9999 none");

        let peer: SocketAddr = "192.0.2.1:1".parse().unwrap();
        client
            .get("/whoami")
            .remote_addr(peer)
            .send()
            .await
            .assert_body_eq("192.0.2.1:1 none");
    }

    #[tokio::test]
    async fn test_body_round_trip() {
        client()
            .post("/echo")
            .json(&serde_json::json!({"n": 1}))
            .send()
            .await
            .assert_status(StatusCode::OK)
            .assert_json_field("n", &serde_json::json!(1));
    }

    #[tokio::test]
    async fn test_try_send_reports_build_errors() {
        let result = client().get("/whoami").header("bad header", "x").try_send().await;
        assert!(matches!(result, Err(TestError::InvalidHeader(_))));
    }
}
