//! Request and response types shared by every Switchyard crate.

use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;

use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_TYPE};
use http::StatusCode;
use http_body_util::Full;
use serde::Serialize;

/// The HTTP request type seen by middleware and handlers.
///
/// The body is fully buffered before dispatch.
pub type Request = http::Request<Bytes>;

/// The HTTP response type produced by middleware and handlers.
pub type Response = http::Response<Full<Bytes>>;

/// A boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The socket address of the connected peer.
///
/// The server inserts this into every request's extensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoteAddr(pub SocketAddr);

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
const APPLICATION_JSON: &str = "application/json";

/// Extension trait for building common responses.
pub trait ResponseExt {
    /// Creates a `text/plain` response.
    fn text(status: StatusCode, body: impl Into<Bytes>) -> Response;

    /// Creates a response with an empty body.
    fn empty(status: StatusCode) -> Response;

    /// Creates an `application/json` response.
    ///
    /// Falls back to a bare 500 if `value` cannot be serialized.
    fn json<T: Serialize>(status: StatusCode, value: &T) -> Response;

    /// Collects a response body.
    ///
    /// A [`Full`] body is available in one frame, so this never waits.
    fn body_bytes(self) -> BoxFuture<'static, Bytes>;
}

impl ResponseExt for Response {
    fn text(status: StatusCode, body: impl Into<Bytes>) -> Response {
        let mut response = http::Response::new(Full::new(body.into()));
        *response.status_mut() = status;
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static(TEXT_PLAIN));
        response
    }

    fn empty(status: StatusCode) -> Response {
        let mut response = http::Response::new(Full::new(Bytes::new()));
        *response.status_mut() = status;
        response
    }

    fn json<T: Serialize>(status: StatusCode, value: &T) -> Response {
        match serde_json::to_vec(value) {
            Ok(body) => {
                let mut response = http::Response::new(Full::new(Bytes::from(body)));
                *response.status_mut() = status;
                response
                    .headers_mut()
                    .insert(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
                response
            }
            Err(error) => {
                tracing::error!(error = %error, "failed to serialize JSON response");
                Self::empty(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }

    fn body_bytes(self) -> BoxFuture<'static, Bytes> {
        use http_body_util::BodyExt;

        Box::pin(async move {
            match self.into_body().collect().await {
                Ok(collected) => collected.to_bytes(),
                Err(never) => match never {},
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_text_response() {
        let response = Response::text(StatusCode::NOT_FOUND, "404 page not found");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers().get(CONTENT_TYPE).unwrap(), TEXT_PLAIN);
        assert_eq!(response.body_bytes().await, "404 page not found");
    }

    #[tokio::test]
    async fn test_json_response() {
        let response = Response::json(StatusCode::OK, &serde_json::json!({ "id": 7 }));
        assert_eq!(response.headers().get(CONTENT_TYPE).unwrap(), APPLICATION_JSON);
        assert_eq!(response.body_bytes().await, r#"{"id":7}"#);
    }

    #[test]
    fn test_empty_response() {
        let response = Response::empty(StatusCode::NO_CONTENT);
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(response.headers().get(CONTENT_TYPE).is_none());
    }
}
