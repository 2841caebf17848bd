//! # Switchyard Test
//!
//! In-memory testing for Switchyard dispatchers. Requests go through the
//! full dispatch path (prefix stripping, routing, middleware, panic
//! containment) without binding a port.
//!
//! ```ignore
//! use switchyard_test::TestClient;
//!
//! let client = TestClient::new(dispatcher);
//! client
//!     .get("/user/42")
//!     .header("X-Request-ID", "abc")
//!     .send()
//!     .await
//!     .assert_status(StatusCode::OK)
//!     .assert_header("x-request-id", "abc");
//! ```

#![doc(html_root_url = "https://docs.rs/switchyard-test/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod error;
mod request;
mod response;

pub use client::{TestClient, TestClientRequest, DEFAULT_REMOTE_ADDR};
pub use error::TestError;
pub use request::{TestRequest, TestRequestBuilder};
pub use response::TestResponse;
