//! End-to-end dispatch scenarios driven through the in-memory client.

use http::StatusCode;
use switchyard_core::{handler_fn, Handler, Response, ResponseExt};
use switchyard_middleware::stages::{self, real_ip, request_id};
use switchyard_server::Dispatcher;
use switchyard_test::TestClient;

fn text(body: &'static str) -> impl Handler {
    handler_fn(move |_ctx, _req| Box::pin(async move { Response::text(StatusCode::OK, body) }))
}

fn echo_param(name: &'static str) -> impl Handler {
    handler_fn(move |ctx, _req| {
        Box::pin(async move {
            let value = ctx.param(name).unwrap_or("<missing>").to_string();
            Response::text(StatusCode::OK, value)
        })
    })
}

fn explode(message: &str) -> Response {
    panic!("{message}")
}

#[tokio::test]
async fn test_static_route_and_method_not_allowed() {
    let client = TestClient::new(
        Dispatcher::builder()
            .route("/users", "GET", text("all users"))
            .unwrap()
            .build()
            .unwrap(),
    );

    client
        .get("/users")
        .send()
        .await
        .assert_status(StatusCode::OK)
        .assert_body_eq("all users");

    let response = client.post("/users").send().await;
    response
        .assert_status(StatusCode::METHOD_NOT_ALLOWED)
        .assert_body_eq("405 method not allowed");
    assert_eq!(response.allow(), Some("GET, HEAD, OPTIONS"));

    client.head("/users").send().await.assert_status(StatusCode::OK);
}

#[tokio::test]
async fn test_named_matcher_parameter() {
    let client = TestClient::new(
        Dispatcher::builder()
            .route("/user/<id:isDigits>", "GET", echo_param("id"))
            .unwrap()
            .build()
            .unwrap(),
    );

    client
        .get("/user/42")
        .send()
        .await
        .assert_status(StatusCode::OK)
        .assert_body_eq("42");

    let response = client.get("/user/abc").send().await;
    response
        .assert_status(StatusCode::NOT_FOUND)
        .assert_body_eq("404 page not found")
        .assert_no_header("allow");
}

#[tokio::test]
async fn test_longer_static_path_is_not_a_prefix_match() {
    let client = TestClient::new(
        Dispatcher::builder()
            .route("/users", "GET", text("collection"))
            .unwrap()
            .route("/users/me", "GET", text("current user"))
            .unwrap()
            .build()
            .unwrap(),
    );

    client.get("/users/me").send().await.assert_body_eq("current user");
    client.get("/users").send().await.assert_body_eq("collection");
    client.get("/users/you").send().await.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_regex_parameter() {
    let client = TestClient::new(
        Dispatcher::builder()
            .route("/article/<a:([a-z]+)>", "GET", echo_param("a"))
            .unwrap()
            .build()
            .unwrap(),
    );

    client.get("/article/hello").send().await.assert_body_eq("hello");
    client.get("/article/123").send().await.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_string_panic_yields_generic_500() {
    let client = TestClient::new(
        Dispatcher::builder()
            .route(
                "/boom",
                "GET",
                handler_fn(|_ctx, _req| Box::pin(async { explode("database password is hunter2") })),
            )
            .unwrap()
            .route("/ok", "GET", text("still fine"))
            .unwrap()
            .build()
            .unwrap(),
    );

    let response = client.get("/boom").send().await;
    response
        .assert_status(StatusCode::INTERNAL_SERVER_ERROR)
        .assert_body_eq("Internal Server Error");
    assert!(!response.text().unwrap().contains("hunter2"));

    client.get("/ok").send().await.assert_body_eq("still fine");
}

#[tokio::test]
async fn test_default_stages_on_matched_routes() {
    let client = TestClient::new(
        Dispatcher::builder()
            .route(
                "/whoami",
                "GET",
                handler_fn(|ctx, _req| {
                    Box::pin(async move {
                        let body = format!(
                            "{} {}",
                            real_ip(ctx).unwrap_or("-"),
                            request_id(ctx).unwrap_or("-")
                        );
                        Response::text(StatusCode::OK, body)
                    })
                }),
            )
            .unwrap()
            .use_chain(stages::defaults())
            .build()
            .unwrap(),
    );

    let response = client
        .get("/whoami")
        .header("X-Forwarded-For", "203.0.113.9, 10.0.0.1")
        .header("X-Request-ID", "req-7")
        .send()
        .await;
    response
        .assert_status(StatusCode::OK)
        .assert_body_eq("203.0.113.9 req-7")
        .assert_header("x-request-id", "req-7")
        .assert_header("pragma", "no-cache");

    let generated = client.get("/whoami").send().await;
    let body = generated.text().unwrap();
    let (ip, id) = body.split_once(' ').unwrap();
    assert_eq!(ip, "127.0.0.1");
    assert_eq!(generated.header_str("x-request-id"), Some(id));

    // Unmatched requests bypass the chain.
    client
        .get("/nowhere")
        .send()
        .await
        .assert_status(StatusCode::NOT_FOUND)
        .assert_no_header("x-request-id");
}

#[tokio::test]
async fn test_mount_prefix_and_readiness() {
    let client = TestClient::new(
        Dispatcher::builder()
            .route("/", "GET", text("root"))
            .unwrap()
            .route("/items/<id>", "GET", echo_param("id"))
            .unwrap()
            .prefix("/api")
            .ready_endpoint("/ready")
            .build()
            .unwrap(),
    );

    client.get("/api").send().await.assert_body_eq("root");
    client.get("/api/items/9").send().await.assert_body_eq("9");
    client.get("/apix/items/9").send().await.assert_status(StatusCode::NOT_FOUND);

    client.get("/api/ready").send().await.assert_body_eq("ok");
    client.dispatcher().readiness().set_ready(false);
    client
        .get("/api/ready")
        .send()
        .await
        .assert_status(StatusCode::SERVICE_UNAVAILABLE)
        .assert_body_eq("shutting down");
}

#[tokio::test]
async fn test_encoded_path_is_decoded_before_routing() {
    let client = TestClient::new(
        Dispatcher::builder()
            .route("/search/<q:isSafeText>", "GET", echo_param("q"))
            .unwrap()
            .route("/echo/<q>", "GET", echo_param("q"))
            .unwrap()
            .build()
            .unwrap(),
    );

    client
        .get("/search/hello%20world")
        .send()
        .await
        .assert_status(StatusCode::OK)
        .assert_body_eq("hello world");

    client
        .get("/echo/caf%C3%A9")
        .send()
        .await
        .assert_status(StatusCode::OK)
        .assert_body_eq("café");

    client
        .get("/echo/%FF%FE")
        .send()
        .await
        .assert_status(StatusCode::BAD_REQUEST)
        .assert_body_contains("not valid UTF-8");
}
