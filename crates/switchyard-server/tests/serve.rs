//! Socket-level server tests.
//!
//! These bind real loopback listeners on ephemeral ports and talk to them
//! with Hyper's client connection API.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use http::{Method, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper::client::conn::http1;
use hyper_util::rt::TokioIo;
use switchyard_core::{handler_fn, Context, ContextProvider, RemoteAddr, Response, ResponseExt};
use switchyard_server::{Dispatcher, Server, ServerConfig, ShutdownSignal};
use tokio::net::TcpStream;

fn dispatcher() -> Dispatcher {
    Dispatcher::builder()
        .route(
            "/peer",
            "GET",
            handler_fn(|_ctx, req| {
                Box::pin(async move {
                    let peer = req
                        .extensions()
                        .get::<RemoteAddr>()
                        .map(|RemoteAddr(addr)| addr.ip().to_string())
                        .unwrap_or_default();
                    Response::text(StatusCode::OK, peer)
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
        .route(
            "/slow",
            "GET",
            handler_fn(|_ctx, _req| {
                Box::pin(async move {
                    tokio::time::sleep(Duration::from_millis(200)).await;
                    Response::text(StatusCode::OK, "done")
                })
            }),
        )
        .unwrap()
        .ready_endpoint("/ready")
        .build()
        .unwrap()
}

fn config(workers: usize) -> ServerConfig {
    ServerConfig::builder()
        .listen("127.0.0.1:0", "test")
        .workers(workers)
        .shutdown_timeout(Duration::from_secs(2))
        .build()
}

async fn send(addr: SocketAddr, method: Method, path: &str, body: &'static str) -> (StatusCode, String) {
    let stream = TcpStream::connect(addr).await.unwrap();
    let (mut sender, conn) = http1::handshake(TokioIo::new(stream)).await.unwrap();
    tokio::spawn(conn);

    let request = http::Request::builder()
        .method(method)
        .uri(path)
        .header(http::header::HOST, "localhost")
        .body(Full::new(Bytes::from_static(body.as_bytes())))
        .unwrap();
    let response = sender.send_request(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8_lossy(&body).into_owned())
}

#[tokio::test]
async fn test_serves_requests_until_shutdown() {
    let server = Server::new(dispatcher(), config(2));
    let dispatcher = Arc::clone(server.dispatcher());
    let bound = server.bind().unwrap();
    let addr = bound.local_addrs()[0];

    let shutdown = ShutdownSignal::new();
    let running = tokio::spawn(bound.serve_with_shutdown(shutdown.clone()));

    assert_eq!(send(addr, Method::GET, "/ready", "").await, (StatusCode::OK, "ok".to_string()));
    assert_eq!(
        send(addr, Method::GET, "/peer", "").await,
        (StatusCode::OK, "127.0.0.1".to_string())
    );
    assert_eq!(
        send(addr, Method::POST, "/echo", "ping").await,
        (StatusCode::OK, "ping".to_string())
    );
    assert_eq!(send(addr, Method::GET, "/missing", "").await.0, StatusCode::NOT_FOUND);

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(5), running)
        .await
        .expect("server stops within the deadline")
        .unwrap()
        .unwrap();
    assert!(!dispatcher.readiness().is_ready());
}

#[tokio::test]
async fn test_in_flight_request_finishes_during_drain() {
    let bound = Server::new(dispatcher(), config(1)).bind().unwrap();
    let addr = bound.local_addrs()[0];

    let shutdown = ShutdownSignal::new();
    let running = tokio::spawn(bound.serve_with_shutdown(shutdown.clone()));

    let slow = tokio::spawn(send(addr, Method::GET, "/slow", ""));
    tokio::time::sleep(Duration::from_millis(50)).await;
    shutdown.trigger();

    assert_eq!(slow.await.unwrap(), (StatusCode::OK, "done".to_string()));
    tokio::time::timeout(Duration::from_secs(5), running)
        .await
        .expect("server stops after draining")
        .unwrap()
        .unwrap();
}

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

#[tokio::test]
async fn test_connection_past_deadline_is_force_closed() {
    let counts = Arc::new(CountingProvider::default());
    let provider: Arc<dyn ContextProvider> = counts.clone();
    let dispatcher = Dispatcher::builder()
        .route(
            "/stuck",
            "GET",
            handler_fn(|_ctx, _req| {
                Box::pin(async move {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    Response::text(StatusCode::OK, "too late")
                })
            }),
        )
        .unwrap()
        .context_provider(provider)
        .build()
        .unwrap();
    let config = ServerConfig::builder()
        .listen("127.0.0.1:0", "test")
        .workers(1)
        .shutdown_timeout(Duration::from_millis(300))
        .build();

    let bound = Server::new(dispatcher, config).bind().unwrap();
    let addr = bound.local_addrs()[0];
    let shutdown = ShutdownSignal::new();
    let running = tokio::spawn(bound.serve_with_shutdown(shutdown.clone()));

    let stuck = tokio::spawn(async move {
        let stream = TcpStream::connect(addr).await.unwrap();
        let (mut sender, conn) = http1::handshake(TokioIo::new(stream)).await.unwrap();
        tokio::spawn(conn);
        let request = http::Request::builder()
            .uri("/stuck")
            .header(http::header::HOST, "localhost")
            .body(Full::new(Bytes::new()))
            .unwrap();
        sender.send_request(request).await
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    let started = Instant::now();
    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(2), running)
        .await
        .expect("server stops at the deadline")
        .unwrap()
        .unwrap();
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(250), "returned early: {elapsed:?}");
    assert!(elapsed < Duration::from_millis(1500), "returned late: {elapsed:?}");

    let outcome = tokio::time::timeout(Duration::from_secs(2), stuck)
        .await
        .expect("client sees the close")
        .unwrap();
    assert!(outcome.is_err(), "request should not complete");

    for _ in 0..50 {
        if counts.released.load(Ordering::SeqCst) == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(counts.acquired.load(Ordering::SeqCst), 1);
    assert_eq!(counts.released.load(Ordering::SeqCst), 1);
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn test_port_sharing_group() {
    let bound = Server::new(dispatcher(), config(3)).bind().unwrap();
    assert_eq!(bound.socket_count(), 3);
    let addr = bound.local_addrs()[0];

    let shutdown = ShutdownSignal::new();
    let running = tokio::spawn(bound.serve_with_shutdown(shutdown.clone()));

    for _ in 0..6 {
        assert_eq!(send(addr, Method::GET, "/ready", "").await.0, StatusCode::OK);
    }

    shutdown.trigger();
    running.await.unwrap().unwrap();
}
