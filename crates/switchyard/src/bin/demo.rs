//! switchyard-demo - a small service on top of the Switchyard engine.
//!
//! ```text
//! switchyard-demo [config.toml]
//! ```
//!
//! Settings come from the optional file, then `SWITCHYARD__*` environment
//! variables. Setup errors end the process before any listener opens.

use anyhow::Context as _;
use serde_json::json;
use switchyard::middleware::stages::{real_ip, request_id, RateLimit};
use switchyard::prelude::*;
use tracing::info;

fn hello() -> impl Handler {
    handler_fn(|ctx, _req| {
        Box::pin(async move {
            let name = ctx.param("name").unwrap_or("world").to_string();
            Response::text(StatusCode::OK, format!("hello, {name}\n"))
        })
    })
}

fn user() -> impl Handler {
    handler_fn(|ctx, _req| {
        Box::pin(async move {
            let body = json!({
                "id": ctx.param("id"),
                "client": real_ip(ctx),
                "request_id": request_id(ctx),
            });
            Response::json(StatusCode::OK, &body)
        })
    })
}

fn files() -> impl Handler {
    handler_fn(|ctx, _req| {
        Box::pin(async move {
            let path = ctx.param("path").unwrap_or_default().to_string();
            Response::text(StatusCode::OK, format!("would serve {path}\n"))
        })
    })
}

fn crash(message: &str) -> Response {
    panic!("{message}")
}

fn dispatcher(config: &SwitchyardConfig) -> anyhow::Result<Dispatcher> {
    let mut chain = stages::defaults();
    chain.push(RateLimit::builder().trusted_proxies(["127.0.0.1/32"]).build());

    let builder = Dispatcher::builder()
        .route("/", "GET", handler_fn(|_ctx, _req| {
            Box::pin(async { Response::text(StatusCode::OK, "switchyard\n") })
        }))?
        .route("/hello/<name:[a-z]+>", "GET", hello())?
        .route("/user/<id:isDigits>", "GET", user())?
        .route("/files/<path:.*>", "GET", files())?
        .route("/panic", "GET", handler_fn(|_ctx, _req| {
            Box::pin(async { crash("demo handler failure") })
        }))?
        .use_chain(chain)
        .recovery(handler_fn(|ctx, _req| {
            Box::pin(async move {
                let body = json!({ "error": "internal", "request_id": request_id(ctx) });
                Response::json(StatusCode::INTERNAL_SERVER_ERROR, &body)
            })
        }));

    Ok(config.apply_to(builder).build()?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args().nth(1);

    let mut loader = ConfigLoader::new();
    if let Some(path) = &config_path {
        loader = loader
            .with_file(path)
            .with_context(|| format!("loading {path}"))?;
    }
    let config = loader
        .with_env_prefix("SWITCHYARD")
        .load()
        .context("invalid configuration")?;

    init_logging(&config.log_config())?;

    let dispatcher = dispatcher(&config).context("route setup failed")?;
    info!(routes = dispatcher.route_count(), "starting switchyard-demo");

    Server::new(dispatcher, config.server_config())
        .serve()
        .await
        .context("server failed")?;

    info!("switchyard-demo stopped");
    Ok(())
}
