//! Client address resolution.

use std::net::{IpAddr, SocketAddr};

use switchyard_core::{BoxFuture, Context, RemoteAddr, Request, Response};

use crate::middleware::{Middleware, Next};

/// Context key holding the resolved client address as a `String`.
pub const REAL_IP_KEY: &str = "real_ip";

const X_REAL_IP: &str = "x-real-ip";
const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Returns the client address stored by [`RealIp`], if the stage ran.
#[must_use]
pub fn real_ip(ctx: &Context) -> Option<&str> {
    ctx.get::<String>(REAL_IP_KEY).map(String::as_str)
}

/// Resolves the client address and stores it under [`REAL_IP_KEY`].
///
/// Sources, first match wins:
///
/// 1. `X-Real-IP`
/// 2. the first hop of `X-Forwarded-For`
/// 3. the socket peer from the [`RemoteAddr`] extension
///
/// When the resolved value parses as an IP address, the request's
/// [`RemoteAddr`] extension is rewritten to it, keeping the peer port.
///
/// Proxy headers are taken at face value. Put this stage behind a proxy
/// that overwrites them.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealIp;

impl RealIp {
    fn resolve(request: &Request) -> Option<String> {
        let header = |name: &str| {
            request
                .headers()
                .get(name)
                .and_then(|value| value.to_str().ok())
        };

        if let Some(ip) = header(X_REAL_IP).map(str::trim).filter(|ip| !ip.is_empty()) {
            return Some(ip.to_string());
        }

        if let Some(ip) = header(X_FORWARDED_FOR)
            .and_then(|xff| xff.split(',').next())
            .map(str::trim)
            .filter(|ip| !ip.is_empty())
        {
            return Some(ip.to_string());
        }

        request
            .extensions()
            .get::<RemoteAddr>()
            .map(|RemoteAddr(addr)| addr.ip().to_string())
    }
}

impl Middleware for RealIp {
    fn name(&self) -> &'static str {
        "real_ip"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut Context,
        mut request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        if let Some(ip) = Self::resolve(&request) {
            if let Ok(parsed) = ip.parse::<IpAddr>() {
                let port = request
                    .extensions()
                    .get::<RemoteAddr>()
                    .map_or(0, |RemoteAddr(addr)| addr.port());
                request
                    .extensions_mut()
                    .insert(RemoteAddr(SocketAddr::new(parsed, port)));
            }
            ctx.set(REAL_IP_KEY, ip);
        }
        Box::pin(next.run(ctx, request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::StatusCode;
    use switchyard_core::{handler_fn, ResponseExt};

    fn peer() -> RemoteAddr {
        RemoteAddr("10.0.0.9:51000".parse().unwrap())
    }

    async fn resolve(headers: &[(&str, &str)], remote: Option<RemoteAddr>) -> (Option<String>, String) {
        let mut builder = http::Request::builder().uri("/");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let mut request = builder.body(Bytes::new()).unwrap();
        if let Some(remote) = remote {
            request.extensions_mut().insert(remote);
        }

        let handler = handler_fn(|_ctx, req| {
            Box::pin(async move {
                let addr = req
                    .extensions()
                    .get::<RemoteAddr>()
                    .map(|RemoteAddr(addr)| addr.to_string())
                    .unwrap_or_default();
                Response::text(StatusCode::OK, addr)
            })
        });
        let mut ctx = Context::new();
        let response = RealIp.process(&mut ctx, request, Next::handler(&handler)).await;
        let body = String::from_utf8_lossy(&response.body_bytes().await).into_owned();
        (real_ip(&ctx).map(String::from), body)
    }

    #[tokio::test]
    async fn test_prefers_x_real_ip() {
        let (ip, remote) = resolve(
            &[(X_REAL_IP, " 203.0.113.7 "), (X_FORWARDED_FOR, "198.51.100.1")],
            Some(peer()),
        )
        .await;
        assert_eq!(ip.as_deref(), Some("203.0.113.7"));
        assert_eq!(remote, "203.0.113.7:51000");
    }

    #[tokio::test]
    async fn test_first_forwarded_hop() {
        let (ip, _) = resolve(&[(X_FORWARDED_FOR, "198.51.100.1, 10.0.0.1")], Some(peer())).await;
        assert_eq!(ip.as_deref(), Some("198.51.100.1"));
    }

    #[tokio::test]
    async fn test_falls_back_to_peer() {
        let (ip, remote) = resolve(&[], Some(peer())).await;
        assert_eq!(ip.as_deref(), Some("10.0.0.9"));
        assert_eq!(remote, "10.0.0.9:51000");
    }

    #[tokio::test]
    async fn test_non_ip_value_is_stored_but_not_applied() {
        let (ip, remote) = resolve(&[(X_REAL_IP, "unknown")], Some(peer())).await;
        assert_eq!(ip.as_deref(), Some("unknown"));
        assert_eq!(remote, "10.0.0.9:51000");
    }

    #[tokio::test]
    async fn test_nothing_known() {
        let (ip, _) = resolve(&[], None).await;
        assert!(ip.is_none());
    }
}
