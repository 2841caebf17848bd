//! `HEAD` to `GET` rewriting.

use http::Method;
use switchyard_core::{BoxFuture, Context, Request, Response};

use crate::middleware::{Middleware, Next};

/// Rewrites `HEAD` requests to `GET` before they reach the handler.
///
/// Routing already accepts `HEAD` on `GET` routes; this stage makes the
/// handler see the method it was registered for. The transport still
/// omits the body because the connection knows the original method.
#[derive(Debug, Clone, Copy, Default)]
pub struct GetHead;

impl Middleware for GetHead {
    fn name(&self) -> &'static str {
        "get_head"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut Context,
        mut request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        if request.method() == Method::HEAD {
            *request.method_mut() = Method::GET;
        }
        Box::pin(next.run(ctx, request))
    }
}
