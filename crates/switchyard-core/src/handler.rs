//! Handler trait for request processing.
//!
//! A [`Handler`] receives the per-request [`Context`] mutably and the
//! request by value, and produces exactly one [`Response`]. Route handlers,
//! the not-found handler, and the recovery handler all share this trait.

use std::sync::Arc;

use crate::context::Context;
use crate::types::{BoxFuture, Request, Response};

/// A request handler.
///
/// # Example
///
/// ```
/// use switchyard_core::{BoxFuture, Context, Handler, Request, Response, ResponseExt};
/// use http::StatusCode;
///
/// struct Hello;
///
/// impl Handler for Hello {
///     fn call<'a>(&'a self, ctx: &'a mut Context, _req: Request) -> BoxFuture<'a, Response> {
///         Box::pin(async move {
///             let name = ctx.param("name").unwrap_or("world").to_string();
///             Response::text(StatusCode::OK, format!("hello {name}"))
///         })
///     }
/// }
/// ```
pub trait Handler: Send + Sync + 'static {
    /// Handles one request.
    fn call<'a>(&'a self, ctx: &'a mut Context, request: Request) -> BoxFuture<'a, Response>;
}

/// A shared, type-erased handler.
pub type BoxedHandler = Arc<dyn Handler>;

/// Adapts a closure into a [`Handler`].
///
/// Created with [`handler_fn`].
pub struct FnHandler<F> {
    func: F,
}

impl<F> Handler for FnHandler<F>
where
    F: for<'a> Fn(&'a mut Context, Request) -> BoxFuture<'a, Response> + Send + Sync + 'static,
{
    fn call<'a>(&'a self, ctx: &'a mut Context, request: Request) -> BoxFuture<'a, Response> {
        (self.func)(ctx, request)
    }
}

/// Creates a handler from a closure returning a boxed future.
///
/// # Example
///
/// ```
/// use switchyard_core::{handler_fn, Response, ResponseExt};
/// use http::StatusCode;
///
/// let show_user = handler_fn(|ctx, _req| {
///     Box::pin(async move {
///         let id = ctx.param("id").unwrap_or_default().to_string();
///         Response::text(StatusCode::OK, id)
///     })
/// });
/// # let _ = show_user;
/// ```
pub fn handler_fn<F>(func: F) -> FnHandler<F>
where
    F: for<'a> Fn(&'a mut Context, Request) -> BoxFuture<'a, Response> + Send + Sync + 'static,
{
    FnHandler { func }
}

impl<H: Handler + ?Sized> Handler for Arc<H> {
    fn call<'a>(&'a self, ctx: &'a mut Context, request: Request) -> BoxFuture<'a, Response> {
        (**self).call(ctx, request)
    }
}
