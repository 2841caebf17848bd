//! Core middleware trait and types.
//!
//! This module defines the [`Middleware`] trait that every stage implements.
//! A middleware sees the request before the handler and the response after
//! it, and may short-circuit by returning a response without calling
//! [`Next::run`].
//!
//! # Example
//!
//! ```
//! use switchyard_core::{BoxFuture, Context, Request, Response};
//! use switchyard_middleware::{Middleware, Next};
//!
//! struct Timing;
//!
//! impl Middleware for Timing {
//!     fn name(&self) -> &'static str {
//!         "timing"
//!     }
//!
//!     fn process<'a>(
//!         &'a self,
//!         ctx: &'a mut Context,
//!         request: Request,
//!         next: Next<'a>,
//!     ) -> BoxFuture<'a, Response> {
//!         Box::pin(async move {
//!             let started = std::time::Instant::now();
//!             let response = next.run(ctx, request).await;
//!             tracing::debug!(elapsed = ?started.elapsed(), "request finished");
//!             response
//!         })
//!     }
//! }
//! ```

use std::sync::Arc;

use switchyard_core::{BoxFuture, Context, Handler, Request, Response};

/// The core middleware trait.
///
/// Middleware receives the per-request [`Context`], the request, and a
/// [`Next`] that continues the chain.
///
/// # Invariants
///
/// - Middleware calls `next.run()` at most once
/// - A middleware that short-circuits should call [`Context::abort`] so
///   later observers know the handler did not run
pub trait Middleware: Send + Sync + 'static {
    /// Returns the name of this middleware, used in logs.
    fn name(&self) -> &'static str;

    /// Processes the request through this middleware.
    ///
    /// # Arguments
    ///
    /// * `ctx` - The per-request context
    /// * `request` - The incoming HTTP request
    /// * `next` - Continuation to the rest of the chain
    fn process<'a>(
        &'a self,
        ctx: &'a mut Context,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response>;
}

/// A shared, type-erased middleware.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// Continuation to the next middleware in the chain, or to the handler.
///
/// `run` consumes `self`, so the rest of the chain can run at most once.
pub struct Next<'a> {
    inner: NextInner<'a>,
}

enum NextInner<'a> {
    Chain {
        middleware: &'a dyn Middleware,
        next: Box<Next<'a>>,
    },
    Handler(&'a dyn Handler),
}

impl<'a> Next<'a> {
    /// Creates a `Next` that runs `middleware`, then `next`.
    #[must_use]
    pub fn new(middleware: &'a dyn Middleware, next: Next<'a>) -> Self {
        Self {
            inner: NextInner::Chain {
                middleware,
                next: Box::new(next),
            },
        }
    }

    /// Creates a terminal `Next` that invokes `handler`.
    #[must_use]
    pub fn handler(handler: &'a dyn Handler) -> Self {
        Self {
            inner: NextInner::Handler(handler),
        }
    }

    /// Invokes the next middleware or the handler.
    pub async fn run(self, ctx: &mut Context, request: Request) -> Response {
        match self.inner {
            NextInner::Chain { middleware, next } => middleware.process(ctx, request, *next).await,
            NextInner::Handler(handler) => handler.call(ctx, request).await,
        }
    }
}

impl std::fmt::Debug for Next<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.inner {
            NextInner::Chain { middleware, .. } => {
                f.debug_tuple("Next").field(&middleware.name()).finish()
            }
            NextInner::Handler(_) => f.write_str("Next(handler)"),
        }
    }
}

/// A middleware built from a closure.
///
/// # Example
///
/// ```
/// use switchyard_middleware::FnMiddleware;
///
/// let tag = FnMiddleware::new("tag", |ctx, req, next| {
///     Box::pin(async move {
///         ctx.set("tagged", true);
///         next.run(ctx, req).await
///     })
/// });
/// # let _ = tag;
/// ```
pub struct FnMiddleware<F> {
    name: &'static str,
    func: F,
}

impl<F> FnMiddleware<F>
where
    F: for<'a> Fn(&'a mut Context, Request, Next<'a>) -> BoxFuture<'a, Response>
        + Send
        + Sync
        + 'static,
{
    /// Creates a new function-based middleware.
    pub fn new(name: &'static str, func: F) -> Self {
        Self { name, func }
    }
}

impl<F> Middleware for FnMiddleware<F>
where
    F: for<'a> Fn(&'a mut Context, Request, Next<'a>) -> BoxFuture<'a, Response>
        + Send
        + Sync
        + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut Context,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        (self.func)(ctx, request, next)
    }
}

impl<M: Middleware + ?Sized> Middleware for Arc<M> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut Context,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        (**self).process(ctx, request, next)
    }
}
