//! Ordered middleware chain.
//!
//! A [`MiddlewareChain`] holds middleware in registration order. When run,
//! the first registered middleware sees the request first and the response
//! last:
//!
//! ```text
//! Request → m1 → m2 → … → handler
//!                            ↓
//! Response ← m1 ← m2 ← … ←──┘
//! ```

use std::sync::Arc;

use switchyard_core::{Context, Handler, Request, Response};

use crate::middleware::{BoxedMiddleware, Middleware, Next};

/// Middleware in registration order.
///
/// # Example
///
/// ```
/// use switchyard_middleware::{stages, MiddlewareChain};
///
/// let mut chain = MiddlewareChain::new();
/// chain.push(stages::NoCache);
/// chain.extend(stages::defaults());
/// assert_eq!(chain.len(), 5);
/// ```
#[derive(Clone, Default)]
pub struct MiddlewareChain {
    stages: Vec<BoxedMiddleware>,
}

impl MiddlewareChain {
    /// Creates an empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a middleware.
    pub fn push<M: Middleware>(&mut self, middleware: M) {
        self.stages.push(Arc::new(middleware));
    }

    /// Appends an already shared middleware.
    pub fn push_shared(&mut self, middleware: BoxedMiddleware) {
        self.stages.push(middleware);
    }

    /// Appends every middleware of `other`, keeping its order.
    pub fn extend(&mut self, other: Self) {
        self.stages.extend(other.stages);
    }

    /// Runs the request through every middleware and then `handler`.
    pub async fn run(&self, ctx: &mut Context, request: Request, handler: &dyn Handler) -> Response {
        self.build(handler).run(ctx, request).await
    }

    /// Builds the chain from back to front.
    fn build<'a>(&'a self, handler: &'a dyn Handler) -> Next<'a> {
        let mut next = Next::handler(handler);
        for middleware in self.stages.iter().rev() {
            next = Next::new(middleware.as_ref(), next);
        }
        next
    }

    /// Names of the middleware, in order.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|m| m.name()).collect()
    }

    /// Number of middleware in the chain.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Returns true if the chain has no middleware.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

impl std::fmt::Debug for MiddlewareChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
