//! Context pooling.
//!
//! Each request borrows a [`Context`] for its lifetime. [`ContextPool`]
//! keeps released contexts on a free list so their buffers are reused by
//! the next request. Acquiring never waits: a miss allocates a fresh
//! context.
//!
//! The dispatcher talks to the pool through the [`ContextProvider`] trait,
//! so tests can substitute [`UnpooledProvider`] or an instrumented provider.

use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::context::Context;

/// Default number of idle contexts a pool retains.
pub const DEFAULT_MAX_IDLE: usize = 1024;

/// A source of reset contexts.
///
/// Implementations must hand out contexts for which
/// [`Context::is_clean`] holds.
pub trait ContextProvider: Send + Sync + 'static {
    /// Returns a clean context.
    fn acquire(&self) -> Context;

    /// Takes back a context after its request finished.
    fn release(&self, ctx: Context);
}

/// Counters describing pool usage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Contexts allocated because the free list was empty
    pub allocated: u64,
    /// Acquisitions served from the free list
    pub reused: u64,
    /// Contexts returned to the pool
    pub released: u64,
    /// Released contexts dropped because the free list was full
    pub evicted: u64,
}

/// A free-list pool of [`Context`] values.
///
/// # Example
///
/// ```
/// use switchyard_core::ContextPool;
///
/// let pool = ContextPool::new();
/// {
///     let mut ctx = pool.acquire_guard();
///     ctx.set("k", 1_u32);
/// } // released here
///
/// let ctx = pool.acquire_guard();
/// assert!(ctx.get::<u32>("k").is_none());
/// assert_eq!(pool.stats().reused, 1);
/// ```
#[derive(Debug)]
pub struct ContextPool {
    free: Mutex<Vec<Context>>,
    max_idle: usize,
    allocated: AtomicU64,
    reused: AtomicU64,
    released: AtomicU64,
    evicted: AtomicU64,
}

impl Default for ContextPool {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextPool {
    /// Creates a pool retaining up to [`DEFAULT_MAX_IDLE`] idle contexts.
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_idle(DEFAULT_MAX_IDLE)
    }

    /// Creates a pool retaining up to `max_idle` idle contexts.
    #[must_use]
    pub fn with_max_idle(max_idle: usize) -> Self {
        Self {
            free: Mutex::new(Vec::new()),
            max_idle,
            allocated: AtomicU64::new(0),
            reused: AtomicU64::new(0),
            released: AtomicU64::new(0),
            evicted: AtomicU64::new(0),
        }
    }

    /// Acquires a context that is released when the guard drops.
    pub fn acquire_guard(&self) -> PooledContext<'_> {
        PooledContext::new(self)
    }

    /// Number of contexts currently idle.
    #[must_use]
    pub fn idle(&self) -> usize {
        self.free.lock().len()
    }

    /// Returns a snapshot of the usage counters.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            allocated: self.allocated.load(Ordering::Relaxed),
            reused: self.reused.load(Ordering::Relaxed),
            released: self.released.load(Ordering::Relaxed),
            evicted: self.evicted.load(Ordering::Relaxed),
        }
    }
}

impl ContextProvider for ContextPool {
    fn acquire(&self) -> Context {
        let pooled = self.free.lock().pop();
        match pooled {
            Some(mut ctx) => {
                self.reused.fetch_add(1, Ordering::Relaxed);
                ctx.reset();
                ctx
            }
            None => {
                self.allocated.fetch_add(1, Ordering::Relaxed);
                Context::new()
            }
        }
    }

    fn release(&self, mut ctx: Context) {
        self.released.fetch_add(1, Ordering::Relaxed);
        ctx.reset();

        let mut free = self.free.lock();
        if free.len() < self.max_idle {
            free.push(ctx);
        } else {
            drop(free);
            self.evicted.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// A provider that allocates a fresh context every time.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnpooledProvider;

impl ContextProvider for UnpooledProvider {
    fn acquire(&self) -> Context {
        Context::new()
    }

    fn release(&self, _ctx: Context) {}
}

/// A context on loan from a [`ContextProvider`].
///
/// Dereferences to [`Context`] and hands it back to the provider exactly
/// once, when dropped. Dropping happens on every exit path, including a
/// request future that is cancelled mid-flight.
pub struct PooledContext<'p> {
    ctx: Option<Context>,
    provider: &'p dyn ContextProvider,
}

impl<'p> PooledContext<'p> {
    /// Acquires a context from `provider`.
    pub fn new(provider: &'p dyn ContextProvider) -> Self {
        Self {
            ctx: Some(provider.acquire()),
            provider,
        }
    }
}

impl Deref for PooledContext<'_> {
    type Target = Context;

    fn deref(&self) -> &Context {
        // Only `Drop` takes the context out.
        match &self.ctx {
            Some(ctx) => ctx,
            None => unreachable!("pooled context used after release"),
        }
    }
}

impl DerefMut for PooledContext<'_> {
    fn deref_mut(&mut self) -> &mut Context {
        match &mut self.ctx {
            Some(ctx) => ctx,
            None => unreachable!("pooled context used after release"),
        }
    }
}

impl Drop for PooledContext<'_> {
    fn drop(&mut self) {
        if let Some(ctx) = self.ctx.take() {
            self.provider.release(ctx);
        }
    }
}

impl std::fmt::Debug for PooledContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("PooledContext").field(&self.ctx).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

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

    #[test]
    fn test_miss_allocates_then_reuses() {
        let pool = ContextPool::new();
        let ctx = pool.acquire();
        assert_eq!(pool.stats().allocated, 1);
        pool.release(ctx);
        assert_eq!(pool.idle(), 1);

        let _ctx = pool.acquire();
        assert_eq!(pool.stats().reused, 1);
        assert_eq!(pool.idle(), 0);
    }

    #[test]
    fn test_released_context_is_clean() {
        let pool = ContextPool::new();
        let mut ctx = pool.acquire();
        ctx.set("user", "ada".to_string());
        ctx.abort();
        pool.release(ctx);

        let ctx = pool.acquire();
        assert!(ctx.is_clean());
    }

    #[test]
    fn test_max_idle_evicts() {
        let pool = ContextPool::with_max_idle(1);
        let a = pool.acquire();
        let b = pool.acquire();
        pool.release(a);
        pool.release(b);
        assert_eq!(pool.idle(), 1);
        assert_eq!(pool.stats().evicted, 1);
    }

    #[test]
    fn test_guard_releases_exactly_once() {
        let provider = CountingProvider::default();
        {
            let mut guard = PooledContext::new(&provider);
            guard.set("x", 1_i32);
        }
        assert_eq!(provider.acquired.load(Ordering::SeqCst), 1);
        assert_eq!(provider.released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_guard_releases_on_panic() {
        let provider = CountingProvider::default();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = PooledContext::new(&provider);
            panic!("boom");
        }));
        assert!(result.is_err());
        assert_eq!(provider.released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_concurrent_acquire_release() {
        let pool = Arc::new(ContextPool::new());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let pool = Arc::clone(&pool);
                std::thread::spawn(move || {
                    for i in 0..100 {
                        let mut ctx = pool.acquire_guard();
                        assert!(ctx.is_clean());
                        ctx.set("n", t * 1000 + i);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        let stats = pool.stats();
        assert_eq!(stats.allocated + stats.reused, 800);
        assert_eq!(stats.released, 800);
    }
}
