//! Panic containment for handler futures.
//!
//! [`catch_panic`] drives a future and turns a panic raised while polling it
//! into a [`PanicError`]. While a guarded future is being polled, the
//! process panic hook records the panic location and a backtrace for the
//! error instead of printing to stderr. Panics outside a guard reach the
//! previously installed hook unchanged.

use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::{Cell, RefCell};
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::Once;
use std::task::{Context as TaskContext, Poll};

use futures_util::FutureExt;

use crate::error::{PanicError, PanicSite};
use crate::types::BoxFuture;

thread_local! {
    static GUARD_DEPTH: Cell<usize> = const { Cell::new(0) };
    static LAST_SITE: RefCell<Option<PanicSite>> = const { RefCell::new(None) };
}

static HOOK: Once = Once::new();

fn install_hook() {
    HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if GUARD_DEPTH.with(Cell::get) == 0 {
                previous(info);
                return;
            }
            let site = PanicSite {
                location: info
                    .location()
                    .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column())),
                backtrace: Backtrace::force_capture().to_string(),
            };
            LAST_SITE.with(|slot| *slot.borrow_mut() = Some(site));
        }));
    });
}

struct DepthGuard;

impl DepthGuard {
    fn enter() -> Self {
        GUARD_DEPTH.with(|depth| depth.set(depth.get() + 1));
        Self
    }
}

impl Drop for DepthGuard {
    fn drop(&mut self) {
        GUARD_DEPTH.with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}

/// Marks every poll of the inner future as guarded.
struct Guarded<F>(F);

impl<F: Future + Unpin> Future for Guarded<F> {
    type Output = F::Output;

    fn poll(mut self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<Self::Output> {
        let _depth = DepthGuard::enter();
        Pin::new(&mut self.0).poll(cx)
    }
}

/// Drives `future` to completion, converting a panic into an error.
///
/// # Example
///
/// ```
/// use switchyard_core::catch_panic;
///
/// # tokio_test::block_on(async {
/// let err = catch_panic(Box::pin(async { panic!("db down") }))
///     .await
///     .unwrap_err();
/// assert_eq!(err.to_string(), "panic occurred: db down");
/// # });
/// ```
pub async fn catch_panic<T>(future: BoxFuture<'_, T>) -> Result<T, PanicError> {
    install_hook();
    AssertUnwindSafe(Guarded(future))
        .catch_unwind()
        .await
        .map_err(from_payload)
}

/// Normalizes a panic payload into a [`PanicError`], attaching the site
/// recorded by the hook on this thread, if any.
pub fn from_payload(payload: Box<dyn Any + Send>) -> PanicError {
    let site = LAST_SITE.with(|slot| slot.borrow_mut().take());
    let message = match payload.downcast::<String>() {
        Ok(message) => Some(*message),
        Err(payload) => payload.downcast_ref::<&'static str>().map(|s| (*s).to_string()),
    };
    match message {
        Some(message) => PanicError::Message { message, site },
        None => PanicError::Unknown { site },
    }
}
