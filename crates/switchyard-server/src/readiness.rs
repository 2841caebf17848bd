//! Readiness reporting.
//!
//! [`Readiness`] is the shared flag behind the readiness endpoint. The
//! server clears it as soon as shutdown begins, so load balancers stop
//! routing new traffic while in-flight requests drain.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A readiness check function.
type CheckFn = Arc<dyn Fn() -> bool + Send + Sync>;

/// Shared readiness state.
///
/// Clones share the same flag.
///
/// # Example
///
/// ```rust
/// use switchyard_server::Readiness;
///
/// let readiness = Readiness::new();
/// let probe = readiness.clone();
/// assert!(probe.is_ready());
///
/// readiness.set_ready(false);
/// assert!(!probe.is_ready());
/// ```
#[derive(Clone)]
pub struct Readiness {
    ready: Arc<AtomicBool>,
    checks: Vec<(String, CheckFn)>,
}

impl fmt::Debug for Readiness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Readiness")
            .field("ready", &self.ready)
            .field("checks", &self.checks.iter().map(|(n, _)| n).collect::<Vec<_>>())
            .finish()
    }
}

impl Default for Readiness {
    fn default() -> Self {
        Self::new()
    }
}

impl Readiness {
    /// Creates a readiness flag that starts out ready.
    #[must_use]
    pub fn new() -> Self {
        Self {
            ready: Arc::new(AtomicBool::new(true)),
            checks: Vec::new(),
        }
    }

    /// Adds a named check that must also pass for the service to be ready.
    ///
    /// ```rust
    /// use switchyard_server::Readiness;
    ///
    /// let readiness = Readiness::new().add_check("cache_warm", || false);
    /// assert!(!readiness.is_ready());
    /// ```
    #[must_use]
    pub fn add_check<F>(mut self, name: impl Into<String>, check: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        self.checks.push((name.into(), Arc::new(check)));
        self
    }

    /// Sets the shared flag.
    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    /// Returns true if the flag is set and every check passes.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst) && self.checks.iter().all(|(_, check)| check())
    }

    /// Returns the names of checks that currently fail.
    #[must_use]
    pub fn failing_checks(&self) -> Vec<&str> {
        self.checks
            .iter()
            .filter(|(_, check)| !check())
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_ready() {
        assert!(Readiness::new().is_ready());
    }

    #[test]
    fn test_flag_is_shared_between_clones() {
        let readiness = Readiness::new();
        let clone = readiness.clone();
        clone.set_ready(false);
        assert!(!readiness.is_ready());
        readiness.set_ready(true);
        assert!(clone.is_ready());
    }

    #[test]
    fn test_checks() {
        let flag = Arc::new(AtomicBool::new(true));
        let probe = Arc::clone(&flag);
        let readiness = Readiness::new()
            .add_check("database", move || probe.load(Ordering::SeqCst))
            .add_check("config", || true);

        assert!(readiness.is_ready());
        assert!(readiness.failing_checks().is_empty());

        flag.store(false, Ordering::SeqCst);
        assert!(!readiness.is_ready());
        assert_eq!(readiness.failing_checks(), vec!["database"]);
    }
}
