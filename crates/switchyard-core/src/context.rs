//! Per-request context.
//!
//! A [`Context`] is the scratch object one request owns from routing to
//! response. It holds the routed path, the segment ranges and candidate
//! entries produced by the route table, the winning route, lazily resolved
//! path parameters, and arbitrary typed extension data.
//!
//! Contexts are recycled through a [`ContextPool`](crate::ContextPool).
//! [`Context::reset`] returns one to its empty state, truncating its
//! buffers and releasing any that grew past [`CAPACITY_CEILING`].

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::ops::Range;
use std::sync::{Arc, OnceLock};

use http::Method;
use switchyard_router::{CompiledRoute, EntryId, Params, Resolution, RouteTable};

/// Buffers that grew beyond this many elements are released on reset
/// instead of being retained for the next request.
pub const CAPACITY_CEILING: usize = 1024;

/// Per-request state shared between middleware and the handler.
///
/// # Example
///
/// ```
/// use switchyard_core::Context;
///
/// let mut ctx = Context::new();
/// ctx.set("user_id", 42_u64);
/// assert_eq!(ctx.get::<u64>("user_id"), Some(&42));
///
/// // Callers own type consistency per key
/// assert_eq!(ctx.get::<u32>("user_id"), None);
/// ```
#[derive(Default)]
pub struct Context {
    path: String,
    segments: Vec<Range<usize>>,
    entries: Vec<EntryId>,
    route: Option<Arc<CompiledRoute>>,
    params: OnceLock<Params>,
    param_map: OnceLock<HashMap<String, String>>,
    data: HashMap<String, Box<dyn Any + Send + Sync>>,
    aborted: bool,
}

impl Context {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Routes `path` through `table`, recording the candidates, segment
    /// ranges, and winning route in this context.
    pub fn resolve<H>(&mut self, table: &RouteTable<H>, method: &Method, path: &str) -> Resolution {
        self.path.clear();
        self.path.push_str(path);
        self.entries.clear();
        self.segments.clear();
        self.route = None;
        self.params = OnceLock::new();
        self.param_map = OnceLock::new();

        let resolution = table.resolve(method, &self.path, &mut self.entries, &mut self.segments);
        if let Resolution::Matched(id) = resolution {
            self.entries.clear();
            self.entries.push(id);
            self.route = Some(Arc::clone(table.entry(id).route()));
        }
        resolution
    }

    /// Returns the value bound to the path parameter `name`.
    ///
    /// Parameters are resolved from the winning route on first access.
    /// Unknown names and names of literal segments return `None`.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        let route = self.route.as_deref()?;
        self.resolved_params(route).get(route, &self.path, name)
    }

    /// Returns every path parameter as an owned map.
    ///
    /// Built once per request and memoized.
    #[must_use]
    pub fn param_map(&self) -> &HashMap<String, String> {
        self.param_map.get_or_init(|| {
            let Some(route) = self.route.as_deref() else {
                return HashMap::new();
            };
            self.resolved_params(route)
                .iter(route, &self.path)
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect()
        })
    }

    fn resolved_params(&self, route: &CompiledRoute) -> &Params {
        self.params.get_or_init(|| {
            let mut params = Params::new();
            params.resolve(route, &self.path, &self.segments);
            params
        })
    }

    /// Stores a value under `key`, replacing any previous value.
    pub fn set<T: Any + Send + Sync>(&mut self, key: impl Into<String>, value: T) {
        self.data.insert(key.into(), Box::new(value));
    }

    /// Returns the value under `key` if it exists and has type `T`.
    #[must_use]
    pub fn get<T: Any>(&self, key: &str) -> Option<&T> {
        self.data.get(key).and_then(|value| value.downcast_ref::<T>())
    }

    /// Returns a mutable reference to the value under `key` if it has type `T`.
    pub fn get_mut<T: Any>(&mut self, key: &str) -> Option<&mut T> {
        self.data
            .get_mut(key)
            .and_then(|value| value.downcast_mut::<T>())
    }

    /// Removes the value under `key`, returning it if it had type `T`.
    pub fn remove<T: Any>(&mut self, key: &str) -> Option<T> {
        self.data
            .remove(key)
            .and_then(|value| value.downcast::<T>().ok())
            .map(|value| *value)
    }

    /// Returns true if a value is stored under `key`.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Marks the request as aborted.
    ///
    /// This is advisory: nothing stops the chain, downstream middleware and
    /// handlers are expected to check [`Context::is_aborted`].
    pub fn abort(&mut self) {
        self.aborted = true;
    }

    /// Returns true once [`Context::abort`] has been called.
    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.aborted
    }

    /// The template of the winning route, if any.
    #[must_use]
    pub fn route_template(&self) -> Option<&str> {
        self.route.as_deref().map(CompiledRoute::template)
    }

    /// The path as routed, after any mount prefix was stripped.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Byte ranges of the path's segments.
    ///
    /// Empty when the request was served by the static fast path.
    #[must_use]
    pub fn segments(&self) -> &[Range<usize>] {
        &self.segments
    }

    /// Iterates the path's segments as strings.
    pub fn segment_strs(&self) -> impl Iterator<Item = &str> {
        self.segments
            .iter()
            .filter_map(|range| self.path.get(range.clone()))
    }

    /// Route entries recorded by the last [`resolve`](Self::resolve).
    ///
    /// After a match this is exactly the winning entry, whichever table
    /// answered. Otherwise it holds the radix candidates that were
    /// considered, in registration order.
    #[must_use]
    pub fn entries(&self) -> &[EntryId] {
        &self.entries
    }

    /// Returns the context to its empty state.
    ///
    /// Collections are truncated; any whose capacity exceeds
    /// [`CAPACITY_CEILING`] is replaced by a fresh one.
    pub fn reset(&mut self) {
        reset_vec(&mut self.segments);
        reset_vec(&mut self.entries);
        if self.path.capacity() > CAPACITY_CEILING {
            self.path = String::new();
        } else {
            self.path.clear();
        }
        if self.data.capacity() > CAPACITY_CEILING {
            self.data = HashMap::new();
        } else {
            self.data.clear();
        }
        self.route = None;
        self.params = OnceLock::new();
        self.param_map = OnceLock::new();
        self.aborted = false;
    }

    /// Returns true if the context holds no request state.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.path.is_empty()
            && self.segments.is_empty()
            && self.entries.is_empty()
            && self.data.is_empty()
            && self.route.is_none()
            && self.params.get().is_none()
            && self.param_map.get().is_none()
            && !self.aborted
    }
}

fn reset_vec<T>(buf: &mut Vec<T>) {
    if buf.capacity() > CAPACITY_CEILING {
        *buf = Vec::new();
    } else {
        buf.clear();
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("path", &self.path)
            .field("route", &self.route_template())
            .field("segments", &self.segments)
            .field("entries", &self.entries)
            .field("data_keys", &self.data.keys().collect::<Vec<_>>())
            .field("aborted", &self.aborted)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn routed(template: &str, path: &str) -> Context {
        let mut table = RouteTable::new();
        table.insert(template, "GET", ()).unwrap();
        let mut ctx = Context::new();
        let resolution = ctx.resolve(&table, &Method::GET, path);
        assert!(matches!(resolution, Resolution::Matched(_)));
        ctx
    }

    #[test]
    fn test_param_lookup() {
        let ctx = routed("/user/<id:isDigits>/<tab>", "/user/42/posts");
        assert_eq!(ctx.param("id"), Some("42"));
        assert_eq!(ctx.param("tab"), Some("posts"));
        assert_eq!(ctx.param("user"), None);
        assert_eq!(ctx.param("missing"), None);
        assert_eq!(ctx.route_template(), Some("/user/<id:isDigits>/<tab>"));
    }

    #[test]
    fn test_param_map_memoized() {
        let ctx = routed("/orgs/{org}/repos/{repo}", "/orgs/acme/repos/api");
        let first = ctx.param_map() as *const _;
        assert_eq!(ctx.param_map().len(), 2);
        assert_eq!(ctx.param_map()["org"], "acme");
        assert_eq!(first, ctx.param_map() as *const _);
    }

    #[test]
    fn test_static_route_has_no_params() {
        let ctx = routed("/health", "/health");
        assert!(ctx.segments().is_empty());
        assert_eq!(ctx.param("health"), None);
        assert!(ctx.param_map().is_empty());
    }

    #[test]
    fn test_entries_hold_the_winner_on_every_match() {
        let mut table = RouteTable::new();
        let listing = table.insert("/users", "GET", ()).unwrap();
        let by_id = table.insert("/users/<id:isDigits>", "GET", ()).unwrap();
        let by_name = table.insert("/users/<name>", "POST", ()).unwrap();

        let mut ctx = Context::new();
        assert!(matches!(ctx.resolve(&table, &Method::GET, "/users"), Resolution::Matched(_)));
        assert_eq!(ctx.entries(), &[listing]);

        let resolution = ctx.resolve(&table, &Method::GET, "/users/7");
        assert!(matches!(resolution, Resolution::Matched(id) if id == by_id));
        assert_eq!(ctx.entries(), &[by_id]);

        let resolution = ctx.resolve(&table, &Method::DELETE, "/users/7");
        assert!(matches!(resolution, Resolution::MethodNotAllowed(_)));
        assert_eq!(ctx.entries(), &[by_id, by_name]);
    }

    #[test]
    fn test_data_roundtrip_and_type_mismatch() {
        let mut ctx = Context::new();
        ctx.set("name", String::from("ada"));
        assert_eq!(ctx.get::<String>("name").map(String::as_str), Some("ada"));
        assert!(ctx.get::<&str>("name").is_none());

        if let Some(name) = ctx.get_mut::<String>("name") {
            name.push('!');
        }
        assert_eq!(ctx.remove::<String>("name").as_deref(), Some("ada!"));
        assert!(!ctx.contains("name"));
    }

    #[test]
    fn test_abort_is_sticky_until_reset() {
        let mut ctx = Context::new();
        assert!(!ctx.is_aborted());
        ctx.abort();
        assert!(ctx.is_aborted());
        ctx.reset();
        assert!(!ctx.is_aborted());
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut ctx = routed("/a/<b>", "/a/x");
        ctx.set("k", 1_u8);
        ctx.abort();
        let _ = ctx.param("b");
        let _ = ctx.param_map();

        ctx.reset();
        assert!(ctx.is_clean());
        assert_eq!(ctx.param("b"), None);
    }

    #[test]
    fn test_reset_drops_oversized_buffers() {
        let mut ctx = Context::new();
        ctx.segments.extend((0..CAPACITY_CEILING * 2).map(|i| i..i));
        ctx.entries.extend(0..CAPACITY_CEILING * 2);
        ctx.reset();
        assert!(ctx.segments.capacity() <= CAPACITY_CEILING);
        assert!(ctx.entries.capacity() <= CAPACITY_CEILING);

        ctx.entries.extend(0..16);
        let kept = ctx.entries.capacity();
        ctx.reset();
        assert_eq!(ctx.entries.capacity(), kept);
    }

    #[test]
    fn test_resolve_clears_previous_request() {
        let mut table = RouteTable::new();
        table.insert("/a/<x>", "GET", ()).unwrap();
        table.insert("/b/<y>", "GET", ()).unwrap();

        let mut ctx = Context::new();
        ctx.resolve(&table, &Method::GET, "/a/1");
        assert_eq!(ctx.param("x"), Some("1"));

        ctx.resolve(&table, &Method::GET, "/b/2");
        assert_eq!(ctx.param("x"), None);
        assert_eq!(ctx.param("y"), Some("2"));
        assert_eq!(ctx.segment_strs().collect::<Vec<_>>(), vec!["b", "2"]);
    }
}
