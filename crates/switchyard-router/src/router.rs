//! The route table.
//!
//! [`RouteTable`] owns every registered entry and indexes it twice: static
//! routes go into an exact-path map for constant-time lookup, and every
//! route goes into the radix tree keyed by its skeleton.
//!
//! The table is built single-threaded and is read-only afterwards, so it can
//! be shared across tasks behind an `Arc` without locking.

use std::collections::HashMap;
use std::ops::Range;
use std::sync::Arc;

use http::Method;

use crate::error::RouteError;
use crate::method::MethodSet;
use crate::node::Node;
use crate::pattern::{split_segments, CompiledRoute};

/// Index of an entry in a [`RouteTable`], assigned in registration order.
pub type EntryId = usize;

/// One registered route.
#[derive(Debug)]
pub struct RouteEntry<H> {
    route: Arc<CompiledRoute>,
    methods: MethodSet,
    handler: H,
}

impl<H> RouteEntry<H> {
    /// The compiled template.
    #[must_use]
    pub fn route(&self) -> &Arc<CompiledRoute> {
        &self.route
    }

    /// Methods this entry accepts.
    #[must_use]
    pub fn methods(&self) -> MethodSet {
        self.methods
    }

    /// The handler registered with this entry.
    #[must_use]
    pub fn handler(&self) -> &H {
        &self.handler
    }
}

/// Outcome of resolving a request against the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The first entry passing structure, method, and pattern checks.
    Matched(EntryId),
    /// At least one entry matched structurally but none accepted the
    /// method. Carries the union of their method sets.
    MethodNotAllowed(MethodSet),
    /// Nothing matched structurally.
    NotFound,
}

/// Registered routes indexed for lookup.
///
/// # Example
///
/// ```rust
/// use switchyard_router::{Resolution, RouteTable};
/// use http::Method;
///
/// let mut table = RouteTable::new();
/// table.insert("/users", "GET", "list").unwrap();
/// table.insert("/user/<id:isDigits>", "GET", "show").unwrap();
///
/// let (mut candidates, mut segments) = (Vec::new(), Vec::new());
/// let found = table.resolve(&Method::GET, "/user/42", &mut candidates, &mut segments);
/// let Resolution::Matched(id) = found else { panic!("no match") };
/// assert_eq!(*table.entry(id).handler(), "show");
/// ```
#[derive(Debug)]
pub struct RouteTable<H> {
    root: Node,
    statics: HashMap<String, Vec<EntryId>>,
    entries: Vec<RouteEntry<H>>,
}

impl<H> Default for RouteTable<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> RouteTable<H> {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: Node::root(),
            statics: HashMap::new(),
            entries: Vec::new(),
        }
    }

    /// Compiles and registers a route.
    ///
    /// `methods` is a method list accepted by [`MethodSet::parse`].
    /// Registering the same template twice creates two independent entries.
    pub fn insert(&mut self, template: &str, methods: &str, handler: H) -> Result<EntryId, RouteError> {
        let methods = MethodSet::parse(methods)?;
        let route = CompiledRoute::compile(template)?;
        Ok(self.insert_compiled(Arc::new(route), methods, handler))
    }

    /// Registers an already compiled route.
    pub fn insert_compiled(&mut self, route: Arc<CompiledRoute>, methods: MethodSet, handler: H) -> EntryId {
        let id = self.entries.len();

        if route.is_static() {
            self.statics
                .entry(route.skeleton().to_string())
                .or_default()
                .push(id);
        }
        self.root.insert(route.skeleton().as_bytes(), id);

        self.entries.push(RouteEntry {
            route,
            methods,
            handler,
        });
        id
    }

    /// Returns the static entries registered under exactly `path`.
    #[must_use]
    pub fn static_entries(&self, path: &str) -> Option<&[EntryId]> {
        self.statics.get(path).map(Vec::as_slice)
    }

    /// Appends every structurally plausible entry for `path` to `out`.
    ///
    /// Entries come out in tree order: literal branches before wildcard
    /// branches, registration order within a leaf.
    pub fn search(&self, path: &str, out: &mut Vec<EntryId>) -> bool {
        self.root.search(path.as_bytes(), out)
    }

    /// Resolves a request to an entry.
    ///
    /// `candidates` and `segments` are caller-owned scratch buffers so a
    /// pooled request context can lend its own. On return they hold the
    /// radix candidates and the path's segment ranges; both stay empty on
    /// a static hit.
    pub fn resolve(
        &self,
        method: &Method,
        path: &str,
        candidates: &mut Vec<EntryId>,
        segments: &mut Vec<Range<usize>>,
    ) -> Resolution {
        if let Some(ids) = self.static_entries(path) {
            let mut allowed = MethodSet::EMPTY;
            for &id in ids {
                let entry = &self.entries[id];
                if entry.methods.allows(method) {
                    return Resolution::Matched(id);
                }
                allowed |= entry.methods;
            }
            return Resolution::MethodNotAllowed(allowed);
        }

        if !self.search(path, candidates) {
            return Resolution::NotFound;
        }
        split_segments(path, segments);

        // Entries whose patterns reject the path do not count towards Allow
        let mut allowed = MethodSet::EMPTY;
        for &id in candidates.iter() {
            let entry = &self.entries[id];
            if entry.route.needs_validation() && !entry.route.matches_segments(path, segments) {
                continue;
            }
            if entry.methods.allows(method) {
                return Resolution::Matched(id);
            }
            allowed |= entry.methods;
        }

        if allowed.is_empty() {
            Resolution::NotFound
        } else {
            Resolution::MethodNotAllowed(allowed)
        }
    }

    /// Returns the entry with the given id.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not produced by this table.
    #[must_use]
    pub fn entry(&self, id: EntryId) -> &RouteEntry<H> {
        &self.entries[id]
    }

    /// Iterates entries in registration order.
    pub fn entries(&self) -> impl Iterator<Item = &RouteEntry<H>> {
        self.entries.iter()
    }

    /// Returns the number of registered entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no routes are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The radix tree root, for inspection.
    #[must_use]
    pub fn root(&self) -> &Node {
        &self.root
    }
}
