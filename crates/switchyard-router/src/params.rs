//! Lazily materialized path parameters.
//!
//! Matching a route only records segment byte ranges. [`Params`] turns those
//! into parameter slots on first access: one slot per non-static segment,
//! narrowed to the capture group for submatch patterns. Slots are ranges into
//! the request path, so materializing allocates nothing for the common case.

use std::ops::Range;

use smallvec::SmallVec;

use crate::pattern::CompiledRoute;

/// Maximum number of parameters stored inline (stack allocated).
const INLINE_PARAMS: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Slot {
    /// Position of the segment pattern in the route
    pattern: usize,
    range: Range<usize>,
}

/// Parameter slots resolved against one route and one path.
///
/// # Example
///
/// ```rust
/// use switchyard_router::{split_segments, CompiledRoute, Params};
///
/// let route = CompiledRoute::compile("/orgs/<org>/v/<ver:v([0-9]+)>").unwrap();
/// let path = "/orgs/acme/v/v3";
/// let mut segments = Vec::new();
/// split_segments(path, &mut segments);
///
/// let mut params = Params::new();
/// params.resolve(&route, path, &segments);
/// assert_eq!(params.get(&route, path, "org"), Some("acme"));
/// assert_eq!(params.get(&route, path, "ver"), Some("3"));
/// assert_eq!(params.get(&route, path, "orgs"), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    slots: SmallVec<[Slot; INLINE_PARAMS]>,
}

impl Params {
    /// Creates an empty parameter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fills the slots for `route` from the segment ranges of `path`,
    /// replacing any previous contents.
    pub fn resolve(&mut self, route: &CompiledRoute, path: &str, segments: &[Range<usize>]) {
        self.slots.clear();
        for (index, (pattern, seg)) in route.patterns().iter().zip(segments).enumerate() {
            if pattern.is_static() {
                continue;
            }
            let Some(value) = path.get(seg.clone()) else {
                continue;
            };
            let captured = pattern.capture(value);
            self.slots.push(Slot {
                pattern: index,
                range: seg.start + captured.start..seg.start + captured.end,
            });
        }
    }

    /// Returns the value bound to parameter `name`.
    ///
    /// Static segments never bind, even when their text equals `name`.
    #[must_use]
    pub fn get<'p>(&self, route: &CompiledRoute, path: &'p str, name: &str) -> Option<&'p str> {
        self.slots
            .iter()
            .find(|slot| route.patterns()[slot.pattern].name() == name)
            .and_then(|slot| path.get(slot.range.clone()))
    }

    /// Iterates `(name, value)` pairs in path order.
    pub fn iter<'a>(
        &'a self,
        route: &'a CompiledRoute,
        path: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        self.slots.iter().filter_map(move |slot| {
            let name = route.patterns()[slot.pattern].name();
            path.get(slot.range.clone()).map(|value| (name, value))
        })
    }

    /// Returns true if there are no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Returns the number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns the slot capacity currently reserved.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    /// Clears all parameters.
    ///
    /// Heap storage larger than `ceiling` slots is released instead of
    /// retained.
    pub fn clear(&mut self, ceiling: usize) {
        if self.slots.capacity() > ceiling {
            self.slots = SmallVec::new();
        } else {
            self.slots.clear();
        }
    }
}
