//! Radix tree router and route template compiler for Switchyard.
//!
//! This crate owns everything that happens before a handler runs: compiling
//! route templates into segment patterns, encoding accepted methods as a
//! bitmask, and resolving a concrete `(method, path)` pair to the entry that
//! should serve it.
//!
//! # Features
//!
//! - **Static fast path**: routes without parameters resolve through an
//!   exact-path map
//! - **Radix tree**: parameterized routes resolve through a compressed trie
//!   keyed by skeleton (`/user/*/posts`)
//! - **Named matchers**: common segment shapes (`isDigits`, `isUUID`, ...)
//!   are checked without a regex engine
//! - **Regex fallback**: any other pattern compiles to an anchored regex,
//!   optionally binding its first capture
//! - **405 support**: method mismatches report the union of accepted methods
//!
//! # Example
//!
//! ```rust
//! use switchyard_router::{MethodSet, Resolution, RouteTable};
//! use http::Method;
//!
//! let mut table = RouteTable::new();
//! table.insert("/users", "GET", "listUsers").unwrap();
//! table.insert("/users/<id:isDigits>", "GET DELETE", "user").unwrap();
//! table.insert("/article/<a:([a-z]+)>", "GET", "article").unwrap();
//!
//! let mut candidates = Vec::new();
//! let mut segments = Vec::new();
//!
//! let res = table.resolve(&Method::POST, "/users", &mut candidates, &mut segments);
//! assert_eq!(res, Resolution::MethodNotAllowed(MethodSet::GET));
//!
//! let res = table.resolve(&Method::GET, "/users/abc", &mut candidates, &mut segments);
//! assert_eq!(res, Resolution::NotFound);
//! ```
//!
//! # Route Priority
//!
//! Candidates are tried in tree order: literal branches before the wildcard
//! branch at each position, registration order among entries on the same
//! leaf. The first candidate whose method and patterns both pass wins; there
//! is no specificity ranking between overlapping parameter routes.

pub mod matchers;

mod error;
mod method;
mod node;
mod params;
mod pattern;
mod router;

pub use error::RouteError;
pub use matchers::NamedMatcher;
pub use method::MethodSet;
pub use node::Node;
pub use params::Params;
pub use pattern::{split_segments, CompiledRoute, PatternKind, SegmentPattern, WILDCARD};
pub use router::{EntryId, Resolution, RouteEntry, RouteTable};

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;

    fn table(routes: &[(&'static str, &str)]) -> RouteTable<&'static str> {
        let mut table = RouteTable::new();
        for (template, methods) in routes {
            table.insert(template, methods, *template).unwrap();
        }
        table
    }

    fn handler_for(table: &RouteTable<&'static str>, method: Method, path: &str) -> Option<&'static str> {
        match table.resolve(&method, path, &mut Vec::new(), &mut Vec::new()) {
            Resolution::Matched(id) => Some(*table.entry(id).handler()),
            _ => None,
        }
    }

    #[test]
    fn test_longer_static_route_wins_over_prefix() {
        let t = table(&[("/users", "GET"), ("/users/me", "GET")]);
        assert_eq!(handler_for(&t, Method::GET, "/users/me"), Some("/users/me"));
        assert_eq!(handler_for(&t, Method::GET, "/users"), Some("/users"));
    }

    #[test]
    fn test_static_segment_beats_param_in_tree() {
        let t = table(&[("/files/<name>/raw", "GET"), ("/files/latest/raw", "GET")]);
        assert_eq!(handler_for(&t, Method::GET, "/files/latest/raw"), Some("/files/latest/raw"));
        assert_eq!(handler_for(&t, Method::GET, "/files/a.txt/raw"), Some("/files/<name>/raw"));
    }

    #[test]
    fn test_regex_and_named_routes() {
        let t = table(&[("/article/<a:([a-z]+)>", "GET"), ("/id/<id:isUUID>", "GET")]);
        assert_eq!(handler_for(&t, Method::GET, "/article/hello"), Some("/article/<a:([a-z]+)>"));
        assert_eq!(handler_for(&t, Method::GET, "/article/123"), None);
        assert_eq!(
            handler_for(&t, Method::GET, "/id/123e4567-e89b-12d3-a456-426614174000"),
            Some("/id/<id:isUUID>")
        );
    }

    #[test]
    fn test_any_method_route() {
        let t = table(&[("/hook/<name>", "ANY")]);
        assert_eq!(handler_for(&t, Method::PATCH, "/hook/x"), Some("/hook/<name>"));
        assert_eq!(
            handler_for(&t, Method::from_bytes(b"PURGE").unwrap(), "/hook/x"),
            Some("/hook/<name>")
        );
    }

    #[test]
    fn test_segment_count_must_match() {
        let t = table(&[("/a/<b>", "GET")]);
        assert_eq!(handler_for(&t, Method::GET, "/a"), None);
        assert_eq!(handler_for(&t, Method::GET, "/a/b/c"), None);
    }
}
