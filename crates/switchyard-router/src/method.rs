//! HTTP method bitmask.
//!
//! Each route entry accepts a set of methods encoded one bit per method.
//! The `ANY` bit accepts every method, including ones outside the table.
//!
//! # Example
//!
//! ```rust
//! use switchyard_router::MethodSet;
//! use http::Method;
//!
//! let methods = MethodSet::parse("GET POST").unwrap();
//! assert!(methods.allows(&Method::GET));
//! assert!(methods.allows(&Method::HEAD));
//! assert!(!methods.allows(&Method::DELETE));
//! assert_eq!(methods.allow_header(), "GET, HEAD, POST, OPTIONS");
//! ```

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use http::Method;

use crate::error::RouteError;

/// A set of accepted HTTP methods.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct MethodSet(u8);

impl MethodSet {
    /// No methods.
    pub const EMPTY: Self = Self(0);
    /// `GET`
    pub const GET: Self = Self(1 << 0);
    /// `POST`
    pub const POST: Self = Self(1 << 1);
    /// `PUT`
    pub const PUT: Self = Self(1 << 2);
    /// `DELETE`
    pub const DELETE: Self = Self(1 << 3);
    /// `PATCH`
    pub const PATCH: Self = Self(1 << 4);
    /// `HEAD`
    pub const HEAD: Self = Self(1 << 5);
    /// `OPTIONS`
    pub const OPTIONS: Self = Self(1 << 6);
    /// Every method.
    pub const ANY: Self = Self(1 << 7);

    const TABLE: [(&'static str, Self); 8] = [
        ("GET", Self::GET),
        ("POST", Self::POST),
        ("PUT", Self::PUT),
        ("DELETE", Self::DELETE),
        ("PATCH", Self::PATCH),
        ("HEAD", Self::HEAD),
        ("OPTIONS", Self::OPTIONS),
        ("ANY", Self::ANY),
    ];

    // Allow header order
    const ALLOW_ORDER: [(&'static str, Self); 7] = [
        ("GET", Self::GET),
        ("HEAD", Self::HEAD),
        ("POST", Self::POST),
        ("PUT", Self::PUT),
        ("DELETE", Self::DELETE),
        ("PATCH", Self::PATCH),
        ("OPTIONS", Self::OPTIONS),
    ];

    /// Parses a method list such as `"GET POST"`, `"get,put"` or
    /// `"GET|HEAD"`.
    ///
    /// Tokens are separated by spaces, commas, or `|` and compared
    /// case-insensitively. Duplicates are harmless.
    pub fn parse(list: &str) -> Result<Self, RouteError> {
        let mut set = Self::EMPTY;
        for token in list
            .split(|c: char| c == ' ' || c == ',' || c == '|')
            .filter(|t| !t.is_empty())
        {
            let bit = Self::TABLE
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(token))
                .map(|(_, bit)| *bit)
                .ok_or_else(|| RouteError::UnknownMethod {
                    token: token.to_string(),
                    list: list.to_string(),
                })?;
            set |= bit;
        }

        if set == Self::EMPTY {
            return Err(RouteError::EmptyMethodList);
        }
        Ok(set)
    }

    /// Returns the bit for a concrete request method, or [`MethodSet::EMPTY`]
    /// for methods outside the table.
    #[must_use]
    pub fn bit_for(method: &Method) -> Self {
        match *method {
            Method::GET => Self::GET,
            Method::POST => Self::POST,
            Method::PUT => Self::PUT,
            Method::DELETE => Self::DELETE,
            Method::PATCH => Self::PATCH,
            Method::HEAD => Self::HEAD,
            Method::OPTIONS => Self::OPTIONS,
            _ => Self::EMPTY,
        }
    }

    /// Returns true if a request with `method` is accepted.
    ///
    /// `ANY` accepts everything. `HEAD` is also accepted by `GET` entries.
    #[inline]
    #[must_use]
    pub fn allows(self, method: &Method) -> bool {
        if self.contains(Self::ANY) {
            return true;
        }
        let bit = Self::bit_for(method);
        if bit == Self::HEAD {
            return self.intersects(Self::HEAD | Self::GET);
        }
        self.intersects(bit)
    }

    /// Returns true if every bit of `other` is set.
    #[must_use]
    pub fn contains(self, other: Self) -> bool {
        other.0 != 0 && self.0 & other.0 == other.0
    }

    /// Returns true if any bit of `other` is set.
    #[must_use]
    pub fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Returns the union of both sets.
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// The raw bits.
    #[must_use]
    pub fn bits(self) -> u8 {
        self.0
    }

    /// Returns true if no method is set.
    #[must_use]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Renders the `Allow` header value for a 405 response.
    ///
    /// Methods are listed in a fixed order. `HEAD` follows from `GET`,
    /// `OPTIONS` is always listed, and `ANY` lists everything.
    #[must_use]
    pub fn allow_header(self) -> String {
        let mut effective = self;
        if effective.contains(Self::ANY) {
            effective = Self(0x7f);
        }
        if effective.contains(Self::GET) {
            effective |= Self::HEAD;
        }
        effective |= Self::OPTIONS;

        let names: Vec<&str> = Self::ALLOW_ORDER
            .iter()
            .filter(|(_, bit)| effective.contains(*bit))
            .map(|(name, _)| *name)
            .collect();
        names.join(", ")
    }
}

impl BitOr for MethodSet {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl BitOrAssign for MethodSet {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for MethodSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (name, bit) in Self::TABLE {
            if self.contains(bit) {
                if !first {
                    f.write_str(" ")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_and_multiple() {
        assert_eq!(MethodSet::parse("GET").unwrap(), MethodSet::GET);
        assert_eq!(
            MethodSet::parse("GET POST").unwrap(),
            MethodSet::GET | MethodSet::POST
        );
        assert_eq!(MethodSet::parse("GET POST").unwrap().bits(), 3);
    }

    #[test]
    fn test_parse_delimiters_and_case() {
        let expected = MethodSet::GET | MethodSet::PUT | MethodSet::DELETE;
        assert_eq!(MethodSet::parse("get,put|DELETE").unwrap(), expected);
        assert_eq!(MethodSet::parse("  GET   PUT , DELETE ").unwrap(), expected);
        assert_eq!(MethodSet::parse("GET GET").unwrap(), MethodSet::GET);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            MethodSet::parse("GET FETCH"),
            Err(RouteError::UnknownMethod { ref token, .. }) if token == "FETCH"
        ));
        assert!(matches!(MethodSet::parse(""), Err(RouteError::EmptyMethodList)));
        assert!(matches!(MethodSet::parse(" , "), Err(RouteError::EmptyMethodList)));
    }

    #[test]
    fn test_allows() {
        let set = MethodSet::parse("POST PATCH").unwrap();
        assert!(set.allows(&Method::POST));
        assert!(set.allows(&Method::PATCH));
        assert!(!set.allows(&Method::GET));
        assert!(!set.allows(&Method::HEAD));
        assert!(!set.allows(&Method::TRACE));
    }

    #[test]
    fn test_head_follows_get() {
        assert!(MethodSet::GET.allows(&Method::HEAD));
        assert!(MethodSet::HEAD.allows(&Method::HEAD));
        assert!(!MethodSet::HEAD.allows(&Method::GET));
    }

    #[test]
    fn test_any_bypasses() {
        let any = MethodSet::parse("ANY").unwrap();
        assert!(any.allows(&Method::GET));
        assert!(any.allows(&Method::TRACE));
        assert!(any.allows(&Method::from_bytes(b"PURGE").unwrap()));
    }

    #[test]
    fn test_allow_header() {
        assert_eq!(MethodSet::GET.allow_header(), "GET, HEAD, OPTIONS");
        assert_eq!(
            (MethodSet::PATCH | MethodSet::POST).allow_header(),
            "POST, PATCH, OPTIONS"
        );
        assert_eq!(MethodSet::EMPTY.allow_header(), "OPTIONS");
        assert_eq!(
            MethodSet::ANY.allow_header(),
            "GET, HEAD, POST, PUT, DELETE, PATCH, OPTIONS"
        );
    }

    #[test]
    fn test_display() {
        let set = MethodSet::parse("put get").unwrap();
        assert_eq!(set.to_string(), "GET PUT");
    }
}
