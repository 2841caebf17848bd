//! Named segment matchers.
//!
//! A named matcher is a whole-segment predicate that stands in for a common
//! regular expression without running a regex engine. Route templates refer
//! to them by name (`<id:isDigits>`) or by the regex they replace
//! (`<id:[0-9]+>`, `<id:(\d+)>`).
//!
//! Every matcher except `any` rejects the empty string.
//!
//! # Example
//!
//! ```rust
//! use switchyard_router::matchers;
//!
//! let digits = matchers::lookup("isDigits").unwrap();
//! assert!(digits.matches("2024"));
//! assert!(!digits.matches("20a4"));
//!
//! // Regex spellings resolve to the same predicate
//! let same = matchers::lookup(r"\d+").unwrap();
//! assert_eq!(same.name(), "isDigits");
//! ```

use std::fmt;

/// Signature of a segment predicate.
pub type MatchFn = fn(&str) -> bool;

/// A predicate identified by a short name, with the regular expression it
/// is equivalent to and the regex spellings that resolve to it.
pub struct NamedMatcher {
    name: &'static str,
    regex: &'static str,
    aliases: &'static [&'static str],
    matcher: MatchFn,
}

impl NamedMatcher {
    /// The table name, e.g. `isDigits`.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The regular expression this matcher is equivalent to, unanchored.
    #[must_use]
    pub fn regex(&self) -> &'static str {
        self.regex
    }

    /// Pattern spellings that resolve to this matcher besides its name.
    #[must_use]
    pub fn aliases(&self) -> &'static [&'static str] {
        self.aliases
    }

    /// Tests a whole segment.
    #[inline]
    #[must_use]
    pub fn matches(&self, segment: &str) -> bool {
        (self.matcher)(segment)
    }

    /// Returns true for the always-true `any` matcher.
    #[must_use]
    pub fn is_any(&self) -> bool {
        self.name == ANY
    }
}

impl fmt::Debug for NamedMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamedMatcher")
            .field("name", &self.name)
            .field("regex", &self.regex)
            .finish_non_exhaustive()
    }
}

/// Name of the default matcher used by `<name>` parameters.
pub const ANY: &str = "any";

/// The fixed matcher table.
pub static NAMED_MATCHERS: [NamedMatcher; 16] = [
    NamedMatcher {
        name: "isLowerAlpha",
        regex: "[a-z]+",
        aliases: &["[a-z]+"],
        matcher: is_lower_alpha,
    },
    NamedMatcher {
        name: "isUpperAlpha",
        regex: "[A-Z]+",
        aliases: &["[A-Z]+"],
        matcher: is_upper_alpha,
    },
    NamedMatcher {
        name: "isAlpha",
        regex: "[a-zA-Z]+",
        aliases: &["[a-zA-Z]+"],
        matcher: is_alpha,
    },
    NamedMatcher {
        name: "isDigits",
        regex: "[0-9]+",
        aliases: &["[0-9]+", r"\d+"],
        matcher: is_digits,
    },
    NamedMatcher {
        name: "isAlnum",
        regex: "[a-zA-Z0-9]+",
        aliases: &["[a-zA-Z0-9]+"],
        matcher: is_alnum,
    },
    NamedMatcher {
        name: "isWord",
        regex: "[A-Za-z0-9_]+",
        aliases: &[r"\w+"],
        matcher: is_word,
    },
    NamedMatcher {
        name: "isSlugSafe",
        regex: "[A-Za-z0-9_-]+",
        aliases: &[r"[\w\-]+"],
        matcher: is_slug_safe,
    },
    NamedMatcher {
        name: "isSlug",
        regex: "[a-z0-9-]+",
        aliases: &[r"[a-z0-9\-]+"],
        matcher: is_slug,
    },
    NamedMatcher {
        name: "isHex",
        regex: "[a-fA-F0-9]+",
        aliases: &["[a-fA-F0-9]+"],
        matcher: is_hex,
    },
    NamedMatcher {
        name: "isUUID",
        regex: "[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}",
        aliases: &["8-4-4-4-12"],
        matcher: is_uuid,
    },
    NamedMatcher {
        name: "isSafeText",
        regex: "[a-zA-Z0-9 _.-]+",
        aliases: &["[a-zA-Z0-9 _.-]+"],
        matcher: is_safe_text,
    },
    NamedMatcher {
        name: "isUpperAlnum",
        regex: "[A-Z0-9]+",
        aliases: &["[A-Z0-9]+"],
        matcher: is_upper_alnum,
    },
    NamedMatcher {
        name: "isBase64",
        regex: "[a-zA-Z0-9+/=]+",
        aliases: &["a-zA-Z0-9+/=", "[a-zA-Z0-9+/=]+"],
        matcher: is_base64,
    },
    NamedMatcher {
        name: "isDateYMD",
        regex: "[0-9]{4}-[0-9]{2}-[0-9]{2}",
        aliases: &[r"\d{4}-\d{2}-\d{2}"],
        matcher: is_date_ymd,
    },
    NamedMatcher {
        name: "isSafePath",
        regex: "[a-zA-Z0-9/._-]+",
        aliases: &["[a-zA-Z0-9/._-]+"],
        matcher: is_safe_path,
    },
    NamedMatcher {
        name: ANY,
        regex: "(?s).*",
        aliases: &[".*"],
        matcher: is_any,
    },
];

/// Resolves a matcher by table name or by one of its regex aliases.
#[must_use]
pub fn lookup(key: &str) -> Option<&'static NamedMatcher> {
    NAMED_MATCHERS
        .iter()
        .find(|m| m.name == key || m.aliases.contains(&key))
}

/// The always-true matcher.
#[must_use]
pub fn any() -> &'static NamedMatcher {
    &NAMED_MATCHERS[NAMED_MATCHERS.len() - 1]
}

#[inline]
fn all_bytes(s: &str, pred: impl Fn(u8) -> bool) -> bool {
    !s.is_empty() && s.bytes().all(pred)
}

fn is_lower_alpha(s: &str) -> bool {
    all_bytes(s, |b| b.is_ascii_lowercase())
}

fn is_upper_alpha(s: &str) -> bool {
    all_bytes(s, |b| b.is_ascii_uppercase())
}

fn is_alpha(s: &str) -> bool {
    all_bytes(s, |b| b.is_ascii_alphabetic())
}

fn is_digits(s: &str) -> bool {
    all_bytes(s, |b| b.is_ascii_digit())
}

fn is_alnum(s: &str) -> bool {
    all_bytes(s, |b| b.is_ascii_alphanumeric())
}

#[inline]
fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn is_word(s: &str) -> bool {
    all_bytes(s, is_word_byte)
}

fn is_slug_safe(s: &str) -> bool {
    all_bytes(s, |b| is_word_byte(b) || b == b'-')
}

fn is_slug(s: &str) -> bool {
    all_bytes(s, |b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
}

fn is_hex(s: &str) -> bool {
    all_bytes(s, |b| b.is_ascii_hexdigit())
}

fn is_uuid(s: &str) -> bool {
    const GROUPS: [usize; 5] = [8, 4, 4, 4, 12];

    let mut parts = s.split('-');
    for len in GROUPS {
        match parts.next() {
            Some(part) if part.len() == len && is_hex(part) => {}
            _ => return false,
        }
    }
    parts.next().is_none()
}

fn is_safe_text(s: &str) -> bool {
    all_bytes(s, |b| {
        b.is_ascii_alphanumeric() || matches!(b, b' ' | b'_' | b'.' | b'-')
    })
}

fn is_upper_alnum(s: &str) -> bool {
    all_bytes(s, |b| b.is_ascii_uppercase() || b.is_ascii_digit())
}

fn is_base64(s: &str) -> bool {
    all_bytes(s, |b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'/' | b'='))
}

// Shape only; 2024-13-45 passes.
fn is_date_ymd(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, &b)| match i {
            4 | 7 => b == b'-',
            _ => b.is_ascii_digit(),
        })
}

fn is_safe_path(s: &str) -> bool {
    all_bytes(s, |b| {
        b.is_ascii_alphanumeric() || matches!(b, b'/' | b'.' | b'_' | b'-')
    })
}

fn is_any(_: &str) -> bool {
    true
}
