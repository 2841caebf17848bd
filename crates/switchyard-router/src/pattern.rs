//! Route template compilation.
//!
//! A template is a `/`-separated list of segments. A segment written as
//! `<name>` or `{name}` binds any non-empty path segment; `<name:pattern>`
//! or `{name:pattern}` additionally validates it. Patterns resolve against
//! the [named matcher table](crate::matchers) first and fall back to an
//! anchored regular expression. A regex with a capturing group binds the
//! first capture instead of the whole segment.
//!
//! Compiling a template yields a [`CompiledRoute`]: the ordered segment
//! patterns plus the *skeleton*, the template with every parameter segment
//! replaced by `*`, which keys the radix tree.
//!
//! # Example
//!
//! ```rust
//! use switchyard_router::CompiledRoute;
//!
//! let route = CompiledRoute::compile(r"/user/<id:(\d+)>/x").unwrap();
//! assert_eq!(route.skeleton(), "/user/*/x");
//! assert!(!route.is_static());
//! assert!(route.needs_validation());
//! ```

use std::ops::Range;

use regex::Regex;

use crate::error::RouteError;
use crate::matchers::{self, NamedMatcher};

/// The byte standing in for a parameter segment in a skeleton.
pub const WILDCARD: u8 = b'*';

/// How a segment is matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    /// Literal text; compared structurally by the radix tree.
    Static,
    /// One of the named matchers.
    NamedFunction,
    /// An anchored regular expression without capturing groups.
    RegexMatch,
    /// An anchored regular expression whose first capture is the value.
    RegexSubmatch,
}

#[derive(Debug, Clone)]
enum Matcher {
    Static,
    Named(&'static NamedMatcher),
    Regex(Regex),
    Submatch(Regex),
}

/// One compiled segment of a route template.
#[derive(Debug, Clone)]
pub struct SegmentPattern {
    /// Literal text for static segments, parameter name otherwise
    name: String,
    matcher: Matcher,
}

impl SegmentPattern {
    /// The literal text of a static segment, or the parameter name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the kind of this segment.
    #[must_use]
    pub fn kind(&self) -> PatternKind {
        match self.matcher {
            Matcher::Static => PatternKind::Static,
            Matcher::Named(_) => PatternKind::NamedFunction,
            Matcher::Regex(_) => PatternKind::RegexMatch,
            Matcher::Submatch(_) => PatternKind::RegexSubmatch,
        }
    }

    /// Returns true for a literal segment.
    #[must_use]
    pub fn is_static(&self) -> bool {
        matches!(self.matcher, Matcher::Static)
    }

    /// Returns true if a concrete segment has to be checked against this
    /// pattern. Static segments are checked by the tree and `any` accepts
    /// everything.
    #[must_use]
    pub fn needs_validation(&self) -> bool {
        match &self.matcher {
            Matcher::Static => false,
            Matcher::Named(m) => !m.is_any(),
            Matcher::Regex(_) | Matcher::Submatch(_) => true,
        }
    }

    /// Tests a concrete path segment against this pattern.
    ///
    /// Static segments always pass here; their text was already matched
    /// while walking the tree.
    #[must_use]
    pub fn matches(&self, segment: &str) -> bool {
        match &self.matcher {
            Matcher::Static => true,
            Matcher::Named(m) => m.matches(segment),
            Matcher::Regex(re) => re.is_match(segment),
            Matcher::Submatch(re) => re.is_match(segment),
        }
    }

    /// Returns the byte range of the bound value within `segment`.
    ///
    /// For submatch patterns this is the first capturing group when it
    /// participated in the match, otherwise the whole segment.
    #[must_use]
    pub fn capture(&self, segment: &str) -> Range<usize> {
        if let Matcher::Submatch(re) = &self.matcher {
            if let Some(group) = re.captures(segment).and_then(|caps| caps.get(1)) {
                return group.range();
            }
        }
        0..segment.len()
    }
}

/// A route template compiled once at registration.
#[derive(Debug, Clone)]
pub struct CompiledRoute {
    template: String,
    skeleton: String,
    patterns: Vec<SegmentPattern>,
    is_static: bool,
    needs_validation: bool,
}

impl CompiledRoute {
    /// Compiles a route template.
    ///
    /// Empty segments produced by leading, trailing, or doubled slashes are
    /// discarded, so `/users/` and `/users` compile to the same skeleton.
    pub fn compile(template: &str) -> Result<Self, RouteError> {
        let mut patterns = Vec::new();
        let mut skeleton = String::with_capacity(template.len() + 1);

        for segment in template.split('/').filter(|s| !s.is_empty()) {
            let pattern = parse_segment(segment, template)?;

            skeleton.push('/');
            if pattern.is_static() {
                skeleton.push_str(segment);
            } else {
                skeleton.push(char::from(WILDCARD));
            }
            patterns.push(pattern);
        }

        if skeleton.is_empty() {
            skeleton.push('/');
        }

        let is_static = patterns.iter().all(SegmentPattern::is_static);
        let needs_validation = patterns.iter().any(SegmentPattern::needs_validation);

        Ok(Self {
            template: template.to_string(),
            skeleton,
            patterns,
            is_static,
            needs_validation,
        })
    }

    /// The template as registered.
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// The radix key: the normalized template with `*` for each parameter.
    #[must_use]
    pub fn skeleton(&self) -> &str {
        &self.skeleton
    }

    /// One pattern per template segment, in path order.
    #[must_use]
    pub fn patterns(&self) -> &[SegmentPattern] {
        &self.patterns
    }

    /// Returns true if no segment is a parameter.
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.is_static
    }

    /// Returns true if at least one parameter has a non-default pattern.
    #[must_use]
    pub fn needs_validation(&self) -> bool {
        self.needs_validation
    }

    /// Returns the position of the parameter called `name`.
    #[must_use]
    pub fn param_index(&self, name: &str) -> Option<usize> {
        self.patterns
            .iter()
            .position(|p| !p.is_static() && p.name == name)
    }

    /// Validates the concrete segments of `path` against every pattern.
    ///
    /// Stops at the first failing segment. A segment count that differs
    /// from the pattern count never matches.
    #[must_use]
    pub fn matches_segments(&self, path: &str, segments: &[Range<usize>]) -> bool {
        if segments.len() != self.patterns.len() {
            return false;
        }
        self.patterns
            .iter()
            .zip(segments)
            .filter(|(p, _)| p.needs_validation())
            .all(|(p, range)| path.get(range.clone()).is_some_and(|seg| p.matches(seg)))
    }
}

/// Splits `path` into the byte ranges of its non-empty `/`-separated
/// segments, appending them to `out`.
///
/// # Example
///
/// ```rust
/// use switchyard_router::split_segments;
///
/// let mut out = Vec::new();
/// split_segments("/a//bc/", &mut out);
/// assert_eq!(out, vec![1..2, 4..6]);
/// ```
pub fn split_segments(path: &str, out: &mut Vec<Range<usize>>) {
    let mut start = None;
    for (i, b) in path.bytes().enumerate() {
        if b == b'/' {
            if let Some(s) = start.take() {
                out.push(s..i);
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(s) = start {
        out.push(s..path.len());
    }
}

fn parse_segment(segment: &str, template: &str) -> Result<SegmentPattern, RouteError> {
    let inner = segment
        .strip_prefix('<')
        .and_then(|s| s.strip_suffix('>'))
        .or_else(|| segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')));

    let Some(inner) = inner else {
        if segment.as_bytes().contains(&WILDCARD) {
            return Err(RouteError::ReservedMarker {
                segment: segment.to_string(),
                template: template.to_string(),
            });
        }
        return Ok(SegmentPattern {
            name: segment.to_string(),
            matcher: Matcher::Static,
        });
    };

    let (name, pattern) = match inner.split_once(':') {
        Some((name, pattern)) => (name, pattern),
        None => (inner, matchers::ANY),
    };

    if name.is_empty() {
        return Err(RouteError::EmptyParamName {
            segment: segment.to_string(),
            template: template.to_string(),
        });
    }
    if pattern.is_empty() {
        return Err(RouteError::EmptyPattern {
            segment: segment.to_string(),
            template: template.to_string(),
        });
    }

    Ok(SegmentPattern {
        name: name.to_string(),
        matcher: resolve_pattern(pattern, template)?,
    })
}

fn resolve_pattern(pattern: &str, template: &str) -> Result<Matcher, RouteError> {
    let unwrapped = pattern
        .strip_prefix('(')
        .and_then(|p| p.strip_suffix(')'))
        .unwrap_or(pattern);

    if let Some(named) = matchers::lookup(unwrapped).or_else(|| matchers::lookup(pattern)) {
        return Ok(Matcher::Named(named));
    }

    let re = Regex::new(&format!("^(?:{pattern})$")).map_err(|source| RouteError::InvalidRegex {
        pattern: pattern.to_string(),
        template: template.to_string(),
        source,
    })?;

    // captures_len counts the implicit whole-match group
    if re.captures_len() > 1 {
        Ok(Matcher::Submatch(re))
    } else {
        Ok(Matcher::Regex(re))
    }
}
