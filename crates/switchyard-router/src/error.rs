//! Route registration errors.
//!
//! Every error here is raised while the route table is being built. Once a
//! table exists it cannot fail: lookups only ever produce a
//! [`Resolution`](crate::Resolution).

use thiserror::Error;

/// Errors raised while compiling a route template or a method list.
#[derive(Debug, Error)]
pub enum RouteError {
    /// A parameter segment was written with an explicitly empty pattern,
    /// e.g. `<id:>`.
    #[error("empty pattern in segment `{segment}` of route `{template}`")]
    EmptyPattern {
        /// The offending segment
        segment: String,
        /// The full route template
        template: String,
    },

    /// A parameter segment has no name, e.g. `<:isDigits>`.
    #[error("empty parameter name in segment `{segment}` of route `{template}`")]
    EmptyParamName {
        /// The offending segment
        segment: String,
        /// The full route template
        template: String,
    },

    /// The pattern was not a named matcher and failed to compile as a
    /// regular expression.
    #[error("invalid regular expression `{pattern}` in route `{template}`: {source}")]
    InvalidRegex {
        /// The pattern text as written in the template
        pattern: String,
        /// The full route template
        template: String,
        /// The underlying regex compile error
        #[source]
        source: regex::Error,
    },

    /// A literal segment contains the `*` byte reserved for skeleton keys.
    #[error("segment `{segment}` of route `{template}` contains the reserved wildcard marker `*`")]
    ReservedMarker {
        /// The offending segment
        segment: String,
        /// The full route template
        template: String,
    },

    /// A method list contained a token that is not a supported method.
    #[error("invalid HTTP method `{token}` in method list `{list}`")]
    UnknownMethod {
        /// The unrecognized token
        token: String,
        /// The full method list
        list: String,
    },

    /// A method list contained no methods at all.
    #[error("empty HTTP method list")]
    EmptyMethodList,
}

impl RouteError {
    /// Returns true if this error came from the method list rather than
    /// the route template.
    #[must_use]
    pub fn is_method_error(&self) -> bool {
        matches!(self, Self::UnknownMethod { .. } | Self::EmptyMethodList)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_the_template() {
        let err = RouteError::EmptyPattern {
            segment: "<id:>".to_string(),
            template: "/user/<id:>".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("<id:>"));
        assert!(msg.contains("/user/<id:>"));
    }

    #[test]
    fn test_is_method_error() {
        assert!(RouteError::EmptyMethodList.is_method_error());
        assert!(RouteError::UnknownMethod {
            token: "FETCH".to_string(),
            list: "GET FETCH".to_string(),
        }
        .is_method_error());
        assert!(!RouteError::ReservedMarker {
            segment: "a*".to_string(),
            template: "/a*".to_string(),
        }
        .is_method_error());
    }
}
