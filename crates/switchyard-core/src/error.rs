//! Error types for Switchyard core.

use thiserror::Error;

/// Where a panic happened, as recorded by the panic hook.
#[derive(Debug, Clone)]
pub struct PanicSite {
    /// `file:line:column` of the panic, when known
    pub location: Option<String>,
    /// Backtrace captured at the panic
    pub backtrace: String,
}

/// A panic caught while running a handler, normalized to an error.
///
/// The display form never includes location or backtrace, only the message.
#[derive(Debug, Clone, Error)]
pub enum PanicError {
    /// The payload was a string.
    #[error("panic occurred: {message}")]
    Message {
        /// The panic message
        message: String,
        /// Location and backtrace, if recorded
        site: Option<PanicSite>,
    },

    /// The payload had some other type.
    #[error("panic occurred with unknown type")]
    Unknown {
        /// Location and backtrace, if recorded
        site: Option<PanicSite>,
    },
}

impl PanicError {
    /// The panic message, if the payload was a string.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Message { message, .. } => Some(message),
            Self::Unknown { .. } => None,
        }
    }

    /// Location and backtrace recorded by the panic hook.
    #[must_use]
    pub fn site(&self) -> Option<&PanicSite> {
        match self {
            Self::Message { site, .. } | Self::Unknown { site } => site.as_ref(),
        }
    }

    /// The panic location, if recorded.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.site().and_then(|site| site.location.as_deref())
    }
}
