//! Server error types.

use std::io;
use std::net::SocketAddr;

use thiserror::Error;

/// Errors raised while binding or running the server.
///
/// Every variant except [`ServerError::Io`] is a setup error: it is
/// returned before the first connection is accepted.
#[derive(Debug, Error)]
pub enum ServerError {
    /// A listen address could not be parsed or resolved.
    #[error("invalid listen address `{addr}`: {reason}")]
    InvalidAddress {
        /// The address as configured
        addr: String,
        /// Why it was rejected
        reason: String,
    },

    /// Binding a listening socket failed.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// The resolved address
        addr: SocketAddr,
        /// The underlying socket error
        #[source]
        source: io::Error,
    },

    /// No listeners were configured.
    #[error("no listeners configured")]
    NoListeners,

    /// An I/O error while serving.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
