//! Listener factory.
//!
//! [`bind_listeners`] opens the sockets for one address. Where the
//! platform supports `SO_REUSEPORT`, it opens up to `count` sockets bound
//! to the same address and the kernel spreads incoming connections across
//! them; each socket then gets its own accept loop. Where the option is
//! unavailable or refused, it opens a single ordinary listener instead.
//!
//! The first port-sharing socket doubles as the probe: if it binds, its
//! local address (with the real port when `:0` was requested) is used for
//! the rest of the group.

use std::io;
use std::net::{SocketAddr, TcpListener, ToSocketAddrs};

use socket2::{Domain, Protocol, Socket, Type};

use crate::error::ServerError;

/// Pending-connection queue length passed to `listen(2)`.
const BACKLOG: i32 = 1024;

/// Sockets bound for one address.
#[derive(Debug)]
pub struct ListenerGroup {
    listeners: Vec<TcpListener>,
    local_addr: SocketAddr,
    shared: bool,
}

impl ListenerGroup {
    /// The bound address, with the actual port.
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// True if the sockets share the port through `SO_REUSEPORT`.
    #[must_use]
    pub fn is_shared(&self) -> bool {
        self.shared
    }

    /// Number of sockets in the group. Never zero.
    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// Always false; a group holds at least one socket.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Takes the sockets. They are already in non-blocking mode.
    #[must_use]
    pub fn into_listeners(self) -> Vec<TcpListener> {
        self.listeners
    }
}

/// Resolves a configured `host:port` to the first socket address it names.
pub fn resolve_addr(addr: &str) -> Result<SocketAddr, ServerError> {
    let invalid = |reason: String| ServerError::InvalidAddress {
        addr: addr.to_string(),
        reason,
    };
    addr.to_socket_addrs()
        .map_err(|error| invalid(error.to_string()))?
        .next()
        .ok_or_else(|| invalid("resolved to no addresses".to_string()))
}

/// Binds up to `count` listeners for `addr`.
///
/// With `reuse_port` off, or where port sharing fails, exactly one
/// listener is bound. Failing to bind that one is an error.
pub fn bind_listeners(addr: SocketAddr, count: usize, reuse_port: bool) -> Result<ListenerGroup, ServerError> {
    if reuse_port {
        match bind_socket(addr, true) {
            Ok(first) => return Ok(fill_shared_group(first, count)?),
            Err(error) => tracing::warn!(
                addr = %addr,
                error = %error,
                "port sharing unavailable, falling back to a single listener"
            ),
        }
    }

    let listener = bind_socket(addr, false).map_err(|source| ServerError::Bind { addr, source })?;
    Ok(ListenerGroup {
        local_addr: listener.local_addr()?,
        listeners: vec![listener],
        shared: false,
    })
}

fn fill_shared_group(first: TcpListener, count: usize) -> io::Result<ListenerGroup> {
    let local_addr = first.local_addr()?;
    let mut listeners = Vec::with_capacity(count.max(1));
    listeners.push(first);

    while listeners.len() < count {
        match bind_socket(local_addr, true) {
            Ok(listener) => listeners.push(listener),
            Err(error) => {
                tracing::warn!(
                    addr = %local_addr,
                    error = %error,
                    bound = listeners.len(),
                    "stopped opening port-sharing listeners"
                );
                break;
            }
        }
    }

    Ok(ListenerGroup {
        listeners,
        local_addr,
        shared: true,
    })
}

fn bind_socket(addr: SocketAddr, reuse_port: bool) -> io::Result<TcpListener> {
    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;
    #[cfg(unix)]
    socket.set_reuse_address(true)?;
    if reuse_port {
        set_reuse_port(&socket)?;
    }
    socket.set_nonblocking(true)?;
    socket.bind(&addr.into())?;
    socket.listen(BACKLOG)?;
    Ok(socket.into())
}

#[cfg(all(unix, not(any(target_os = "solaris", target_os = "illumos"))))]
fn set_reuse_port(socket: &Socket) -> io::Result<()> {
    socket.set_reuse_port(true)
}

#[cfg(not(all(unix, not(any(target_os = "solaris", target_os = "illumos")))))]
fn set_reuse_port(_socket: &Socket) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "SO_REUSEPORT is not supported on this platform",
    ))
}
