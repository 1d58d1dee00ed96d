//! Listening socket lifecycle.
//!
//! A [`TcpListener`] owns one OS socket in the listening state. It is
//! created listening (there is no exposed unbound state) and released
//! exactly once, by `close(self)` or by `Drop`. No process-wide listener
//! state exists; the handle is returned to the caller and threaded through
//! every subsequent call.

use std::net::SocketAddr;

use socket2::Socket;

use crate::error::{NetError, Result};
use crate::resolve::{self, Endpoint};
use crate::stream::TcpStream;

/// Depth of the pending-connection queue handed to the OS.
pub const BACKLOG: i32 = 10;

/// A TCP listening socket.
#[derive(Debug)]
pub struct TcpListener {
    inner: Socket,
    local: SocketAddr,
}

impl TcpListener {
    /// Listens on all interfaces for the given service (numeric port or
    /// well-known name). Service `"0"` asks the OS to pick a port; read it
    /// back with [`local_addr`](Self::local_addr).
    pub fn listen(service: &str) -> Result<Self> {
        Self::bind_candidates(resolve::resolve_passive(service)?)
    }

    /// Listens on one specific interface.
    pub fn listen_on(host: &str, service: &str) -> Result<Self> {
        Self::bind_candidates(resolve::resolve(host, service)?)
    }

    /// Walks resolver candidates in order; the first that binds and
    /// listens wins, the last failure is reported otherwise.
    fn bind_candidates(endpoints: Vec<Endpoint>) -> Result<Self> {
        let mut last_err = None;
        for endpoint in endpoints {
            match Self::bind_endpoint(&endpoint) {
                Ok(listener) => return Ok(listener),
                Err(err) => last_err = Some(err),
            }
        }
        Err(last_err.unwrap_or(NetError::InvalidArgument("no endpoint candidates")))
    }

    fn bind_endpoint(endpoint: &Endpoint) -> Result<Self> {
        let socket = Socket::new(
            endpoint.domain(),
            endpoint.socket_type(),
            Some(endpoint.protocol()),
        )
        .map_err(NetError::Creation)?;

        // Lets a restarted server rebind while the old socket lingers in
        // TIME_WAIT.
        socket.set_reuse_address(true).map_err(NetError::Creation)?;

        socket.bind(endpoint.sock_addr()).map_err(NetError::Bind)?;
        socket.listen(BACKLOG).map_err(NetError::Listen)?;

        let local = socket
            .local_addr()
            .map_err(NetError::Listen)?
            .as_socket()
            .ok_or(NetError::InvalidArgument(
                "bound address is not an IP address",
            ))?;

        tracing::debug!(%local, backlog = BACKLOG, "listening");
        Ok(Self {
            inner: socket,
            local,
        })
    }

    /// Blocks until a pending connection exists and returns a dedicated
    /// stream plus the peer address. In non-blocking mode an empty queue
    /// yields [`NetError::WouldBlock`]. The listener stays usable.
    pub fn accept(&self) -> Result<(TcpStream, SocketAddr)> {
        let (socket, peer) = self.inner.accept().map_err(|e| {
            if e.kind() == std::io::ErrorKind::WouldBlock {
                NetError::WouldBlock
            } else {
                NetError::Accept(e)
            }
        })?;

        let peer = peer.as_socket().ok_or(NetError::InvalidArgument(
            "peer address is not an IP address",
        ))?;

        tracing::trace!(%peer, "accepted");
        Ok((TcpStream::from_socket(socket), peer))
    }

    /// The address this listener is bound to. With service `"0"` this
    /// carries the OS-assigned port.
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.local
    }

    /// Makes `accept` return [`NetError::WouldBlock`] instead of blocking.
    pub fn set_nonblocking(&self) -> Result<()> {
        self.inner.set_nonblocking(true).map_err(NetError::Listen)
    }

    /// Restores blocking `accept`.
    pub fn set_blocking(&self) -> Result<()> {
        self.inner.set_nonblocking(false).map_err(NetError::Listen)
    }

    /// Releases the OS socket. Consuming `self` makes a second close
    /// unrepresentable.
    pub fn close(self) {
        tracing::trace!(local = %self.local, "listener closed");
    }
}

#[cfg(unix)]
impl std::os::fd::AsRawFd for TcpListener {
    fn as_raw_fd(&self) -> std::os::fd::RawFd {
        std::os::fd::AsRawFd::as_raw_fd(&self.inner)
    }
}

#[cfg(windows)]
impl std::os::windows::io::AsRawSocket for TcpListener {
    fn as_raw_socket(&self) -> std::os::windows::io::RawSocket {
        std::os::windows::io::AsRawSocket::as_raw_socket(&self.inner)
    }
}
