//! Connected TCP stream: connection establishment and data transfer.
//!
//! A [`TcpStream`] is an owning handle to one established connection. It is
//! created by [`TcpStream::connect`] or by a listener's `accept`, and the OS
//! socket is released exactly once, either by `close(self)` or by `Drop`.
//! Payloads are opaque byte sequences; framing belongs to the caller.

use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr};
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use socket2::Socket;

use crate::error::{NetError, Result};
use crate::resolve::{self, Endpoint};

/// An established TCP connection.
#[derive(Debug)]
pub struct TcpStream {
    inner: Socket,
}

impl TcpStream {
    pub(crate) fn from_socket(inner: Socket) -> Self {
        Self { inner }
    }

    /// Connects to a resolved endpoint, blocking until the handshake
    /// completes or fails. The descriptor is consumed.
    pub fn connect(endpoint: Endpoint) -> Result<Self> {
        let socket = Socket::new(
            endpoint.domain(),
            endpoint.socket_type(),
            Some(endpoint.protocol()),
        )
        .map_err(NetError::Creation)?;

        socket
            .connect(endpoint.sock_addr())
            .map_err(NetError::from_connect)?;

        tracing::debug!(peer = ?endpoint.socket_addr(), "connected");
        Ok(Self::from_socket(socket))
    }

    /// As [`connect`](Self::connect), but gives up after `timeout`.
    pub fn connect_timeout(endpoint: Endpoint, timeout: Duration) -> Result<Self> {
        let socket = Socket::new(
            endpoint.domain(),
            endpoint.socket_type(),
            Some(endpoint.protocol()),
        )
        .map_err(NetError::Creation)?;

        socket
            .connect_timeout(endpoint.sock_addr(), timeout)
            .map_err(NetError::from_connect)?;

        tracing::debug!(peer = ?endpoint.socket_addr(), ?timeout, "connected");
        Ok(Self::from_socket(socket))
    }

    /// Resolves `host`/`service` and tries each candidate in resolver
    /// order, returning the first connection that succeeds.
    pub fn connect_host(host: &str, service: &str) -> Result<Self> {
        let mut last_err = None;
        for endpoint in resolve::resolve(host, service)? {
            match Self::connect(endpoint) {
                Ok(stream) => return Ok(stream),
                Err(err) => last_err = Some(err),
            }
        }
        // resolve() never returns an empty candidate list.
        Err(last_err.unwrap_or(NetError::InvalidArgument("no endpoint candidates")))
    }

    /// Writes as much of `data` as the transport accepts and returns the
    /// count. A short write is normal, not an error. Empty input returns 0
    /// without touching the socket.
    pub fn send(&self, data: &[u8]) -> Result<usize> {
        if data.is_empty() {
            return Ok(0);
        }
        (&self.inner).write(data).map_err(NetError::from_transfer)
    }

    /// Sends the whole payload, looping over partial writes until done or a
    /// fatal transport error. Blocking-mode TCP paces the loop, so no
    /// backoff is applied; in non-blocking mode a [`NetError::WouldBlock`]
    /// is surfaced and the multiplexing caller owns the retry.
    pub fn send_all(&self, data: &[u8]) -> Result<usize> {
        let mut sent = 0;
        while sent < data.len() {
            match self.send(&data[sent..]) {
                Ok(0) => {
                    return Err(NetError::Transfer(io::Error::new(
                        io::ErrorKind::WriteZero,
                        "transport accepted no bytes",
                    )));
                }
                Ok(n) => sent += n,
                Err(NetError::WouldBlock) => return Err(NetError::WouldBlock),
                Err(e) if e.is_recoverable() => {}
                Err(e) => return Err(e),
            }
        }
        Ok(sent)
    }

    /// Reads up to `capacity` bytes. An empty result signals orderly peer
    /// shutdown; close the handle after seeing it. `capacity` of zero is
    /// rejected before any system call.
    pub fn recv(&self, capacity: usize) -> Result<Bytes> {
        if capacity == 0 {
            return Err(NetError::InvalidArgument("recv capacity must be non-zero"));
        }
        let mut buf = BytesMut::zeroed(capacity);
        let n = (&self.inner)
            .read(&mut buf)
            .map_err(NetError::from_transfer)?;
        buf.truncate(n);
        Ok(buf.freeze())
    }

    /// Reads into a caller-supplied buffer and returns the byte count.
    /// Zero means orderly peer shutdown. An empty buffer is rejected.
    pub fn recv_into(&self, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() {
            return Err(NetError::InvalidArgument("recv buffer must be non-empty"));
        }
        (&self.inner).read(buf).map_err(NetError::from_transfer)
    }

    /// Switches the handle to non-blocking mode: accept/send/recv return
    /// [`NetError::WouldBlock`] instead of suspending the thread.
    pub fn set_nonblocking(&self) -> Result<()> {
        self.inner.set_nonblocking(true).map_err(NetError::Transfer)
    }

    /// Switches the handle back to blocking mode.
    pub fn set_blocking(&self) -> Result<()> {
        self.inner
            .set_nonblocking(false)
            .map_err(NetError::Transfer)
    }

    /// Disables Nagle's algorithm, trading bandwidth for latency.
    pub fn set_nodelay(&self, nodelay: bool) -> Result<()> {
        self.inner.set_nodelay(nodelay).map_err(NetError::Transfer)
    }

    /// The peer's address.
    pub fn peer_addr(&self) -> Result<SocketAddr> {
        self.inner
            .peer_addr()
            .map_err(NetError::Transfer)?
            .as_socket()
            .ok_or(NetError::InvalidArgument("peer address is not an IP address"))
    }

    /// The local address of this connection.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.inner
            .local_addr()
            .map_err(NetError::Transfer)?
            .as_socket()
            .ok_or(NetError::InvalidArgument(
                "local address is not an IP address",
            ))
    }

    /// Signals orderly shutdown to the peer without releasing the handle.
    pub fn shutdown(&self, how: Shutdown) -> Result<()> {
        self.inner.shutdown(how).map_err(NetError::Transfer)
    }

    /// Releases the OS socket. Consuming `self` makes a second close
    /// unrepresentable; `Drop` covers handles that go out of scope.
    pub fn close(self) {
        tracing::trace!("stream closed");
    }
}

#[cfg(unix)]
impl std::os::fd::AsRawFd for TcpStream {
    fn as_raw_fd(&self) -> std::os::fd::RawFd {
        std::os::fd::AsRawFd::as_raw_fd(&self.inner)
    }
}

#[cfg(windows)]
impl std::os::windows::io::AsRawSocket for TcpStream {
    fn as_raw_socket(&self) -> std::os::windows::io::RawSocket {
        std::os::windows::io::AsRawSocket::as_raw_socket(&self.inner)
    }
}
