//! Crosswire Error Types
//!
//! One closed taxonomy for every fallible operation in the facade. Platform
//! error codes (errno / WSA) arrive here as `std::io::Error` and are folded
//! into a fixed set of kinds so callers never branch on raw OS values.

use std::io;
use thiserror::Error;

/// Why a connect attempt failed, normalized across platforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectReason {
    /// The peer actively refused the connection.
    Refused,
    /// No route to the host, or the network is down.
    Unreachable,
    /// The handshake did not complete in time.
    TimedOut,
    /// Any other platform-reported failure.
    Other,
}

impl ConnectReason {
    pub(crate) fn classify(err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::ConnectionRefused => Self::Refused,
            io::ErrorKind::TimedOut => Self::TimedOut,
            io::ErrorKind::HostUnreachable | io::ErrorKind::NetworkUnreachable => {
                Self::Unreachable
            }
            _ => Self::Other,
        }
    }
}

/// Main error type for crosswire operations.
#[derive(Error, Debug)]
pub enum NetError {
    /// Host or service lookup produced no usable endpoint.
    #[error("resolution failed for {spec}: {source}")]
    Resolution {
        spec: String,
        #[source]
        source: io::Error,
    },

    /// The OS refused to allocate a socket.
    #[error("socket creation failed: {0}")]
    Creation(#[source] io::Error),

    /// Bind failed (address in use, permission denied, ...).
    #[error("bind failed: {0}")]
    Bind(#[source] io::Error),

    /// The bound socket could not enter the listening state.
    #[error("listen failed: {0}")]
    Listen(#[source] io::Error),

    /// Accepting a pending connection failed.
    #[error("accept failed: {0}")]
    Accept(#[source] io::Error),

    /// The connection handshake failed.
    #[error("connect failed ({reason:?}): {source}")]
    Connect {
        reason: ConnectReason,
        #[source]
        source: io::Error,
    },

    /// Send or receive failed on an established connection. Orderly peer
    /// shutdown is not a transfer error.
    #[error("transfer failed: {0}")]
    Transfer(#[source] io::Error),

    /// A non-blocking operation had no immediate result. A retry signal,
    /// not a true failure.
    #[error("operation would block")]
    WouldBlock,

    /// Caller misuse detected before any system call was made.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
}

/// Result type alias for crosswire operations.
pub type Result<T> = std::result::Result<T, NetError>;

impl NetError {
    /// Folds an I/O error from a transfer call into the taxonomy,
    /// turning `WouldBlock` into the retry signal.
    pub(crate) fn from_transfer(err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::WouldBlock {
            Self::WouldBlock
        } else {
            Self::Transfer(err)
        }
    }

    /// Classifies a failed connect attempt.
    pub(crate) fn from_connect(err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::WouldBlock {
            return Self::WouldBlock;
        }
        Self::Connect {
            reason: ConnectReason::classify(&err),
            source: err,
        }
    }

    /// True if this is the non-blocking retry signal.
    #[must_use]
    pub fn is_would_block(&self) -> bool {
        matches!(self, Self::WouldBlock)
    }

    /// True if retrying the same operation can succeed without caller
    /// intervention (interrupted or would-block conditions).
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::WouldBlock => true,
            Self::Transfer(e) | Self::Accept(e) => {
                matches!(
                    e.kind(),
                    io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock
                )
            }
            _ => false,
        }
    }

    /// The platform error kind behind this failure, when one exists.
    #[must_use]
    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        match self {
            Self::Resolution { source, .. } | Self::Connect { source, .. } => Some(source.kind()),
            Self::Creation(e)
            | Self::Bind(e)
            | Self::Listen(e)
            | Self::Accept(e)
            | Self::Transfer(e) => Some(e.kind()),
            Self::WouldBlock | Self::InvalidArgument(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_would_block_is_folded() {
        let err = NetError::from_transfer(io::Error::from(io::ErrorKind::WouldBlock));
        assert!(err.is_would_block());
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_transfer_keeps_platform_kind() {
        let err = NetError::from_transfer(io::Error::from(io::ErrorKind::ConnectionReset));
        assert_eq!(err.io_kind(), Some(io::ErrorKind::ConnectionReset));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_connect_refused_reason() {
        let err = NetError::from_connect(io::Error::from(io::ErrorKind::ConnectionRefused));
        match err {
            NetError::Connect { reason, .. } => assert_eq!(reason, ConnectReason::Refused),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_argument_has_no_io_kind() {
        assert_eq!(NetError::InvalidArgument("capacity").io_kind(), None);
    }
}
