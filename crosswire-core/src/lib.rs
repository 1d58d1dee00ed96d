//! Crosswire Core
//!
//! One interface over the divergent socket APIs of POSIX-like systems and
//! Windows: connection establishment, byte-stream transfer, and
//! readiness-based multiplexing.
//!
//! - Error taxonomy shared by every operation (`error`)
//! - Host/service resolution into endpoint descriptors (`resolve`)
//! - Listening socket lifecycle (`listener`)
//! - Connected streams and transfer primitives (`stream`)
//! - Readiness multiplexer with per-platform backends (`poll`)
//!
//! Two usage patterns are supported and must not be mixed on one handle:
//! thread-per-connection blocking I/O, or a single thread owning a
//! [`poll::Poller`] and touching only non-blocking handles reported ready.

// Raw fd/socket access and the epoll/kqueue FFI need unsafe; everything
// else is forbidden it.
#![cfg_attr(not(test), deny(unsafe_code))]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod listener;
pub mod poll;
pub mod resolve;
pub mod stream;

// Small prelude for downstream crates; kept minimal to avoid API lock-in.
pub mod prelude {
    pub use crate::error::{ConnectReason, NetError, Result};
    pub use crate::listener::{TcpListener, BACKLOG};
    pub use crate::poll::{Event, Events, Interest, Poller, Token};
    pub use crate::resolve::{resolve, resolve_passive, Endpoint};
    pub use crate::stream::TcpStream;
}
