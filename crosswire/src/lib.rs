//! # Crosswire
//!
//! A cross-platform TCP networking facade: one contract over POSIX and
//! Winsock sockets for connection establishment, byte-stream transfer, and
//! readiness-based I/O multiplexing.
//!
//! ## Architecture
//!
//! - **`crosswire-core`**: resolver, socket lifecycle, transfer
//!   primitives, readiness poller, error taxonomy
//! - **`crosswire`**: public API surface (this crate)
//!
//! ## Quick Start
//!
//! ### Blocking echo server, one thread per connection
//!
//! ```rust,no_run
//! use crosswire::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let listener = TcpListener::listen("7000")?;
//!     loop {
//!         let (stream, peer) = listener.accept()?;
//!         std::thread::spawn(move || -> Result<()> {
//!             loop {
//!                 let data = stream.recv(1024)?;
//!                 if data.is_empty() {
//!                     // Orderly shutdown by the peer.
//!                     return Ok(());
//!                 }
//!                 stream.send_all(&data)?;
//!             }
//!         });
//!         let _ = peer;
//!     }
//! }
//! ```
//!
//! ### Multiplexed server, single thread
//!
//! ```rust,no_run
//! use crosswire::prelude::*;
//! use std::time::Duration;
//!
//! fn main() -> Result<()> {
//!     let listener = TcpListener::listen("7000")?;
//!     listener.set_nonblocking()?;
//!
//!     let poller = Poller::new();
//!     const LISTENER: Token = Token(0);
//!     poller.add(&listener, LISTENER, Interest::READABLE);
//!
//!     let mut events = Events::with_capacity(64);
//!     loop {
//!         poller.wait(&mut events, Some(Duration::from_secs(1)));
//!         for event in &events {
//!             if event.token == LISTENER && event.readable {
//!                 match listener.accept() {
//!                     Ok((stream, _peer)) => {
//!                         stream.set_nonblocking()?;
//!                         // Register the new connection, track it by token...
//!                         # let _ = stream;
//!                     }
//!                     Err(NetError::WouldBlock) => {}
//!                     Err(e) => return Err(e),
//!                 }
//!             }
//!         }
//!     }
//! }
//! ```
//!
//! ## Contract highlights
//!
//! - Partial sends are normal; [`TcpStream::send_all`] loops until the
//!   payload is fully delivered or the transport fails.
//! - An empty `recv` result means orderly peer shutdown, never an error.
//! - `WouldBlock` is a retry signal owned by the caller, not a failure.
//! - A handle's I/O belongs to one thread at a time; blocking calls and
//!   multiplexed polling must not be mixed on the same handle.

pub use crosswire_core::error::{self, ConnectReason, NetError, Result};
pub use crosswire_core::listener::{TcpListener, BACKLOG};
pub use crosswire_core::poll::{self, AsSource, Event, Events, Interest, Poller, Token};
pub use crosswire_core::resolve::{self, Endpoint};
pub use crosswire_core::stream::TcpStream;

// Receive buffers come back as `bytes::Bytes`; re-export for downstream use.
pub use bytes;

pub mod dev_tracing;

/// Convenience prelude mirroring the core surface.
pub mod prelude {
    pub use crosswire_core::prelude::*;
}
