//! Readiness multiplexer.
//!
//! One thread owns a [`Poller`], registers interest in socket handles, and
//! drives a wait loop that reports which handles can perform I/O without
//! blocking. One public surface, one backend per platform selected at build
//! configuration time: epoll on Linux, kqueue on the BSDs and macOS, and
//! the `polling` crate's IOCP adapter on Windows.
//!
//! The poller observes registered handles; it never owns their lifetime.
//! Deregister a handle (or just close it — the OS drops the registration)
//! before its owner releases it, and close the poller only after the
//! sockets it watched are gone.
//!
//! Failure to allocate an OS context, or a malformed registration, is an
//! unrecoverable environment failure: the process is terminated rather than
//! left with a corrupt event loop.

pub mod interest;

pub use interest::Interest;

#[cfg(any(target_os = "linux", target_os = "android"))]
mod epoll;
#[cfg(any(target_os = "linux", target_os = "android"))]
use epoll::Selector;

#[cfg(any(
    target_os = "macos",
    target_os = "freebsd",
    target_os = "openbsd",
    target_os = "netbsd",
    target_os = "dragonfly"
))]
mod kqueue;
#[cfg(any(
    target_os = "macos",
    target_os = "freebsd",
    target_os = "openbsd",
    target_os = "netbsd",
    target_os = "dragonfly"
))]
use kqueue::Selector;

#[cfg(windows)]
mod windows;
#[cfg(windows)]
use windows::Selector;

use std::io;
use std::time::{Duration, Instant};

/// Raw OS handle accepted by the poller.
#[cfg(unix)]
pub type Raw = std::os::fd::RawFd;
#[cfg(windows)]
pub type Raw = std::os::windows::io::RawSocket;

/// Anything with a raw OS socket handle can be registered.
#[cfg(unix)]
pub trait AsSource: std::os::fd::AsRawFd {
    fn raw(&self) -> Raw {
        self.as_raw_fd()
    }
}
#[cfg(unix)]
impl<T: std::os::fd::AsRawFd> AsSource for T {}

#[cfg(windows)]
pub trait AsSource: std::os::windows::io::AsRawSocket {
    fn raw(&self) -> Raw {
        self.as_raw_socket()
    }
}
#[cfg(windows)]
impl<T: std::os::windows::io::AsRawSocket> AsSource for T {}

/// Caller-chosen key identifying a registration, carried back verbatim in
/// every event for that handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Token(pub usize);

/// One readiness report: which registration fired and how.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    /// Key supplied at registration.
    pub token: Token,
    /// The handle can be read without blocking.
    pub readable: bool,
    /// The handle can be written without blocking.
    pub writable: bool,
    /// The OS reported an error condition.
    pub error: bool,
    /// The peer hung up.
    pub hangup: bool,
}

/// Reusable event buffer. Each [`Poller::wait`] clears it and fills at most
/// its capacity; the contents are valid until the next wait.
#[derive(Debug)]
pub struct Events {
    inner: Vec<Event>,
    cap: usize,
}

impl Events {
    /// A buffer that holds at most `capacity` events per wait.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Vec::with_capacity(capacity),
            cap: capacity.max(1),
        }
    }

    /// Maximum events a single wait may deliver.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.cap
    }

    /// Events delivered by the last wait.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// True if the last wait delivered nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Iterates over the last wait's events.
    pub fn iter(&self) -> std::slice::Iter<'_, Event> {
        self.inner.iter()
    }

    pub(crate) fn clear(&mut self) {
        self.inner.clear();
    }

    pub(crate) fn push(&mut self, event: Event) {
        self.inner.push(event);
    }
}

impl<'a> IntoIterator for &'a Events {
    type Item = &'a Event;
    type IntoIter = std::slice::Iter<'a, Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// The readiness multiplexer.
///
/// Registration bookkeeping is the only locked state; the thread driving
/// [`wait`](Poller::wait) owns the event loop.
#[derive(Debug)]
pub struct Poller {
    sys: Selector,
}

impl Poller {
    /// Allocates an OS interest-tracking context.
    ///
    /// Terminates the process if the OS cannot provide one: every
    /// subsequent event-driven operation depends on this context existing.
    #[must_use]
    pub fn new() -> Self {
        match Selector::new() {
            Ok(sys) => Self { sys },
            Err(err) => fatal("poller context allocation failed", &err),
        }
    }

    /// Registers interest in a handle under `token`. Registering a handle
    /// that is already present replaces its mask, exactly as
    /// [`modify`](Self::modify) would. A malformed registration terminates
    /// the process.
    pub fn add(&self, source: &impl AsSource, token: Token, interest: Interest) {
        if let Err(err) = self.sys.add(source.raw(), token, interest) {
            fatal("poller registration failed", &err);
        }
    }

    /// Replaces the interest mask of an existing registration. Modifying a
    /// handle that was never registered terminates the process.
    pub fn modify(&self, source: &impl AsSource, token: Token, interest: Interest) {
        if let Err(err) = self.sys.modify(source.raw(), token, interest) {
            fatal("poller modify failed", &err);
        }
    }

    /// Drops the registration for a handle. Safe to call for a handle that
    /// was never registered or is already gone; no wait will report it
    /// afterwards.
    pub fn remove(&self, source: &impl AsSource) {
        self.sys.remove(source.raw());
    }

    /// Number of live registrations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sys.len()
    }

    /// True if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sys.len() == 0
    }

    /// Blocks until at least one registered handle is ready, filling
    /// `events` up to its capacity and returning the count.
    ///
    /// `None` blocks indefinitely; `Some(Duration::ZERO)` is an immediate
    /// poll; any other timeout returns an empty buffer once it elapses.
    /// Interruption by a signal is retried with the remaining timeout. Any
    /// other wait failure terminates the process.
    pub fn wait(&self, events: &mut Events, timeout: Option<Duration>) -> usize {
        let deadline = timeout.map(|t| Instant::now() + t);
        loop {
            events.clear();
            let remaining = deadline.map(|d| d.saturating_duration_since(Instant::now()));
            match self.sys.wait(events, remaining) {
                Ok(n) => return n,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => {
                    // Recoverable signal; go around with what is left of
                    // the timeout.
                    if remaining == Some(Duration::ZERO) {
                        return 0;
                    }
                }
                Err(err) => fatal("poller wait failed", &err),
            }
        }
    }
}

impl Default for Poller {
    fn default() -> Self {
        Self::new()
    }
}

fn fatal(what: &str, err: &io::Error) -> ! {
    tracing::error!(error = %err, "{what}; terminating");
    eprintln!("crosswire: {what}: {err}");
    std::process::abort()
}
