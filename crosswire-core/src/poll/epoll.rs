//! Linux epoll backend.
//!
//! Level-triggered epoll via raw `libc` calls. The registration token rides
//! in `epoll_data` as a `u64`, so the kernel hands it back with every event
//! and no lookup is needed on the wait path. A token map is kept only for
//! bookkeeping (`len`) and for deregistration.

#![allow(unsafe_code)]

use std::collections::HashMap;
use std::io;
use std::time::Duration;

use parking_lot::Mutex;

use super::{Event, Events, Interest, Raw, Token};

#[derive(Debug)]
pub(crate) struct Selector {
    epfd: Raw,
    registrations: Mutex<HashMap<Raw, Token>>,
}

fn interest_to_events(interest: Interest) -> u32 {
    let mut events = 0u32;
    if interest.is_readable() {
        events |= libc::EPOLLIN as u32;
    }
    if interest.is_writable() {
        events |= libc::EPOLLOUT as u32;
    }
    if interest.is_hup() {
        events |= libc::EPOLLRDHUP as u32;
    }
    // EPOLLERR and EPOLLHUP are always delivered; nothing to request.
    events
}

impl Selector {
    pub(crate) fn new() -> io::Result<Self> {
        let epfd = unsafe { libc::epoll_create1(libc::EPOLL_CLOEXEC) };
        if epfd < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(Self {
            epfd,
            registrations: Mutex::new(HashMap::new()),
        })
    }

    fn ctl(&self, op: libc::c_int, fd: Raw, token: Token, interest: Interest) -> io::Result<()> {
        let mut ev = libc::epoll_event {
            events: interest_to_events(interest),
            u64: token.0 as u64,
        };
        if unsafe { libc::epoll_ctl(self.epfd, op, fd, &mut ev) } < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    pub(crate) fn add(&self, fd: Raw, token: Token, interest: Interest) -> io::Result<()> {
        match self.ctl(libc::EPOLL_CTL_ADD, fd, token, interest) {
            // Re-adding an existing registration replaces its mask.
            Err(e) if e.raw_os_error() == Some(libc::EEXIST) => {
                self.ctl(libc::EPOLL_CTL_MOD, fd, token, interest)?;
            }
            other => other?,
        }
        self.registrations.lock().insert(fd, token);
        Ok(())
    }

    pub(crate) fn modify(&self, fd: Raw, token: Token, interest: Interest) -> io::Result<()> {
        self.ctl(libc::EPOLL_CTL_MOD, fd, token, interest)?;
        self.registrations.lock().insert(fd, token);
        Ok(())
    }

    pub(crate) fn remove(&self, fd: Raw) {
        let mut ev = libc::epoll_event { events: 0, u64: 0 };
        // ENOENT and EBADF mean the registration is already gone, which is
        // exactly the state we want.
        let _ = unsafe { libc::epoll_ctl(self.epfd, libc::EPOLL_CTL_DEL, fd, &mut ev) };
        self.registrations.lock().remove(&fd);
    }

    pub(crate) fn len(&self) -> usize {
        self.registrations.lock().len()
    }

    pub(crate) fn wait(&self, events: &mut Events, timeout: Option<Duration>) -> io::Result<usize> {
        let cap = events.capacity();
        let mut buf: Vec<libc::epoll_event> = Vec::with_capacity(cap);

        let timeout_ms: libc::c_int = match timeout {
            None => -1,
            Some(t) => {
                // Round sub-millisecond timeouts up so a short wait is not
                // silently a busy poll.
                let ms = t.as_millis();
                if ms == 0 && !t.is_zero() {
                    1
                } else {
                    ms.min(libc::c_int::MAX as u128) as libc::c_int
                }
            }
        };

        let n = unsafe {
            libc::epoll_wait(self.epfd, buf.as_mut_ptr(), cap as libc::c_int, timeout_ms)
        };
        if n < 0 {
            return Err(io::Error::last_os_error());
        }
        // epoll_wait wrote `n` initialized entries.
        unsafe { buf.set_len(n as usize) };

        for ev in &buf {
            let flags = ev.events;
            events.push(Event {
                token: Token(ev.u64 as usize),
                readable: flags & (libc::EPOLLIN as u32 | libc::EPOLLPRI as u32) != 0,
                writable: flags & libc::EPOLLOUT as u32 != 0,
                error: flags & libc::EPOLLERR as u32 != 0,
                hangup: flags & (libc::EPOLLHUP as u32 | libc::EPOLLRDHUP as u32) != 0,
            });
        }
        Ok(events.len())
    }
}

impl Drop for Selector {
    fn drop(&mut self) {
        unsafe {
            libc::close(self.epfd);
        }
    }
}
