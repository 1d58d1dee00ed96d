//! macOS/BSD kqueue backend.
//!
//! Level-triggered kqueue via raw `libc`. kqueue tracks read and write
//! interest as two separate filters, so applying a mask means adding the
//! requested filters and deleting the absent ones; the token rides in
//! `udata`. One kevent is pushed per fired filter.

#![allow(unsafe_code)]

use std::collections::HashMap;
use std::io;
use std::ptr;
use std::time::Duration;

use parking_lot::Mutex;

use super::{Event, Events, Interest, Raw, Token};

#[derive(Debug)]
pub(crate) struct Selector {
    kq: Raw,
    registrations: Mutex<HashMap<Raw, Token>>,
}

impl Selector {
    pub(crate) fn new() -> io::Result<Self> {
        let kq = unsafe { libc::kqueue() };
        if kq < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(Self {
            kq,
            registrations: Mutex::new(HashMap::new()),
        })
    }

    fn change(&self, fd: Raw, filter: i32, flags: u16, token: Token) -> io::Result<()> {
        let kev = libc::kevent {
            ident: fd as libc::uintptr_t,
            filter: filter as _,
            flags: flags as _,
            fflags: 0,
            data: 0,
            udata: token.0 as _,
        };
        if unsafe { libc::kevent(self.kq, &kev, 1, ptr::null_mut(), 0, ptr::null()) } < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    /// Brings the kernel filters for `fd` in line with `interest`.
    fn apply(&self, fd: Raw, token: Token, interest: Interest) -> io::Result<()> {
        if interest.is_readable() {
            self.change(fd, libc::EVFILT_READ as i32, libc::EV_ADD as u16, token)?;
        } else if let Err(e) = self.change(fd, libc::EVFILT_READ as i32, libc::EV_DELETE as u16, token) {
            // A filter that was never armed is fine to "delete".
            if e.raw_os_error() != Some(libc::ENOENT) {
                return Err(e);
            }
        }
        if interest.is_writable() {
            self.change(fd, libc::EVFILT_WRITE as i32, libc::EV_ADD as u16, token)?;
        } else if let Err(e) = self.change(fd, libc::EVFILT_WRITE as i32, libc::EV_DELETE as u16, token) {
            if e.raw_os_error() != Some(libc::ENOENT) {
                return Err(e);
            }
        }
        Ok(())
    }

    pub(crate) fn add(&self, fd: Raw, token: Token, interest: Interest) -> io::Result<()> {
        self.apply(fd, token, interest)?;
        self.registrations.lock().insert(fd, token);
        Ok(())
    }

    pub(crate) fn modify(&self, fd: Raw, token: Token, interest: Interest) -> io::Result<()> {
        if !self.registrations.lock().contains_key(&fd) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                "handle is not registered",
            ));
        }
        self.apply(fd, token, interest)?;
        self.registrations.lock().insert(fd, token);
        Ok(())
    }

    pub(crate) fn remove(&self, fd: Raw) {
        let token = Token(0);
        let _ = self.change(fd, libc::EVFILT_READ as i32, libc::EV_DELETE as u16, token);
        let _ = self.change(fd, libc::EVFILT_WRITE as i32, libc::EV_DELETE as u16, token);
        self.registrations.lock().remove(&fd);
    }

    pub(crate) fn len(&self) -> usize {
        self.registrations.lock().len()
    }

    pub(crate) fn wait(&self, events: &mut Events, timeout: Option<Duration>) -> io::Result<usize> {
        let cap = events.capacity();
        let mut buf: Vec<libc::kevent> = Vec::with_capacity(cap);

        let ts;
        let ts_ptr = match timeout {
            None => ptr::null(),
            Some(t) => {
                ts = libc::timespec {
                    tv_sec: t.as_secs().min(libc::time_t::MAX as u64) as libc::time_t,
                    tv_nsec: t.subsec_nanos() as libc::c_long,
                };
                &ts as *const libc::timespec
            }
        };

        let n = unsafe {
            libc::kevent(
                self.kq,
                ptr::null(),
                0,
                buf.as_mut_ptr(),
                cap as libc::c_int,
                ts_ptr,
            )
        };
        if n < 0 {
            return Err(io::Error::last_os_error());
        }
        // kevent wrote `n` initialized entries.
        unsafe { buf.set_len(n as usize) };

        for kev in &buf {
            let filter = kev.filter as i32;
            events.push(Event {
                token: Token(kev.udata as usize),
                readable: filter == libc::EVFILT_READ as i32,
                writable: filter == libc::EVFILT_WRITE as i32,
                error: kev.flags as u32 & libc::EV_ERROR as u32 != 0,
                hangup: kev.flags as u32 & libc::EV_EOF as u32 != 0,
            });
        }
        Ok(events.len())
    }
}

impl Drop for Selector {
    fn drop(&mut self) {
        unsafe {
            libc::close(self.kq);
        }
    }
}
