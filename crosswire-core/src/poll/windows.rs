//! Windows backend over the `polling` crate.
//!
//! IOCP is completion-based; `polling` adapts it to the readiness shape the
//! rest of this module expects. Its notifications are one-shot, so every
//! fired registration is re-armed with its stored mask before `wait`
//! returns, which restores the level-triggered contract of the Unix
//! backends.

#![allow(unsafe_code)]

use std::collections::HashMap;
use std::io;
use std::os::windows::io::BorrowedSocket;
use std::time::Duration;

use parking_lot::Mutex;
use polling::{Event as PollEvent, Poller as SysPoller};

use super::{Event, Events, Interest, Raw, Token};

#[derive(Debug)]
struct RegistrationInfo {
    raw: Raw,
    interest: Interest,
}

#[derive(Debug)]
pub(crate) struct Selector {
    poller: SysPoller,
    registrations: Mutex<HashMap<Raw, (Token, RegistrationInfo)>>,
}

fn to_poll_event(token: Token, interest: Interest) -> PollEvent {
    match (interest.is_readable(), interest.is_writable()) {
        (true, true) => PollEvent::all(token.0),
        (true, false) => PollEvent::readable(token.0),
        (false, true) => PollEvent::writable(token.0),
        (false, false) => PollEvent::none(token.0),
    }
}

impl Selector {
    pub(crate) fn new() -> io::Result<Self> {
        Ok(Self {
            poller: SysPoller::new()?,
            registrations: Mutex::new(HashMap::new()),
        })
    }

    pub(crate) fn add(&self, raw: Raw, token: Token, interest: Interest) -> io::Result<()> {
        let mut regs = self.registrations.lock();
        if regs.contains_key(&raw) {
            // Re-adding replaces the mask.
            let socket = unsafe { BorrowedSocket::borrow_raw(raw) };
            self.poller.modify(socket, to_poll_event(token, interest))?;
        } else {
            unsafe { self.poller.add(raw, to_poll_event(token, interest))? };
        }
        regs.insert(raw, (token, RegistrationInfo { raw, interest }));
        Ok(())
    }

    pub(crate) fn modify(&self, raw: Raw, token: Token, interest: Interest) -> io::Result<()> {
        let mut regs = self.registrations.lock();
        if !regs.contains_key(&raw) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                "handle is not registered",
            ));
        }
        let socket = unsafe { BorrowedSocket::borrow_raw(raw) };
        self.poller.modify(socket, to_poll_event(token, interest))?;
        regs.insert(raw, (token, RegistrationInfo { raw, interest }));
        Ok(())
    }

    pub(crate) fn remove(&self, raw: Raw) {
        let mut regs = self.registrations.lock();
        if regs.remove(&raw).is_some() {
            let socket = unsafe { BorrowedSocket::borrow_raw(raw) };
            let _ = self.poller.delete(socket);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.registrations.lock().len()
    }

    pub(crate) fn wait(&self, events: &mut Events, timeout: Option<Duration>) -> io::Result<usize> {
        let mut buf = polling::Events::with_capacity(
            std::num::NonZeroUsize::new(events.capacity())
                .unwrap_or(std::num::NonZeroUsize::MIN),
        );
        self.poller.wait(&mut buf, timeout)?;

        let regs = self.registrations.lock();
        for ev in buf.iter() {
            events.push(Event {
                token: Token(ev.key),
                readable: ev.readable,
                writable: ev.writable,
                error: false,
                hangup: false,
            });
            // One-shot delivery: re-arm with the registered mask.
            for (token, info) in regs.values() {
                if token.0 == ev.key {
                    let socket = unsafe { BorrowedSocket::borrow_raw(info.raw) };
                    let _ = self
                        .poller
                        .modify(socket, to_poll_event(*token, info.interest));
                }
            }
        }
        Ok(events.len())
    }
}
