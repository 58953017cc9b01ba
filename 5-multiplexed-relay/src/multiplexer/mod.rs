//! Readiness multiplexing behind one trait.
//!
//! The relay hands a snapshot of its wait set to [`Multiplexer::wait`] and
//! gets back the tokens that are readable. It never learns which system
//! primitive produced the answer:
//!
//! - [`PollMultiplexer`] uses `poll(2)` over an event array it keeps between
//!   calls.
//! - [`SelectMultiplexer`] rebuilds an `fd_set` bitmask from scratch on every
//!   call, so its cost grows with the highest descriptor in the set.

mod poll;
mod select;

use std::{io, os::fd::RawFd, time::Duration};

use clap::ValueEnum;

use crate::connection::Token;

pub use self::{poll::PollMultiplexer, select::SelectMultiplexer};

/// A descriptor the caller wants to hear about once it is readable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interest {
    pub token: Token,
    pub fd: RawFd,
}

impl Interest {
    pub fn readable(token: Token, fd: RawFd) -> Self {
        Self { token, fd }
    }
}

/// Tokens reported ready by one wait, in wait-set order.
pub type ReadySet = Vec<Token>;

pub trait Multiplexer {
    /// Blocks until at least one member of `interest` is readable or
    /// `timeout` elapses (`None` waits forever).
    ///
    /// An empty ready set means the timeout fired or the wait was interrupted
    /// by a signal. Hang-ups and socket errors count as readable so the next
    /// read observes them.
    fn wait(&mut self, interest: &[Interest], timeout: Option<Duration>) -> io::Result<ReadySet>;

    fn name(&self) -> &'static str;
}

impl<M: Multiplexer + ?Sized> Multiplexer for Box<M> {
    fn wait(&mut self, interest: &[Interest], timeout: Option<Duration>) -> io::Result<ReadySet> {
        (**self).wait(interest, timeout)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Backend {
    #[default]
    Poll,
    Select,
}

impl Backend {
    pub fn build(self) -> Box<dyn Multiplexer + Send> {
        match self {
            Backend::Poll => Box::new(PollMultiplexer::new()),
            Backend::Select => Box::new(SelectMultiplexer::new()),
        }
    }
}
