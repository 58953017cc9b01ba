use std::{io, time::Duration};

use super::{Interest, Multiplexer, ReadySet};

const READY_MASK: libc::c_short = libc::POLLIN | libc::POLLHUP | libc::POLLERR | libc::POLLNVAL;

/// `poll(2)` backend. The event array is reused across waits.
#[derive(Default)]
pub struct PollMultiplexer {
    fds: Vec<libc::pollfd>,
}

impl PollMultiplexer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Multiplexer for PollMultiplexer {
    fn wait(&mut self, interest: &[Interest], timeout: Option<Duration>) -> io::Result<ReadySet> {
        self.fds.clear();
        self.fds.extend(interest.iter().map(|entry| libc::pollfd {
            fd: entry.fd,
            events: libc::POLLIN,
            revents: 0,
        }));

        let rc = unsafe {
            libc::poll(
                self.fds.as_mut_ptr(),
                self.fds.len() as libc::nfds_t,
                timeout_millis(timeout),
            )
        };
        if rc < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                return Ok(ReadySet::new());
            }
            return Err(err);
        }

        Ok(self
            .fds
            .iter()
            .zip(interest)
            .filter(|(pfd, _)| pfd.revents & READY_MASK != 0)
            .map(|(_, entry)| entry.token)
            .collect())
    }

    fn name(&self) -> &'static str {
        "poll"
    }
}

/// Converts a wait timeout to `poll`'s millisecond argument, rounding
/// sub-millisecond waits up so they do not become busy polls.
fn timeout_millis(timeout: Option<Duration>) -> libc::c_int {
    match timeout {
        None => -1,
        Some(duration) if duration.is_zero() => 0,
        Some(duration) => {
            let millis = duration.as_millis().max(1);
            libc::c_int::try_from(millis).unwrap_or(libc::c_int::MAX)
        }
    }
}
