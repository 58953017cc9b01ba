//! Waiting on one descriptor with a deadline, through either multiplexer
//! backend.

use std::{io, os::fd::RawFd, time::Duration};

use multiplexed_relay::{
    connection::Token,
    multiplexer::{Interest, Multiplexer},
};
use tracing::debug;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(2500);

const WATCHED: Token = Token(0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Ready,
    TimedOut,
}

/// Blocks until `fd` is readable or `timeout` passes.
pub fn wait_for_input<M>(mux: &mut M, fd: RawFd, timeout: Duration) -> io::Result<WaitOutcome>
where
    M: Multiplexer + ?Sized,
{
    let ready = mux.wait(&[Interest::readable(WATCHED, fd)], Some(timeout))?;
    debug!(backend = mux.name(), ?ready, "wait returned");
    Ok(if ready.contains(&WATCHED) {
        WaitOutcome::Ready
    } else {
        WaitOutcome::TimedOut
    })
}

#[cfg(test)]
mod tests {
    use std::{
        io::Write,
        os::{fd::AsRawFd, unix::net::UnixStream},
        time::Instant,
    };

    use multiplexed_relay::multiplexer::Backend;

    use super::*;

    #[test]
    fn pending_input_is_ready_on_both_backends() {
        for backend in [Backend::Poll, Backend::Select] {
            let (watched, mut feeder) = UnixStream::pair().unwrap();
            feeder.write_all(b"\n").unwrap();

            let mut mux = backend.build();
            let outcome = wait_for_input(&mut mux, watched.as_raw_fd(), DEFAULT_TIMEOUT).unwrap();
            assert_eq!(outcome, WaitOutcome::Ready);
        }
    }

    #[test]
    fn silence_times_out_after_the_deadline() {
        for backend in [Backend::Poll, Backend::Select] {
            let (watched, _feeder) = UnixStream::pair().unwrap();
            let timeout = Duration::from_millis(50);

            let started = Instant::now();
            let mut mux = backend.build();
            let outcome = wait_for_input(&mut mux, watched.as_raw_fd(), timeout).unwrap();

            assert_eq!(outcome, WaitOutcome::TimedOut);
            assert!(started.elapsed() >= Duration::from_millis(40));
        }
    }
}
