//! Self-pipe used to interrupt the relay's blocking wait.
//!
//! The signal end joins the wait set under [`Token::SHUTDOWN`](crate::connection::Token::SHUTDOWN).
//! Writing a byte through any [`ShutdownHandle`] makes it readable, which the
//! event loop treats as a request to finish the current pass and return.

use std::{
    io::{self, Read, Write},
    os::{
        fd::{AsRawFd, RawFd},
        unix::net::UnixStream,
    },
    sync::Arc,
};

/// Cloneable, `Send` trigger for a running relay.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    writer: Arc<UnixStream>,
}

/// Receiving end, registered in the relay's wait set.
#[derive(Debug)]
pub struct ShutdownSignal {
    reader: UnixStream,
}

pub fn channel() -> io::Result<(ShutdownHandle, ShutdownSignal)> {
    let (writer, reader) = UnixStream::pair()?;
    writer.set_nonblocking(true)?;
    reader.set_nonblocking(true)?;
    Ok((
        ShutdownHandle {
            writer: Arc::new(writer),
        },
        ShutdownSignal { reader },
    ))
}

impl ShutdownHandle {
    pub fn trigger(&self) -> io::Result<()> {
        match (&*self.writer).write(&[1]) {
            Ok(_) => Ok(()),
            // A full pipe already holds a pending request.
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => Ok(()),
            Err(err) => Err(err),
        }
    }
}

impl ShutdownSignal {
    /// Empties the pipe and reports whether a request was pending.
    pub fn drain(&mut self) -> bool {
        let mut buf = [0u8; 64];
        let mut requested = false;
        loop {
            match self.reader.read(&mut buf) {
                Ok(0) => return true,
                Ok(_) => requested = true,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(_) => return requested,
            }
        }
    }
}

impl AsRawFd for ShutdownSignal {
    fn as_raw_fd(&self) -> RawFd {
        self.reader.as_raw_fd()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trigger_is_observed_once() {
        let (handle, mut signal) = channel().expect("channel");
        assert!(!signal.drain());

        handle.trigger().expect("trigger");
        handle.clone().trigger().expect("trigger clone");
        assert!(signal.drain());
        assert!(!signal.drain());
    }

    #[test]
    fn dropped_handles_count_as_shutdown() {
        let (handle, mut signal) = channel().expect("channel");
        drop(handle);
        assert!(signal.drain());
    }
}
