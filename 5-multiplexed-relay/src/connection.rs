use std::{
    fmt,
    io::{self, Read, Write},
    net::TcpStream,
    os::fd::{AsRawFd, RawFd},
};

/// Stable identity of a member of the wait set.
///
/// Tokens are handed out once and never reused, so a token that was removed
/// earlier in a dispatch pass can never alias a newer connection. Slots, by
/// contrast, are reused as soon as they are vacated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Token(pub usize);

impl Token {
    /// The listening socket.
    pub const LISTENER: Token = Token(0);
    /// The read end of the shutdown pipe.
    pub const SHUTDOWN: Token = Token(1);
    /// First token given to an accepted connection.
    pub const FIRST_PEER: Token = Token(2);

    pub fn is_peer(self) -> bool {
        self >= Self::FIRST_PEER
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One accepted client link, exclusively owned by the connection set.
#[derive(Debug)]
pub struct Connection<S = TcpStream> {
    token: Token,
    stream: S,
    peer: String,
}

impl<S> Connection<S> {
    pub(crate) fn new(token: Token, stream: S, peer: String) -> Self {
        Self {
            token,
            stream,
            peer,
        }
    }

    pub fn token(&self) -> Token {
        self.token
    }

    /// Best-effort rendering of the remote endpoint, for diagnostics only.
    pub fn peer(&self) -> &str {
        &self.peer
    }

    pub fn stream(&self) -> &S {
        &self.stream
    }

    pub fn into_stream(self) -> S {
        self.stream
    }
}

impl<S: Read> Connection<S> {
    pub fn receive(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            match self.stream.read(buf) {
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                other => return other,
            }
        }
    }
}

/// How much of one relayed message reached a recipient.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Complete,
    /// Only the first `written` bytes went out. The recipient's byte stream
    /// now ends mid-message, so nothing more may be written to it.
    Truncated { written: usize },
}

impl<S: Write> Connection<S> {
    /// Hands `bytes` to the transport in a single write.
    ///
    /// An error means nothing was written. A short write is reported as
    /// [`Delivery::Truncated`] rather than retried, since a non-blocking
    /// stream would otherwise interleave the rest with later messages.
    pub fn deliver(&mut self, bytes: &[u8]) -> io::Result<Delivery> {
        loop {
            match self.stream.write(bytes) {
                Ok(n) if n == bytes.len() => return Ok(Delivery::Complete),
                Ok(written) => return Ok(Delivery::Truncated { written }),
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            }
        }
    }
}

impl<S: AsRawFd> AsRawFd for Connection<S> {
    fn as_raw_fd(&self) -> RawFd {
        self.stream.as_raw_fd()
    }
}
