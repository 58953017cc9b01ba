use std::{
    io,
    net::{SocketAddr, TcpListener, TcpStream},
    os::fd::{AsRawFd, RawFd},
};

use net_basics::{Endpoint, Hints, display::render_peer, resolve};
use socket2::{Domain, Protocol, Socket, Type};
use tracing::{debug, info, warn};

use crate::{
    config::RelayConfig,
    error::{RelayError, Result},
};

/// The relay's passive endpoint. Lives for the whole run.
#[derive(Debug)]
pub struct Listener {
    inner: TcpListener,
    local_addr: SocketAddr,
}

/// A connection fresh off the accept queue.
#[derive(Debug)]
pub struct Accepted {
    pub stream: TcpStream,
    pub peer: String,
}

impl Listener {
    /// Resolves the configured address and listens on the first candidate
    /// that binds. Running out of candidates is fatal.
    pub fn bind_and_listen(config: &RelayConfig) -> Result<Self> {
        let candidates = resolve(
            config.host.as_deref(),
            &config.port.to_string(),
            Hints::stream().passive(),
        )?;

        let attempts = candidates.len();
        let mut last = None;
        for candidate in candidates {
            match listen_on(&candidate, config.backlog) {
                Ok(inner) => {
                    inner.set_nonblocking(true)?;
                    let local_addr = inner.local_addr()?;
                    info!(%local_addr, backlog = config.backlog, "listening");
                    return Ok(Self { inner, local_addr });
                }
                Err(err) => {
                    debug!(addr = %candidate.addr, error = ?err, "bind candidate rejected");
                    last = Some(err);
                }
            }
        }

        Err(RelayError::Bind {
            port: config.port,
            attempts,
            last,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Takes one pending connection off the queue.
    ///
    /// `Ok(None)` means nothing was waiting (the readiness was stale). The
    /// accepted stream is switched to non-blocking so a slow recipient can
    /// never stall the relay.
    pub fn accept(&self) -> io::Result<Option<Accepted>> {
        match self.inner.accept() {
            Ok((stream, addr)) => {
                if let Err(err) = stream.set_nonblocking(true) {
                    warn!(peer = %addr, error = ?err, "could not make connection non-blocking");
                }
                Ok(Some(Accepted {
                    stream,
                    peer: render_peer(&addr),
                }))
            }
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(err) => Err(err),
        }
    }
}

impl AsRawFd for Listener {
    fn as_raw_fd(&self) -> RawFd {
        self.inner.as_raw_fd()
    }
}

fn listen_on(candidate: &Endpoint, backlog: u32) -> io::Result<TcpListener> {
    let domain = Domain::for_address(candidate.addr);
    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;
    socket.set_reuse_address(true)?;
    if candidate.addr.is_ipv6() {
        // Accept IPv4 clients on the IPv6 wildcard where the host allows it.
        let _ = socket.set_only_v6(false);
    }
    socket.bind(&candidate.addr.into())?;
    socket.listen(backlog.try_into().unwrap_or(i32::MAX))?;
    Ok(socket.into())
}
