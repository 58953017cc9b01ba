//! The single-threaded event loop.
//!
//! Each pass waits on the connection set, then walks the ready tokens once:
//! listener readiness accepts one connection, connection readiness performs
//! one read and either relays the bytes to every other connection or drops
//! the connection. Nothing that goes wrong with an individual connection
//! escapes the pass; only wait failures and storage growth failures end the
//! loop with an error.

use std::{io, net::SocketAddr, os::fd::AsRawFd, time::Duration};

use tracing::{debug, info, trace, warn};

use crate::{
    config::RelayConfig,
    connection::Token,
    connection_set::{ConnectionSet, Slot},
    error::{RelayError, Result},
    listener::{Accepted, Listener},
    multiplexer::Multiplexer,
    shutdown::ShutdownSignal,
};

/// What one read turned into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relayed {
    pub from: Token,
    pub bytes: usize,
    pub delivered: usize,
    pub failed: usize,
    /// Recipients dropped because they took only part of the message.
    pub dropped: usize,
}

/// Bookkeeping for one wait-and-dispatch pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassSummary {
    pub ready: usize,
    pub accepted: usize,
    pub closed: usize,
    pub relays: Vec<Relayed>,
    pub shutdown: bool,
}

pub struct Relay<M = Box<dyn Multiplexer + Send>> {
    listener: Listener,
    connections: ConnectionSet,
    multiplexer: M,
    buffer: Vec<u8>,
    shutdown: Option<ShutdownSignal>,
    wait_timeout: Option<Duration>,
}

impl Relay {
    /// Binds the listener and picks the configured multiplexer backend.
    pub fn bind(config: &RelayConfig) -> Result<Self> {
        let listener = Listener::bind_and_listen(config)?;
        Ok(Self::with_multiplexer(listener, config, config.backend.build()))
    }
}

impl<M: Multiplexer> Relay<M> {
    pub fn with_multiplexer(listener: Listener, config: &RelayConfig, multiplexer: M) -> Self {
        let connections = ConnectionSet::new(listener.as_raw_fd(), config.initial_capacity);
        Self {
            listener,
            connections,
            multiplexer,
            buffer: vec![0; config.buffer_size.get()],
            shutdown: None,
            wait_timeout: config.wait_timeout,
        }
    }

    /// Adds the shutdown pipe to the wait set. Without one, [`Relay::run`]
    /// only returns on error.
    pub fn with_shutdown(mut self, signal: ShutdownSignal) -> Self {
        self.connections.register_shutdown(signal.as_raw_fd());
        self.shutdown = Some(signal);
        self
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.listener.local_addr()
    }

    pub fn connections(&self) -> &ConnectionSet {
        &self.connections
    }

    /// Runs passes until shutdown is requested or a fatal error occurs.
    pub fn run(&mut self) -> Result<()> {
        info!(
            addr = %self.local_addr(),
            backend = self.multiplexer.name(),
            "relay loop started"
        );
        loop {
            let pass = self.turn()?;
            if pass.shutdown {
                info!(open = self.connections.len(), "relay shutting down");
                return Ok(());
            }
        }
    }

    /// One WAITING → DISPATCHING → WAITING cycle.
    ///
    /// The ready set is a snapshot of tokens taken before any removal, so a
    /// connection moved by a swap-remove earlier in the pass is still served
    /// exactly once, and one that was removed is skipped.
    pub fn turn(&mut self) -> Result<PassSummary> {
        let interest = self.connections.snapshot_for_wait();
        let ready = self
            .multiplexer
            .wait(&interest, self.wait_timeout)
            .map_err(RelayError::Wait)?;

        let mut summary = PassSummary {
            ready: ready.len(),
            ..PassSummary::default()
        };
        if ready.is_empty() {
            trace!("wait returned with nothing ready");
            return Ok(summary);
        }

        for token in ready {
            match token {
                Token::LISTENER => self.accept_one(&mut summary)?,
                Token::SHUTDOWN => {
                    if let Some(signal) = self.shutdown.as_mut() {
                        summary.shutdown |= signal.drain();
                    }
                }
                token => self.service(token, &mut summary),
            }
        }

        debug!(?summary, "pass complete");
        Ok(summary)
    }

    fn accept_one(&mut self, summary: &mut PassSummary) -> Result<()> {
        match self.listener.accept() {
            Ok(Some(Accepted { stream, peer })) => {
                let slot = self.connections.add(stream, peer)?;
                if let Some(conn) = self.connections.get(slot) {
                    info!(token = %conn.token(), peer = conn.peer(), slot, "new connection");
                }
                summary.accepted += 1;
            }
            Ok(None) => debug!("listener readiness without a pending connection"),
            Err(err) => warn!(error = ?err, "failed to accept connection"),
        }
        Ok(())
    }

    fn service(&mut self, token: Token, summary: &mut PassSummary) {
        let Some(slot) = self.connections.slot_of(token) else {
            debug!(%token, "connection already closed this pass");
            return;
        };
        let Some(conn) = self.connections.get_mut(slot) else {
            return;
        };

        match conn.receive(&mut self.buffer) {
            Ok(0) => {
                self.close(slot, None);
                summary.closed += 1;
            }
            Ok(n) => {
                let outcome = self.connections.broadcast(token, &self.buffer[..n]);
                for (recipient, err) in &outcome.failed {
                    warn!(from = %token, to = %recipient, error = ?err, "failed to relay to recipient");
                }
                for cut in &outcome.truncated {
                    warn!(
                        from = %token,
                        to = %cut.token,
                        peer = cut.peer.as_str(),
                        written = cut.written,
                        bytes = n,
                        "recipient took a partial message, dropping connection"
                    );
                }
                trace!(from = %token, bytes = n, delivered = outcome.delivered.len(), "relayed");
                summary.relays.push(Relayed {
                    from: token,
                    bytes: n,
                    delivered: outcome.delivered.len(),
                    failed: outcome.failed.len(),
                    dropped: outcome.truncated.len(),
                });
                summary.closed += outcome.truncated.len();
            }
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => {
                trace!(%token, "spurious readiness");
            }
            Err(err) => {
                self.close(slot, Some(err));
                summary.closed += 1;
            }
        }
    }

    fn close(&mut self, slot: Slot, error: Option<io::Error>) {
        let Some(conn) = self.connections.remove(slot) else {
            return;
        };
        match error {
            None => info!(token = %conn.token(), peer = conn.peer(), "connection hung up"),
            Some(err) => warn!(token = %conn.token(), peer = conn.peer(), error = ?err, "receive failed, dropping connection"),
        }
    }
}
