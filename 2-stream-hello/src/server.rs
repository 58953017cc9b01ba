use std::{future::Future, net::SocketAddr};

use anyhow::{Context, Result, anyhow};
use net_basics::{Endpoint, Hints, display::render_peer, resolve_async};
use tokio::{
    io::AsyncWriteExt,
    net::{TcpListener, TcpSocket, TcpStream},
    select,
};
use tracing::{debug, info, warn};

use crate::GREETING;

pub struct HelloServer {
    listener: TcpListener,
}

impl HelloServer {
    /// Listens on the first resolved candidate that binds.
    pub async fn bind(host: Option<&str>, port: u16, backlog: u32) -> Result<Self> {
        let candidates = resolve_async(
            host.map(str::to_string),
            port.to_string(),
            Hints::stream().passive(),
        )
        .await?;

        let mut last_error = None;
        for candidate in &candidates {
            match listen_on(candidate, backlog) {
                Ok(listener) => return Ok(Self { listener }),
                Err(err) => {
                    debug!(addr = %candidate.addr, error = ?err, "server: bind failed");
                    last_error = Some(err);
                }
            }
        }

        let err = last_error.map_or_else(|| anyhow!("no candidates"), Into::into);
        Err(err.context(format!("server: failed to bind port {port}")))
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send,
    {
        tokio::pin!(shutdown);
        info!("server: waiting for connections...");

        loop {
            select! {
                _ = &mut shutdown => {
                    info!("server shutting down");
                    break;
                }
                accepted = self.listener.accept() => {
                    match accepted {
                        Ok((stream, peer)) => spawn_greeting(stream, peer),
                        Err(err) => warn!(error = ?err, "server: accept failed"),
                    }
                }
            }
        }

        Ok(())
    }

    pub async fn run_until_ctrl_c(self) -> Result<()> {
        self.run_until(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                warn!(error = ?err, "failed to install ctrl-c handler");
            }
        })
        .await
    }
}

fn listen_on(candidate: &Endpoint, backlog: u32) -> std::io::Result<TcpListener> {
    let socket = if candidate.addr.is_ipv4() {
        TcpSocket::new_v4()?
    } else {
        TcpSocket::new_v6()?
    };
    socket.set_reuseaddr(true)?;
    socket.bind(candidate.addr)?;
    socket.listen(backlog)
}

fn spawn_greeting(mut stream: TcpStream, peer: SocketAddr) {
    info!("server: got connection from {}", render_peer(&peer));
    tokio::spawn(async move {
        if let Err(err) = stream.write_all(GREETING).await {
            warn!(%peer, error = ?err, "server: send failed");
        }
        let _ = stream.shutdown().await;
    });
}
