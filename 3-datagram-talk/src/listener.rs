use std::net::SocketAddr;

use anyhow::{Context, Result, anyhow};
use net_basics::{Family, Hints, resolve_async};
use tokio::net::UdpSocket;
use tracing::debug;

/// Largest datagram payload the listener keeps.
pub const MAX_BUF_LEN: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub from: SocketAddr,
    pub payload: Vec<u8>,
}

impl Packet {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.payload).into_owned()
    }
}

/// Binds the first passive candidate for `port` that the host accepts.
pub async fn bind(host: Option<&str>, port: u16, family: Family) -> Result<UdpSocket> {
    let candidates = resolve_async(
        host.map(str::to_string),
        port.to_string(),
        Hints::datagram().family(family).passive(),
    )
    .await?;

    for candidate in &candidates {
        match UdpSocket::bind(candidate.addr).await {
            Ok(socket) => return Ok(socket),
            Err(err) => debug!(addr = %candidate.addr, error = ?err, "listener: bind failed"),
        }
    }
    Err(anyhow!("listener: failed to bind socket"))
}

/// Waits for a single datagram.
pub async fn receive_one(socket: &UdpSocket) -> Result<Packet> {
    let mut buf = [0u8; MAX_BUF_LEN - 1];
    let (len, from) = socket
        .recv_from(&mut buf)
        .await
        .context("listener: recvfrom failed")?;
    Ok(Packet {
        from,
        payload: buf[..len].to_vec(),
    })
}
