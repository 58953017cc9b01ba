use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};

use anyhow::{Context, Result, anyhow};
use net_basics::{Family, Hints, resolve_async};
use tokio::net::UdpSocket;
use tracing::debug;

/// Sends `message` as one datagram to the first candidate for `host` that a
/// socket can be opened for. Returns the number of bytes sent.
pub async fn send_message(host: &str, port: u16, family: Family, message: &[u8]) -> Result<usize> {
    let candidates = resolve_async(
        Some(host.to_string()),
        port.to_string(),
        Hints::datagram().family(family),
    )
    .await
    .with_context(|| format!("talker: could not resolve {host}"))?;

    for candidate in &candidates {
        let local = if candidate.addr.is_ipv4() {
            SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0))
        } else {
            SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0))
        };
        let socket = match UdpSocket::bind(local).await {
            Ok(socket) => socket,
            Err(err) => {
                debug!(addr = %candidate.addr, error = ?err, "talker: socket failed");
                continue;
            }
        };
        return socket
            .send_to(message, candidate.addr)
            .await
            .context("talker: sendto failed");
    }

    Err(anyhow!("talker: failed to create socket"))
}
