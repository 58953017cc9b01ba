use std::net::SocketAddr;

use anyhow::{Context, Result, anyhow};
use net_basics::{Hints, resolve_async};
use tokio::{io::AsyncReadExt, net::TcpStream};
use tracing::{info, warn};

/// Largest greeting the client will read.
pub const MAX_DATA_SIZE: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Greeting {
    pub server: SocketAddr,
    pub text: String,
}

/// Connects to the first reachable candidate for `host` and performs a
/// single read.
pub async fn fetch_greeting(host: &str, port: u16) -> Result<Greeting> {
    let candidates = resolve_async(Some(host.to_string()), port.to_string(), Hints::stream())
        .await
        .with_context(|| format!("client: could not resolve {host}"))?;

    let (mut stream, server) = connect_first(&candidates).await?;
    info!("client: connecting to {}", server.ip());

    let mut buf = [0u8; MAX_DATA_SIZE - 1];
    let read = stream
        .read(&mut buf)
        .await
        .context("client: receive failed")?;

    Ok(Greeting {
        server,
        text: String::from_utf8_lossy(&buf[..read]).into_owned(),
    })
}

async fn connect_first(
    candidates: &[net_basics::Endpoint],
) -> Result<(TcpStream, SocketAddr)> {
    for candidate in candidates {
        match TcpStream::connect(candidate.addr).await {
            Ok(stream) => return Ok((stream, candidate.addr)),
            Err(err) => warn!(addr = %candidate.addr, error = ?err, "client: connect failed"),
        }
    }
    Err(anyhow!("client: failed to connect"))
}
