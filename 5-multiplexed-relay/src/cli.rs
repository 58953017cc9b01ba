use std::{num::NonZeroUsize, time::Duration};

use clap::Parser;

use crate::{
    config::{
        DEFAULT_BACKLOG, DEFAULT_BUFFER_SIZE, DEFAULT_INITIAL_CAPACITY, DEFAULT_PORT, RelayConfig,
    },
    multiplexer::Backend,
};

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Relay bytes from each client to every other client", long_about = None)]
pub struct Cli {
    /// Address to bind. Omit to listen on every local address.
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on. Use 0 for an ephemeral port.
    #[arg(long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Bytes read from a client per readiness event.
    #[arg(long, default_value_t = DEFAULT_BUFFER_SIZE)]
    pub buffer_size: NonZeroUsize,

    /// Pending connections the kernel may queue before accept.
    #[arg(long, default_value_t = DEFAULT_BACKLOG, value_parser = clap::value_parser!(u32).range(1..))]
    pub backlog: u32,

    /// Connections tracked before the connection set first grows.
    #[arg(long, default_value_t = DEFAULT_INITIAL_CAPACITY)]
    pub initial_capacity: NonZeroUsize,

    /// Readiness primitive used to wait on connections.
    #[arg(long, value_enum, default_value_t = Backend::Poll)]
    pub backend: Backend,

    /// Wake up after this many milliseconds even if nothing is ready.
    #[arg(long)]
    pub wait_timeout_ms: Option<u64>,
}

impl From<Cli> for RelayConfig {
    fn from(cli: Cli) -> Self {
        Self {
            host: cli.host,
            port: cli.port,
            buffer_size: cli.buffer_size,
            backlog: cli.backlog,
            initial_capacity: cli.initial_capacity,
            backend: cli.backend,
            wait_timeout: cli.wait_timeout_ms.map(Duration::from_millis),
        }
    }
}
