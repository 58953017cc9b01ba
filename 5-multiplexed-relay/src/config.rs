use std::{num::NonZeroUsize, time::Duration};

use crate::multiplexer::Backend;

pub const DEFAULT_PORT: u16 = 9034;
pub const DEFAULT_BUFFER_SIZE: NonZeroUsize = non_zero(256);
pub const DEFAULT_BACKLOG: u32 = 10;
pub const DEFAULT_INITIAL_CAPACITY: NonZeroUsize = non_zero(5);

const fn non_zero(n: usize) -> NonZeroUsize {
    match NonZeroUsize::new(n) {
        Some(n) => n,
        None => panic!("default must be non-zero"),
    }
}

/// Everything the relay needs to know before it binds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    /// Address to bind; `None` binds the wildcard address of every family.
    pub host: Option<String>,
    pub port: u16,
    /// Size of the single read performed per readiness event.
    pub buffer_size: NonZeroUsize,
    pub backlog: u32,
    /// Connections the set can track before its storage first doubles.
    pub initial_capacity: NonZeroUsize,
    pub backend: Backend,
    /// `None` blocks in the wait indefinitely.
    pub wait_timeout: Option<Duration>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: None,
            port: DEFAULT_PORT,
            buffer_size: DEFAULT_BUFFER_SIZE,
            backlog: DEFAULT_BACKLOG,
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            backend: Backend::default(),
            wait_timeout: None,
        }
    }
}

impl RelayConfig {
    /// Loopback config on an ephemeral port, handy for tests and local runs.
    pub fn loopback() -> Self {
        Self {
            host: Some("127.0.0.1".to_string()),
            port: 0,
            ..Self::default()
        }
    }

    pub fn with_backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }
}
