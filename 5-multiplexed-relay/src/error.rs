use std::{collections::TryReserveError, io};

use net_basics::ResolveError;
use thiserror::Error;

/// Failures that stop the relay.
///
/// Per-connection trouble (a failed accept, a dropped peer, a recipient that
/// cannot be written to) is logged and absorbed inside the dispatch pass and
/// never shows up here.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("could not resolve a listening address")]
    Resolve(#[from] ResolveError),
    #[error("failed to bind any of {attempts} candidate(s) for port {port}")]
    Bind {
        port: u16,
        attempts: usize,
        #[source]
        last: Option<io::Error>,
    },
    #[error("multiplexer wait failed")]
    Wait(#[source] io::Error),
    #[error("connection set could not grow past {capacity} entries")]
    Growth {
        capacity: usize,
        #[source]
        source: TryReserveError,
    },
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T, E = RelayError> = std::result::Result<T, E>;
