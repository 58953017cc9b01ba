//! A multiperson chat relay on one thread.
//!
//! Every byte one client sends is written, unchanged, to every other client
//! currently connected. There is no framing, no nicknames and no history:
//! the relay only manages connection lifecycle and readiness.
//!
//! - [`listener`] binds the passive socket and accepts connections.
//! - [`connection_set`] owns every accepted connection and builds the wait
//!   set handed to the multiplexer.
//! - [`multiplexer`] hides `poll(2)` and `select(2)` behind one trait.
//! - [`relay`] is the event loop that ties them together.
//! - [`shutdown`] is a self-pipe that lets another thread stop the loop.
//! - [`config`] and [`cli`] describe how the relay is started.

pub mod cli;
pub mod config;
pub mod connection;
pub mod connection_set;
pub mod error;
pub mod listener;
pub mod multiplexer;
pub mod relay;
pub mod shutdown;

pub use config::RelayConfig;
pub use error::RelayError;
pub use relay::{PassSummary, Relay};
