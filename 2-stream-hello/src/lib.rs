//! The smallest useful stream server and client.
//!
//! - [`cli`] parses the `server` and `client` subcommands.
//! - [`server`] greets every connection with a fixed message and hangs up.
//! - [`client`] connects to the first reachable address for a host and
//!   prints whatever the server sends in one read.

pub mod cli;
pub mod client;
pub mod server;

pub const DEFAULT_PORT: u16 = 3490;
pub const GREETING: &[u8] = b"Hello, world!";
