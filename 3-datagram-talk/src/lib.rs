//! One datagram, sent and received.
//!
//! [`listener`] binds a datagram socket and waits for a single packet;
//! [`talker`] sends one. Neither side connects, retries or acknowledges.

pub mod cli;
pub mod listener;
pub mod talker;

pub const DEFAULT_PORT: u16 = 4950;
