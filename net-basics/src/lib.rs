//! Socket helpers shared by the teaching programs in this workspace.
//!
//! - [`resolve`] turns a host and service into an ordered list of candidate
//!   endpoints, the way every program here finds something to bind or connect.
//! - [`display`] renders addresses for the terminal.
//! - [`telemetry`] installs the `tracing` subscriber used by each binary.

pub mod display;
pub mod resolve;
pub mod telemetry;

pub use resolve::{Endpoint, Family, Hints, ResolveError, SockType, resolve, resolve_async};
