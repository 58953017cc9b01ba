use std::{io, os::fd::AsRawFd, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;

use multiplexed_relay::multiplexer::Backend;
use net_basics::telemetry::init_tracing;
use readiness_wait::{DEFAULT_TIMEOUT, WaitOutcome, wait_for_input};

#[derive(Parser, Debug)]
#[command(author, version, about = "Wait for a key press or a timeout", long_about = None)]
struct Args {
    /// Readiness primitive to wait with.
    #[arg(long, value_enum, default_value_t = Backend::Poll)]
    backend: Backend,

    /// Give up after this many milliseconds.
    #[arg(long, default_value_t = DEFAULT_TIMEOUT.as_millis() as u64)]
    timeout_ms: u64,
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let stdin = io::stdin();
    let fd = stdin.as_raw_fd();
    let mut mux = args.backend.build();

    println!(
        "Hit RETURN or wait {:.1} seconds for timeout",
        args.timeout_ms as f64 / 1000.0
    );
    let outcome = wait_for_input(&mut mux, fd, Duration::from_millis(args.timeout_ms))
        .context("wait on stdin failed")?;

    match outcome {
        WaitOutcome::Ready => println!("File descriptor {fd} is ready to read"),
        WaitOutcome::TimedOut => println!("Timed out."),
    }
    Ok(())
}
