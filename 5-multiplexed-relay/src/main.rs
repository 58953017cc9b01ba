use anyhow::{Context, Result};
use clap::Parser;
use tokio::{select, task::JoinError};
use tracing::{info, warn};

use multiplexed_relay::{
    RelayConfig, RelayError,
    cli::Cli,
    relay::Relay,
    shutdown,
};
use net_basics::telemetry::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = RelayConfig::from(Cli::parse());
    let (handle, signal) = shutdown::channel().context("failed to create shutdown pipe")?;
    let mut relay = Relay::bind(&config)
        .context("failed to start relay")?
        .with_shutdown(signal);
    info!("relay listening on {}", relay.local_addr());

    // The loop blocks in poll/select, so it gets a thread of its own.
    let mut server = tokio::task::spawn_blocking(move || relay.run());

    select! {
        result = &mut server => return finish(result),
        ctrl_c = tokio::signal::ctrl_c() => {
            if let Err(err) = ctrl_c {
                warn!(error = ?err, "failed to install ctrl-c handler");
            }
            handle.trigger().context("failed to signal relay shutdown")?;
        }
    }

    finish(server.await)
}

fn finish(result: Result<Result<(), RelayError>, JoinError>) -> Result<()> {
    match result.context("relay thread panicked")? {
        Ok(()) => Ok(()),
        Err(err) => {
            warn!("relay exited with error: {err:?}");
            Err(err.into())
        }
    }
}
