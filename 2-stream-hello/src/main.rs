use anyhow::Result;
use clap::Parser;
use tracing::info;

use net_basics::telemetry::init_tracing;
use stream_hello::{
    cli::{Cli, Command},
    client,
    server::HelloServer,
};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    match cli.command {
        Command::Server(args) => {
            let server = HelloServer::bind(args.host.as_deref(), args.port, args.backlog).await?;
            info!("server listening on {}", server.local_addr()?);
            server.run_until_ctrl_c().await?;
        }
        Command::Client(args) => {
            let greeting = client::fetch_greeting(&args.host, args.port).await?;
            println!("client: connected to {}", greeting.server.ip());
            println!("client: received '{}'", greeting.text);
        }
    }

    Ok(())
}
