use anyhow::Result;
use clap::Parser;

use datagram_talk::{
    cli::{Cli, Command},
    listener, talker,
};
use net_basics::telemetry::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    match cli.command {
        Command::Listen(args) => {
            let socket = listener::bind(args.host.as_deref(), args.port, args.family).await?;
            println!("listener: waiting to recvfrom...");
            let packet = listener::receive_one(&socket).await?;
            println!("listener: got packet from {}", packet.from.ip().to_canonical());
            println!("listener: packet is {} bytes long", packet.payload.len());
            println!("listener: packet contains \"{}\"", packet.text());
        }
        Command::Talk(args) => {
            let sent =
                talker::send_message(&args.host, args.port, args.family, args.message.as_bytes())
                    .await?;
            println!("talker: sent {sent} bytes to {}", args.host);
        }
    }

    Ok(())
}
