use anyhow::{Context, Result};
use clap::Parser;
use net_basics::{Family, telemetry::init_tracing};

#[derive(Parser, Debug)]
#[command(author, version, about = "Show the IP addresses for a host", long_about = None)]
struct Args {
    /// Hostname or address literal to look up.
    host: String,

    /// Restrict results to one address family.
    #[arg(long, value_enum, default_value_t = Family::Any)]
    family: Family,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let endpoints = show_ip::lookup(&args.host, args.family)
        .await
        .with_context(|| format!("could not resolve {}", args.host))?;
    print!("{}", show_ip::render(&args.host, &endpoints));
    Ok(())
}
