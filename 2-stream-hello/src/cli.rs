use clap::{Args, Parser, Subcommand};

use crate::DEFAULT_PORT;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Greet every connection, then close it.
    Server(ServerArgs),
    /// Connect to a server and print its greeting.
    Client(ClientArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ServerArgs {
    /// Address to bind. Omit to listen on every local address.
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on. Use 0 for an ephemeral port.
    #[arg(long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Pending connections the kernel may queue before accept.
    #[arg(long, default_value_t = 10)]
    pub backlog: u32,
}

#[derive(Args, Debug, Clone)]
pub struct ClientArgs {
    /// Host to connect to.
    pub host: String,

    #[arg(long, default_value_t = DEFAULT_PORT)]
    pub port: u16,
}
