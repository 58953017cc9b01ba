use clap::{Args, Parser, Subcommand};
use net_basics::Family;

use crate::DEFAULT_PORT;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Wait for one datagram and print it.
    Listen(ListenArgs),
    /// Send one datagram.
    Talk(TalkArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ListenArgs {
    /// Address to bind. Omit to use the wildcard address.
    #[arg(long)]
    pub host: Option<String>,

    #[arg(long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    #[arg(long, value_enum, default_value_t = Family::V6)]
    pub family: Family,
}

#[derive(Args, Debug, Clone)]
pub struct TalkArgs {
    /// Host to send to.
    pub host: String,

    /// Text carried by the datagram.
    pub message: String,

    #[arg(long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    #[arg(long, value_enum, default_value_t = Family::V6)]
    pub family: Family,
}
