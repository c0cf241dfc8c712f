use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "contentbox")]
#[command(about = "contentbox CLI", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP server
    Serve(ServeArgs),
    /// Store a file and print the URL that serves it
    Store(StoreArgs),
    /// Print the steps a token encodes, as JSON
    Decode(DecodeArgs),
}

#[derive(clap::Args, Debug)]
pub struct ServeArgs {
    /// Address to bind the HTTP server to (overrides server.bind_addr)
    #[arg(long)]
    pub address: Option<SocketAddr>,

    /// Configuration file (defaults to $CONTENTBOX_CONFIG or config/contentbox.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct StoreArgs {
    /// File whose bytes are stored
    pub file: PathBuf,

    /// Instance to store into
    #[arg(long, default_value = "default")]
    pub instance: String,

    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct DecodeArgs {
    pub token: String,
}
