//! feedctl - CLI for the event store feed
//!
//! Reads the recent page, archive pages and single events, and walks the
//! archive chain back to the first page. Encrypted responses are opened when
//! a key alias and master key are supplied.

use anyhow::Result;
use clap::Parser;

mod client;
mod commands;
mod error;
mod output;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Err(e) = cli.run().await {
        error::print_error(&e);
        std::process::exit(1);
    }

    Ok(())
}
