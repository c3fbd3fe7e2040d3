//! scorepull CLI: bulk extraction of paginated admission scores into one table.
//!
//! Fetches every page of the score listing under a concurrency cap and
//! merges the records into a single CSV file.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
