//! Scorecard CLI: MEDDPICC qualification scorecards from meeting notes.
//!
//! Sends notes to the analysis service (or serves a demo scorecard),
//! prints the result and optionally stores it in the local database.

mod commands;
mod render;

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
