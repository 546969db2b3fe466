//! takeaways CLI: regenerate glossary takeaways and publish them as pull
//! requests.
//!
//! Generates selected takeaway fields with a structured-output model, merges
//! them into the glossary document's front-matter and opens a pull request.

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
