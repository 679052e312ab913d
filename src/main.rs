//! # Resource Forge CLI
//!
//! This is the binary entry point for the `resource-forge` command-line tool.
//!
//! Its responsibilities are parsing arguments with `clap`, running the chosen
//! command and turning errors into readable output. The pipeline itself lives
//! in the library crate.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli.execute()
}
