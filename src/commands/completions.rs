//! # Completions Command Implementation
//!
//! Prints a shell completion script for `resource-forge` to stdout.
//!
//! ```bash
//! resource-forge completions bash > ~/.local/share/bash-completion/completions/resource-forge
//! resource-forge completions zsh > ~/.zfunc/_resource-forge
//! ```

use anyhow::Result;
use clap::{Args, CommandFactory};
use clap_complete::{generate, Shell};
use std::io;

use crate::cli::Cli;

/// Generate shell completion scripts
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// The shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Execute the `completions` command.
pub fn execute(args: CompletionsArgs) -> Result<()> {
    let mut cmd = Cli::command();
    generate(args.shell, &mut cmd, "resource-forge", &mut io::stdout());
    Ok(())
}
