//! # Validate Command Implementation
//!
//! Runs the validation rule set of a platform over an existing output
//! directory, e.g. `target/forge/openshift`. Without `--classifier` the
//! platform is taken from the directory name.
//!
//! Violations are printed as warnings unless `--fail-on-error` is given, in
//! which case the command fails. This command does not modify any files.

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;
use std::str::FromStr;

use resource_forge::output::{emoji, validation_line, OutputConfig};
use resource_forge::phases::validate::{self, ValidationOutcome, ValidationPolicy};
use resource_forge::resource::PlatformMode;
use resource_forge::suggestions;

/// Validate manifests in an output directory
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Directory holding the manifests of one platform
    #[arg(value_name = "DIR")]
    pub dir: PathBuf,

    /// Rule set to apply (kubernetes, openshift); defaults to the directory name
    #[arg(long, value_name = "PLATFORM")]
    pub classifier: Option<String>,

    /// Fail when violations are found
    #[arg(long)]
    pub fail_on_error: bool,
}

fn platform_for(args: &ValidateArgs) -> Result<PlatformMode> {
    let name = match &args.classifier {
        Some(classifier) => classifier.clone(),
        None => args
            .dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default(),
    };
    PlatformMode::from_str(&name).map_err(|_| suggestions::unknown_platform(&name))
}

/// Execute the `validate` command.
pub fn execute(args: ValidateArgs, color_flag: &str) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(color_flag);
    if !args.dir.is_dir() {
        return Err(suggestions::output_dir_not_found(&args.dir));
    }
    let platform = platform_for(&args)?;

    println!(
        "{} Validating {} resources in {}",
        emoji(&out, "🔍", "[SCAN]"),
        platform,
        args.dir.display()
    );

    let policy = ValidationPolicy {
        skip: false,
        fail_on_error: args.fail_on_error,
    };
    let outcome = validate::execute(&args.dir, platform, policy)?;
    println!("{}", validation_line(&out, &outcome));
    if let ValidationOutcome::Warned(message) = &outcome {
        for line in message.lines().skip(1) {
            println!("{}", line);
        }
    }
    Ok(())
}
