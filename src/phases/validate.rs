//! Phase 8: Validation
//!
//! Runs the [`validation`](crate::validation) rule set of the platform over
//! the files just written and applies the validation policy:
//!
//! | skip  | fail on error | outcome of a failed validation |
//! |-------|---------------|--------------------------------|
//! | true  | any           | nothing is checked             |
//! | false | false         | a warning is logged            |
//! | false | true          | the run aborts                 |
//!
//! A file that cannot be read or parsed is treated like a violation.

use std::path::Path;

use log::{debug, error, info, warn};

use crate::error::Result;
use crate::resource::PlatformMode;
use crate::validation;

/// How validation failures are handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationPolicy {
    pub skip: bool,
    pub fail_on_error: bool,
}

/// What came of validating one output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    Skipped,
    Passed,
    /// Validation failed but the policy let the run continue.
    Warned(String),
}

/// Executes Phase 8 for the output of `platform` in `dir`.
pub fn execute(
    dir: &Path,
    platform: PlatformMode,
    policy: ValidationPolicy,
) -> Result<ValidationOutcome> {
    if policy.skip {
        debug!("Skipping validation of {} resources", platform);
        return Ok(ValidationOutcome::Skipped);
    }
    match validation::validate_dir(dir, platform) {
        Ok(()) => {
            info!("Validated {} resources in {}", platform, dir.display());
            Ok(ValidationOutcome::Passed)
        }
        Err(e) if policy.fail_on_error => {
            error!("{}", e);
            Err(e)
        }
        Err(e) => {
            warn!("{}", e);
            Ok(ValidationOutcome::Warned(e.to_string()))
        }
    }
}
