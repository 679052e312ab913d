//! # Error Handling
//!
//! This module defines the centralized error type for `resource-forge`. It
//! uses `thiserror` to build a single `Error` enum whose variants follow the
//! failure modes of the manifest pipeline:
//!
//! - **Configuration**: bad mapping declarations, unknown profiles, profile
//!   directories that do not resolve. Raised before any output is written.
//! - **Parse**: a fragment could not be turned into resource items (for
//!   example because no `kind` could be determined). Names the file.
//! - **Filter**: placeholder expansion or the copy into the work directory
//!   failed.
//! - **Processor**: a generator or enricher failed; carries the processor
//!   name. `ConstraintViolation` is the distinguished case where a processor
//!   rejected its input with a list of human readable constraints.
//! - **Validation**: the written output did not pass the schema checks.
//!   Whether this aborts the run is decided by the validation policy.
//! - **Write**: an output file could not be written; carries the path.
//! - **Fetch**: a remote fragment could not be retrieved.
//!
//! Library functions return [`Result<T>`], an alias for
//! `std::result::Result<T, Error>`.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for resource-forge operations
#[derive(Error, Debug)]
pub enum Error {
    /// The build configuration is invalid.
    ///
    /// Includes an optional hint describing how to fix the problem.
    #[error("Configuration error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    Configuration {
        message: String,
        /// Optional hint for how to fix the configuration issue
        hint: Option<String>,
    },

    /// A fragment file could not be parsed into resource items.
    #[error("Cannot parse {}: {message}", file.display())]
    Parse { file: PathBuf, message: String },

    /// Placeholder expansion of a fragment failed.
    #[error("Cannot filter {} to {}: {message}", src.display(), dst.display())]
    Filter {
        src: PathBuf,
        dst: PathBuf,
        message: String,
    },

    /// A generator or enricher failed at runtime.
    #[error("Processor '{processor}' failed: {message}")]
    Processor { processor: String, message: String },

    /// A processor rejected the resources with one or more constraint violations.
    #[error("Constraint violation in '{processor}': {}", violations.join("; "))]
    ConstraintViolation {
        processor: String,
        violations: Vec<String>,
    },

    /// The generated output did not pass validation.
    #[error("Validation of {classifier} resources failed:\n{}", violations.iter().map(|v| format!("  - {}", v)).collect::<Vec<_>>().join("\n"))]
    Validation {
        classifier: String,
        violations: Vec<String>,
    },

    /// An output file could not be written.
    #[error("Failed to write resource to {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A remote fragment could not be fetched.
    #[error("Failed to fetch remote fragment {url}: {message}")]
    Fetch { url: String, message: String },

    /// A serialization step failed.
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A JSON error, wrapped from `serde_json::Error`.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A regular expression error, wrapped from `regex::Error`.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// A URL parsing error, wrapped from `url::ParseError`.
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),
}

impl Error {
    /// Shorthand for a configuration error without a hint.
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
            hint: None,
        }
    }

    /// Whether this error is a constraint violation raised by a processor.
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, Error::ConstraintViolation { .. })
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
