//! # Error Suggestions
//!
//! Helpers producing error messages that say what went wrong and how to fix
//! it. Used by the CLI commands; library code reports hints through
//! [`Error::Configuration`](crate::error::Error::Configuration).
//!
//! ## Usage
//!
//! ```rust,ignore
//! use resource_forge::suggestions;
//!
//! return Err(suggestions::config_not_found(&path));
//! ```

use std::path::Path;

use crate::defaults::{CONFIG_ENV_VAR, CONFIG_FILE_NAME};

/// The configuration file does not exist.
pub fn config_not_found(path: &Path) -> anyhow::Error {
    anyhow::anyhow!(
        "Configuration file not found: {path}\n\n\
         hint: Create a {CONFIG_FILE_NAME} file in your project root\n\
         hint: Use -c/--config to specify a different path\n\
         hint: Set the {CONFIG_ENV_VAR} environment variable",
        path = path.display()
    )
}

/// A validation target directory does not exist.
pub fn output_dir_not_found(path: &Path) -> anyhow::Error {
    anyhow::anyhow!(
        "Output directory not found: {path}\n\n\
         hint: Run 'resource-forge resource' first to generate manifests\n\
         hint: Pass the classifier directory, e.g. target/forge/openshift",
        path = path.display()
    )
}

/// An unknown platform name was given, with a suggestion for typos.
pub fn unknown_platform(platform: &str) -> anyhow::Error {
    let valid = ["kubernetes", "openshift"];
    let did_you_mean = find_similar(platform, &valid)
        .map(|s| format!("\nhint: Did you mean '{s}'?"))
        .unwrap_or_default();

    anyhow::anyhow!(
        "Unknown platform: {platform}{did_you_mean}\n\n\
         Valid platforms are: {platforms}",
        platforms = valid.join(", ")
    )
}

/// An unknown profile name was given, with a suggestion for typos.
pub fn unknown_profile(name: &str, known: &[&str]) -> anyhow::Error {
    let did_you_mean = find_similar(name, known)
        .map(|s| format!("\nhint: Did you mean '{s}'?"))
        .unwrap_or_default();

    anyhow::anyhow!(
        "No profile '{name}' defined{did_you_mean}\n\n\
         Known profiles are: {profiles}\n\
         hint: Run 'resource-forge profiles' to see where each profile is defined",
        profiles = known.join(", ")
    )
}

/// Find a similar string from a list of candidates using edit distance.
///
/// Returns Some(candidate) if a close match is found (edit distance <= 2).
fn find_similar<'a>(input: &str, candidates: &[&'a str]) -> Option<&'a str> {
    candidates
        .iter()
        .map(|&candidate| (candidate, edit_distance(input, candidate)))
        .filter(|&(_, distance)| distance <= 2 && distance < input.len())
        .min_by_key(|&(_, distance)| distance)
        .map(|(candidate, _)| candidate)
}

/// Levenshtein distance, computed with a single rolling row.
fn edit_distance(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    let mut row: Vec<usize> = (0..=b_chars.len()).collect();

    for (i, a_char) in a.chars().enumerate() {
        let mut diagonal = row[0];
        row[0] = i + 1;
        for (j, b_char) in b_chars.iter().enumerate() {
            let substitution = diagonal + usize::from(a_char != *b_char);
            diagonal = row[j + 1];
            row[j + 1] = substitution.min(row[j] + 1).min(diagonal + 1);
        }
    }
    row[b_chars.len()]
}
