//! Default values for resource-forge configuration.
//!
//! This module provides centralized default values used by the configuration
//! schema and the CLI, ensuring consistency and avoiding duplication.

use std::path::PathBuf;

use crate::resource::PlatformMode;

/// Name of the configuration file looked up in the project directory.
pub const CONFIG_FILE_NAME: &str = ".resource-forge.yaml";

/// Environment variable that overrides the configuration file path.
pub const CONFIG_ENV_VAR: &str = "RESOURCE_FORGE_CONFIG";

/// File names searched for project specific profiles inside a resource directory.
pub const PROFILE_FILE_NAMES: &[&str] = &["profiles.yml", "profiles.yaml"];

/// Timestamp file written by an earlier image build, relative to the build directory.
pub const BUILD_TIMESTAMP_FILE: &str = "docker/build.timestamp";

/// Profile used when no profile is configured explicitly.
pub const DEFAULT_PROFILE: &str = "default";

/// Folder holding the project's manifest fragments.
pub fn default_resource_dir() -> PathBuf {
    PathBuf::from("src/main/forge")
}

/// Folder receiving the generated manifests.
pub fn default_target_dir() -> PathBuf {
    PathBuf::from("target/forge")
}

/// Scratch folder for placeholder-expanded fragments.
pub fn default_work_dir() -> PathBuf {
    PathBuf::from("target/forge-work")
}

/// Build output folder, searched for the reference build timestamp.
pub fn default_build_dir() -> PathBuf {
    PathBuf::from("target")
}

/// Per-user profile folder, searched after the project's resource directory.
///
/// - Linux: `~/.config/resource-forge`
/// - macOS: `~/Library/Application Support/resource-forge`
/// - Windows: `{FOLDERID_RoamingAppData}\resource-forge`
pub fn default_user_profile_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("resource-forge"))
}

/// Platforms processed when none are configured.
pub fn default_platforms() -> Vec<PlatformMode> {
    vec![PlatformMode::Kubernetes, PlatformMode::Openshift]
}

pub fn default_true() -> bool {
    true
}
