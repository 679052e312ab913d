//! # Profiles Command Implementation
//!
//! Lists every profile resolvable for the project: those declared in the
//! project's `profiles.yml`, in the user's profile directory and the ones
//! built into the tool. A profile shadowed by an earlier source is listed
//! once, with the source it resolves from.

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use resource_forge::config;
use resource_forge::defaults::{default_resource_dir, CONFIG_FILE_NAME};
use resource_forge::output::{emoji, OutputConfig};
use resource_forge::phases::orchestrator::{effective_resource_dir, profile_search_roots};
use resource_forge::profile::{Profile, ProfileResolver};
use resource_forge::suggestions;

/// List known profiles
#[derive(Args, Debug)]
pub struct ProfilesArgs {
    /// Path to the configuration file; its resource directory is searched for profiles
    #[arg(short, long, value_name = "FILE", env = "RESOURCE_FORGE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Show only this profile
    #[arg(value_name = "NAME")]
    pub name: Option<String>,
}

fn resource_dir(args: &ProfilesArgs) -> Result<PathBuf> {
    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));
    if !config_path.exists() {
        if args.config.is_some() {
            return Err(suggestions::config_not_found(&config_path));
        }
        return Ok(default_resource_dir());
    }
    let forge_config = config::from_file(&config_path)?;
    let base_dir = config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."));
    Ok(effective_resource_dir(
        &config::ForgeConfig::resolve_dir(&base_dir, &forge_config.resource_dir),
        forge_config.environment.as_deref(),
    ))
}

fn describe(profile: &Profile) -> String {
    let includes = |config: Option<&config::ProcessorConfig>| {
        config
            .filter(|c| !c.includes.is_empty())
            .map(|c| c.includes.join(", "))
            .unwrap_or_else(|| "(all)".to_string())
    };
    format!(
        "   enrichers: {}\n   generators: {}",
        includes(profile.enricher.as_ref()),
        includes(profile.generator.as_ref())
    )
}

/// Execute the `profiles` command.
pub fn execute(args: ProfilesArgs, color_flag: &str) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(color_flag);
    let resolver = ProfileResolver::new(&profile_search_roots(&resource_dir(&args)?));
    let profiles = resolver.list()?;

    if let Some(name) = &args.name {
        if !profiles.iter().any(|(p, _)| &p.name == name) {
            let known: Vec<&str> = profiles.iter().map(|(p, _)| p.name.as_str()).collect();
            return Err(suggestions::unknown_profile(name, &known));
        }
    }

    for (profile, source) in &profiles {
        if args.name.as_ref().is_some_and(|n| n != &profile.name) {
            continue;
        }
        println!(
            "{} {} ({})",
            emoji(&out, "📋", "[PROFILE]"),
            profile.name,
            source
        );
        println!("{}", describe(profile));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_lists_includes() {
        let profile: Profile = serde_yaml::from_str(
            "name: dev\nenricher:\n  includes: [namespace, project-label]\n",
        )
        .unwrap();
        assert_eq!(
            describe(&profile),
            "   enrichers: namespace, project-label\n   generators: (all)"
        );
    }

    #[test]
    fn test_explicit_missing_config_is_error() {
        let args = ProfilesArgs {
            config: Some(PathBuf::from("/nonexistent/.resource-forge.yaml")),
            name: None,
        };
        let err = resource_dir(&args).unwrap_err();
        assert!(err.to_string().contains("Configuration file not found"));
    }
}
