//! # Resource Command Implementation
//!
//! Runs the complete generation pipeline for the project described by the
//! configuration file: fragments are expanded, assembled, enriched, merged
//! with profile overlays, written below the target directory and validated.
//!
//! Flags given on the command line override the values of the
//! configuration file. Relative directories in the configuration are
//! resolved against the directory holding the configuration file.

use anyhow::Result;
use clap::Args;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Instant;

use resource_forge::config::{self, ForgeConfig};
use resource_forge::defaults::CONFIG_FILE_NAME;
use resource_forge::output::{emoji, report_summary, OutputConfig};
use resource_forge::phases::orchestrator;
use resource_forge::resource::{PlatformMode, ResourceFileType};
use resource_forge::suggestions;

/// Generate manifests from the project's fragments and images
#[derive(Args, Debug, Default)]
pub struct ResourceArgs {
    /// Path to the configuration file
    #[arg(short, long, value_name = "FILE", env = "RESOURCE_FORGE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Read fragments from <resource-dir>/<ENV>
    #[arg(long, value_name = "ENV")]
    pub environment: Option<String>,

    /// Platform to generate for; repeat for several (kubernetes, openshift)
    #[arg(long = "platform", value_name = "PLATFORM")]
    pub platforms: Vec<String>,

    /// Output format (yaml, json)
    #[arg(long, value_name = "TYPE")]
    pub resource_type: Option<String>,

    /// Drop Route resources from the output
    #[arg(long)]
    pub no_route: bool,

    /// Do not validate the written manifests
    #[arg(long)]
    pub skip_validation: bool,

    /// Abort when validation fails instead of warning
    #[arg(long)]
    pub fail_on_validation_error: bool,

    /// Profile blended under the enricher and generator configuration
    #[arg(long, value_name = "NAME")]
    pub profile: Option<String>,

    /// Directory receiving the generated manifests
    #[arg(long, value_name = "DIR")]
    pub target_dir: Option<PathBuf>,

    /// Suppress all output except errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl ResourceArgs {
    /// Apply the command line overrides to a parsed configuration.
    pub fn apply_overrides(&self, config: &mut ForgeConfig) -> Result<()> {
        if let Some(environment) = &self.environment {
            config.environment = Some(environment.clone());
        }
        if !self.platforms.is_empty() {
            config.platforms = self
                .platforms
                .iter()
                .map(|p| PlatformMode::from_str(p).map_err(|_| suggestions::unknown_platform(p)))
                .collect::<Result<Vec<_>>>()?;
        }
        if let Some(resource_type) = &self.resource_type {
            config.resource_type = ResourceFileType::from_str(resource_type)?;
        }
        if self.no_route {
            config.generate_route = false;
        }
        if self.skip_validation {
            config.skip_resource_validation = true;
        }
        if self.fail_on_validation_error {
            config.fail_on_validation_error = true;
        }
        if let Some(profile) = &self.profile {
            config.profile = Some(profile.clone());
        }
        if let Some(target_dir) = &self.target_dir {
            config.target_dir = target_dir.clone();
        }
        Ok(())
    }
}

/// Directory relative configuration paths are resolved against.
fn base_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Execute the `resource` command.
pub fn execute(args: ResourceArgs, color_flag: &str) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(color_flag);
    let start_time = Instant::now();

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));
    if !config_path.exists() {
        return Err(suggestions::config_not_found(&config_path));
    }

    let mut forge_config = config::from_file(&config_path)?;
    args.apply_overrides(&mut forge_config)?;

    if !args.quiet {
        println!(
            "{} Generating resources for {}",
            emoji(&out, "🔨", "[GEN]"),
            forge_config.project.artifact_id
        );
    }

    let reports = match orchestrator::execute(&forge_config, &base_dir(&config_path)) {
        Ok(reports) => reports,
        Err(e) => {
            if !args.quiet {
                println!("{} Resource generation failed", emoji(&out, "❌", "[ERR]"));
            }
            return Err(e.into());
        }
    };

    if !args.quiet {
        if reports.is_empty() {
            println!("{} Resource generation skipped", emoji(&out, "⏭️", "[SKIP]"));
        }
        for report in &reports {
            println!("{}", report_summary(&out, report));
        }
        println!(
            "{} Done in {:.2}s",
            emoji(&out, "✅", "[OK]"),
            start_time.elapsed().as_secs_f64()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_replace_file_values() {
        let mut config = ForgeConfig::for_project("shop");
        let args = ResourceArgs {
            environment: Some("prod".to_string()),
            platforms: vec!["openshift".to_string()],
            resource_type: Some("json".to_string()),
            no_route: true,
            skip_validation: true,
            profile: Some("minimal".to_string()),
            target_dir: Some(PathBuf::from("out")),
            ..Default::default()
        };
        args.apply_overrides(&mut config).unwrap();

        assert_eq!(config.environment.as_deref(), Some("prod"));
        assert_eq!(config.platforms, vec![PlatformMode::Openshift]);
        assert_eq!(config.resource_type, ResourceFileType::Json);
        assert!(!config.generate_route);
        assert!(config.skip_resource_validation);
        assert!(!config.fail_on_validation_error);
        assert_eq!(config.profile.as_deref(), Some("minimal"));
        assert_eq!(config.target_dir, PathBuf::from("out"));
    }

    #[test]
    fn test_no_overrides_keep_file_values() {
        let mut config = ForgeConfig::for_project("shop");
        config.generate_route = true;
        ResourceArgs::default().apply_overrides(&mut config).unwrap();
        assert!(config.generate_route);
        assert_eq!(config.platforms.len(), 2);
    }

    #[test]
    fn test_unknown_platform_is_rejected() {
        let mut config = ForgeConfig::for_project("shop");
        let args = ResourceArgs {
            platforms: vec!["openshfit".to_string()],
            ..Default::default()
        };
        let err = args.apply_overrides(&mut config).unwrap_err();
        assert!(err.to_string().contains("Did you mean 'openshift'?"));
    }

    #[test]
    fn test_base_dir() {
        assert_eq!(base_dir(Path::new(".resource-forge.yaml")), PathBuf::from("."));
        assert_eq!(
            base_dir(Path::new("project/.resource-forge.yaml")),
            PathBuf::from("project")
        );
    }
}
