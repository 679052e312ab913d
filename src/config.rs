//! # Configuration Schema and Parsing
//!
//! This module defines the data structures that represent the
//! `.resource-forge.yaml` build configuration and the logic for parsing it.
//!
//! ## Key Components
//!
//! - **`ForgeConfig`**: the whole file: project identity, image
//!   configuration, directory layout, processor configuration, kind mappings
//!   and the flags that gate route emission and validation.
//! - **`ProjectConfig`**: the project's canonical identifier and the build
//!   properties used for `${...}` placeholder expansion.
//! - **`ProcessorConfig`**: which enrichers or generators run, in which order,
//!   and with which per-processor settings.
//!
//! Relative directories are interpreted against the directory containing the
//! configuration file (see [`ForgeConfig::resolve_dir`]).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use crate::defaults;
use crate::error::{Error, Result};
use crate::image::ImageConfiguration;
use crate::mapping::MappingConfig;
use crate::resource::{PlatformMode, ResourceFileType};

/// Project identity and build properties.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct ProjectConfig {
    #[serde(default)]
    pub group_id: String,
    pub artifact_id: String,
    #[serde(default)]
    pub version: String,
    /// Human readable name, defaults to the artifact id.
    #[serde(default)]
    pub name: Option<String>,
    /// Build properties available to placeholder expansion.
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

/// Resource specific settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct ResourcesConfig {
    /// Namespace applied to namespaced resources.
    #[serde(default)]
    pub namespace: Option<String>,
    /// URLs of additional fragments.
    #[serde(default)]
    pub remotes: Vec<String>,
}

/// Selection, ordering and settings of a group of processors.
///
/// `includes` fixes the order; when it is empty every registered processor
/// runs in registry order. `excludes` always wins. `config` holds the
/// settings of each processor keyed by processor name.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProcessorConfig {
    #[serde(default)]
    pub includes: Vec<String>,
    #[serde(default)]
    pub excludes: Vec<String>,
    #[serde(default)]
    pub config: BTreeMap<String, BTreeMap<String, Value>>,
}

/// Render a scalar YAML value as a string.
pub fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

impl ProcessorConfig {
    /// Whether `name` is part of the chain.
    pub fn use_processor(&self, name: &str) -> bool {
        if self.excludes.iter().any(|e| e == name) {
            return false;
        }
        self.includes.is_empty() || self.includes.iter().any(|i| i == name)
    }

    /// Raw setting of a processor.
    pub fn value(&self, processor: &str, key: &str) -> Option<&Value> {
        self.config.get(processor).and_then(|c| c.get(key))
    }

    /// Scalar setting of a processor rendered as a string.
    pub fn get(&self, processor: &str, key: &str) -> Option<String> {
        self.value(processor, key).and_then(scalar_to_string)
    }

    /// Scalar setting with a fallback.
    pub fn get_or(&self, processor: &str, key: &str, default: &str) -> String {
        self.get(processor, key)
            .unwrap_or_else(|| default.to_string())
    }

    /// Boolean setting; anything but `true` (case-insensitive) is false.
    pub fn get_bool(&self, processor: &str, key: &str, default: bool) -> bool {
        self.get(processor, key)
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(default)
    }

    /// Layer `explicit` over `base`.
    ///
    /// Includes come from `explicit` when it declares any, excludes are the
    /// union of both, and per-processor settings are merged key-wise with
    /// `explicit` winning.
    pub fn merge(explicit: Option<&ProcessorConfig>, base: Option<&ProcessorConfig>) -> Self {
        let (explicit, base) = match (explicit, base) {
            (None, None) => return Self::default(),
            (Some(e), None) => return e.clone(),
            (None, Some(b)) => return b.clone(),
            (Some(e), Some(b)) => (e, b),
        };

        let includes = if explicit.includes.is_empty() {
            base.includes.clone()
        } else {
            explicit.includes.clone()
        };

        let mut excludes = base.excludes.clone();
        for exclude in &explicit.excludes {
            if !excludes.contains(exclude) {
                excludes.push(exclude.clone());
            }
        }

        let mut config = base.config.clone();
        for (processor, settings) in &explicit.config {
            let entry = config.entry(processor.clone()).or_default();
            for (key, value) in settings {
                entry.insert(key.clone(), value.clone());
            }
        }

        Self {
            includes,
            excludes,
            config,
        }
    }
}

/// The complete `.resource-forge.yaml` configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct ForgeConfig {
    pub project: ProjectConfig,
    #[serde(default)]
    pub images: Vec<ImageConfiguration>,
    #[serde(default = "defaults::default_resource_dir")]
    pub resource_dir: PathBuf,
    #[serde(default = "defaults::default_target_dir")]
    pub target_dir: PathBuf,
    #[serde(default = "defaults::default_work_dir")]
    pub work_dir: PathBuf,
    #[serde(default = "defaults::default_build_dir")]
    pub build_dir: PathBuf,
    /// Selects `resource_dir/<environment>` as the effective fragment root.
    #[serde(default)]
    pub environment: Option<String>,
    #[serde(default)]
    pub resources: ResourcesConfig,
    /// Profile blended under the explicit enricher/generator configuration.
    #[serde(default)]
    pub profile: Option<String>,
    #[serde(default)]
    pub enricher: Option<ProcessorConfig>,
    #[serde(default)]
    pub generator: Option<ProcessorConfig>,
    #[serde(default)]
    pub mappings: Vec<MappingConfig>,
    #[serde(default = "defaults::default_platforms")]
    pub platforms: Vec<PlatformMode>,
    #[serde(default = "defaults::default_true")]
    pub generate_route: bool,
    #[serde(default)]
    pub skip_resource_validation: bool,
    #[serde(default)]
    pub fail_on_validation_error: bool,
    #[serde(default)]
    pub resource_type: ResourceFileType,
    /// Skip resource generation altogether.
    #[serde(default)]
    pub skip: bool,
}

impl ForgeConfig {
    /// Minimal configuration for a project; every other field takes its default.
    pub fn for_project(artifact_id: &str) -> Self {
        Self {
            project: ProjectConfig {
                artifact_id: artifact_id.to_string(),
                ..Default::default()
            },
            images: Vec::new(),
            resource_dir: defaults::default_resource_dir(),
            target_dir: defaults::default_target_dir(),
            work_dir: defaults::default_work_dir(),
            build_dir: defaults::default_build_dir(),
            environment: None,
            resources: ResourcesConfig::default(),
            profile: None,
            enricher: None,
            generator: None,
            mappings: Vec::new(),
            platforms: defaults::default_platforms(),
            generate_route: true,
            skip_resource_validation: false,
            fail_on_validation_error: false,
            resource_type: ResourceFileType::Yaml,
            skip: false,
        }
    }

    /// Resolve a configured directory against the project directory.
    pub fn resolve_dir(base_dir: &Path, dir: &Path) -> PathBuf {
        if dir.is_absolute() {
            dir.to_path_buf()
        } else {
            base_dir.join(dir)
        }
    }

    /// Check invariants serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.project.artifact_id.trim().is_empty() {
            return Err(Error::Configuration {
                message: "project.artifact-id must not be empty".to_string(),
                hint: Some("Set 'project: { artifact-id: my-app }'".to_string()),
            });
        }
        if self.platforms.is_empty() {
            return Err(Error::configuration(
                "At least one platform must be configured",
            ));
        }
        Ok(())
    }
}

/// Parse a YAML string into a validated [`ForgeConfig`].
pub fn parse(yaml_content: &str) -> Result<ForgeConfig> {
    let config: ForgeConfig =
        serde_yaml::from_str(yaml_content).map_err(|e| Error::Configuration {
            message: e.to_string(),
            hint: None,
        })?;
    config.validate()?;
    Ok(config)
}

/// Read and parse a configuration file.
pub fn from_file<P: AsRef<Path>>(path: P) -> Result<ForgeConfig> {
    let content = std::fs::read_to_string(path.as_ref())?;
    parse(&content)
}
