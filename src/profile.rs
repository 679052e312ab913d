//! # Profiles
//!
//! A profile is a named bundle of enricher and generator configuration. It is
//! used in two places:
//!
//! - the configured `profile` is blended under the explicit `enricher` and
//!   `generator` configuration of the main pass
//!   ([`blend_profile_with_configuration`]);
//! - every subdirectory of the resource directory names the profile its
//!   fragments are processed with.
//!
//! Profiles are looked up through a [`ProfileResolver`], which asks its
//! sources in a fixed order: the `profiles.yml` of each search root, then the
//! profiles compiled into the binary. The first source knowing a name wins.
//! Resolution reads only the search roots it was given.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::ProcessorConfig;
use crate::defaults::PROFILE_FILE_NAMES;
use crate::error::{Error, Result};

const BUILTIN_PROFILES: &str = include_str!("builtin-profiles.yml");

/// A named bundle of processor configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Profile {
    pub name: String,
    /// Among profiles of the same name in one file, the highest order wins.
    #[serde(default)]
    pub order: i32,
    #[serde(default)]
    pub enricher: Option<ProcessorConfig>,
    #[serde(default)]
    pub generator: Option<ProcessorConfig>,
}

/// Which processor group a configuration is meant for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessorKind {
    Enricher,
    Generator,
}

impl Profile {
    pub fn processor_config(&self, kind: ProcessorKind) -> Option<&ProcessorConfig> {
        match kind {
            ProcessorKind::Enricher => self.enricher.as_ref(),
            ProcessorKind::Generator => self.generator.as_ref(),
        }
    }

    /// Enricher configuration used when processing a profile directory.
    pub fn enricher_config(&self) -> ProcessorConfig {
        self.enricher.clone().unwrap_or_default()
    }
}

/// Parse a profile file. `origin` is only used in error messages.
pub fn read_profiles(content: &str, origin: &Path) -> Result<Vec<Profile>> {
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_yaml::from_str(content).map_err(|e| Error::Parse {
        file: origin.to_path_buf(),
        message: e.to_string(),
    })
}

fn select(profiles: Vec<Profile>, name: &str) -> Option<Profile> {
    profiles
        .into_iter()
        .filter(|p| p.name == name)
        .max_by_key(|p| p.order)
}

/// A place profiles are read from.
pub trait ProfileSource {
    /// Every profile this source declares.
    fn load(&self) -> Result<Vec<Profile>>;

    /// Human readable origin, e.g. a file path.
    fn describe(&self) -> String;
}

/// `profiles.yml` (or `profiles.yaml`) inside a directory.
pub struct DirectoryProfiles {
    dir: PathBuf,
}

impl DirectoryProfiles {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn profile_file(&self) -> Option<PathBuf> {
        PROFILE_FILE_NAMES
            .iter()
            .map(|name| self.dir.join(name))
            .find(|path| path.is_file())
    }
}

impl ProfileSource for DirectoryProfiles {
    fn load(&self) -> Result<Vec<Profile>> {
        let Some(path) = self.profile_file() else {
            return Ok(Vec::new());
        };
        let content = fs::read_to_string(&path)?;
        read_profiles(&content, &path)
    }

    fn describe(&self) -> String {
        self.profile_file()
            .unwrap_or_else(|| self.dir.join(PROFILE_FILE_NAMES[0]))
            .display()
            .to_string()
    }
}

/// Profiles compiled into the binary.
pub struct EmbeddedProfiles;

impl ProfileSource for EmbeddedProfiles {
    fn load(&self) -> Result<Vec<Profile>> {
        read_profiles(BUILTIN_PROFILES, Path::new("<builtin>"))
    }

    fn describe(&self) -> String {
        "builtin".to_string()
    }
}

/// Looks up profiles in a fixed sequence of sources.
pub struct ProfileResolver {
    sources: Vec<Box<dyn ProfileSource>>,
}

impl ProfileResolver {
    /// Each search root in order, then the embedded profiles.
    pub fn new(search_roots: &[PathBuf]) -> Self {
        let mut sources: Vec<Box<dyn ProfileSource>> = search_roots
            .iter()
            .map(|root| Box::new(DirectoryProfiles::new(root)) as Box<dyn ProfileSource>)
            .collect();
        sources.push(Box::new(EmbeddedProfiles));
        Self { sources }
    }

    pub fn with_sources(sources: Vec<Box<dyn ProfileSource>>) -> Self {
        Self { sources }
    }

    /// The profile called `name` from the first source that declares it.
    pub fn find(&self, name: &str) -> Result<Option<Profile>> {
        for source in &self.sources {
            if let Some(profile) = select(source.load()?, name) {
                return Ok(Some(profile));
            }
        }
        Ok(None)
    }

    /// Every resolvable profile with the source it resolves from.
    pub fn list(&self) -> Result<Vec<(Profile, String)>> {
        let mut resolved: Vec<(Profile, String)> = Vec::new();
        for source in &self.sources {
            let profiles = source.load()?;
            let mut names: Vec<String> = profiles.iter().map(|p| p.name.clone()).collect();
            names.dedup();
            for name in names {
                if resolved.iter().any(|(p, _)| p.name == name) {
                    continue;
                }
                if let Some(profile) = select(profiles.clone(), &name) {
                    resolved.push((profile, source.describe()));
                }
            }
        }
        Ok(resolved)
    }

    fn known_names(&self) -> Vec<String> {
        self.list()
            .map(|profiles| profiles.into_iter().map(|(p, _)| p.name).collect())
            .unwrap_or_default()
    }
}

/// Profile `name` searched in `search_roots`, then among the embedded profiles.
pub fn find_profile(name: &str, search_roots: &[PathBuf]) -> Result<Option<Profile>> {
    ProfileResolver::new(search_roots).find(name)
}

/// Layer `explicit` over the `kind` configuration of profile `profile_name`.
///
/// Without a profile name `explicit` is returned as is. An unknown profile is
/// a configuration error.
pub fn blend_profile_with_configuration(
    kind: ProcessorKind,
    profile_name: Option<&str>,
    resolver: &ProfileResolver,
    explicit: Option<&ProcessorConfig>,
) -> Result<ProcessorConfig> {
    let Some(profile_name) = profile_name else {
        return Ok(explicit.cloned().unwrap_or_default());
    };
    let profile = resolver.find(profile_name)?.ok_or_else(|| Error::Configuration {
        message: format!("No profile '{}' defined", profile_name),
        hint: Some(format!(
            "Known profiles: {}",
            resolver.known_names().join(", ")
        )),
    })?;
    Ok(ProcessorConfig::merge(
        explicit,
        profile.processor_config(kind),
    ))
}
