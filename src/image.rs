//! # Image Configuration
//!
//! Build-time image configuration consumed by generators and by the
//! enrichers that synthesize controllers.
//!
//! - **`ImageConfiguration`** / **`BuildConfiguration`**: what the project
//!   declares under `images:`.
//! - **`ImageConfigResolver`**: the seam through which raw configuration is
//!   turned into resolved configuration before any assembly takes place. The
//!   default implementation expands `${...}` placeholders in image names.
//! - **`ImageNameFormatter`**: expands `%g`, `%a`, `%v`, `%l` and `%t` in
//!   image names against the project identity and the reference build date.
//! - **`reference_date`**: the build timestamp shared by every platform pass.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Local, TimeZone};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::ProjectConfig;
use crate::error::{Error, Result};
use crate::phases::expand::SubstitutionContext;

/// Build part of an image configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct BuildConfiguration {
    /// Base image.
    #[serde(default)]
    pub from: Option<String>,
    /// Exposed ports, e.g. `"8080"` or `"8443/tcp"`.
    #[serde(default)]
    pub ports: Vec<String>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl BuildConfiguration {
    /// Numeric container ports, protocol suffixes stripped, invalid entries skipped.
    pub fn port_numbers(&self) -> Vec<u16> {
        self.ports
            .iter()
            .filter_map(|p| p.split('/').next())
            .filter_map(|p| p.trim().parse::<u16>().ok())
            .collect()
    }
}

/// One image of the project.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ImageConfiguration {
    pub name: String,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub build: Option<BuildConfiguration>,
}

impl ImageConfiguration {
    /// Container name derived from the alias or the image name.
    pub fn container_name(&self) -> String {
        if let Some(alias) = self.alias.as_deref().filter(|a| !a.trim().is_empty()) {
            return alias.to_string();
        }
        let without_tag = self.name.rsplit('/').next().unwrap_or(&self.name);
        let base = without_tag.split(':').next().unwrap_or(without_tag);
        crate::phases::assemble::default_resource_name(base)
    }
}

/// Turns raw image configuration into resolved configuration.
pub trait ImageConfigResolver {
    fn resolve(&self, images: Vec<ImageConfiguration>) -> Result<Vec<ImageConfiguration>>;
}

/// Expands `${...}` placeholders in image names and aliases.
pub struct PropertyImageConfigResolver<'a> {
    context: &'a SubstitutionContext,
}

impl<'a> PropertyImageConfigResolver<'a> {
    pub fn new(context: &'a SubstitutionContext) -> Self {
        Self { context }
    }
}

impl ImageConfigResolver for PropertyImageConfigResolver<'_> {
    fn resolve(&self, images: Vec<ImageConfiguration>) -> Result<Vec<ImageConfiguration>> {
        images
            .into_iter()
            .map(|mut image| {
                image.name = self.context.substitute(&image.name);
                image.alias = image.alias.map(|a| self.context.substitute(&a));
                Ok(image)
            })
            .collect()
    }
}

/// Expands the `%` placeholders of image names.
pub struct ImageNameFormatter<'a> {
    project: &'a ProjectConfig,
    reference_date: DateTime<Local>,
}

impl<'a> ImageNameFormatter<'a> {
    pub fn new(project: &'a ProjectConfig, reference_date: DateTime<Local>) -> Self {
        Self {
            project,
            reference_date,
        }
    }

    fn is_snapshot(&self) -> bool {
        self.project.version.ends_with("-SNAPSHOT")
    }

    fn has_no_version(&self) -> bool {
        self.project.version.trim().is_empty()
    }

    fn group(&self) -> String {
        let group = self
            .project
            .group_id
            .rsplit('.')
            .next()
            .unwrap_or_default();
        group.to_lowercase()
    }

    pub fn format(&self, name: &str) -> String {
        let mut out = String::with_capacity(name.len());
        let mut chars = name.chars().peekable();
        while let Some(ch) = chars.next() {
            if ch != '%' {
                out.push(ch);
                continue;
            }
            match chars.peek().copied() {
                Some('g') => {
                    let group = self.group();
                    if group.is_empty() {
                        // no group: `%g/shop` becomes `shop`
                        chars.next();
                        if chars.peek() == Some(&'/') {
                            chars.next();
                        }
                        continue;
                    }
                    out.push_str(&group);
                }
                Some('a') => out.push_str(&self.project.artifact_id),
                Some('v') => out.push_str(&self.project.version),
                Some('l') => {
                    if self.is_snapshot() || self.has_no_version() {
                        out.push_str("latest");
                    } else {
                        out.push_str(&self.project.version);
                    }
                }
                Some('t') => {
                    if self.has_no_version() {
                        out.push_str("latest");
                    } else if self.is_snapshot() {
                        out.push_str(&format!(
                            "snapshot-{}",
                            self.reference_date.format("%y%m%d-%H%M%S")
                        ));
                    } else {
                        out.push_str(&self.project.version);
                    }
                }
                _ => {
                    out.push('%');
                    continue;
                }
            }
            chars.next();
        }
        out
    }
}

/// Format image names and reject images without a name.
pub fn init_and_validate(
    images: Vec<ImageConfiguration>,
    formatter: &ImageNameFormatter<'_>,
) -> Result<Vec<ImageConfiguration>> {
    images
        .into_iter()
        .map(|mut image| {
            if image.name.trim().is_empty() {
                return Err(Error::Configuration {
                    message: "Every image must have a non-blank name".to_string(),
                    hint: None,
                });
            }
            image.name = formatter.format(&image.name);
            Ok(image)
        })
        .collect()
}

/// Reference build date: the timestamp left by an earlier image build, or now.
pub fn reference_date(build_dir: &Path) -> Result<DateTime<Local>> {
    let ts_file = build_dir.join(crate::defaults::BUILD_TIMESTAMP_FILE);
    if !ts_file.exists() {
        return Ok(Local::now());
    }
    let content = fs::read_to_string(&ts_file)?;
    let millis: i64 = content.trim().parse().map_err(|_| {
        Error::configuration(format!(
            "Cannot read timestamp from {}",
            ts_file.display()
        ))
    })?;
    debug!("Using build timestamp {} from {}", millis, ts_file.display());
    Local
        .timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| {
            Error::configuration(format!(
                "Invalid timestamp {} in {}",
                millis,
                ts_file.display()
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn project(version: &str) -> ProjectConfig {
        ProjectConfig {
            group_id: "io.Example.Shop".to_string(),
            artifact_id: "cart".to_string(),
            version: version.to_string(),
            ..Default::default()
        }
    }

    fn fixed_date() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 5, 7, 8, 9).single().unwrap()
    }

    #[test]
    fn test_format_release_version() {
        let project = project("1.2.0");
        let formatter = ImageNameFormatter::new(&project, fixed_date());
        assert_eq!(formatter.format("%g/%a:%l"), "shop/cart:1.2.0");
        assert_eq!(formatter.format("%a:%t"), "cart:1.2.0");
        assert_eq!(formatter.format("%a:%v"), "cart:1.2.0");
    }

    #[test]
    fn test_format_snapshot_version() {
        let project = project("1.2.0-SNAPSHOT");
        let formatter = ImageNameFormatter::new(&project, fixed_date());
        assert_eq!(formatter.format("%g/%a:%l"), "shop/cart:latest");
        assert_eq!(formatter.format("%a:%t"), "cart:snapshot-240305-070809");
    }

    #[test]
    fn test_format_without_group_or_version() {
        let project = ProjectConfig {
            artifact_id: "cart".to_string(),
            ..Default::default()
        };
        let formatter = ImageNameFormatter::new(&project, fixed_date());
        assert_eq!(formatter.format("%g/%a:%l"), "cart:latest");
        assert_eq!(formatter.format("%a:%t"), "cart:latest");
        assert_eq!(formatter.format("registry.io/%g/%a"), "registry.io/cart");
    }

    #[test]
    fn test_format_keeps_unknown_placeholders() {
        let project = project("1");
        let formatter = ImageNameFormatter::new(&project, fixed_date());
        assert_eq!(formatter.format("100%x"), "100%x");
        assert_eq!(formatter.format("trailing%"), "trailing%");
    }

    #[test]
    fn test_init_and_validate_rejects_blank_name() {
        let project = project("1");
        let formatter = ImageNameFormatter::new(&project, fixed_date());
        let images = vec![ImageConfiguration::default()];
        assert!(matches!(
            init_and_validate(images, &formatter),
            Err(Error::Configuration { .. })
        ));
    }

    #[test]
    fn test_container_name() {
        let image = ImageConfiguration {
            name: "registry.io/team/My_App:1.0".to_string(),
            ..Default::default()
        };
        assert_eq!(image.container_name(), "my-app");

        let aliased = ImageConfiguration {
            name: "x".to_string(),
            alias: Some("web".to_string()),
            build: None,
        };
        assert_eq!(aliased.container_name(), "web");
    }

    #[test]
    fn test_port_numbers() {
        let build = BuildConfiguration {
            ports: vec!["8080".to_string(), "8443/tcp".to_string(), "junk".to_string()],
            ..Default::default()
        };
        assert_eq!(build.port_numbers(), vec![8080, 8443]);
    }

    #[test]
    fn test_reference_date_from_timestamp_file() {
        let temp = TempDir::new().unwrap();
        let docker = temp.path().join("docker");
        fs::create_dir_all(&docker).unwrap();
        fs::write(docker.join("build.timestamp"), "1700000000000\n").unwrap();

        let date = reference_date(temp.path()).unwrap();
        assert_eq!(date.timestamp_millis(), 1_700_000_000_000);
    }

    #[test]
    fn test_reference_date_rejects_garbage() {
        let temp = TempDir::new().unwrap();
        let docker = temp.path().join("docker");
        fs::create_dir_all(&docker).unwrap();
        fs::write(docker.join("build.timestamp"), "yesterday").unwrap();

        assert!(reference_date(temp.path()).is_err());
    }

    #[test]
    fn test_reference_date_defaults_to_now() {
        let temp = TempDir::new().unwrap();
        let before = Local::now().timestamp_millis();
        let date = reference_date(temp.path()).unwrap();
        assert!(date.timestamp_millis() >= before);
    }
}
