//! Phase 5: Profile Overlays
//!
//! Every immediate subdirectory of the effective resource directory holds
//! fragments for the profile of the same name.
//!
//! ## Process
//!
//! 1.  **Resolution** ([`resolve_profile_dirs`]): each directory name is
//!     resolved through the [`ProfileResolver`] before anything is read or
//!     written. A name no profile answers to is a configuration error; a
//!     stray directory must not be skipped silently.
//!
//! 2.  **Overlay passes** ([`execute`]): for each profile with at least one
//!     fragment, in directory name order, the fragments are expanded,
//!     assembled and run through the enricher chain of the profile's own
//!     configuration. The resulting items are appended to the main builder.
//!     Nothing is deduplicated against the main items.

use std::path::{Path, PathBuf};

use log::{debug, info};
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::mapping::KindFilenameMapper;
use crate::phases::{assemble, enrich, expand::SubstitutionContext, fragments};
use crate::processor::{Enricher, EnricherContext, ProcessorRegistry};
use crate::profile::{Profile, ProfileResolver};
use crate::resource::{PlatformMode, ResourceListBuilder};

/// A profile directory together with the profile it resolved to.
#[derive(Debug, Clone)]
pub struct ProfileDir {
    pub dir: PathBuf,
    pub profile: Profile,
}

/// Immediate subdirectories of `resource_dir`, sorted by name.
pub fn list_profile_dirs(resource_dir: &Path) -> Result<Vec<PathBuf>> {
    if !resource_dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut dirs = Vec::new();
    for entry in WalkDir::new(resource_dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| Error::Io(e.into()))?;
        if entry.file_type().is_dir() {
            dirs.push(entry.into_path());
        }
    }
    Ok(dirs)
}

/// Resolve every profile directory of `resource_dir`.
pub fn resolve_profile_dirs(
    resource_dir: &Path,
    resolver: &ProfileResolver,
) -> Result<Vec<ProfileDir>> {
    let mut resolved = Vec::new();
    for dir in list_profile_dirs(resource_dir)? {
        let name = dir
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        let profile = resolver.find(&name)?.ok_or_else(|| Error::Configuration {
            message: format!(
                "Invalid profile '{}' given as directory in {}",
                name,
                resource_dir.display()
            ),
            hint: Some(
                "Please either define a profile of this name or move this directory away"
                    .to_string(),
            ),
        })?;
        resolved.push(ProfileDir { dir, profile });
    }
    Ok(resolved)
}

/// Everything an overlay pass needs besides the profile itself.
pub struct OverlayPass<'a> {
    pub platform: PlatformMode,
    pub ctx: &'a EnricherContext<'a>,
    pub registry: &'a ProcessorRegistry<dyn Enricher>,
    pub mapper: &'a KindFilenameMapper,
    pub substitution: &'a SubstitutionContext,
    /// Profile fragments are expanded into `<work_dir>/<profile-dir-name>`.
    pub work_dir: &'a Path,
}

/// Run the overlay pass of one profile directory. Returns its items.
pub fn process_profile_dir(pass: &OverlayPass<'_>, profile_dir: &ProfileDir) -> Result<ResourceListBuilder> {
    let fragments = fragments::list_local_fragments(&profile_dir.dir)?;
    if fragments.is_empty() {
        debug!(
            "Profile directory {} has no fragments, skipping",
            profile_dir.dir.display()
        );
        return Ok(ResourceListBuilder::new());
    }

    let dir_name = profile_dir.dir.file_name().unwrap_or_default();
    let out_dir = pass.work_dir.join(dir_name);
    let files = super::expand::execute(&fragments, &out_dir, pass.substitution)?;
    let mut builder = assemble::execute(&files, pass.platform, pass.ctx.default_name, pass.mapper)?;

    let config = profile_dir.profile.enricher_config();
    enrich::execute(pass.registry, pass.platform, pass.ctx, &config, &mut builder)?;
    Ok(builder)
}

/// Executes Phase 5: append the items of every profile overlay to `main`.
///
/// Returns the number of appended items.
pub fn execute(
    pass: &OverlayPass<'_>,
    profile_dirs: &[ProfileDir],
    main: &mut ResourceListBuilder,
) -> Result<usize> {
    let mut appended = 0;
    for profile_dir in profile_dirs {
        let overlay = process_profile_dir(pass, profile_dir)?;
        if overlay.is_empty() {
            continue;
        }
        info!(
            "Adding {} resource(s) from profile '{}' ({})",
            overlay.len(),
            profile_dir.profile.name,
            profile_dir.dir.display()
        );
        appended += overlay.len();
        main.add_all(overlay.build().into_items());
    }
    Ok(appended)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use crate::config::{ProjectConfig, ResourcesConfig};
    use crate::resource::ResourceItem;
    use tempfile::TempDir;

    const PROFILES: &str = r#"
- name: dev
  enricher:
    includes: [project-label]
    config:
      project-label:
        provider: dev-team
- name: qa
  enricher:
    includes: [namespace]
- name: empty
"#;

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    struct Fixture {
        temp: TempDir,
        project: ProjectConfig,
        resources: ResourcesConfig,
    }

    impl Fixture {
        fn new() -> Self {
            let temp = TempDir::new().unwrap();
            let forge = temp.path().join("forge");
            write(&forge.join("profiles.yml"), PROFILES);
            write(&forge.join("dev/web-svc.yml"), "spec: {}\n");
            write(
                &forge.join("dev/settings-cm.yml"),
                "data:\n  a: b\n---\nkind: Secret\nmetadata:\n  name: creds\n",
            );
            write(&forge.join("qa/web-svc.yml"), "spec: {}\n");
            fs::create_dir_all(forge.join("empty")).unwrap();
            Self {
                temp,
                project: ProjectConfig {
                    artifact_id: "shop".to_string(),
                    ..Default::default()
                },
                resources: ResourcesConfig {
                    namespace: Some("qa-ns".to_string()),
                    remotes: Vec::new(),
                },
            }
        }

        fn forge(&self) -> PathBuf {
            self.temp.path().join("forge")
        }
    }

    #[test]
    fn test_list_profile_dirs_sorted() {
        let fixture = Fixture::new();
        let dirs = list_profile_dirs(&fixture.forge()).unwrap();
        let names: Vec<_> = dirs
            .iter()
            .map(|d| d.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["dev", "empty", "qa"]);
        assert!(list_profile_dirs(&fixture.temp.path().join("missing"))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_stray_directory_is_configuration_error() {
        let fixture = Fixture::new();
        fs::create_dir_all(fixture.forge().join("backup")).unwrap();
        let resolver = ProfileResolver::new(&[fixture.forge()]);
        let err = resolve_profile_dirs(&fixture.forge(), &resolver).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("Invalid profile 'backup'"));
        assert!(message.contains("move this directory away"));
    }

    #[test]
    fn test_overlays_are_appended_in_directory_order() {
        let fixture = Fixture::new();
        let resolver = ProfileResolver::new(&[fixture.forge()]);
        let profile_dirs = resolve_profile_dirs(&fixture.forge(), &resolver).unwrap();

        let images = Vec::new();
        let ctx = EnricherContext {
            project: &fixture.project,
            images: &images,
            resources: &fixture.resources,
            default_name: "shop",
        };
        let registry = ProcessorRegistry::<dyn Enricher>::enrichers();
        let mapper = KindFilenameMapper::default();
        let substitution = SubstitutionContext::from_project(&fixture.project);
        let work_dir = fixture.temp.path().join("work");
        let pass = OverlayPass {
            platform: PlatformMode::Kubernetes,
            ctx: &ctx,
            registry: &registry,
            mapper: &mapper,
            substitution: &substitution,
            work_dir: &work_dir,
        };

        let mut main = ResourceListBuilder::new();
        main.add_item(ResourceItem::new("Service", "web"));
        let appended = execute(&pass, &profile_dirs, &mut main).unwrap();

        assert_eq!(appended, 4);
        let summary: Vec<_> = main
            .items()
            .iter()
            .map(|i| format!("{}/{}", i.kind(), i.name().unwrap()))
            .collect();
        assert_eq!(
            summary,
            vec![
                "Service/web",
                "ConfigMap/settings",
                "Secret/creds",
                "Service/web",
                "Service/web",
            ]
        );

        // dev: labels only, qa: namespace only
        let dev_service = &main.items()[3];
        assert_eq!(
            dev_service
                .get(&["metadata", "labels", "provider"])
                .and_then(serde_yaml::Value::as_str),
            Some("dev-team")
        );
        assert_eq!(dev_service.namespace(), None);
        let qa_service = &main.items()[4];
        assert_eq!(qa_service.namespace(), Some("qa-ns"));
        assert!(qa_service.get(&["metadata", "labels"]).is_none());

        assert!(work_dir.join("dev/web-svc.yml").exists());
        assert!(work_dir.join("qa/web-svc.yml").exists());
    }
}
