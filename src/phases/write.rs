//! Phase 7: Writing to Disk
//!
//! Serializes the finalized resources below the classifier directory:
//!
//! - one composite document, `<classifier>.<ext>`, holding the composite root
//!   (an unwrapped Template or a `List` of every item);
//! - one file per item, `<name>-<suffix>.<ext>`, where the suffix comes from
//!   the [`KindFilenameMapper`].
//!
//! Items without a name get no individual file; they are logged and counted.
//! Files written before a failure are left in place.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::mapping::KindFilenameMapper;
use crate::phases::finalize::OutputEntity;
use crate::resource::{ResourceCollection, ResourceFileType};

/// Files produced by one write.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteOutcome {
    pub composite: PathBuf,
    pub individual: Vec<PathBuf>,
    /// Items without a name, and therefore without an individual file.
    pub skipped: usize,
}

fn write_file<T: Serialize>(path: &Path, value: &T, file_type: ResourceFileType) -> Result<()> {
    let content = file_type.serialize(value)?;
    fs::write(path, content).map_err(|source| Error::Write {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("Wrote {}", path.display());
    Ok(())
}

/// `base` with the format's extension, e.g. `target/forge/openshift/openshift.yml`.
pub fn composite_path(base: &Path, file_type: ResourceFileType) -> PathBuf {
    base.with_extension(file_type.extension())
}

/// Executes Phase 7.
///
/// `base` is the composite file path without extension; individual files go
/// next to it.
pub fn execute(
    entity: &OutputEntity,
    filtered: &ResourceCollection,
    base: &Path,
    file_type: ResourceFileType,
    mapper: &KindFilenameMapper,
) -> Result<WriteOutcome> {
    let dir = base.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir).map_err(|source| Error::Write {
        path: dir.to_path_buf(),
        source,
    })?;

    let composite = composite_path(base, file_type);
    write_file(&composite, &entity.to_value(), file_type)?;

    let mut outcome = WriteOutcome {
        composite,
        ..Default::default()
    };
    for item in filtered.iter() {
        let Some(name) = item.name().filter(|n| !n.trim().is_empty()) else {
            warn!(
                "No name for generated item of kind {}, skipping individual file",
                item.kind()
            );
            outcome.skipped += 1;
            continue;
        };
        let file_name = format!(
            "{}.{}",
            mapper.name_with_suffix(name, item.kind()),
            file_type.extension()
        );
        let path = dir.join(file_name);
        write_file(&path, item, file_type)?;
        outcome.individual.push(path);
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phases::finalize;
    use crate::resource::ResourceItem;
    use log::Level;
    use serde_yaml::Value;
    use tempfile::TempDir;

    fn unnamed(kind: &str) -> ResourceItem {
        let yaml = format!("kind: {}\nmetadata:\n  labels:\n    a: b\n", kind);
        ResourceItem::from_value(serde_yaml::from_str(&yaml).unwrap()).unwrap()
    }

    #[test]
    fn test_writes_composite_and_individual_files() {
        let temp = TempDir::new().unwrap();
        let collection = ResourceCollection::new(vec![
            ResourceItem::new("Deployment", "app"),
            ResourceItem::new("Service", "app"),
            ResourceItem::new("Route", "app"),
        ]);
        let (entity, filtered) = finalize::execute(&collection, false);
        let base = temp.path().join("openshift/openshift");

        let outcome = execute(
            &entity,
            &filtered,
            &base,
            ResourceFileType::Yaml,
            &KindFilenameMapper::default(),
        )
        .unwrap();

        assert_eq!(outcome.composite, temp.path().join("openshift/openshift.yml"));
        assert_eq!(
            outcome.individual,
            vec![
                temp.path().join("openshift/app-deployment.yml"),
                temp.path().join("openshift/app-service.yml"),
            ]
        );
        assert!(!temp.path().join("openshift/app-route.yml").exists());

        let composite: Value =
            serde_yaml::from_str(&fs::read_to_string(&outcome.composite).unwrap()).unwrap();
        assert_eq!(composite.get("kind").and_then(Value::as_str), Some("List"));
        assert_eq!(
            composite.get("items").and_then(Value::as_sequence).map(Vec::len),
            Some(2)
        );
    }

    #[test]
    fn test_json_output() {
        let temp = TempDir::new().unwrap();
        let collection = ResourceCollection::new(vec![ResourceItem::new("ConfigMap", "settings")]);
        let (entity, filtered) = finalize::execute(&collection, true);

        let outcome = execute(
            &entity,
            &filtered,
            &temp.path().join("kubernetes/kubernetes"),
            ResourceFileType::Json,
            &KindFilenameMapper::default(),
        )
        .unwrap();

        assert!(outcome.composite.ends_with("kubernetes/kubernetes.json"));
        let individual = fs::read_to_string(&outcome.individual[0]).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&individual).unwrap();
        assert_eq!(parsed["metadata"]["name"], "settings");
        assert!(outcome.individual[0].ends_with("settings-configmap.json"));
    }

    #[test]
    fn test_unwrapped_template_is_composite_root() {
        let temp = TempDir::new().unwrap();
        let collection = ResourceCollection::new(vec![ResourceItem::new("Template", "shop")]);
        let (entity, filtered) = finalize::execute(&collection, true);

        let outcome = execute(
            &entity,
            &filtered,
            &temp.path().join("openshift/openshift"),
            ResourceFileType::Yaml,
            &KindFilenameMapper::default(),
        )
        .unwrap();
        let composite: Value =
            serde_yaml::from_str(&fs::read_to_string(&outcome.composite).unwrap()).unwrap();
        assert_eq!(composite.get("kind").and_then(Value::as_str), Some("Template"));
        assert!(outcome.individual[0].ends_with("shop-template.yml"));
    }

    #[test]
    fn test_blank_names_are_skipped_with_warning() {
        testing_logger::setup();
        let temp = TempDir::new().unwrap();
        let collection = ResourceCollection::new(vec![
            unnamed("ConfigMap"),
            ResourceItem::new("Service", "web"),
            ResourceItem::new("Secret", "  "),
        ]);
        let (entity, filtered) = finalize::execute(&collection, true);

        let outcome = execute(
            &entity,
            &filtered,
            &temp.path().join("kubernetes/kubernetes"),
            ResourceFileType::Yaml,
            &KindFilenameMapper::default(),
        )
        .unwrap();

        assert_eq!(outcome.individual.len(), 1);
        assert_eq!(outcome.skipped, 2);
        let composite: Value =
            serde_yaml::from_str(&fs::read_to_string(&outcome.composite).unwrap()).unwrap();
        assert_eq!(
            composite.get("items").and_then(Value::as_sequence).map(Vec::len),
            Some(3)
        );

        testing_logger::validate(|captured_logs| {
            let warnings: Vec<_> = captured_logs
                .iter()
                .filter(|log| log.level == Level::Warn)
                .collect();
            assert_eq!(warnings.len(), 2);
            assert!(warnings[0].body.contains("ConfigMap"));
            assert!(warnings[1].body.contains("Secret"));
        });
    }

    #[test]
    fn test_duplicate_items_overwrite_same_file() {
        let temp = TempDir::new().unwrap();
        let collection = ResourceCollection::new(vec![
            ResourceItem::new("Service", "web"),
            ResourceItem::new("Service", "web"),
        ]);
        let (entity, filtered) = finalize::execute(&collection, true);
        let outcome = execute(
            &entity,
            &filtered,
            &temp.path().join("kubernetes/kubernetes"),
            ResourceFileType::Yaml,
            &KindFilenameMapper::default(),
        )
        .unwrap();
        assert_eq!(outcome.individual.len(), 2);
        assert_eq!(outcome.individual[0], outcome.individual[1]);
    }

    #[test]
    fn test_unwritable_target_reports_path() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("blocker");
        fs::write(&blocker, "file").unwrap();
        let collection = ResourceCollection::new(vec![ResourceItem::new("Service", "web")]);
        let (entity, filtered) = finalize::execute(&collection, true);

        let err = execute(
            &entity,
            &filtered,
            &blocker.join("kubernetes/kubernetes"),
            ResourceFileType::Yaml,
            &KindFilenameMapper::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Write { .. }));
        assert!(err.to_string().contains("blocker"));
    }
}
