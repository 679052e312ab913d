//! Phase 3: Resource Assembly
//!
//! Parses expanded fragment files into a [`ResourceListBuilder`].
//!
//! A fragment may hold one manifest, several `---` separated documents, a
//! `kind: List` with `items`, or a top-level sequence. Each entry becomes one
//! [`ResourceItem`], in file order and then in document order.
//!
//! ## Defaults taken from the file name
//!
//! A file named `<name>-<type>.<ext>` (or just `<type>.<ext>`) declares a
//! default kind through the [`KindFilenameMapper`] and a default name. The
//! content always wins: an explicit `kind` or `metadata.name` is never
//! overwritten. The precedence for names is content, then file name, then the
//! project's default resource name. Missing `apiVersion` fields are filled
//! from [`default_api_version`].

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use regex::Regex;
use serde::Deserialize;
use serde_yaml::Value;

use crate::error::{Error, Result};
use crate::mapping::KindFilenameMapper;
use crate::resource::{
    default_api_version, ensure_mapping, PlatformMode, ResourceItem, ResourceListBuilder,
};

const FILENAME_PATTERN: &str = r"^(?P<name>.*?)(-(?P<type>[^-]+))?\.(?P<ext>yaml|yml|json)$";

/// Longest name accepted for Kubernetes objects.
const MAX_NAME_LENGTH: usize = 63;

/// Kubernetes-compatible name derived from a project identifier.
///
/// Lowercases, replaces everything outside `[a-z0-9-]` by `-`, trims dashes
/// and caps the length at 63 characters. An empty result becomes `app`.
pub fn default_resource_name(identifier: &str) -> String {
    let sanitized: String = identifier
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' {
                c
            } else {
                '-'
            }
        })
        .collect();
    let mut name = sanitized.trim_matches('-').to_string();
    if name.len() > MAX_NAME_LENGTH {
        name.truncate(MAX_NAME_LENGTH);
        name = name.trim_end_matches('-').to_string();
    }
    if name.is_empty() {
        "app".to_string()
    } else {
        name
    }
}

/// Kind and name implied by a fragment's file name.
#[derive(Debug, Default, PartialEq)]
pub struct FilenameDefaults {
    pub kind: Option<String>,
    pub name: Option<String>,
}

fn filename_defaults(
    pattern: &Regex,
    file_name: &str,
    mapper: &KindFilenameMapper,
) -> FilenameDefaults {
    let Some(captures) = pattern.captures(file_name) else {
        return FilenameDefaults::default();
    };
    let name = captures.name("name").map(|m| m.as_str()).unwrap_or_default();

    if let Some(filename_type) = captures.name("type") {
        if let Some(kind) = mapper.kind_for_filename_type(filename_type.as_str()) {
            return FilenameDefaults {
                kind: Some(kind.to_string()),
                name: Some(name.to_string()).filter(|n| !n.is_empty()),
            };
        }
        // `my-app.yml`: the dash is part of the name.
        let stem = format!("{}-{}", name, filename_type.as_str());
        return FilenameDefaults {
            kind: None,
            name: Some(stem),
        };
    }

    match mapper.kind_for_filename_type(name) {
        Some(kind) => FilenameDefaults {
            kind: Some(kind.to_string()),
            name: None,
        },
        None => FilenameDefaults {
            kind: None,
            name: Some(name.to_string()).filter(|n| !n.is_empty()),
        },
    }
}

/// Kind and name defaults for `path`.
pub fn defaults_for_file(path: &Path, mapper: &KindFilenameMapper) -> Result<FilenameDefaults> {
    let pattern = Regex::new(FILENAME_PATTERN).map_err(Error::Regex)?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    Ok(filename_defaults(&pattern, file_name, mapper))
}

/// Split a parsed document into its manifest entries.
fn document_entries(document: Value) -> Vec<Value> {
    match document {
        Value::Null => Vec::new(),
        Value::Sequence(items) => items,
        Value::Mapping(_) => {
            let is_list = document
                .get("kind")
                .and_then(Value::as_str)
                .is_some_and(|k| k.eq_ignore_ascii_case("List"));
            if is_list {
                if let Some(items) = document.get("items").and_then(Value::as_sequence) {
                    return items.clone();
                }
            }
            vec![document]
        }
        other => vec![other],
    }
}

fn complete_entry(
    file: &Path,
    mut entry: Value,
    defaults: &FilenameDefaults,
    default_name: &str,
) -> Result<ResourceItem> {
    let parse_error = |message: &str| Error::Parse {
        file: file.to_path_buf(),
        message: message.to_string(),
    };
    if !entry.is_mapping() {
        return Err(parse_error("each manifest must be a mapping"));
    }

    let has_kind = entry
        .get("kind")
        .and_then(Value::as_str)
        .is_some_and(|k| !k.trim().is_empty());
    if !has_kind {
        let kind = defaults.kind.as_deref().ok_or_else(|| {
            parse_error(
                "no 'kind' declared and none can be derived from the file name; \
                 name the file '<name>-<type>.<ext>' or add a 'kind' field",
            )
        })?;
        ensure_mapping(&mut entry).insert(
            Value::String("kind".to_string()),
            Value::String(kind.to_string()),
        );
    }

    let mut item = ResourceItem::from_value(entry).map_err(|m| parse_error(&m))?;
    if item.api_version().is_none() {
        let api_version = default_api_version(item.kind());
        item.set_api_version(api_version);
    }
    if item.name().map_or(true, |n| n.trim().is_empty()) {
        let name = defaults.name.as_deref().unwrap_or(default_name);
        item.set_name(name);
    }
    Ok(item)
}

/// Parse one expanded fragment file into resource items.
pub fn read_fragment(
    file: &Path,
    default_name: &str,
    mapper: &KindFilenameMapper,
) -> Result<Vec<ResourceItem>> {
    let content = fs::read_to_string(file)?;
    let defaults = defaults_for_file(file, mapper)?;

    let mut items = Vec::new();
    for document in serde_yaml::Deserializer::from_str(&content) {
        let value = Value::deserialize(document).map_err(|e| Error::Parse {
            file: file.to_path_buf(),
            message: e.to_string(),
        })?;
        for entry in document_entries(value) {
            items.push(complete_entry(file, entry, &defaults, default_name)?);
        }
    }
    Ok(items)
}

/// Executes Phase 3: read every expanded file into a fresh builder.
pub fn execute(
    files: &[PathBuf],
    platform: PlatformMode,
    default_name: &str,
    mapper: &KindFilenameMapper,
) -> Result<ResourceListBuilder> {
    let mut builder = ResourceListBuilder::new();
    for file in files {
        let items = read_fragment(file, default_name, mapper)?;
        debug!(
            "Read {} item(s) from {} for {}",
            items.len(),
            file.display(),
            platform
        );
        builder.add_all(items);
    }
    Ok(builder)
}
