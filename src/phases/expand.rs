//! Phase 2: Placeholder Expansion
//!
//! Copies every fragment into a work directory, replacing `${...}`
//! placeholders with values from the [`SubstitutionContext`] on the way.
//!
//! ## Lookup order
//!
//! 1. Explicit project properties (`project.properties` in the configuration).
//! 2. Project identity: `project.artifactId`, `project.groupId`,
//!    `project.version`, `project.name`.
//! 3. `env.NAME` reads the environment variable `NAME`.
//!
//! Unknown placeholders are left untouched so that manifests can carry
//! `${...}` strings meant for later tooling (for example template
//! parameters). Files already expanded stay on disk when a later file fails.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use crate::config::ProjectConfig;
use crate::error::{Error, Result};
use crate::phases::fragments::Fragment;

/// Values available to `${...}` placeholders.
#[derive(Debug, Clone, Default)]
pub struct SubstitutionContext {
    values: BTreeMap<String, String>,
}

impl SubstitutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context holding the project identity and its build properties.
    pub fn from_project(project: &ProjectConfig) -> Self {
        let mut context = Self::new();
        context.insert("project.artifactId", &project.artifact_id);
        context.insert("project.groupId", &project.group_id);
        context.insert("project.version", &project.version);
        context.insert(
            "project.name",
            project.name.as_deref().unwrap_or(&project.artifact_id),
        );
        for (key, value) in &project.properties {
            context.insert(key, value);
        }
        context
    }

    pub fn insert(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }

    pub fn lookup(&self, key: &str) -> Option<String> {
        if let Some(value) = self.values.get(key) {
            return Some(value.clone());
        }
        key.strip_prefix("env.")
            .and_then(|name| std::env::var(name).ok())
    }

    /// Replace every resolvable `${key}` in `text`.
    pub fn substitute(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;
        while let Some(start) = rest.find("${") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let Some(end) = after.find('}') else {
                out.push_str(&rest[start..]);
                return out;
            };
            let key = &after[..end];
            match self.lookup(key.trim()) {
                Some(value) => out.push_str(&value),
                None => {
                    out.push_str("${");
                    out.push_str(key);
                    out.push('}');
                }
            }
            rest = &after[end + 1..];
        }
        out.push_str(rest);
        out
    }
}

/// Expand one fragment into `out_dir` at its [`Fragment::work_path`].
fn expand_fragment(
    fragment: &Fragment,
    out_dir: &Path,
    context: &SubstitutionContext,
) -> Result<PathBuf> {
    let dst = out_dir.join(fragment.work_path());
    let filter_error = |message: String| Error::Filter {
        src: fragment.origin(),
        dst: dst.clone(),
        message,
    };

    let content = fragment
        .read_content()
        .map_err(|e| filter_error(e.to_string()))?;
    let expanded = context.substitute(&content);
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent).map_err(|e| filter_error(e.to_string()))?;
    }
    fs::write(&dst, expanded).map_err(|e| filter_error(e.to_string()))?;
    debug!("Expanded {} to {}", fragment.origin().display(), dst.display());
    Ok(dst)
}

/// Executes Phase 2: expand `fragments` into `out_dir`.
///
/// Returns the expanded paths in the order of `fragments`.
pub fn execute(
    fragments: &[Fragment],
    out_dir: &Path,
    context: &SubstitutionContext,
) -> Result<Vec<PathBuf>> {
    if fragments.is_empty() {
        return Ok(Vec::new());
    }
    fs::create_dir_all(out_dir).map_err(|source| Error::Write {
        path: out_dir.to_path_buf(),
        source,
    })?;

    fragments
        .iter()
        .map(|fragment| expand_fragment(fragment, out_dir, context))
        .collect()
}
