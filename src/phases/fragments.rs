//! Phase 1: Fragment Discovery
//!
//! Lists the manifest fragments of one scope: the files directly inside a
//! resource directory plus any remote fragments configured for the project.
//!
//! ## Process
//!
//! 1.  **Local files**: Immediate files of the directory are listed in file
//!     name order. Only `.yml`, `.yaml` and `.json` files are fragments; the
//!     profile declaration files and everything else are skipped silently.
//!     A missing directory contributes no fragments.
//!
//! 2.  **Remote fragments**: Each configured URL is fetched through a
//!     [`RemoteFetcher`] and appended after the local files. A failed fetch
//!     aborts the run.
//!
//! Discovery never writes anything.

use std::path::{Path, PathBuf};

use log::debug;
use url::Url;
use walkdir::WalkDir;

use crate::defaults::PROFILE_FILE_NAMES;
use crate::error::{Error, Result};
use crate::fetch::{remote_file_name, RemoteFetcher};

/// Extensions recognized as manifest fragments.
pub const FRAGMENT_EXTENSIONS: &[&str] = &["yml", "yaml", "json"];

/// Where a fragment's content comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum FragmentSource {
    Local(PathBuf),
    /// `index` is the position of the URL among the configured remotes.
    Remote {
        url: Url,
        index: usize,
        content: String,
    },
}

/// A manifest fragment awaiting expansion.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    /// File name used for the expanded copy and for kind/name inference.
    pub file_name: String,
    pub source: FragmentSource,
}

impl Fragment {
    pub fn local(path: PathBuf) -> Option<Self> {
        let file_name = path.file_name()?.to_str()?.to_string();
        Some(Self {
            file_name,
            source: FragmentSource::Local(path),
        })
    }

    /// Path of the expanded copy relative to the work directory.
    ///
    /// Local fragments keep their file name. Remote fragments go to
    /// `remote/<index>/<file name>` so they never replace a local fragment or
    /// another remote one with the same file name.
    pub fn work_path(&self) -> PathBuf {
        match &self.source {
            FragmentSource::Local(_) => PathBuf::from(&self.file_name),
            FragmentSource::Remote { index, .. } => PathBuf::from("remote")
                .join(index.to_string())
                .join(&self.file_name),
        }
    }

    /// Path or URL for diagnostics.
    pub fn origin(&self) -> PathBuf {
        match &self.source {
            FragmentSource::Local(path) => path.clone(),
            FragmentSource::Remote { url, .. } => PathBuf::from(url.as_str()),
        }
    }

    /// Raw, unexpanded content.
    pub fn read_content(&self) -> std::io::Result<String> {
        match &self.source {
            FragmentSource::Local(path) => std::fs::read_to_string(path),
            FragmentSource::Remote { content, .. } => Ok(content.clone()),
        }
    }
}

/// Whether `path` names a manifest fragment.
pub fn is_fragment_file(path: &Path) -> bool {
    let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    if PROFILE_FILE_NAMES.contains(&file_name) {
        return false;
    }
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| FRAGMENT_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

/// Immediate fragment files of `dir`, sorted by file name.
pub fn list_local_fragments(dir: &Path) -> Result<Vec<Fragment>> {
    if !dir.exists() {
        debug!("No fragment directory at {}", dir.display());
        return Ok(Vec::new());
    }
    if !dir.is_dir() {
        return Err(Error::configuration(format!(
            "Fragment location {} is not a directory",
            dir.display()
        )));
    }

    let mut fragments = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| Error::Io(e.into()))?;
        if !entry.file_type().is_file() || !is_fragment_file(entry.path()) {
            continue;
        }
        if let Some(fragment) = Fragment::local(entry.into_path()) {
            fragments.push(fragment);
        }
    }
    Ok(fragments)
}

/// Fetch every remote fragment, in configuration order.
pub fn fetch_remote_fragments(
    remotes: &[String],
    fetcher: &dyn RemoteFetcher,
) -> Result<Vec<Fragment>> {
    let mut fragments = Vec::with_capacity(remotes.len());
    for (index, remote) in remotes.iter().enumerate() {
        let url = Url::parse(remote).map_err(|e| Error::Fetch {
            url: remote.clone(),
            message: e.to_string(),
        })?;
        let file_name = remote_file_name(&url).ok_or_else(|| Error::Fetch {
            url: remote.clone(),
            message: "URL has no file name".to_string(),
        })?;
        let content = fetcher.fetch(&url)?;
        fragments.push(Fragment {
            file_name,
            source: FragmentSource::Remote {
                url,
                index,
                content,
            },
        });
    }
    Ok(fragments)
}

/// Executes Phase 1: local fragments of `dir` followed by the remote ones.
pub fn execute(dir: &Path, remotes: &[String], fetcher: &dyn RemoteFetcher) -> Result<Vec<Fragment>> {
    let mut fragments = list_local_fragments(dir)?;
    fragments.extend(fetch_remote_fragments(remotes, fetcher)?);
    Ok(fragments)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs;
    use tempfile::TempDir;

    /// Serves canned content keyed by URL.
    #[derive(Default)]
    pub(crate) struct MockFetcher {
        pub responses: HashMap<String, String>,
    }

    impl RemoteFetcher for MockFetcher {
        fn fetch(&self, url: &Url) -> Result<String> {
            self.responses
                .get(url.as_str())
                .cloned()
                .ok_or_else(|| Error::Fetch {
                    url: url.to_string(),
                    message: "404".to_string(),
                })
        }
    }

    #[test]
    fn test_missing_directory_yields_no_fragments() {
        let temp = TempDir::new().unwrap();
        let fragments = execute(&temp.path().join("absent"), &[], &MockFetcher::default()).unwrap();
        assert!(fragments.is_empty());
    }

    #[test]
    fn test_file_instead_of_directory_is_error() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("file.yml");
        fs::write(&file, "kind: Service").unwrap();
        assert!(list_local_fragments(&file).is_err());
    }

    #[test]
    fn test_lists_only_fragment_files_sorted() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("b-svc.yml"), "").unwrap();
        fs::write(temp.path().join("a-deployment.yaml"), "").unwrap();
        fs::write(temp.path().join("c.json"), "{}").unwrap();
        fs::write(temp.path().join("README.md"), "").unwrap();
        fs::write(temp.path().join("profiles.yml"), "").unwrap();
        fs::create_dir(temp.path().join("dev")).unwrap();
        fs::write(temp.path().join("dev/ignored.yml"), "").unwrap();

        let names: Vec<_> = list_local_fragments(temp.path())
            .unwrap()
            .into_iter()
            .map(|f| f.file_name)
            .collect();
        assert_eq!(names, vec!["a-deployment.yaml", "b-svc.yml", "c.json"]);
    }

    #[test]
    fn test_remote_fragments_follow_local_ones() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("local-cm.yml"), "kind: ConfigMap").unwrap();

        let mut fetcher = MockFetcher::default();
        fetcher.responses.insert(
            "https://example.com/shared/db-secret.yml".to_string(),
            "kind: Secret".to_string(),
        );

        let fragments = execute(
            temp.path(),
            &["https://example.com/shared/db-secret.yml".to_string()],
            &fetcher,
        )
        .unwrap();
        assert_eq!(fragments.len(), 2);
        assert_eq!(fragments[0].file_name, "local-cm.yml");
        assert_eq!(fragments[1].file_name, "db-secret.yml");
        assert_eq!(fragments[1].read_content().unwrap(), "kind: Secret");
    }

    #[test]
    fn test_work_paths_keep_same_named_fragments_apart() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("web-svc.yml"), "kind: Service").unwrap();

        let remotes = vec![
            "https://example.com/a/web-svc.yml".to_string(),
            "https://example.com/b/web-svc.yml".to_string(),
        ];
        let mut fetcher = MockFetcher::default();
        for remote in &remotes {
            fetcher
                .responses
                .insert(remote.clone(), "kind: Service".to_string());
        }

        let fragments = execute(temp.path(), &remotes, &fetcher).unwrap();
        let paths: Vec<_> = fragments.iter().map(Fragment::work_path).collect();
        assert_eq!(
            paths,
            vec![
                PathBuf::from("web-svc.yml"),
                PathBuf::from("remote/0/web-svc.yml"),
                PathBuf::from("remote/1/web-svc.yml"),
            ]
        );
    }

    #[test]
    fn test_failed_remote_fetch_is_fatal() {
        let temp = TempDir::new().unwrap();
        let err = execute(
            temp.path(),
            &["https://example.com/missing.yml".to_string()],
            &MockFetcher::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Fetch { .. }));
    }

    #[test]
    fn test_invalid_remote_url_is_fatal() {
        let err = fetch_remote_fragments(&["not a url".to_string()], &MockFetcher::default())
            .unwrap_err();
        assert!(matches!(err, Error::Fetch { .. }));
    }
}
