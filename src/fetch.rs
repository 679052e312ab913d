//! # Remote Fragment Fetching
//!
//! Fragments listed under `resources.remotes` are retrieved through the
//! [`RemoteFetcher`] trait so the fragment store can be exercised in tests
//! without touching the network.
//!
//! - `file://` URLs are read from the local filesystem.
//! - `http://` and `https://` URLs are fetched with a blocking HTTP client.
//!
//! Every failure is reported as [`Error::Fetch`] and is fatal for the run.

use std::time::Duration;

use log::debug;
use url::Url;

use crate::error::{Error, Result};

/// Trait for remote fragment retrieval - allows mocking in tests
pub trait RemoteFetcher {
    /// Fetch the content behind `url`.
    fn fetch(&self, url: &Url) -> Result<String>;
}

/// The default implementation of `RemoteFetcher`.
pub struct DefaultRemoteFetcher {
    timeout: Duration,
}

impl Default for DefaultRemoteFetcher {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
        }
    }
}

impl DefaultRemoteFetcher {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }

    fn fetch_http(&self, url: &Url) -> Result<String> {
        let fetch_error = |message: String| Error::Fetch {
            url: url.to_string(),
            message,
        };
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| fetch_error(e.to_string()))?;
        let response = client
            .get(url.as_str())
            .send()
            .map_err(|e| fetch_error(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(fetch_error(format!("HTTP status {}", status)));
        }
        response.text().map_err(|e| fetch_error(e.to_string()))
    }
}

impl RemoteFetcher for DefaultRemoteFetcher {
    fn fetch(&self, url: &Url) -> Result<String> {
        debug!("Fetching remote fragment {}", url);
        match url.scheme() {
            "file" => {
                let path = url.to_file_path().map_err(|_| Error::Fetch {
                    url: url.to_string(),
                    message: "not a valid file path".to_string(),
                })?;
                std::fs::read_to_string(&path).map_err(|e| Error::Fetch {
                    url: url.to_string(),
                    message: e.to_string(),
                })
            }
            "http" | "https" => self.fetch_http(url),
            other => Err(Error::Fetch {
                url: url.to_string(),
                message: format!("unsupported scheme '{}'", other),
            }),
        }
    }
}

/// File name a remote fragment is stored under: the last path segment.
pub fn remote_file_name(url: &Url) -> Option<String> {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_fetch_file_url() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("extra-cm.yml");
        std::fs::write(&path, "kind: ConfigMap\n").unwrap();
        let url = Url::from_file_path(&path).unwrap();

        let content = DefaultRemoteFetcher::default().fetch(&url).unwrap();
        assert_eq!(content, "kind: ConfigMap\n");
    }

    #[test]
    fn test_fetch_missing_file_is_fetch_error() {
        let url = Url::parse("file:///definitely/not/here.yml").unwrap();
        let err = DefaultRemoteFetcher::default().fetch(&url).unwrap_err();
        assert!(matches!(err, Error::Fetch { .. }));
    }

    #[test]
    fn test_fetch_unsupported_scheme() {
        let url = Url::parse("ftp://example.com/a.yml").unwrap();
        let err = DefaultRemoteFetcher::default().fetch(&url).unwrap_err();
        assert!(err.to_string().contains("unsupported scheme 'ftp'"));
    }

    #[test]
    #[cfg_attr(not(feature = "integration-tests"), ignore)]
    fn test_fetch_https_url() {
        let url = Url::parse("https://example.com/").unwrap();
        let content = DefaultRemoteFetcher::with_timeout(Duration::from_secs(10))
            .fetch(&url)
            .unwrap();
        assert!(content.contains("Example Domain"));
    }

    #[test]
    fn test_remote_file_name() {
        let url = Url::parse("https://example.com/manifests/web-svc.yml?raw=1").unwrap();
        assert_eq!(remote_file_name(&url).as_deref(), Some("web-svc.yml"));

        let url = Url::parse("https://example.com/").unwrap();
        assert_eq!(remote_file_name(&url), None);
    }
}
