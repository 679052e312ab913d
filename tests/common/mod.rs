//! Shared test utilities for integration and E2E tests.
//!
//! ## Usage
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! let fixture = TestFixture::new()
//!     .with_config(configs::MINIMAL)
//!     .with_fragment("app-deployment.yml", fragments::DEPLOYMENT);
//! ```

use assert_fs::prelude::*;
use std::path::{Path, PathBuf};

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    #[allow(unused_imports)]
    pub use assert_cmd::cargo::cargo_bin_cmd;
    #[allow(unused_imports)]
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::configs;
    #[allow(unused_imports)]
    pub use super::fragments;
    pub use super::TestFixture;
}

/// Configuration files used across tests.
#[allow(dead_code)]
pub mod configs {
    /// Only the project identity.
    pub const MINIMAL: &str = r#"
project:
  artifact-id: shop
"#;

    /// OpenShift only, with one image exposing a port.
    pub const OPENSHIFT_WITH_IMAGE: &str = r#"
project:
  group-id: io.example
  artifact-id: shop
  version: 1.0.0
images:
  - name: example/shop:1.0.0
    build:
      from: eclipse-temurin:21
      ports: ["8080"]
platforms: [openshift]
"#;

    /// Kubernetes only, failing on validation errors.
    pub const STRICT_KUBERNETES: &str = r#"
project:
  artifact-id: shop
platforms: [kubernetes]
fail-on-validation-error: true
"#;

    /// Invalid YAML for error testing.
    pub const INVALID_YAML: &str = "project: [unclosed";
}

/// Fragment files used across tests.
#[allow(dead_code)]
pub mod fragments {
    pub const DEPLOYMENT: &str = r#"
metadata:
  name: app
spec:
  template:
    spec:
      containers:
        - name: app
          image: example/app:1.0
"#;

    pub const CONFIG_MAP: &str = "data:\n  mode: ${project.version}\n";

    pub const SERVICE_BAD_PORT: &str = r#"
metadata:
  name: web
spec:
  ports:
    - port: 0
"#;

    pub const PROFILES: &str = r#"
- name: dev
  enricher:
    includes: [project-label]
- name: qa
  enricher:
    includes: [namespace]
"#;
}

/// A temporary project directory.
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

#[allow(dead_code)]
impl TestFixture {
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Add a `.resource-forge.yaml` with the given content.
    pub fn with_config(self, content: &str) -> Self {
        self.with_file(".resource-forge.yaml", content)
    }

    /// Add a fragment below the default resource directory.
    pub fn with_fragment(self, path: &str, content: &str) -> Self {
        let path = format!("src/main/forge/{}", path);
        self.with_file(&path, content)
    }

    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn config_path(&self) -> PathBuf {
        self.temp_dir.path().join(".resource-forge.yaml")
    }

    /// Path below the default target directory.
    pub fn output(&self, path: &str) -> PathBuf {
        self.temp_dir.path().join("target/forge").join(path)
    }

    pub fn child(&self, path: &str) -> assert_fs::fixture::ChildPath {
        self.temp_dir.child(path)
    }

    /// A command running in this fixture's directory.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("resource-forge");
        cmd.current_dir(self.path()).env_remove("RESOURCE_FORGE_CONFIG");
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}
