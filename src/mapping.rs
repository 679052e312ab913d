//! Kind to filename-type mapping.
//!
//! Fragment file names may encode the kind of the resource they declare
//! (`web-svc.yml` is a Service named `web`), and individual output files are
//! named `<name>-<suffix>.<ext>`. Both directions go through the
//! [`KindFilenameMapper`] built here once per invocation. User supplied
//! [`MappingConfig`] entries replace the built-in entry for their kind.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Built-in kind to filename types table. The last filename type of a kind
/// is the suffix used for individual output files.
const DEFAULT_MAPPINGS: &[(&str, &[&str])] = &[
    ("BuildConfig", &["bc", "buildconfig"]),
    ("ClusterRole", &["cr", "crole", "clusterrole"]),
    ("ConfigMap", &["cm", "configmap"]),
    ("ClusterRoleBinding", &["crb", "clusterrb", "clusterrolebinding"]),
    ("CronJob", &["cj", "cronjob"]),
    ("CustomResourceDefinition", &["crd", "customresourcedefinition"]),
    ("DaemonSet", &["ds", "daemonset"]),
    ("Deployment", &["deployment"]),
    ("DeploymentConfig", &["dc", "deploymentconfig"]),
    ("ImageStream", &["is", "imagestream"]),
    ("ImageStreamTag", &["istag", "imagestreamtag"]),
    ("Ingress", &["ingress"]),
    ("Job", &["job"]),
    ("LimitRange", &["lr", "limitrange"]),
    ("Namespace", &["ns", "namespace"]),
    ("OAuthClient", &["oauthclient"]),
    ("PersistentVolume", &["pv", "persistentvolume"]),
    ("PersistentVolumeClaim", &["pvc", "persistentvolumeclaim"]),
    ("Pod", &["pd", "pod"]),
    ("Project", &["project"]),
    ("ProjectRequest", &["pr", "projectrequest"]),
    ("ReplicaSet", &["rs", "replicaset"]),
    ("ReplicationController", &["rc", "replicationcontroller"]),
    ("ResourceQuota", &["rq", "resourcequota"]),
    ("Role", &["role"]),
    ("RoleBinding", &["rb", "rolebinding"]),
    ("Route", &["route"]),
    ("Secret", &["secret"]),
    ("Service", &["svc", "service"]),
    ("ServiceAccount", &["sa", "serviceaccount"]),
    ("StatefulSet", &["statefulset"]),
    ("Template", &["template"]),
];

/// A user declared mapping from a kind to its filename types.
///
/// `filename-types` is a comma separated list, e.g. `"cm, configmap"`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct MappingConfig {
    pub kind: String,
    pub filename_types: String,
}

impl MappingConfig {
    /// Filename types as a list, blanks removed.
    pub fn filenames(&self) -> Vec<String> {
        self.filename_types
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn is_valid(&self) -> bool {
        !self.kind.trim().is_empty() && !self.filenames().is_empty()
    }
}

/// Resolves kinds to filename suffixes and filename types back to kinds.
#[derive(Debug, Clone)]
pub struct KindFilenameMapper {
    kind_to_types: HashMap<String, Vec<String>>,
    type_to_kind: HashMap<String, String>,
}

impl Default for KindFilenameMapper {
    fn default() -> Self {
        let mut mapper = Self {
            kind_to_types: HashMap::new(),
            type_to_kind: HashMap::new(),
        };
        for (kind, types) in DEFAULT_MAPPINGS {
            mapper.put(kind, types.iter().map(|t| t.to_string()).collect());
        }
        mapper
    }
}

impl KindFilenameMapper {
    /// Built-in table with the given overrides applied in order.
    ///
    /// An entry with a blank kind or no filename types is rejected.
    pub fn with_mappings(mappings: &[MappingConfig]) -> Result<Self> {
        let mut mapper = Self::default();
        for mapping in mappings {
            if !mapping.is_valid() {
                return Err(Error::Configuration {
                    message: format!(
                        "Invalid mapping for Kind '{}' and Filename Types '{}'",
                        mapping.kind, mapping.filename_types
                    ),
                    hint: Some(
                        "Each mapping needs a kind and a comma separated list of filename types"
                            .to_string(),
                    ),
                });
            }
            mapper.put(mapping.kind.trim(), mapping.filenames());
        }
        Ok(mapper)
    }

    fn put(&mut self, kind: &str, types: Vec<String>) {
        self.type_to_kind.retain(|_, k| k.as_str() != kind);
        for filename_type in &types {
            self.type_to_kind
                .insert(filename_type.to_lowercase(), kind.to_string());
        }
        self.kind_to_types.insert(kind.to_string(), types);
    }

    /// Kind declared by a filename type, e.g. `svc` → `Service`.
    pub fn kind_for_filename_type(&self, filename_type: &str) -> Option<&str> {
        self.type_to_kind
            .get(&filename_type.to_lowercase())
            .map(String::as_str)
    }

    /// Suffix used in individual output file names for `kind`.
    pub fn suffix_for_kind(&self, kind: &str) -> String {
        self.kind_to_types
            .get(kind)
            .or_else(|| {
                self.kind_to_types
                    .iter()
                    .find(|(k, _)| k.eq_ignore_ascii_case(kind))
                    .map(|(_, v)| v)
            })
            .and_then(|types| types.last())
            .cloned()
            .unwrap_or_else(|| kind.to_lowercase())
    }

    /// `<name>-<suffix>` for an item.
    pub fn name_with_suffix(&self, name: &str, kind: &str) -> String {
        format!("{}-{}", name, self.suffix_for_kind(kind))
    }
}
