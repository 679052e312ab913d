//! # Resource Model
//!
//! In-memory representation of Kubernetes and OpenShift manifests.
//!
//! - **`ResourceItem`**: one manifest (Deployment, Service, Route, Template, ...).
//!   The payload is kept as an opaque YAML mapping; only `kind`, `apiVersion`
//!   and `metadata` are interpreted by the pipeline itself.
//! - **`ResourceListBuilder`**: the mutable, insertion-ordered collection the
//!   assembler and the processors work on.
//! - **`ResourceCollection`**: the finalized, immutable list handed to the
//!   writer. Order is the order items were added; nothing is deduplicated.
//! - **`PlatformMode`** and **`ResourceFileType`**: the closed sets selecting
//!   the target platform and the output serialization.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use crate::error::{Error, Result};

/// Kinds that own pods and therefore count as "controllers".
pub const CONTROLLER_KINDS: &[&str] = &[
    "Deployment",
    "DeploymentConfig",
    "StatefulSet",
    "DaemonSet",
    "ReplicaSet",
    "ReplicationController",
    "Job",
];

/// Kinds that are never namespaced.
pub const CLUSTER_SCOPED_KINDS: &[&str] = &[
    "Namespace",
    "ClusterRole",
    "ClusterRoleBinding",
    "CustomResourceDefinition",
    "PersistentVolume",
    "Project",
    "ProjectRequest",
];

/// Default `apiVersion` for a kind when a fragment does not declare one.
pub fn default_api_version(kind: &str) -> &'static str {
    match kind {
        "Deployment" | "ReplicaSet" | "StatefulSet" | "DaemonSet" => "apps/v1",
        "Job" | "CronJob" => "batch/v1",
        "Ingress" => "networking.k8s.io/v1",
        "Route" => "route.openshift.io/v1",
        "Template" => "template.openshift.io/v1",
        "DeploymentConfig" => "apps.openshift.io/v1",
        "ImageStream" | "ImageStreamTag" => "image.openshift.io/v1",
        "BuildConfig" => "build.openshift.io/v1",
        "Role" | "RoleBinding" | "ClusterRole" | "ClusterRoleBinding" => {
            "rbac.authorization.k8s.io/v1"
        }
        _ => "v1",
    }
}

/// Make sure `value` is a mapping and return it.
pub(crate) fn ensure_mapping(value: &mut Value) -> &mut Mapping {
    if !value.is_mapping() {
        *value = Value::Mapping(Mapping::new());
    }
    match value {
        Value::Mapping(map) => map,
        _ => unreachable!("value was just replaced by a mapping"),
    }
}

/// Walk `path` below `value`, creating empty mappings on the way.
pub(crate) fn path_mut<'a>(value: &'a mut Value, path: &[&str]) -> &'a mut Value {
    let mut current = value;
    for key in path {
        let map = ensure_mapping(current);
        current = map
            .entry(Value::String((*key).to_string()))
            .or_insert(Value::Null);
    }
    current
}

/// Read the value at `path` below `value`, if every segment exists.
pub(crate) fn path_get<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut current = value;
    for key in path {
        current = current.get(*key)?;
    }
    Some(current)
}

/// A single Kubernetes or OpenShift manifest.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ResourceItem {
    value: Value,
}

impl ResourceItem {
    /// Create a new item with the given kind and name and an empty body.
    pub fn new(kind: &str, name: &str) -> Self {
        let mut map = Mapping::new();
        map.insert(
            Value::String("apiVersion".to_string()),
            Value::String(default_api_version(kind).to_string()),
        );
        map.insert(
            Value::String("kind".to_string()),
            Value::String(kind.to_string()),
        );
        let mut item = Self {
            value: Value::Mapping(map),
        };
        item.set_name(name);
        item
    }

    /// Wrap a parsed YAML value. The value must be a mapping with a non-blank
    /// string `kind`.
    pub fn from_value(value: Value) -> std::result::Result<Self, String> {
        if !value.is_mapping() {
            return Err("resource must be a mapping".to_string());
        }
        let has_kind = value
            .get("kind")
            .and_then(Value::as_str)
            .is_some_and(|kind| !kind.trim().is_empty());
        if has_kind {
            Ok(Self { value })
        } else {
            Err("resource has no 'kind'".to_string())
        }
    }

    /// The resource kind, e.g. `Deployment`.
    pub fn kind(&self) -> &str {
        self.value
            .get("kind")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    /// Case-insensitive kind comparison.
    pub fn is_kind(&self, kind: &str) -> bool {
        self.kind().eq_ignore_ascii_case(kind)
    }

    /// Whether this item's kind owns pods.
    pub fn is_controller(&self) -> bool {
        CONTROLLER_KINDS.iter().any(|k| self.is_kind(k))
    }

    /// `metadata.name`, if present and a string.
    pub fn name(&self) -> Option<&str> {
        path_get(&self.value, &["metadata", "name"]).and_then(Value::as_str)
    }

    /// Set `metadata.name`.
    pub fn set_name(&mut self, name: &str) {
        *path_mut(&mut self.value, &["metadata", "name"]) = Value::String(name.to_string());
    }

    pub fn api_version(&self) -> Option<&str> {
        self.value.get("apiVersion").and_then(Value::as_str)
    }

    pub fn set_api_version(&mut self, api_version: &str) {
        ensure_mapping(&mut self.value).insert(
            Value::String("apiVersion".to_string()),
            Value::String(api_version.to_string()),
        );
    }

    pub fn namespace(&self) -> Option<&str> {
        path_get(&self.value, &["metadata", "namespace"]).and_then(Value::as_str)
    }

    pub fn set_namespace(&mut self, namespace: &str) {
        *path_mut(&mut self.value, &["metadata", "namespace"]) =
            Value::String(namespace.to_string());
    }

    /// Mutable access to `metadata.labels`, creating it if needed.
    pub fn labels_mut(&mut self) -> &mut Mapping {
        ensure_mapping(path_mut(&mut self.value, &["metadata", "labels"]))
    }

    /// Mutable access to `metadata.annotations`, creating it if needed.
    pub fn annotations_mut(&mut self) -> &mut Mapping {
        ensure_mapping(path_mut(&mut self.value, &["metadata", "annotations"]))
    }

    /// Read a nested field, e.g. `item.get(&["spec", "replicas"])`.
    pub fn get(&self, path: &[&str]) -> Option<&Value> {
        path_get(&self.value, path)
    }

    /// Mutable access to a nested field, created as `null` when missing.
    pub fn get_mut(&mut self, path: &[&str]) -> &mut Value {
        path_mut(&mut self.value, path)
    }

    /// Container list of the pod template (`spec.template.spec.containers`).
    pub fn containers_mut(&mut self) -> Option<&mut Vec<Value>> {
        self.value
            .get_mut("spec")?
            .get_mut("template")?
            .get_mut("spec")?
            .get_mut("containers")?
            .as_sequence_mut()
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn into_value(self) -> Value {
        self.value
    }
}

/// Incremental, order-preserving builder for a resource list.
#[derive(Debug, Clone, Default)]
pub struct ResourceListBuilder {
    items: Vec<ResourceItem>,
}

impl ResourceListBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one item.
    pub fn add_item(&mut self, item: ResourceItem) -> &mut Self {
        self.items.push(item);
        self
    }

    /// Append all items, keeping their order.
    pub fn add_all<I: IntoIterator<Item = ResourceItem>>(&mut self, items: I) -> &mut Self {
        self.items.extend(items);
        self
    }

    pub fn items(&self) -> &[ResourceItem] {
        &self.items
    }

    pub fn items_mut(&mut self) -> &mut [ResourceItem] {
        &mut self.items
    }

    /// Replace the whole list. Used by processors that restructure the output.
    pub fn replace_items(&mut self, items: Vec<ResourceItem>) {
        self.items = items;
    }

    pub fn has_kind(&self, kind: &str) -> bool {
        self.items.iter().any(|item| item.is_kind(kind))
    }

    pub fn has_controller(&self) -> bool {
        self.items.iter().any(ResourceItem::is_controller)
    }

    /// First item with the given kind and name.
    pub fn find(&self, kind: &str, name: &str) -> Option<&ResourceItem> {
        self.items
            .iter()
            .find(|item| item.is_kind(kind) && item.name() == Some(name))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Finalize into an immutable collection.
    pub fn build(self) -> ResourceCollection {
        ResourceCollection { items: self.items }
    }
}

/// Immutable, ordered list of resource items.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceCollection {
    items: Vec<ResourceItem>,
}

impl ResourceCollection {
    pub fn new(items: Vec<ResourceItem>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[ResourceItem] {
        &self.items
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResourceItem> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_items(self) -> Vec<ResourceItem> {
        self.items
    }

    /// Render as a `kind: List` document.
    pub fn to_list_value(&self) -> Value {
        let mut map = Mapping::new();
        map.insert(
            Value::String("apiVersion".to_string()),
            Value::String("v1".to_string()),
        );
        map.insert(
            Value::String("kind".to_string()),
            Value::String("List".to_string()),
        );
        map.insert(
            Value::String("items".to_string()),
            Value::Sequence(self.items.iter().map(|i| i.value().clone()).collect()),
        );
        Value::Mapping(map)
    }
}

/// Target platform of a generation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformMode {
    Kubernetes,
    Openshift,
}

impl PlatformMode {
    /// Classifier used for the output directory, composite file name and
    /// validation rule set.
    pub fn classifier(&self) -> &'static str {
        match self {
            PlatformMode::Kubernetes => "kubernetes",
            PlatformMode::Openshift => "openshift",
        }
    }
}

impl fmt::Display for PlatformMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.classifier())
    }
}

impl FromStr for PlatformMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "kubernetes" | "k8s" => Ok(PlatformMode::Kubernetes),
            "openshift" => Ok(PlatformMode::Openshift),
            other => Err(Error::configuration(format!(
                "Unknown platform mode '{}', expected 'kubernetes' or 'openshift'",
                other
            ))),
        }
    }
}

/// Serialization format of the written manifests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceFileType {
    #[default]
    Yaml,
    Json,
}

impl ResourceFileType {
    pub fn extension(&self) -> &'static str {
        match self {
            ResourceFileType::Yaml => "yml",
            ResourceFileType::Json => "json",
        }
    }

    /// Serialize any value in this format.
    pub fn serialize<T: Serialize>(&self, value: &T) -> Result<String> {
        match self {
            ResourceFileType::Yaml => Ok(serde_yaml::to_string(value)?),
            ResourceFileType::Json => {
                let mut json = serde_json::to_string_pretty(value)?;
                json.push('\n');
                Ok(json)
            }
        }
    }
}

impl FromStr for ResourceFileType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Ok(ResourceFileType::Yaml),
            "json" => Ok(ResourceFileType::Json),
            other => Err(Error::configuration(format!(
                "Unknown resource type '{}', expected 'yaml' or 'json'",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_item_has_defaults() {
        let item = ResourceItem::new("Deployment", "app");
        assert_eq!(item.kind(), "Deployment");
        assert_eq!(item.name(), Some("app"));
        assert_eq!(item.api_version(), Some("apps/v1"));
    }

    #[test]
    fn test_from_value_requires_kind() {
        let value: Value = serde_yaml::from_str("metadata:\n  name: x\n").unwrap();
        assert!(ResourceItem::from_value(value).is_err());

        let value: Value = serde_yaml::from_str("kind: '  '\n").unwrap();
        assert!(ResourceItem::from_value(value).is_err());

        let value: Value = serde_yaml::from_str("- kind: Service\n").unwrap();
        assert!(ResourceItem::from_value(value).is_err());
    }

    #[test]
    fn test_is_kind_ignores_case() {
        let item = ResourceItem::new("Route", "web");
        assert!(item.is_kind("route"));
        assert!(item.is_kind("ROUTE"));
        assert!(!item.is_kind("Service"));
    }

    #[test]
    fn test_labels_mut_creates_metadata() {
        let value: Value = serde_yaml::from_str("kind: Service\n").unwrap();
        let mut item = ResourceItem::from_value(value).unwrap();
        item.labels_mut().insert(
            Value::String("app".to_string()),
            Value::String("demo".to_string()),
        );
        assert_eq!(
            item.get(&["metadata", "labels", "app"]).and_then(Value::as_str),
            Some("demo")
        );
    }

    #[test]
    fn test_containers_mut() {
        let value: Value = serde_yaml::from_str(
            "kind: Deployment\nspec:\n  template:\n    spec:\n      containers:\n        - name: a\n",
        )
        .unwrap();
        let mut item = ResourceItem::from_value(value).unwrap();
        assert_eq!(item.containers_mut().map(|c| c.len()), Some(1));

        let mut service = ResourceItem::new("Service", "svc");
        assert!(service.containers_mut().is_none());
    }

    #[test]
    fn test_builder_preserves_order_and_duplicates() {
        let mut builder = ResourceListBuilder::new();
        builder
            .add_item(ResourceItem::new("Service", "a"))
            .add_item(ResourceItem::new("Deployment", "b"))
            .add_item(ResourceItem::new("Service", "a"));
        assert!(builder.has_controller());
        assert!(builder.find("service", "a").is_some());

        let collection = builder.build();
        let names: Vec<_> = collection.iter().map(|i| i.name().unwrap()).collect();
        assert_eq!(names, vec!["a", "b", "a"]);
    }

    #[test]
    fn test_to_list_value() {
        let collection = ResourceCollection::new(vec![ResourceItem::new("Service", "a")]);
        let list = collection.to_list_value();
        assert_eq!(list.get("kind").and_then(Value::as_str), Some("List"));
        assert_eq!(
            list.get("items").and_then(Value::as_sequence).map(|s| s.len()),
            Some(1)
        );
    }

    #[test]
    fn test_platform_mode_parse() {
        assert_eq!(
            "OpenShift".parse::<PlatformMode>().unwrap(),
            PlatformMode::Openshift
        );
        assert_eq!(
            "kubernetes".parse::<PlatformMode>().unwrap(),
            PlatformMode::Kubernetes
        );
        assert!("mesos".parse::<PlatformMode>().is_err());
        assert_eq!(PlatformMode::Openshift.to_string(), "openshift");
    }

    #[test]
    fn test_resource_file_type_serialize() {
        let item = ResourceItem::new("Service", "a");
        let yaml = ResourceFileType::Yaml.serialize(&item).unwrap();
        assert!(yaml.contains("kind: Service"));
        let json = ResourceFileType::Json.serialize(&item).unwrap();
        assert!(json.contains("\"kind\": \"Service\""));
        assert_eq!(ResourceFileType::Json.extension(), "json");
        assert_eq!("yml".parse::<ResourceFileType>().unwrap(), ResourceFileType::Yaml);
    }
}
