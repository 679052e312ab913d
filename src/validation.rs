//! # Resource Validation
//!
//! Shape checks for written manifests. Each platform has a fixed [`RuleSet`]:
//!
//! - every resource needs an `apiVersion` and a `kind`;
//! - `metadata.name` must be a DNS-1123 subdomain, label values must be valid
//!   label values;
//! - containers need a DNS-1123 label as name and a non-empty image;
//! - service ports must lie in `1..=65535`;
//! - Routes must point somewhere (`spec.to.name`);
//! - Templates must carry a list of `objects`, which are checked in turn, and
//!   named parameters;
//! - the kubernetes rule set rejects OpenShift-only kinds.
//!
//! `List` documents are checked item by item. A file that cannot be read or
//! parsed is an error of its own, distinct from a list of violations.

use std::fmt;
use std::fs;
use std::path::Path;

use log::debug;
use regex::Regex;
use serde::Deserialize;
use serde_yaml::Value;
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::phases::fragments::FRAGMENT_EXTENSIONS;
use crate::resource::{path_get, PlatformMode};

/// Kinds that only exist on OpenShift.
pub const OPENSHIFT_ONLY_KINDS: &[&str] = &[
    "Route",
    "Template",
    "DeploymentConfig",
    "ImageStream",
    "ImageStreamTag",
    "BuildConfig",
];

const DNS_1123_SUBDOMAIN: &str =
    r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?(\.[a-z0-9]([-a-z0-9]*[a-z0-9])?)*$";
const DNS_1123_LABEL: &str = r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?$";
const LABEL_VALUE: &str = r"^(([A-Za-z0-9][-A-Za-z0-9_.]*)?[A-Za-z0-9])?$";
/// `[registry[:port]/]path[:tag][@digest]`, path components lowercase.
const IMAGE_REFERENCE: &str = concat!(
    r"^([a-zA-Z0-9]([a-zA-Z0-9-]*[a-zA-Z0-9])?(\.[a-zA-Z0-9]([a-zA-Z0-9-]*[a-zA-Z0-9])?)*(:[0-9]+)?/)?",
    r"[a-z0-9]+((\.|_|__|-+)[a-z0-9]+)*(/[a-z0-9]+((\.|_|__|-+)[a-z0-9]+)*)*",
    r"(:[A-Za-z0-9_][A-Za-z0-9_.-]{0,127})?",
    r"(@[A-Za-z][A-Za-z0-9]*([-_+.][A-Za-z][A-Za-z0-9]*)*:[0-9a-fA-F]{32,})?$",
);

/// One failed check.
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    /// Where the check failed, e.g. `openshift.yml#items[1] (Service/web)`.
    pub location: String,
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.location, self.message)
    }
}

/// The checks applied to the output of one platform.
pub struct RuleSet {
    platform: PlatformMode,
    subdomain: Regex,
    label: Regex,
    label_value: Regex,
    image: Regex,
}

impl RuleSet {
    pub fn new(platform: PlatformMode) -> Result<Self> {
        Ok(Self {
            platform,
            subdomain: Regex::new(DNS_1123_SUBDOMAIN)?,
            label: Regex::new(DNS_1123_LABEL)?,
            label_value: Regex::new(LABEL_VALUE)?,
            image: Regex::new(IMAGE_REFERENCE)?,
        })
    }

    pub fn platform(&self) -> PlatformMode {
        self.platform
    }

    /// Check one document: a resource or a `List` of resources.
    pub fn check_document(&self, document: &Value, location: &str) -> Vec<Violation> {
        let mut violations = Vec::new();
        if document.get("kind").and_then(Value::as_str) == Some("List") {
            match document.get("items") {
                Some(Value::Sequence(items)) => {
                    for (i, item) in items.iter().enumerate() {
                        let at = format!("{}#items[{}]", location, i);
                        self.check_resource(item, &at, &mut violations);
                    }
                }
                Some(Value::Null) | None => {}
                Some(_) => violations.push(Violation {
                    location: location.to_string(),
                    message: "items must be a list".to_string(),
                }),
            }
        } else {
            self.check_resource(document, location, &mut violations);
        }
        violations
    }

    fn check_resource(&self, resource: &Value, location: &str, out: &mut Vec<Violation>) {
        let kind = resource.get("kind").and_then(Value::as_str).unwrap_or("");
        let name = path_get(resource, &["metadata", "name"]).and_then(Value::as_str);
        let at = match name {
            Some(name) if !kind.is_empty() => format!("{} ({}/{})", location, kind, name),
            _ => location.to_string(),
        };
        let mut fail = |message: String| {
            out.push(Violation {
                location: at.clone(),
                message,
            })
        };

        if !resource.is_mapping() {
            fail("resource must be a mapping".to_string());
            return;
        }
        if kind.is_empty() {
            fail("kind is required".to_string());
        }
        if resource
            .get("apiVersion")
            .and_then(Value::as_str)
            .map_or(true, |v| v.trim().is_empty())
        {
            fail("apiVersion is required".to_string());
        }
        if self.platform == PlatformMode::Kubernetes && OPENSHIFT_ONLY_KINDS.contains(&kind) {
            fail(format!("kind {} is not available on kubernetes", kind));
        }

        match name {
            None => fail("metadata.name is required".to_string()),
            Some(name) if name.len() > 253 || !self.subdomain.is_match(name) => fail(format!(
                "metadata.name '{}' must be a lowercase RFC 1123 subdomain",
                name
            )),
            Some(_) => {}
        }

        for message in self.label_messages(resource) {
            fail(message);
        }
        for message in self.container_messages(resource, kind) {
            fail(message);
        }
        match kind {
            "Service" => {
                for message in service_port_messages(resource) {
                    fail(message);
                }
            }
            "Route" => {
                if path_get(resource, &["spec", "to", "name"])
                    .and_then(Value::as_str)
                    .map_or(true, |n| n.trim().is_empty())
                {
                    fail("spec.to.name is required".to_string());
                }
            }
            _ => {}
        }

        if kind == "Template" {
            self.check_template(resource, location, &at, out);
        }
    }

    fn label_messages(&self, resource: &Value) -> Vec<String> {
        let Some(Value::Mapping(labels)) = path_get(resource, &["metadata", "labels"]) else {
            return Vec::new();
        };
        let mut messages = Vec::new();
        for (key, value) in labels {
            let key = key.as_str().unwrap_or("?");
            match value.as_str() {
                Some(v) if v.len() <= 63 && self.label_value.is_match(v) => {}
                Some(v) => messages.push(format!("label {} has invalid value '{}'", key, v)),
                None => messages.push(format!("label {} must be a string", key)),
            }
        }
        messages
    }

    fn container_messages(&self, resource: &Value, kind: &str) -> Vec<String> {
        let path: &[&str] = match kind {
            "Pod" => &["spec", "containers"],
            "CronJob" => &[
                "spec",
                "jobTemplate",
                "spec",
                "template",
                "spec",
                "containers",
            ],
            _ => &["spec", "template", "spec", "containers"],
        };
        let Some(Value::Sequence(containers)) = path_get(resource, path) else {
            return Vec::new();
        };
        let mut messages = Vec::new();
        for (i, container) in containers.iter().enumerate() {
            match container.get("name").and_then(Value::as_str) {
                Some(name) if name.len() <= 63 && self.label.is_match(name) => {}
                Some(name) => messages.push(format!(
                    "container[{}] name '{}' must be a lowercase RFC 1123 label",
                    i, name
                )),
                None => messages.push(format!("container[{}] name is required", i)),
            }
            match container.get("image").and_then(Value::as_str) {
                None => messages.push(format!("container[{}] image is required", i)),
                Some(image) if image.trim().is_empty() => {
                    messages.push(format!("container[{}] image is required", i))
                }
                // template parameters are resolved when the template is processed
                Some(image) if image.contains("${") => {}
                Some(image) if !self.image.is_match(image) => messages.push(format!(
                    "container[{}] image '{}' is not a valid image reference",
                    i, image
                )),
                Some(_) => {}
            }
        }
        messages
    }

    /// Objects are located relative to `location`, template level findings at `at`.
    fn check_template(&self, template: &Value, location: &str, at: &str, out: &mut Vec<Violation>) {
        match template.get("objects") {
            Some(Value::Sequence(objects)) => {
                for (i, object) in objects.iter().enumerate() {
                    let object_at = format!("{}#objects[{}]", location, i);
                    self.check_resource(object, &object_at, out);
                }
            }
            _ => out.push(Violation {
                location: at.to_string(),
                message: "objects must be a list".to_string(),
            }),
        }
        if let Some(Value::Sequence(parameters)) = template.get("parameters") {
            for (i, parameter) in parameters.iter().enumerate() {
                if parameter
                    .get("name")
                    .and_then(Value::as_str)
                    .map_or(true, |n| n.trim().is_empty())
                {
                    out.push(Violation {
                        location: at.to_string(),
                        message: format!("parameters[{}] name is required", i),
                    });
                }
            }
        }
    }
}

fn port_in_range(value: &Value) -> bool {
    value.as_u64().is_some_and(|port| (1..=65535).contains(&port))
}

fn service_port_messages(resource: &Value) -> Vec<String> {
    let Some(Value::Sequence(ports)) = path_get(resource, &["spec", "ports"]) else {
        return Vec::new();
    };
    let mut messages = Vec::new();
    for (i, port) in ports.iter().enumerate() {
        if !port.get("port").is_some_and(port_in_range) {
            messages.push(format!("ports[{}].port must be between 1 and 65535", i));
        }
        // named target ports are allowed
        if let Some(target) = port.get("targetPort") {
            if !target.is_string() && !port_in_range(target) {
                messages.push(format!(
                    "ports[{}].targetPort must be between 1 and 65535",
                    i
                ));
            }
        }
    }
    messages
}

fn read_documents(path: &Path) -> Result<Vec<Value>> {
    let content = fs::read_to_string(path)?;
    let parse_error = |message: String| Error::Parse {
        file: path.to_path_buf(),
        message,
    };
    if path.extension().and_then(|e| e.to_str()) == Some("json") {
        let document: Value =
            serde_json::from_str(&content).map_err(|e| parse_error(e.to_string()))?;
        return Ok(vec![document]);
    }
    let mut documents = Vec::new();
    for document in serde_yaml::Deserializer::from_str(&content) {
        let value = Value::deserialize(document).map_err(|e| parse_error(e.to_string()))?;
        if !matches!(value, Value::Null) {
            documents.push(value);
        }
    }
    Ok(documents)
}

/// Check every manifest file directly inside `dir`.
///
/// Returns the violations found; an unreadable or unparsable file is an error.
pub fn check_dir(dir: &Path, rules: &RuleSet) -> Result<Vec<Violation>> {
    let mut violations = Vec::new();
    let walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name();
    for entry in walker {
        let entry = entry.map_err(|e| Error::Io(e.into()))?;
        let path = entry.path();
        let is_manifest = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| FRAGMENT_EXTENSIONS.contains(&e));
        if !entry.file_type().is_file() || !is_manifest {
            continue;
        }
        let file_name = entry.file_name().to_string_lossy().to_string();
        debug!("Validating {}", path.display());
        for document in read_documents(path)? {
            violations.extend(rules.check_document(&document, &file_name));
        }
    }
    Ok(violations)
}

/// Validate the output written for `platform` in `dir`.
///
/// Fails with [`Error::Validation`] listing every violation.
pub fn validate_dir(dir: &Path, platform: PlatformMode) -> Result<()> {
    if !dir.is_dir() {
        return Err(Error::configuration(format!(
            "Validation directory {} does not exist",
            dir.display()
        )));
    }
    let rules = RuleSet::new(platform)?;
    let violations = check_dir(dir, &rules)?;
    if violations.is_empty() {
        return Ok(());
    }
    Err(Error::Validation {
        classifier: platform.classifier().to_string(),
        violations: violations.iter().map(ToString::to_string).collect(),
    })
}
