//! Built-in enrichers, in default registry order.
//!
//! | Name | Stage | Platforms |
//! | --- | --- | --- |
//! | `namespace` | enrich | all |
//! | `default-controller` | create, enrich | all |
//! | `default-service` | create | all |
//! | `project-label` | enrich | all |
//! | `healthcheck` | enrich | all |
//! | `openshift-route` | create | openshift |
//! | `openshift-imageChangeTrigger` | enrich | openshift |
//! | `openshift-template` | enrich | openshift |

use serde_json::json;
use serde_yaml::{Mapping, Value};

use super::{constraint_violation, Enricher, EnricherContext, Processor};
use crate::config::ProcessorConfig;
use crate::error::Result;
use crate::image::ImageConfiguration;
use crate::resource::{PlatformMode, ResourceItem, ResourceListBuilder, CLUSTER_SCOPED_KINDS};

/// Every built-in enricher in default order.
pub fn builtin() -> Vec<Box<dyn Enricher>> {
    vec![
        Box::new(NamespaceEnricher),
        Box::new(DefaultControllerEnricher),
        Box::new(DefaultServiceEnricher),
        Box::new(ProjectLabelEnricher),
        Box::new(HealthCheckEnricher),
        Box::new(RouteEnricher),
        Box::new(ImageChangeTriggerEnricher),
        Box::new(TemplateEnricher),
    ]
}

fn key(name: &str) -> Value {
    Value::String(name.to_string())
}

/// Parse a numeric setting, reporting a constraint violation when it is not a number.
fn numeric_setting<T: std::str::FromStr>(
    processor: &str,
    config: &ProcessorConfig,
    setting: &str,
    default: T,
) -> Result<T> {
    match config.get(processor, setting) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| {
            constraint_violation(
                processor,
                format!("{}.{} must be a number, got '{}'", processor, setting, raw),
            )
        }),
    }
}

/// Images that are built by the project.
fn build_images<'a>(ctx: &EnricherContext<'a>) -> impl Iterator<Item = &'a ImageConfiguration> {
    ctx.images.iter().filter(|image| image.build.is_some())
}

/// Sets `metadata.namespace` on namespaced items that have none.
pub struct NamespaceEnricher;

impl Processor for NamespaceEnricher {
    fn name(&self) -> &'static str {
        "namespace"
    }
}

impl Enricher for NamespaceEnricher {
    fn enrich(
        &self,
        _platform: PlatformMode,
        ctx: &EnricherContext<'_>,
        config: &ProcessorConfig,
        builder: &mut ResourceListBuilder,
    ) -> Result<()> {
        let namespace = config
            .get(self.name(), "namespace")
            .or_else(|| ctx.resources.namespace.clone())
            .filter(|ns| !ns.trim().is_empty());
        let Some(namespace) = namespace else {
            return Ok(());
        };

        for item in builder.items_mut() {
            let cluster_scoped = CLUSTER_SCOPED_KINDS.iter().any(|k| item.is_kind(k));
            if !cluster_scoped && item.namespace().is_none() {
                item.set_namespace(&namespace);
            }
        }
        Ok(())
    }
}

/// Synthesizes a Deployment for the project's images when no controller exists.
pub struct DefaultControllerEnricher;

impl DefaultControllerEnricher {
    fn container(image: &ImageConfiguration) -> Result<Value> {
        let mut container = json!({
            "name": image.container_name(),
            "image": image.name,
            "imagePullPolicy": "IfNotPresent",
        });
        if let Some(build) = &image.build {
            let ports: Vec<_> = build
                .port_numbers()
                .into_iter()
                .map(|port| json!({ "containerPort": port, "protocol": "TCP" }))
                .collect();
            if !ports.is_empty() {
                container["ports"] = json!(ports);
            }
            let env: Vec<_> = build
                .env
                .iter()
                .map(|(name, value)| json!({ "name": name, "value": value }))
                .collect();
            if !env.is_empty() {
                container["env"] = json!(env);
            }
        }
        Ok(serde_yaml::to_value(container)?)
    }
}

impl Processor for DefaultControllerEnricher {
    fn name(&self) -> &'static str {
        "default-controller"
    }
}

impl Enricher for DefaultControllerEnricher {
    fn create_defaults(
        &self,
        _platform: PlatformMode,
        ctx: &EnricherContext<'_>,
        config: &ProcessorConfig,
        builder: &mut ResourceListBuilder,
    ) -> Result<()> {
        let images: Vec<_> = build_images(ctx).collect();
        if images.is_empty() || builder.has_controller() {
            return Ok(());
        }

        let name = config.get_or(self.name(), "name", ctx.default_name);
        let replicas: u32 = numeric_setting(self.name(), config, "replicaCount", 1)?;
        let containers = images
            .into_iter()
            .map(Self::container)
            .collect::<Result<Vec<_>>>()?;

        let mut deployment = ResourceItem::new("Deployment", &name);
        *deployment.get_mut(&["spec", "replicas"]) = serde_yaml::to_value(replicas)?;
        *deployment.get_mut(&["spec", "template", "spec", "containers"]) =
            Value::Sequence(containers);
        builder.add_item(deployment);
        Ok(())
    }

    fn enrich(
        &self,
        _platform: PlatformMode,
        ctx: &EnricherContext<'_>,
        _config: &ProcessorConfig,
        builder: &mut ResourceListBuilder,
    ) -> Result<()> {
        let Some(image) = ctx.images.first() else {
            return Ok(());
        };
        for item in builder.items_mut() {
            if !item.is_controller() {
                continue;
            }
            let Some(containers) = item.containers_mut() else {
                continue;
            };
            for container in containers.iter_mut() {
                let missing = container
                    .get("image")
                    .and_then(Value::as_str)
                    .map_or(true, |i| i.trim().is_empty());
                if missing {
                    if let Value::Mapping(map) = container {
                        map.insert(key("image"), Value::String(image.name.clone()));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Synthesizes a Service for the ports of the first build image.
pub struct DefaultServiceEnricher;

impl DefaultServiceEnricher {
    fn port_name(port: u16) -> String {
        match port {
            80 | 8080 => "http".to_string(),
            443 | 8443 => "https".to_string(),
            _ => format!("port-{}", port),
        }
    }
}

impl Processor for DefaultServiceEnricher {
    fn name(&self) -> &'static str {
        "default-service"
    }
}

impl Enricher for DefaultServiceEnricher {
    fn create_defaults(
        &self,
        _platform: PlatformMode,
        ctx: &EnricherContext<'_>,
        config: &ProcessorConfig,
        builder: &mut ResourceListBuilder,
    ) -> Result<()> {
        if builder.has_kind("Service") {
            return Ok(());
        }
        let ports = build_images(ctx)
            .next()
            .and_then(|image| image.build.as_ref())
            .map(|build| build.port_numbers())
            .unwrap_or_default();
        if ports.is_empty() {
            return Ok(());
        }

        let name = config.get_or(self.name(), "name", ctx.default_name);
        let service_type = config.get_or(self.name(), "type", "ClusterIP");
        let ports: Vec<_> = ports
            .into_iter()
            .map(|port| {
                json!({
                    "name": Self::port_name(port),
                    "port": port,
                    "targetPort": port,
                    "protocol": "TCP",
                })
            })
            .collect();

        let mut service = ResourceItem::new("Service", &name);
        *service.get_mut(&["spec", "type"]) = Value::String(service_type);
        *service.get_mut(&["spec", "ports"]) = serde_yaml::to_value(ports)?;
        builder.add_item(service);
        Ok(())
    }
}

/// Adds project identity labels and fills empty selectors.
pub struct ProjectLabelEnricher;

impl ProjectLabelEnricher {
    /// Labels used in selectors. The version is left out so that selectors
    /// survive upgrades.
    fn selector_labels(ctx: &EnricherContext<'_>, config: &ProcessorConfig) -> Mapping {
        let mut labels = Mapping::new();
        let app = config.get_or("project-label", "app", ctx.default_name);
        labels.insert(key("app"), Value::String(app));
        let provider = config.get_or("project-label", "provider", "resource-forge");
        labels.insert(key("provider"), Value::String(provider));
        if !ctx.project.group_id.is_empty() {
            labels.insert(key("group"), Value::String(ctx.project.group_id.clone()));
        }
        labels
    }

    fn merge_missing(target: &mut Mapping, labels: &Mapping) {
        for (k, v) in labels {
            if !target.contains_key(k) {
                target.insert(k.clone(), v.clone());
            }
        }
    }

    fn is_empty_selector(value: Option<&Value>) -> bool {
        match value {
            None | Some(Value::Null) => true,
            Some(Value::Mapping(map)) => map.is_empty(),
            Some(_) => false,
        }
    }

    fn fill_selectors(item: &mut ResourceItem, selector: &Mapping) {
        let kind = item.kind().to_string();
        match kind.as_str() {
            "Deployment" | "StatefulSet" | "DaemonSet" | "ReplicaSet" => {
                if Self::is_empty_selector(item.get(&["spec", "selector", "matchLabels"])) {
                    *item.get_mut(&["spec", "selector", "matchLabels"]) =
                        Value::Mapping(selector.clone());
                }
                Self::fill_pod_labels(item, selector);
            }
            "DeploymentConfig" | "ReplicationController" => {
                if Self::is_empty_selector(item.get(&["spec", "selector"])) {
                    *item.get_mut(&["spec", "selector"]) = Value::Mapping(selector.clone());
                }
                Self::fill_pod_labels(item, selector);
            }
            "Service" => {
                if Self::is_empty_selector(item.get(&["spec", "selector"])) {
                    *item.get_mut(&["spec", "selector"]) = Value::Mapping(selector.clone());
                }
            }
            _ => {}
        }
    }

    fn fill_pod_labels(item: &mut ResourceItem, selector: &Mapping) {
        if item.get(&["spec", "template"]).is_none() {
            return;
        }
        let labels = item.get_mut(&["spec", "template", "metadata", "labels"]);
        if !labels.is_mapping() {
            *labels = Value::Mapping(Mapping::new());
        }
        if let Value::Mapping(map) = labels {
            Self::merge_missing(map, selector);
        }
    }
}

impl Processor for ProjectLabelEnricher {
    fn name(&self) -> &'static str {
        "project-label"
    }
}

impl Enricher for ProjectLabelEnricher {
    fn enrich(
        &self,
        _platform: PlatformMode,
        ctx: &EnricherContext<'_>,
        config: &ProcessorConfig,
        builder: &mut ResourceListBuilder,
    ) -> Result<()> {
        let selector = Self::selector_labels(ctx, config);
        let mut labels = selector.clone();
        if !ctx.project.version.is_empty() {
            labels.insert(key("version"), Value::String(ctx.project.version.clone()));
        }

        for item in builder.items_mut() {
            Self::merge_missing(item.labels_mut(), &labels);
            Self::fill_selectors(item, &selector);
        }
        Ok(())
    }
}

/// Adds HTTP readiness and liveness checks to containers that have none.
pub struct HealthCheckEnricher;

impl HealthCheckEnricher {
    fn http_check(path: &str, port: u16, initial_delay: u32) -> Result<Value> {
        Ok(serde_yaml::to_value(json!({
            "httpGet": { "path": path, "port": port, "scheme": "HTTP" },
            "initialDelaySeconds": initial_delay,
        }))?)
    }
}

impl Processor for HealthCheckEnricher {
    fn name(&self) -> &'static str {
        "healthcheck"
    }
}

impl Enricher for HealthCheckEnricher {
    fn enrich(
        &self,
        _platform: PlatformMode,
        _ctx: &EnricherContext<'_>,
        config: &ProcessorConfig,
        builder: &mut ResourceListBuilder,
    ) -> Result<()> {
        let Some(raw_port) = config.get(self.name(), "port") else {
            return Ok(());
        };
        let port: u16 = raw_port.trim().parse().map_err(|_| {
            constraint_violation(
                self.name(),
                format!("healthcheck.port must be a port number, got '{}'", raw_port),
            )
        })?;
        let path = config.get_or(self.name(), "path", "/");
        let readiness_delay: u32 =
            numeric_setting(self.name(), config, "readinessInitialDelay", 10)?;
        let liveness_delay: u32 =
            numeric_setting(self.name(), config, "livenessInitialDelay", 180)?;

        let readiness = Self::http_check(&path, port, readiness_delay)?;
        let liveness = Self::http_check(&path, port, liveness_delay)?;

        for item in builder.items_mut() {
            if !item.is_controller() {
                continue;
            }
            let Some(containers) = item.containers_mut() else {
                continue;
            };
            for container in containers.iter_mut() {
                let Value::Mapping(map) = container else {
                    continue;
                };
                if !map.contains_key("readinessProbe") {
                    map.insert(key("readinessProbe"), readiness.clone());
                }
                if !map.contains_key("livenessProbe") {
                    map.insert(key("livenessProbe"), liveness.clone());
                }
            }
        }
        Ok(())
    }
}

/// Creates a Route for each Service with ports.
pub struct RouteEnricher;

impl Processor for RouteEnricher {
    fn name(&self) -> &'static str {
        "openshift-route"
    }
}

impl Enricher for RouteEnricher {
    fn supports(&self, platform: PlatformMode) -> bool {
        platform == PlatformMode::Openshift
    }

    fn create_defaults(
        &self,
        _platform: PlatformMode,
        _ctx: &EnricherContext<'_>,
        _config: &ProcessorConfig,
        builder: &mut ResourceListBuilder,
    ) -> Result<()> {
        let mut routes = Vec::new();
        for service in builder.items().iter().filter(|i| i.is_kind("Service")) {
            let Some(name) = service.name() else {
                continue;
            };
            let target_port = service
                .get(&["spec", "ports"])
                .and_then(Value::as_sequence)
                .and_then(|ports| ports.first())
                .and_then(|port| port.get("port"))
                .cloned();
            let Some(target_port) = target_port else {
                continue;
            };
            if builder.find("Route", name).is_some() {
                continue;
            }

            let mut route = ResourceItem::new("Route", name);
            *route.get_mut(&["spec", "to"]) = serde_yaml::to_value(json!({
                "kind": "Service",
                "name": name,
            }))?;
            *route.get_mut(&["spec", "port", "targetPort"]) = target_port;
            routes.push(route);
        }
        builder.add_all(routes);
        Ok(())
    }
}

/// Annotates Deployments with OpenShift image change triggers.
pub struct ImageChangeTriggerEnricher;

impl ImageChangeTriggerEnricher {
    const ANNOTATION: &'static str = "image.openshift.io/triggers";

    /// `registry/team/app:1.0` → `app:1.0`, `app` → `app:latest`.
    fn image_stream_tag(image: &str) -> String {
        let last = image.rsplit('/').next().unwrap_or(image);
        if last.contains(':') {
            last.to_string()
        } else {
            format!("{}:latest", last)
        }
    }

    fn triggers(item: &ResourceItem, paused: bool) -> Vec<serde_json::Value> {
        item.get(&["spec", "template", "spec", "containers"])
            .and_then(Value::as_sequence)
            .map(|containers| {
                containers
                    .iter()
                    .filter_map(|container| {
                        let name = container.get("name")?.as_str()?;
                        let image = container.get("image")?.as_str()?;
                        Some(json!({
                            "from": {
                                "kind": "ImageStreamTag",
                                "name": Self::image_stream_tag(image),
                            },
                            "fieldPath": format!(
                                "spec.template.spec.containers[?(@.name==\"{}\")].image",
                                name
                            ),
                            "paused": paused.to_string(),
                        }))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl Processor for ImageChangeTriggerEnricher {
    fn name(&self) -> &'static str {
        "openshift-imageChangeTrigger"
    }
}

impl Enricher for ImageChangeTriggerEnricher {
    fn supports(&self, platform: PlatformMode) -> bool {
        platform == PlatformMode::Openshift
    }

    fn enrich(
        &self,
        _platform: PlatformMode,
        _ctx: &EnricherContext<'_>,
        config: &ProcessorConfig,
        builder: &mut ResourceListBuilder,
    ) -> Result<()> {
        if !config.get_bool(self.name(), "enableImageChangeTrigger", true) {
            return Ok(());
        }
        let paused = !config.get_bool(self.name(), "enableAutomaticTrigger", true);

        for item in builder.items_mut() {
            if !item.is_kind("Deployment") {
                continue;
            }
            let triggers = Self::triggers(item, paused);
            if triggers.is_empty() {
                continue;
            }
            let annotations = item.annotations_mut();
            if annotations.contains_key(Self::ANNOTATION) {
                continue;
            }
            annotations.insert(
                key(Self::ANNOTATION),
                Value::String(serde_json::to_string(&triggers)?),
            );
        }
        Ok(())
    }
}

/// Wraps every item into one OpenShift Template.
pub struct TemplateEnricher;

impl TemplateEnricher {
    /// `KEY=value,KEY2=value2` → template parameters. An entry without `=`
    /// declares a parameter without a default value.
    fn parameters(raw: &str) -> Vec<serde_json::Value> {
        raw.split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(|entry| match entry.split_once('=') {
                Some((name, value)) => json!({ "name": name.trim(), "value": value.trim() }),
                None => json!({ "name": entry }),
            })
            .collect()
    }
}

impl Processor for TemplateEnricher {
    fn name(&self) -> &'static str {
        "openshift-template"
    }
}

impl Enricher for TemplateEnricher {
    fn supports(&self, platform: PlatformMode) -> bool {
        platform == PlatformMode::Openshift
    }

    fn enrich(
        &self,
        _platform: PlatformMode,
        _ctx: &EnricherContext<'_>,
        config: &ProcessorConfig,
        builder: &mut ResourceListBuilder,
    ) -> Result<()> {
        let Some(name) = config
            .get(self.name(), "name")
            .filter(|n| !n.trim().is_empty())
        else {
            return Ok(());
        };
        if builder.is_empty() || builder.has_kind("Template") {
            return Ok(());
        }

        let objects: Vec<Value> = builder.items().iter().map(|i| i.value().clone()).collect();
        let mut template = ResourceItem::new("Template", &name);
        *template.get_mut(&["objects"]) = Value::Sequence(objects);
        if let Some(raw) = config.get(self.name(), "parameters") {
            let parameters = Self::parameters(&raw);
            if !parameters.is_empty() {
                *template.get_mut(&["parameters"]) = serde_yaml::to_value(parameters)?;
            }
        }
        builder.replace_items(vec![template]);
        Ok(())
    }
}
