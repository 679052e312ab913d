//! Built-in generators.
//!
//! - `simple`: when the project declares no image, derives one from the
//!   generator's `from` setting.
//! - `image-labels`: adds the `ports` and `env` of its configuration to every
//!   build image, keeping values the image already declares.

use std::collections::BTreeMap;

use super::{Generator, GeneratorContext, Processor};
use crate::config::{scalar_to_string, ProcessorConfig};
use crate::error::Result;
use crate::image::{BuildConfiguration, ImageConfiguration};

/// Every built-in generator in default order.
pub fn builtin() -> Vec<Box<dyn Generator>> {
    vec![Box::new(SimpleGenerator), Box::new(ImageLabelsGenerator)]
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Derives a single image from the configured base image.
pub struct SimpleGenerator;

impl Processor for SimpleGenerator {
    fn name(&self) -> &'static str {
        "simple"
    }
}

impl Generator for SimpleGenerator {
    fn customize(
        &self,
        _ctx: &GeneratorContext<'_>,
        config: &ProcessorConfig,
        mut images: Vec<ImageConfiguration>,
    ) -> Result<Vec<ImageConfiguration>> {
        if !images.is_empty() {
            return Ok(images);
        }
        let Some(from) = config.get(self.name(), "from") else {
            return Ok(images);
        };

        images.push(ImageConfiguration {
            name: config.get_or(self.name(), "name", "%g/%a:%l"),
            alias: config.get(self.name(), "alias"),
            build: Some(BuildConfiguration {
                from: Some(from),
                ports: config
                    .get(self.name(), "ports")
                    .map(|p| split_list(&p))
                    .unwrap_or_default(),
                ..Default::default()
            }),
        });
        Ok(images)
    }
}

/// Adds configured ports and environment to build images.
pub struct ImageLabelsGenerator;

impl ImageLabelsGenerator {
    fn env(config: &ProcessorConfig, processor: &str) -> BTreeMap<String, String> {
        let Some(mapping) = config.value(processor, "env").and_then(|v| v.as_mapping()) else {
            return BTreeMap::new();
        };
        mapping
            .iter()
            .filter_map(|(k, v)| Some((scalar_to_string(k)?, scalar_to_string(v)?)))
            .collect()
    }
}

impl Processor for ImageLabelsGenerator {
    fn name(&self) -> &'static str {
        "image-labels"
    }
}

impl Generator for ImageLabelsGenerator {
    fn customize(
        &self,
        _ctx: &GeneratorContext<'_>,
        config: &ProcessorConfig,
        mut images: Vec<ImageConfiguration>,
    ) -> Result<Vec<ImageConfiguration>> {
        let ports = config
            .get(self.name(), "ports")
            .map(|p| split_list(&p))
            .unwrap_or_default();
        let env = Self::env(config, self.name());
        if ports.is_empty() && env.is_empty() {
            return Ok(images);
        }

        for build in images.iter_mut().filter_map(|image| image.build.as_mut()) {
            for port in &ports {
                if !build.ports.contains(port) {
                    build.ports.push(port.clone());
                }
            }
            for (key, value) in &env {
                build.env.entry(key.clone()).or_insert_with(|| value.clone());
            }
        }
        Ok(images)
    }
}
