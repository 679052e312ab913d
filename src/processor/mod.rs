//! # Processors
//!
//! Generators and enrichers are named processors selected and ordered by a
//! [`ProcessorConfig`].
//!
//! - **Generators** ([`Generator`]) run once per invocation, before any
//!   platform pass, and customize the image configuration.
//! - **Enrichers** ([`Enricher`]) run in two stages on a
//!   [`ResourceListBuilder`]: `create_defaults` synthesizes missing resources
//!   (a default controller, a service, routes), `enrich` completes existing
//!   ones (labels, health checks, triggers).
//!
//! A [`ProcessorRegistry`] maps names to processors and resolves the
//! configured chain once, before a pass starts. Each processor reads its own
//! settings from `config.<processor-name>` of the chain's configuration.

pub mod enrichers;
pub mod generators;

use crate::config::{ProcessorConfig, ProjectConfig, ResourcesConfig};
use crate::error::{Error, Result};
use crate::image::ImageConfiguration;
use crate::resource::{PlatformMode, ResourceListBuilder};

/// Anything that can be looked up by name in a [`ProcessorRegistry`].
pub trait Processor {
    fn name(&self) -> &'static str;
}

/// Read-only state shared by every enricher of a run.
#[derive(Debug, Clone, Copy)]
pub struct EnricherContext<'a> {
    pub project: &'a ProjectConfig,
    pub images: &'a [ImageConfiguration],
    pub resources: &'a ResourcesConfig,
    /// Name given to synthesized resources unless configured otherwise.
    pub default_name: &'a str,
}

/// A processor that creates and completes resource items.
pub trait Enricher: Processor {
    /// Platforms this enricher runs on.
    fn supports(&self, _platform: PlatformMode) -> bool {
        true
    }

    /// Add resources that are missing from `builder`. Must be idempotent.
    fn create_defaults(
        &self,
        _platform: PlatformMode,
        _ctx: &EnricherContext<'_>,
        _config: &ProcessorConfig,
        _builder: &mut ResourceListBuilder,
    ) -> Result<()> {
        Ok(())
    }

    /// Complete the resources in `builder`.
    fn enrich(
        &self,
        _platform: PlatformMode,
        _ctx: &EnricherContext<'_>,
        _config: &ProcessorConfig,
        _builder: &mut ResourceListBuilder,
    ) -> Result<()> {
        Ok(())
    }
}

/// Read-only state shared by every generator.
#[derive(Debug, Clone, Copy)]
pub struct GeneratorContext<'a> {
    pub project: &'a ProjectConfig,
}

/// A processor that derives or adjusts image configuration.
pub trait Generator: Processor {
    fn customize(
        &self,
        ctx: &GeneratorContext<'_>,
        config: &ProcessorConfig,
        images: Vec<ImageConfiguration>,
    ) -> Result<Vec<ImageConfiguration>>;
}

/// Name to processor lookup, kept in registration order.
pub struct ProcessorRegistry<P: Processor + ?Sized> {
    kind: &'static str,
    processors: Vec<Box<P>>,
}

impl<P: Processor + ?Sized> ProcessorRegistry<P> {
    /// Empty registry; `kind` (`"enricher"`, `"generator"`) is used in messages.
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            processors: Vec::new(),
        }
    }

    /// Register a processor. A processor with the same name is replaced in place.
    pub fn register(&mut self, processor: Box<P>) {
        let name = processor.name();
        match self.processors.iter().position(|p| p.name() == name) {
            Some(index) => self.processors[index] = processor,
            None => self.processors.push(processor),
        }
    }

    pub fn by_name(&self, name: &str) -> Option<&P> {
        self.processors
            .iter()
            .find(|p| p.name() == name)
            .map(|p| &**p)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.processors.iter().map(|p| p.name()).collect()
    }

    /// The chain selected by `config`, in execution order.
    ///
    /// With includes, their order is used and every name must be registered.
    /// Without includes, every registered processor runs in registration
    /// order. Excluded names are dropped either way.
    pub fn all_ordered(&self, config: &ProcessorConfig) -> Result<Vec<&P>> {
        if config.includes.is_empty() {
            return Ok(self
                .processors
                .iter()
                .map(|p| &**p)
                .filter(|p| config.use_processor(p.name()))
                .collect());
        }

        let mut chain = Vec::with_capacity(config.includes.len());
        for name in &config.includes {
            let processor = self.by_name(name).ok_or_else(|| Error::Configuration {
                message: format!("Unknown {} '{}'", self.kind, name),
                hint: Some(format!("Known {}s: {}", self.kind, self.names().join(", "))),
            })?;
            if config.use_processor(name) {
                chain.push(processor);
            }
        }
        Ok(chain)
    }
}

impl ProcessorRegistry<dyn Enricher> {
    /// Registry with every built-in enricher in default order.
    pub fn enrichers() -> Self {
        let mut registry = Self::new("enricher");
        for enricher in enrichers::builtin() {
            registry.register(enricher);
        }
        registry
    }
}

impl ProcessorRegistry<dyn Generator> {
    /// Registry with every built-in generator in default order.
    pub fn generators() -> Self {
        let mut registry = Self::new("generator");
        for generator in generators::builtin() {
            registry.register(generator);
        }
        registry
    }
}

/// Attach the processor's identity to a runtime failure.
///
/// Constraint violations and errors already naming a processor pass through.
pub fn wrap_error(processor: &str, error: Error) -> Error {
    match error {
        Error::ConstraintViolation { .. } | Error::Processor { .. } => error,
        other => Error::Processor {
            processor: processor.to_string(),
            message: other.to_string(),
        },
    }
}

/// Shorthand for a single constraint violation.
pub fn constraint_violation(processor: &str, violation: impl Into<String>) -> Error {
    Error::ConstraintViolation {
        processor: processor.to_string(),
        violations: vec![violation.into()],
    }
}
