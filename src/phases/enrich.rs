//! Phase 4: Generation and Enrichment
//!
//! Runs processor chains resolved from a [`ProcessorConfig`].
//!
//! - [`generate`]: the generator chain over the image configuration, once per
//!   invocation.
//! - [`create_default_resources`]: the `create_defaults` stage of every
//!   enricher supporting the platform, in chain order.
//! - [`enrich`]: the `enrich` stage, in the same order.
//!
//! The chain is resolved before the first processor runs, so a bad include
//! fails without touching the builder. Runtime errors are wrapped with the
//! failing processor's name; constraint violations pass through unchanged so
//! callers can report them as such.

use log::debug;

use crate::config::ProcessorConfig;
use crate::error::Result;
use crate::image::ImageConfiguration;
use crate::processor::{
    wrap_error, Enricher, EnricherContext, Generator, GeneratorContext, Processor,
    ProcessorRegistry,
};
use crate::resource::{PlatformMode, ResourceListBuilder};

/// Run the generator chain.
pub fn generate(
    registry: &ProcessorRegistry<dyn Generator>,
    ctx: &GeneratorContext<'_>,
    config: &ProcessorConfig,
    mut images: Vec<ImageConfiguration>,
) -> Result<Vec<ImageConfiguration>> {
    for generator in registry.all_ordered(config)? {
        debug!("Running generator {}", generator.name());
        images = generator
            .customize(ctx, config, images)
            .map_err(|e| wrap_error(generator.name(), e))?;
    }
    Ok(images)
}

fn chain<'r>(
    registry: &'r ProcessorRegistry<dyn Enricher>,
    platform: PlatformMode,
    config: &ProcessorConfig,
) -> Result<Vec<&'r dyn Enricher>> {
    Ok(registry
        .all_ordered(config)?
        .into_iter()
        .filter(|enricher| enricher.supports(platform))
        .collect())
}

/// Let every enricher add the resources it is responsible for.
pub fn create_default_resources(
    registry: &ProcessorRegistry<dyn Enricher>,
    platform: PlatformMode,
    ctx: &EnricherContext<'_>,
    config: &ProcessorConfig,
    builder: &mut ResourceListBuilder,
) -> Result<()> {
    for enricher in chain(registry, platform, config)? {
        debug!("Creating default resources with {}", enricher.name());
        enricher
            .create_defaults(platform, ctx, config, builder)
            .map_err(|e| wrap_error(enricher.name(), e))?;
    }
    Ok(())
}

/// Let every enricher complete the resources in `builder`.
pub fn enrich(
    registry: &ProcessorRegistry<dyn Enricher>,
    platform: PlatformMode,
    ctx: &EnricherContext<'_>,
    config: &ProcessorConfig,
    builder: &mut ResourceListBuilder,
) -> Result<()> {
    for enricher in chain(registry, platform, config)? {
        debug!("Enriching with {}", enricher.name());
        enricher
            .enrich(platform, ctx, config, builder)
            .map_err(|e| wrap_error(enricher.name(), e))?;
    }
    Ok(())
}

/// Both stages, defaults first.
pub fn execute(
    registry: &ProcessorRegistry<dyn Enricher>,
    platform: PlatformMode,
    ctx: &EnricherContext<'_>,
    config: &ProcessorConfig,
    builder: &mut ResourceListBuilder,
) -> Result<()> {
    create_default_resources(registry, platform, ctx, config, builder)?;
    enrich(registry, platform, ctx, config, builder)
}
