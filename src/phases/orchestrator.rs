//! Orchestrator for a complete resource generation run
//!
//! This module coordinates all phases. Everything that can fail on bad
//! configuration (mappings, profile names, processor names, profile
//! directories) is resolved before the first file is read or written.

use std::path::{Path, PathBuf};

use log::{error, info};

use super::profiles::{OverlayPass, ProfileDir};
use super::validate::{ValidationOutcome, ValidationPolicy};
use super::{phase1, phase2, phase3, phase4, phase5, phase6, phase7, phase8};
use crate::config::{ForgeConfig, ProcessorConfig};
use crate::defaults::{default_user_profile_dir, DEFAULT_PROFILE};
use crate::error::Result;
use crate::fetch::{DefaultRemoteFetcher, RemoteFetcher};
use crate::image::{self, ImageConfigResolver, ImageNameFormatter, PropertyImageConfigResolver};
use crate::mapping::KindFilenameMapper;
use crate::phases::assemble::default_resource_name;
use crate::phases::expand::SubstitutionContext;
use crate::processor::{Enricher, EnricherContext, Generator, GeneratorContext, ProcessorRegistry};
use crate::profile::{blend_profile_with_configuration, ProcessorKind, ProfileResolver};
use crate::resource::{PlatformMode, ResourceCollection};

/// What one platform pass produced.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationReport {
    pub platform: PlatformMode,
    pub classifier: String,
    /// Items in the composite document.
    pub items: usize,
    /// Items contributed by profile directories.
    pub profile_items: usize,
    pub composite: PathBuf,
    pub individual: Vec<PathBuf>,
    /// Items written without an individual file because they have no name.
    pub skipped: usize,
    pub validation: ValidationOutcome,
}

/// `resource_dir/<environment>` when an environment is set, else `resource_dir`.
pub fn effective_resource_dir(resource_dir: &Path, environment: Option<&str>) -> PathBuf {
    match environment.map(str::trim).filter(|env| !env.is_empty()) {
        Some(env) => resource_dir.join(env),
        None => resource_dir.to_path_buf(),
    }
}

/// Where profiles are looked up: the resource directory, then the user's
/// profile directory.
pub fn profile_search_roots(resource_dir: &Path) -> Vec<PathBuf> {
    let mut roots = vec![resource_dir.to_path_buf()];
    roots.extend(default_user_profile_dir());
    roots
}

/// State shared by every platform pass.
struct Run<'a> {
    config: &'a ForgeConfig,
    mapper: KindFilenameMapper,
    enrichers: ProcessorRegistry<dyn Enricher>,
    enricher_config: ProcessorConfig,
    profile_dirs: Vec<ProfileDir>,
    substitution: SubstitutionContext,
    expanded: Vec<PathBuf>,
    target_dir: PathBuf,
    work_dir: PathBuf,
}

/// Execute a complete run with the default remote fetcher.
///
/// Relative directories of `config` are resolved against `base_dir`.
pub fn execute(config: &ForgeConfig, base_dir: &Path) -> Result<Vec<GenerationReport>> {
    execute_with_fetcher(config, base_dir, &DefaultRemoteFetcher::default())
}

/// Execute a complete run:
///
/// 1. Resolve the kind mapping, profile directories and processor chains
/// 2. Resolve images and run the generator chain once
/// 3. Discover and expand the fragments once (phases 1-2)
/// 4. For every configured platform, run phases 3-8
///
/// Returns one report per platform. With `skip` set nothing happens.
pub fn execute_with_fetcher(
    config: &ForgeConfig,
    base_dir: &Path,
    fetcher: &dyn RemoteFetcher,
) -> Result<Vec<GenerationReport>> {
    if config.skip {
        info!("Skipping resource generation");
        return Ok(Vec::new());
    }
    config.validate()?;

    let mapper = KindFilenameMapper::with_mappings(&config.mappings)?;
    let resource_dir = effective_resource_dir(
        &ForgeConfig::resolve_dir(base_dir, &config.resource_dir),
        config.environment.as_deref(),
    );
    let resolver = ProfileResolver::new(&profile_search_roots(&resource_dir));
    let profile_dirs = phase5::resolve_profile_dirs(&resource_dir, &resolver)?;

    let profile_name = config.profile.as_deref().unwrap_or(DEFAULT_PROFILE);
    let generator_config = blend_profile_with_configuration(
        ProcessorKind::Generator,
        Some(profile_name),
        &resolver,
        config.generator.as_ref(),
    )?;
    let enricher_config = blend_profile_with_configuration(
        ProcessorKind::Enricher,
        Some(profile_name),
        &resolver,
        config.enricher.as_ref(),
    )?;

    let enrichers = ProcessorRegistry::<dyn Enricher>::enrichers();
    enrichers.all_ordered(&enricher_config)?;
    for profile_dir in &profile_dirs {
        enrichers.all_ordered(&profile_dir.profile.enricher_config())?;
    }
    let generators = ProcessorRegistry::<dyn Generator>::generators();

    // Images
    let substitution = SubstitutionContext::from_project(&config.project);
    let images = PropertyImageConfigResolver::new(&substitution).resolve(config.images.clone())?;
    let images = phase4::generate(
        &generators,
        &GeneratorContext {
            project: &config.project,
        },
        &generator_config,
        images,
    )?;
    let build_dir = ForgeConfig::resolve_dir(base_dir, &config.build_dir);
    let reference_date = image::reference_date(&build_dir)?;
    let images = image::init_and_validate(
        images,
        &ImageNameFormatter::new(&config.project, reference_date),
    )?;

    // Phases 1-2
    let work_dir = ForgeConfig::resolve_dir(base_dir, &config.work_dir);
    let fragments = phase1::execute(&resource_dir, &config.resources.remotes, fetcher)?;
    let expanded = phase2::execute(&fragments, &work_dir, &substitution)?;

    let run = Run {
        config,
        mapper,
        enrichers,
        enricher_config,
        profile_dirs,
        substitution,
        expanded,
        target_dir: ForgeConfig::resolve_dir(base_dir, &config.target_dir),
        work_dir,
    };
    let default_name = default_resource_name(&config.project.artifact_id);
    let ctx = EnricherContext {
        project: &config.project,
        images: &images,
        resources: &config.resources,
        default_name: &default_name,
    };

    config
        .platforms
        .iter()
        .map(|platform| generate_platform(&run, &ctx, *platform))
        .collect()
}

/// Phases 3-5: the main items followed by every profile overlay.
fn assemble_platform(
    run: &Run<'_>,
    ctx: &EnricherContext<'_>,
    platform: PlatformMode,
) -> Result<(ResourceCollection, usize)> {
    let mut builder = phase3::execute(&run.expanded, platform, ctx.default_name, &run.mapper)?;
    phase4::execute(
        &run.enrichers,
        platform,
        ctx,
        &run.enricher_config,
        &mut builder,
    )?;

    let pass = OverlayPass {
        platform,
        ctx,
        registry: &run.enrichers,
        mapper: &run.mapper,
        substitution: &run.substitution,
        work_dir: &run.work_dir,
    };
    let profile_items = phase5::execute(&pass, &run.profile_dirs, &mut builder)?;
    Ok((builder.build(), profile_items))
}

fn generate_platform(
    run: &Run<'_>,
    ctx: &EnricherContext<'_>,
    platform: PlatformMode,
) -> Result<GenerationReport> {
    let classifier = platform.classifier();
    info!("Generating {} resources", classifier);

    let (collection, profile_items) = assemble_platform(run, ctx, platform).map_err(|e| {
        if e.is_constraint_violation() {
            error!("Failed to generate {} resources: {}", classifier, e);
        }
        e
    })?;

    let (entity, filtered) = phase6::execute(&collection, run.config.generate_route);

    let output_dir = run.target_dir.join(classifier);
    let written = phase7::execute(
        &entity,
        &filtered,
        &output_dir.join(classifier),
        run.config.resource_type,
        &run.mapper,
    )?;
    info!(
        "Wrote {} {} resource(s) to {}",
        filtered.len(),
        classifier,
        written.composite.display()
    );

    let policy = ValidationPolicy {
        skip: run.config.skip_resource_validation,
        fail_on_error: run.config.fail_on_validation_error,
    };
    let validation = phase8::execute(&output_dir, platform, policy)?;

    Ok(GenerationReport {
        platform,
        classifier: classifier.to_string(),
        items: filtered.len(),
        profile_items,
        composite: written.composite,
        individual: written.individual,
        skipped: written.skipped,
        validation,
    })
}
