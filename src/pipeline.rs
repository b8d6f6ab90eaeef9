//! Offline batch stages
//!
//! Each stage reads the previous stage's file, so they can be rerun one at a
//! time: `categorize` (categories + region filter), `refine`, `generate_sets`.
//! A missing or empty input aborts the stage before anything is written.

use std::path::Path;

use tracing::{info, warn};

use crate::category::{CategoryReport, Categorizer};
use crate::config::{PipelineConfig, SetsConfig};
use crate::error::{Error, Result};
use crate::poi::{self, Poi};
use crate::profile::Profile;
use crate::refine::{self, BannedNames};
use crate::region::Region;
use crate::sets::{CandidatePool, GenerationReport, RandomSampler, Sampler, SetBuilder, SetWriter};

/// Counts from the categorize stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategorizeSummary {
    pub categories: CategoryReport,
    pub points_kept: usize,
    pub areas_kept: usize,
    pub outside: usize,
    pub unsupported: usize,
}

impl CategorizeSummary {
    pub fn kept(&self) -> usize {
        self.points_kept + self.areas_kept
    }
}

/// Counts from the refine stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefineSummary {
    pub kept: usize,
    pub unnamed: usize,
    pub banned: usize,
}

fn load_non_empty(path: &Path) -> Result<Vec<Poi>> {
    let pois = poi::load(path)?;
    if pois.is_empty() {
        return Err(Error::EmptyInput(path.to_path_buf()));
    }
    Ok(pois)
}

/// Categorize raw POIs, write them all, then write the ones inside the region.
pub fn categorize(config: &PipelineConfig) -> Result<CategorizeSummary> {
    let mut pois = load_non_empty(&config.raw_pois)?;
    let region = Region::load(&config.region)?;

    let categories = Categorizer::default().categorize_all(&mut pois);
    for (category, count) in &categories.counts {
        info!(category = %category, count, "Categorized");
    }
    if categories.unmatched > 0 {
        warn!(unmatched = categories.unmatched, "Records without a category");
    }
    poi::save(&config.categorized, &pois)?;

    let filtered = region.filter(pois);
    poi::save(&config.filtered, &filtered.kept)?;

    let summary = CategorizeSummary {
        categories,
        points_kept: filtered.points_kept,
        areas_kept: filtered.areas_kept,
        outside: filtered.outside,
        unsupported: filtered.unsupported,
    };
    info!(
        total = summary.categories.total(),
        kept = summary.kept(),
        points = summary.points_kept,
        areas = summary.areas_kept,
        outside = summary.outside,
        unsupported = summary.unsupported,
        output = %config.filtered.display(),
        "Categorize stage complete"
    );
    Ok(summary)
}

/// Drop unnamed and banned records from the filtered file.
pub fn refine(config: &PipelineConfig) -> Result<RefineSummary> {
    let pois = load_non_empty(&config.filtered)?;
    let banned = match &config.banned_names {
        Some(path) => BannedNames::load(path)?,
        None => BannedNames::default(),
    };

    let report = refine::refine(pois, &banned);
    poi::save(&config.refined, &report.kept)?;

    let summary = RefineSummary {
        kept: report.kept.len(),
        unnamed: report.unnamed,
        banned: report.banned,
    };
    info!(
        kept = summary.kept,
        unnamed = summary.unnamed,
        banned = summary.banned,
        output = %config.refined.display(),
        "Refine stage complete"
    );
    Ok(summary)
}

/// Generate `count` sets for each of `profiles` from the refined file.
///
/// Uses `seed` when given, else `sets.seed`, else a fresh random seed.
pub fn generate_sets(
    pipeline: &PipelineConfig,
    sets: &SetsConfig,
    profiles: &[Profile],
    count: usize,
    seed: Option<u64>,
) -> Result<Vec<(Profile, GenerationReport)>> {
    let pool = CandidatePool::new(load_non_empty(&pipeline.refined)?);
    let writer = SetWriter::new(&sets.output_dir);
    info!(candidates = pool.len(), count, "Generating sets");

    match seed.or(sets.seed) {
        Some(seed) => generate_with(&pool, &writer, profiles, count, RandomSampler::seeded(seed)),
        None => generate_with(&pool, &writer, profiles, count, RandomSampler::from_entropy()),
    }
}

/// [`generate_sets`] with an explicit sampler.
pub fn generate_with<S: Sampler>(
    pool: &CandidatePool,
    writer: &SetWriter,
    profiles: &[Profile],
    count: usize,
    sampler: S,
) -> Result<Vec<(Profile, GenerationReport)>> {
    let mut builder = SetBuilder::new(pool, sampler);
    let mut reports = Vec::with_capacity(profiles.len());
    for &profile in profiles {
        let draws = builder.build_sets(profile, count);
        let report = writer.write_profile(profile, &draws)?;
        if !report.empty.is_empty() {
            warn!(
                profile = %profile,
                missing = report.empty.len(),
                "Some sets were not generated"
            );
        }
        reports.push((profile, report));
    }
    Ok(reports)
}
