//! Persisting generated sets as GeoJSON files

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::Draw;
use crate::error::Result;
use crate::poi;
use crate::profile::Profile;

pub const SET_EXTENSION: &str = "geojson";

/// Writes sets under `{root}/{profile}/{index}.geojson`.
#[derive(Debug, Clone)]
pub struct SetWriter {
    root: PathBuf,
}

/// What a generation run produced for one profile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationReport {
    pub written: Vec<PathBuf>,
    /// Indices of draws that selected nothing
    pub empty: Vec<usize>,
    /// Indices of draws written with fewer POIs than the quota asks for
    pub partial: Vec<usize>,
    /// Files removed from a previous run
    pub removed: usize,
}

impl SetWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn profile_dir(&self, profile: Profile) -> PathBuf {
        self.root.join(profile.as_str())
    }

    pub fn set_path(&self, profile: Profile, index: usize) -> PathBuf {
        self.profile_dir(profile)
            .join(format!("{}.{}", index, SET_EXTENSION))
    }

    /// Replace the profile's whole batch with `draws`.
    pub fn write_profile(&self, profile: Profile, draws: &[Draw]) -> Result<GenerationReport> {
        let dir = self.profile_dir(profile);
        fs::create_dir_all(&dir)?;

        let mut report = GenerationReport {
            removed: clear_sets(&dir)?,
            ..Default::default()
        };

        for draw in draws {
            let Some(set) = draw.set() else {
                warn!(profile = %profile, set = draw.index(), "Set not generated, no candidates");
                report.empty.push(draw.index());
                continue;
            };
            let path = self.set_path(profile, set.index);
            poi::save(&path, &set.pois)?;
            debug!(path = %path.display(), pois = set.pois.len(), "Set written");
            if !draw.starved().is_empty() {
                report.partial.push(set.index);
            }
            report.written.push(path);
        }

        info!(
            profile = %profile,
            written = report.written.len(),
            partial = report.partial.len(),
            empty = report.empty.len(),
            "Profile sets generated"
        );
        Ok(report)
    }
}

fn clear_sets(dir: &Path) -> Result<usize> {
    let mut removed = 0;
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|e| e == SET_EXTENSION) {
            fs::remove_file(&path)?;
            removed += 1;
        }
    }
    Ok(removed)
}
