//! Pipeline and service configuration
//!
//! Loaded from a TOML file; every field has a default so a missing file or a
//! partial file is valid.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub sets: SetsConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

/// Offline batch inputs and outputs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Raw POIs as downloaded, with a `main_category` property
    #[serde(default = "default_raw_pois")]
    pub raw_pois: PathBuf,

    /// Region of interest polygons
    #[serde(default = "default_region")]
    pub region: PathBuf,

    /// Every raw POI with its category, before the region filter
    #[serde(default = "default_categorized")]
    pub categorized: PathBuf,

    /// Categorized POIs inside the region
    #[serde(default = "default_filtered")]
    pub filtered: PathBuf,

    /// Names to drop during refinement, one per line (optional)
    #[serde(default)]
    pub banned_names: Option<PathBuf>,

    /// Filtered POIs with unusable names removed; input of set generation
    #[serde(default = "default_refined")]
    pub refined: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetsConfig {
    /// Directory holding one sub-directory of set files per profile
    #[serde(default = "default_sets_dir")]
    pub output_dir: PathBuf,

    /// Sets generated per profile
    #[serde(default = "default_sets_per_profile")]
    pub per_profile: usize,

    /// Fixed RNG seed; random on every run when unset
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP listen address
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,

    /// Directory served under `/static`; must contain the sets directory
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,

    /// Place name shown in the health report
    #[serde(default = "default_location")]
    pub location: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// SQLite assignment database
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
}

// Defaults
fn default_raw_pois() -> PathBuf {
    PathBuf::from("data/pois.geojson")
}
fn default_region() -> PathBuf {
    PathBuf::from("data/area_mobility_workshop.geojson")
}
fn default_categorized() -> PathBuf {
    PathBuf::from("data/pois_categorized.geojson")
}
fn default_filtered() -> PathBuf {
    PathBuf::from("data/pois_categorized_filtered.geojson")
}
fn default_refined() -> PathBuf {
    PathBuf::from("data/pois_categorized_filtered_refined.geojson")
}
fn default_sets_dir() -> PathBuf {
    PathBuf::from("static/places")
}
fn default_sets_per_profile() -> usize {
    200
}
fn default_listen() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8000))
}
fn default_static_dir() -> PathBuf {
    PathBuf::from("static")
}
fn default_location() -> String {
    "Concepción, Chile".to_string()
}
fn default_db_path() -> PathBuf {
    PathBuf::from("data/assignments.db")
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            raw_pois: default_raw_pois(),
            region: default_region(),
            categorized: default_categorized(),
            filtered: default_filtered(),
            banned_names: None,
            refined: default_refined(),
        }
    }
}

impl Default for SetsConfig {
    fn default() -> Self {
        Self {
            output_dir: default_sets_dir(),
            per_profile: default_sets_per_profile(),
            seed: None,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            static_dir: default_static_dir(),
            location: default_location(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

impl Config {
    /// Load `path`, or defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("Config file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.sets.per_profile == 0 {
            return Err(Error::Config("sets.per_profile must be at least 1".to_string()));
        }
        if !self.sets.output_dir.starts_with(&self.server.static_dir) {
            return Err(Error::Config(format!(
                "sets.output_dir ({}) must be inside server.static_dir ({})",
                self.sets.output_dir.display(),
                self.server.static_dir.display()
            )));
        }
        Ok(())
    }
}
