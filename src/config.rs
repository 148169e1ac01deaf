use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::error::Result;
use crate::scale::ChartFrame;

/// Looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "park_atlas.toml";

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub data: DataConfig,
    pub chart: ChartConfig,
    pub map: MapConfig,
    pub pings: PingOptions,
}

/// Input files; relative paths are resolved against the data directory.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct DataConfig {
    pub dir: PathBuf,
    pub observations: PathBuf,
    pub parks: PathBuf,
    pub polygons: PathBuf,
    pub earthquakes: Option<PathBuf>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("data"),
            observations: PathBuf::from("merged_data.csv"),
            parks: PathBuf::from("parks.csv"),
            polygons: PathBuf::from("nps_polygons_filter.geojson"),
            earthquakes: Some(PathBuf::from("all_month.csv")),
        }
    }
}

impl DataConfig {
    pub fn resolve(&self, file: &Path) -> PathBuf {
        if file.is_absolute() { file.to_path_buf() } else { self.dir.join(file) }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChartConfig {
    #[serde(flatten)]
    pub frame: ChartFrame,
    /// Statuses left out of the stacked status chart.
    pub baseline_statuses: Vec<String>,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            frame: ChartFrame::default(),
            baseline_statuses: vec!["No Concern".to_string()],
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct MapConfig {
    pub center_lat: f64,
    pub center_lon: f64,
    pub zoom: f64,
    /// At or above this zoom parks are drawn as boundaries instead of points.
    pub polygon_zoom: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            center_lat: 50.0902,
            center_lon: -95.7129,
            zoom: 3.4,
            polygon_zoom: 5.0,
            min_zoom: 2.0,
            max_zoom: 12.0,
        }
    }
}

/// Earthquake ping animation.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct PingOptions {
    pub duration_ms: u64,
    pub radius_range: [f64; 2],
    pub opacity_range: [f64; 2],
    /// Next ping fires after `min_delay_ms + rand * jitter_ms`.
    pub min_delay_ms: u64,
    pub jitter_ms: u64,
}

impl Default for PingOptions {
    fn default() -> Self {
        Self {
            duration_ms: 800,
            radius_range: [5.0, 12.0],
            opacity_range: [1.0, 0.0],
            min_delay_ms: 100,
            jitter_ms: 400,
        }
    }
}

impl Config {
    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// An explicit path must exist; otherwise the default file is used if
    /// present and built-in defaults if not.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => {
                let cfg = Self::from_toml(&fs::read_to_string(p)?)?;
                log::info!("Loaded config from {}", p.display());
                Ok(cfg)
            }
            None => {
                let p = Path::new(DEFAULT_CONFIG_FILE);
                if p.exists() {
                    Self::load(Some(p))
                } else {
                    log::debug!("No {} found, using defaults", DEFAULT_CONFIG_FILE);
                    Ok(Self::default())
                }
            }
        }
    }
}
