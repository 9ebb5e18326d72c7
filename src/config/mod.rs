use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};

use crate::geometry::ElevationGrid;

/// Fixed geometry constants, all in meters unless noted.
///
/// Vertical layout of a generated model (y up, terrain reference at 0):
///   Slab:       foundation - base_thickness -> foundation
///   Ground:     foundation -> terrain surface (carved down under water)
///   Water:      carved bottom + WATER_SURFACE_LIFT
///   Buildings:  terrain - BUILDING_SINK -> roof
///   Roads:      terrain + ROAD_CLEARANCE
/// where foundation = -(water_depth * VERTICAL_EXAGGERATION) - MIN_GROUND_THICKNESS.
pub mod terrain {
    /// Vertical scale applied to sampled elevation so relief survives small prints
    pub const VERTICAL_EXAGGERATION: f64 = 1.5;

    /// Ground vertices closer than this to a waterway centerline are carved
    pub const WATERWAY_CARVE_DISTANCE: f64 = 8.0;
    /// Water surface height above the carved bottom
    pub const WATER_SURFACE_LIFT: f64 = 0.3;
    /// Ground material kept between the deepest carve and the foundation
    pub const MIN_GROUND_THICKNESS: f64 = 1.0;

    /// Buildings are sunk slightly into the terrain so they fuse with it
    pub const BUILDING_SINK: f64 = 0.1;
    /// Roof stays at least this far above the highest floor vertex
    pub const MIN_ROOF_CLEARANCE: f64 = 1.0;
    /// Road ribbons float this far above the terrain surface
    pub const ROAD_CLEARANCE: f64 = 0.5;

    /// Grid divisions per side are clamped into this range
    pub const MIN_GRID_DIVISIONS: u32 = 40;
    pub const MAX_GRID_DIVISIONS: u32 = 150;

    /// Segments of the circular foundation slab
    pub const CIRCLE_SEGMENTS: usize = 64;

    /// Below this resolution small buildings are dropped
    pub const BUILDING_LOD_RESOLUTION: u32 = 80;
    /// Below this resolution roads narrower than PATH_LOD_WIDTH are dropped
    pub const PATH_LOD_RESOLUTION: u32 = 60;
    pub const PATH_LOD_WIDTH: f64 = 2.0;
}

/// Outline of the printed model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BaseShape {
    #[default]
    Square,
    Circular,
}

/// Which raw elevation counts as height zero
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub enum GroundLevel {
    /// Lowest sample of the elevation grid
    #[default]
    Lowest,
    /// Raw elevation above sea level
    Raw,
    /// Explicit reference in meters
    Fixed(f64),
}

impl GroundLevel {
    /// Reference elevation to subtract from raw samples
    pub fn reference(self, grid: Option<&ElevationGrid>) -> f64 {
        match (self, grid) {
            (_, None) | (GroundLevel::Raw, _) => 0.0,
            (GroundLevel::Lowest, Some(grid)) => grid.min_sample(),
            (GroundLevel::Fixed(meters), Some(_)) => meters,
        }
    }
}

impl FromStr for GroundLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "lowest" | "auto" => Ok(GroundLevel::Lowest),
            "raw" => Ok(GroundLevel::Raw),
            other => other
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(GroundLevel::Fixed)
                .ok_or_else(|| {
                    format!("invalid ground level '{s}': expected lowest, raw or meters")
                }),
        }
    }
}

impl TryFrom<String> for GroundLevel {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<GroundLevel> for String {
    fn from(level: GroundLevel) -> Self {
        level.to_string()
    }
}

impl fmt::Display for GroundLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroundLevel::Lowest => write!(f, "lowest"),
            GroundLevel::Raw => write!(f, "raw"),
            GroundLevel::Fixed(meters) => write!(f, "{meters}"),
        }
    }
}

fn default_base_color() -> String {
    "#C8C8C8".to_string()
}
fn default_building_color() -> String {
    "#FF6464".to_string()
}
fn default_road_color() -> String {
    "#323232".to_string()
}
fn default_water_color() -> String {
    "#3C78D8".to_string()
}

/// Per-layer display colors; cosmetic only, exported as a slicing hint
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LayerColors {
    #[serde(default = "default_base_color")]
    pub base: String,
    #[serde(default = "default_building_color")]
    pub building: String,
    #[serde(default = "default_road_color")]
    pub road: String,
    #[serde(default = "default_water_color")]
    pub water: String,
}

impl Default for LayerColors {
    fn default() -> Self {
        Self {
            base: default_base_color(),
            building: default_building_color(),
            road: default_road_color(),
            water: default_water_color(),
        }
    }
}

/// Everything the mesh generator needs to know about a request
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOptions {
    /// (lat, lon) of the model center
    pub center: (f64, f64),
    /// Half extent of the footprint in meters
    pub radius: f64,
    pub base_shape: BaseShape,
    /// Foundation slab thickness in meters
    pub base_thickness: f64,
    /// Detail level, 1..=150; drives grid density and level-of-detail cuts
    pub resolution: u32,
    /// Full building extrusion instead of flat relief
    pub is_3d: bool,
    pub ground_level: GroundLevel,
    /// Use the elevation grid when one is supplied
    pub elevation_enabled: bool,
    /// Depth of carved water depressions before exaggeration
    pub water_depth: f64,
    /// Global vertical offset added to every building floor
    pub building_offset: f64,
    /// Solid road depth below the ribbon top; 0 emits bare ribbons
    pub road_thickness: f64,
    pub colors: LayerColors,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            center: (0.0, 0.0),
            radius: 500.0,
            base_shape: BaseShape::Square,
            base_thickness: 2.0,
            resolution: 100,
            is_3d: true,
            ground_level: GroundLevel::Lowest,
            elevation_enabled: true,
            water_depth: 2.0,
            building_offset: 0.0,
            road_thickness: 0.0,
            colors: LayerColors::default(),
        }
    }
}

impl GenerationOptions {
    pub fn new(center: (f64, f64), radius: f64) -> Self {
        Self {
            center,
            radius,
            ..Default::default()
        }
    }

    pub fn with_base_shape(mut self, shape: BaseShape) -> Self {
        self.base_shape = shape;
        self
    }

    pub fn with_resolution(mut self, resolution: u32) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn with_3d(mut self, is_3d: bool) -> Self {
        self.is_3d = is_3d;
        self
    }

    pub fn with_ground_level(mut self, level: GroundLevel) -> Self {
        self.ground_level = level;
        self
    }

    pub fn with_water_depth(mut self, depth: f64) -> Self {
        self.water_depth = depth;
        self
    }

    pub fn with_building_offset(mut self, offset: f64) -> Self {
        self.building_offset = offset;
        self
    }

    pub fn with_road_thickness(mut self, thickness: f64) -> Self {
        self.road_thickness = thickness;
        self
    }

    /// Terrain grid divisions per side
    pub fn grid_divisions(&self) -> u32 {
        self.resolution
            .clamp(terrain::MIN_GRID_DIVISIONS, terrain::MAX_GRID_DIVISIONS)
    }

    /// Height of the flat level the ground skirt drops to
    pub fn foundation_level(&self) -> f64 {
        -(self.water_depth.max(0.0) * terrain::VERTICAL_EXAGGERATION) - terrain::MIN_GROUND_THICKNESS
    }
}

fn default_timeout_secs() -> u64 {
    200
}

fn default_max_retries() -> u32 {
    3
}

fn default_overpass_urls() -> Vec<String> {
    vec![
        "https://overpass-api.de/api/interpreter".to_string(),
        "https://overpass.private.coffee/api/interpreter".to_string(),
        "https://maps.mail.ru/osm/tools/overpass/api/interpreter".to_string(),
    ]
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct OverpassConfig {
    #[serde(default = "default_overpass_urls")]
    pub urls: Vec<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for OverpassConfig {
    fn default() -> Self {
        Self {
            urls: default_overpass_urls(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

/// Settings read from a TOML file; every field is optional and CLI flags win
#[derive(Debug, Deserialize, Default)]
pub struct FileConfig {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub radius: Option<f64>,
    pub base_shape: Option<BaseShape>,
    pub base_thickness: Option<f64>,
    pub resolution: Option<u32>,
    /// Flat 2D relief instead of full building heights
    pub flat: Option<bool>,
    pub ground_level: Option<GroundLevel>,
    pub elevation: Option<bool>,
    pub water_depth: Option<f64>,
    pub building_offset: Option<f64>,
    pub road_thickness: Option<f64>,
    pub export_scale: Option<f64>,
    pub output_dir: Option<PathBuf>,
    pub merged: Option<bool>,
    #[serde(default)]
    pub verbose: bool,
    pub colors: Option<LayerColors>,
    pub overpass: Option<OverpassConfig>,
}

impl FileConfig {
    /// Load the first config file found in the usual places
    pub fn load() -> Option<Self> {
        for path in get_config_paths() {
            if path.exists()
                && let Ok(contents) = std::fs::read_to_string(&path)
            {
                match toml::from_str(&contents) {
                    Ok(config) => return Some(config),
                    Err(e) => {
                        log::warn!("Failed to parse config file {:?}: {}", path, e);
                    }
                }
            }
        }
        None
    }

    /// Load an explicitly requested config file
    pub fn from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&contents).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}

fn get_config_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("mapsolid.toml"), PathBuf::from(".mapsolid.toml")];

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("mapsolid").join("config.toml"));
        paths.push(config_dir.join("mapsolid.toml"));
    }

    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".mapsolid.toml"));
    }

    paths
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = GenerationOptions::default();
        assert_eq!(options.grid_divisions(), 100);
        assert_eq!(options.base_shape, BaseShape::Square);
        assert_eq!(options.foundation_level(), -4.0);
        assert_eq!(options.colors.building, "#FF6464");
    }

    #[test]
    fn test_grid_divisions_clamped() {
        assert_eq!(GenerationOptions::default().with_resolution(5).grid_divisions(), 40);
        assert_eq!(GenerationOptions::default().with_resolution(400).grid_divisions(), 150);
    }

    #[test]
    fn test_ground_level_parse() {
        assert_eq!("lowest".parse::<GroundLevel>(), Ok(GroundLevel::Lowest));
        assert_eq!(" RAW ".parse::<GroundLevel>(), Ok(GroundLevel::Raw));
        assert_eq!("120.5".parse::<GroundLevel>(), Ok(GroundLevel::Fixed(120.5)));
        assert!("sea".parse::<GroundLevel>().is_err());
    }

    #[test]
    fn test_ground_reference() {
        let grid = ElevationGrid::new(2, 100.0, vec![40.0, 55.0, 60.0, 42.0]).unwrap();
        assert_eq!(GroundLevel::Lowest.reference(Some(&grid)), 40.0);
        assert_eq!(GroundLevel::Raw.reference(Some(&grid)), 0.0);
        assert_eq!(GroundLevel::Fixed(50.0).reference(Some(&grid)), 50.0);
        assert_eq!(GroundLevel::Fixed(50.0).reference(None), 0.0);
    }

    #[test]
    fn test_parse_file_config() {
        let toml = r##"
            lat = 48.8584
            lon = 2.2945
            radius = 750.0
            base_shape = "circular"
            ground_level = "raw"
            flat = true

            [colors]
            building = "#FFFFFF"

            [overpass]
            max_retries = 5
        "##;
        let config: FileConfig = toml::from_str(toml).unwrap();

        assert_eq!(config.radius, Some(750.0));
        assert_eq!(config.base_shape, Some(BaseShape::Circular));
        assert_eq!(config.ground_level, Some(GroundLevel::Raw));
        assert_eq!(config.flat, Some(true));
        assert!(!config.verbose);

        let colors = config.colors.unwrap();
        assert_eq!(colors.building, "#FFFFFF");
        assert_eq!(colors.road, "#323232");

        let overpass = config.overpass.unwrap();
        assert_eq!(overpass.max_retries, 5);
        assert_eq!(overpass.urls.len(), 3);
    }
}
