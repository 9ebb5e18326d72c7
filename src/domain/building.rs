//! Building height resolution from OSM tags
//!
//! Heights come from an ordered list of rules; the first rule returning a
//! value wins. Unparseable tag values make a rule return `None` so the next
//! rule gets a chance.

use super::Tags;

/// Meters per building level
pub const LEVEL_HEIGHT: f64 = 3.5;
/// Height of towers without any height information
pub const TOWER_DEFAULT_HEIGHT: f64 = 50.0;
/// Default height in full 3D mode
pub const DEFAULT_HEIGHT_3D: f64 = 15.0;
/// Default relief height in flat 2D mode
pub const DEFAULT_HEIGHT_2D: f64 = 2.0;

const MIN_PARSED_HEIGHT: f64 = 1.0;
const MAX_PARSED_HEIGHT: f64 = 1000.0;

/// Resolved vertical extent of a footprint, meters above its ground
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuildingVolume {
    pub min_height: f64,
    pub max_height: f64,
}

impl BuildingVolume {
    /// Resolve the volume of a building or building part
    ///
    /// `min_height` only comes from explicit tags; the top always stays at
    /// least one meter above it.
    pub fn from_tags(tags: &Tags, is_3d: bool) -> Self {
        let min_height = parse_meters(tags, "min_height")
            .or_else(|| parse_meters(tags, "building:min_height"))
            .unwrap_or(0.0)
            .clamp(0.0, MAX_PARSED_HEIGHT);
        let mut max_height = resolve_height(tags, is_3d);
        if max_height <= min_height {
            max_height = min_height + 1.0;
        }
        Self {
            min_height,
            max_height,
        }
    }
}

/// A single step of the height fallback chain
pub type HeightRule = fn(&Tags) -> Option<f64>;

/// Tag-driven rules in priority order; the mode-dependent default comes last
/// in [`resolve_height`]
pub const HEIGHT_RULES: &[HeightRule] = &[
    explicit_height,
    tower_height,
    levels_height,
    min_height_estimate,
    building_type_height,
];

/// Building height in meters from its tags
pub fn resolve_height(tags: &Tags, is_3d: bool) -> f64 {
    HEIGHT_RULES
        .iter()
        .find_map(|rule| rule(tags))
        .unwrap_or(if is_3d {
            DEFAULT_HEIGHT_3D
        } else {
            DEFAULT_HEIGHT_2D
        })
}

fn explicit_height(tags: &Tags) -> Option<f64> {
    ["height", "building:height", "height:building"]
        .iter()
        .find_map(|key| parse_height(tags, key))
}

fn tower_height(tags: &Tags) -> Option<f64> {
    if tags.get("man_made").map(String::as_str) != Some("tower") {
        return None;
    }
    parse_height(tags, "tower:height")
        .or_else(|| parse_height(tags, "height"))
        .or(Some(TOWER_DEFAULT_HEIGHT))
}

fn levels_height(tags: &Tags) -> Option<f64> {
    ["building:levels", "levels"]
        .iter()
        .find_map(|key| parse_positive(tags, key))
        .map(|levels| (levels * LEVEL_HEIGHT).max(LEVEL_HEIGHT))
}

fn min_height_estimate(tags: &Tags) -> Option<f64> {
    parse_height(tags, "min_height").map(|min| (min + 10.0).max(15.0))
}

fn building_type_height(tags: &Tags) -> Option<f64> {
    let building = tags.get("building")?.to_lowercase();
    match building.as_str() {
        "cathedral" | "church" => Some(25.0),
        "tower" => Some(TOWER_DEFAULT_HEIGHT),
        "stadium" => Some(30.0),
        "commercial" | "office" => Some(20.0),
        "retail" => Some(12.0),
        "industrial" | "warehouse" => Some(8.0),
        "residential" | "apartments" | "house" => Some(12.0),
        "garage" | "garages" => Some(4.0),
        "shed" | "roof" => Some(3.0),
        _ => None,
    }
}

/// Parse a height tag such as "330", "330 m", "330m" or "12.5"
///
/// The result is clamped to 1..=1000 meters.
pub fn parse_height(tags: &Tags, key: &str) -> Option<f64> {
    parse_meters(tags, key).map(|value| value.clamp(MIN_PARSED_HEIGHT, MAX_PARSED_HEIGHT))
}

/// Parse a length tag, dropping an "m" unit suffix and inner whitespace
fn parse_meters(tags: &Tags, key: &str) -> Option<f64> {
    let raw = tags.get(key)?.trim().to_lowercase();
    if raw.is_empty() {
        return None;
    }
    let cleaned: String = raw
        .trim_end_matches('m')
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    let value: f64 = cleaned.parse().ok()?;
    value.is_finite().then_some(value)
}

/// Parse a plain positive number such as a level count
fn parse_positive(tags: &Tags, key: &str) -> Option<f64> {
    let value: f64 = tags.get(key)?.trim().parse().ok()?;
    (value.is_finite() && value > 0.0).then_some(value)
}
