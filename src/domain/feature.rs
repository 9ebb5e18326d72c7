use std::collections::HashMap;

use super::RoadClass;

pub type Tags = HashMap<String, String>;

/// What a vector feature is rendered as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureKind {
    Building,
    BuildingPart,
    /// Closed water body (lake, pond, riverbank)
    Water,
    /// River, stream or canal centerline
    Waterway,
    Road(RoadClass),
}

impl FeatureKind {
    /// Classify a way from its tags
    ///
    /// Polygon kinds (buildings, water bodies) require a closed way; `None`
    /// for anything this crate does not render.
    pub fn classify(tags: &Tags, closed: bool) -> Option<FeatureKind> {
        if closed && tags.contains_key("building:part") {
            return Some(FeatureKind::BuildingPart);
        }
        if closed && tags.contains_key("building") {
            return Some(FeatureKind::Building);
        }
        if let Some(highway) = tags.get("highway") {
            return Some(FeatureKind::Road(RoadClass::from_highway_tag(highway)));
        }
        if closed && is_water_body(tags) {
            return Some(FeatureKind::Water);
        }
        if let Some(waterway) = tags.get("waterway")
            && matches!(waterway.as_str(), "river" | "stream" | "canal" | "drain" | "ditch")
        {
            return Some(FeatureKind::Waterway);
        }
        None
    }

    pub fn is_polygon(self) -> bool {
        matches!(
            self,
            FeatureKind::Building | FeatureKind::BuildingPart | FeatureKind::Water
        )
    }
}

fn is_water_body(tags: &Tags) -> bool {
    tags.get("natural").is_some_and(|v| v == "water")
        || tags.get("waterway").is_some_and(|v| v == "riverbank")
        || tags
            .get("landuse")
            .is_some_and(|v| v == "reservoir" || v == "basin")
}

/// A way with resolved coordinates, as handed over by the vector-data fetcher
#[derive(Debug, Clone)]
pub struct VectorFeature {
    pub id: u64,
    pub kind: FeatureKind,
    pub tags: Tags,
    /// Points as (lat, lon) pairs in WGS84
    pub points: Vec<(f64, f64)>,
}

impl VectorFeature {
    pub fn new(id: u64, kind: FeatureKind, tags: Tags, points: Vec<(f64, f64)>) -> Self {
        Self {
            id,
            kind,
            tags,
            points,
        }
    }

    /// Enough points for the feature's geometry type
    pub fn is_valid(&self) -> bool {
        if self.kind.is_polygon() {
            self.points.len() >= 3
        } else {
            self.points.len() >= 2
        }
    }
}
