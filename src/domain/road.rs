/// Road classification based on OSM highway tags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoadClass {
    Motorway,
    Primary,
    Secondary,
    /// Paths, footways and other narrow non-motorised ways
    Path,
    /// Everything else carrying a highway tag
    Local,
}

impl RoadClass {
    /// Classify a highway tag value into a RoadClass
    pub fn from_highway_tag(tag: &str) -> RoadClass {
        match tag {
            "motorway" | "motorway_link" | "trunk" | "trunk_link" => RoadClass::Motorway,
            "primary" | "primary_link" => RoadClass::Primary,
            "secondary" | "secondary_link" => RoadClass::Secondary,
            "path" | "footway" | "cycleway" | "bridleway" | "steps" => RoadClass::Path,
            _ => RoadClass::Local,
        }
    }

    /// Ribbon width in meters
    pub fn width(self) -> f64 {
        match self {
            RoadClass::Motorway | RoadClass::Primary => 6.0,
            RoadClass::Secondary => 4.0,
            RoadClass::Path => 1.5,
            RoadClass::Local => 3.0,
        }
    }
}
