use crate::config::{GenerationOptions, terrain};
use crate::domain::{FeatureKind, RoadClass, VectorFeature};
use crate::generator::GenerationStats;
use crate::geometry::{PlanarPoint, Projector, normalize_footprint};
use crate::mesh::{Mesh, extrude_ribbon};

use super::terrain::TerrainSurface;

/// Narrow road classes are dropped at low resolution
pub fn is_visible(class: RoadClass, resolution: u32) -> bool {
    resolution >= terrain::PATH_LOD_RESOLUTION || class.width() >= terrain::PATH_LOD_WIDTH
}

/// Generate ribbon meshes for all roads
///
/// Ribbons float `ROAD_CLEARANCE` above the terrain at every segment
/// endpoint. With a positive `road_thickness` each segment is a closed box.
///
/// # Arguments
/// * `features` - All vector features; non-roads are ignored
/// * `projector` - Coordinate projector (lat/lon → meters)
/// * `surface` - Terrain height lookup
/// * `options` - Generation settings (radius, resolution, road thickness)
/// * `stats` - Counters updated with built and skipped roads
pub fn generate_roads(
    features: &[VectorFeature],
    projector: &Projector,
    surface: &TerrainSurface,
    options: &GenerationOptions,
    stats: &mut GenerationStats,
) -> Mesh {
    let mut mesh = Mesh::new();
    let top = |p: PlanarPoint| surface.height_at(p) + terrain::ROAD_CLEARANCE;

    for feature in features {
        let FeatureKind::Road(class) = feature.kind else {
            continue;
        };
        if !feature.is_valid() {
            continue;
        }
        if !is_visible(class, options.resolution) {
            stats.roads_lod_skipped += 1;
            continue;
        }
        let Some(points) = normalize_footprint(&feature.points, projector, options.radius) else {
            continue;
        };

        let ribbon = extrude_ribbon(&points, class.width(), options.road_thickness, &top);
        if ribbon.is_empty() {
            stats.roads_degenerate += 1;
            continue;
        }
        stats.roads += 1;
        mesh.append(&ribbon);
    }

    mesh
}
