use crate::config::{GenerationOptions, terrain};
use crate::domain::{FeatureKind, VectorFeature};
use crate::geometry::footprint::distance_to_polyline;
use crate::geometry::{Footprint, PlanarPoint, Projector, normalize_footprint};
use crate::mesh::{Mesh, extrude_ribbon, normalize_ring, triangulate_ring};

use super::terrain::TerrainSurface;

/// Water features projected onto the map, used both for carving the ground
/// and for the water surface fragment
#[derive(Debug, Default)]
pub struct WaterBodies {
    polygons: Vec<(Vec<PlanarPoint>, Footprint)>,
    waterways: Vec<Vec<PlanarPoint>>,
}

impl WaterBodies {
    /// Collect water polygons and waterway centerlines inside the map
    pub fn collect(features: &[VectorFeature], projector: &Projector, radius: f64) -> Self {
        let mut bodies = Self::default();

        for feature in features.iter().filter(|f| f.is_valid()) {
            match feature.kind {
                FeatureKind::Water => {
                    let Some(points) = normalize_footprint(&feature.points, projector, radius) else {
                        continue;
                    };
                    let ring = normalize_ring(&points);
                    if let Some(footprint) = Footprint::new(&ring) {
                        bodies.polygons.push((ring, footprint));
                    }
                }
                FeatureKind::Waterway => {
                    if let Some(line) = normalize_footprint(&feature.points, projector, radius) {
                        bodies.waterways.push(line);
                    }
                }
                _ => {}
            }
        }

        bodies
    }

    pub fn polygon_count(&self) -> usize {
        self.polygons.len()
    }

    pub fn waterway_count(&self) -> usize {
        self.waterways.len()
    }

    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty() && self.waterways.is_empty()
    }

    /// Inside a water polygon or close enough to a waterway to be carved
    pub fn covers(&self, p: PlanarPoint) -> bool {
        self.polygons.iter().any(|(_, footprint)| footprint.contains(p))
            || self
                .waterways
                .iter()
                .any(|line| distance_to_polyline(p, line) <= terrain::WATERWAY_CARVE_DISTANCE)
    }
}

/// Build the water surface fragment
///
/// Polygons are triangulated flat on the carved terrain and waterways become
/// ribbons as wide as their carved band, both lifted slightly above the carved
/// bottom.
pub fn generate_water_surface(
    water: &WaterBodies,
    surface: &TerrainSurface,
    options: &GenerationOptions,
) -> Mesh {
    let carve = options.water_depth.max(0.0) * terrain::VERTICAL_EXAGGERATION;
    let foundation = options.foundation_level();
    let level = |p: PlanarPoint| {
        (surface.height_at(p) - carve).max(foundation) + terrain::WATER_SURFACE_LIFT
    };

    let mut mesh = Mesh::new();

    for (ring, _) in &water.polygons {
        let base = mesh.vertex_count() as u32;
        for p in ring {
            mesh.add_vertex([p.x, level(*p), p.z]);
        }
        for [a, b, c] in triangulate_ring(ring) {
            // reversed so the surface faces up
            mesh.add_triangle(base + c as u32, base + b as u32, base + a as u32);
        }
    }

    let width = 2.0 * terrain::WATERWAY_CARVE_DISTANCE;
    for line in &water.waterways {
        mesh.append(&extrude_ribbon(line, width, 0.0, &level));
    }

    mesh
}
