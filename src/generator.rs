//! Turns vector features and an optional elevation grid into printable mesh
//! fragments.
//!
//! Generation never fails: unusable footprints are skipped and counted in
//! [`GenerationStats`], a missing elevation grid means flat terrain, and the
//! ground plus foundation are always produced.

use log::{debug, info};

use crate::config::GenerationOptions;
use crate::domain::VectorFeature;
use crate::geometry::{ElevationGrid, Projector};
use crate::layers::{
    TerrainSurface, WaterBodies, generate_buildings, generate_foundation, generate_ground, generate_roads,
    generate_water_surface, without_bottom_cap,
};
use crate::mesh::Mesh;

/// Counters collected while generating one model
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationStats {
    pub buildings: usize,
    pub building_parts: usize,
    /// Plain buildings skipped because a part covers them
    pub buildings_replaced_by_parts: usize,
    /// Small buildings dropped at low resolution
    pub buildings_lod_skipped: usize,
    /// Footprints with too few points or that did not triangulate
    pub invalid_footprints: usize,
    pub roads: usize,
    /// Narrow roads dropped at low resolution
    pub roads_lod_skipped: usize,
    /// Roads whose every segment was too short to extrude
    pub roads_degenerate: usize,
    pub water_bodies: usize,
    pub waterways: usize,
    pub elevation_used: bool,
}

/// Independent meshes of one model, one per print material
#[derive(Debug, Clone, Default)]
pub struct MapFragments {
    pub ground: Mesh,
    pub water: Mesh,
    pub foundation: Mesh,
    pub buildings: Mesh,
    pub roads: Mesh,
    pub stats: GenerationStats,
}

impl MapFragments {
    /// Named fragments in export order
    pub fn layers(&self) -> [(&'static str, &Mesh); 5] {
        [
            ("foundation", &self.foundation),
            ("ground", &self.ground),
            ("water", &self.water),
            ("buildings", &self.buildings),
            ("roads", &self.roads),
        ]
    }

    /// All fragments combined into one mesh
    ///
    /// The ground's bottom cap is left out when a foundation slab exists, so
    /// the ground rests on the slab's top face instead of doubling it.
    pub fn merged(&self) -> Mesh {
        let mut merged = Mesh::new();
        for (name, mesh) in self.layers() {
            if name == "ground" && !self.foundation.is_empty() {
                merged.append(&without_bottom_cap(mesh));
            } else {
                merged.append(mesh);
            }
        }
        merged
    }

    pub fn triangle_count(&self) -> usize {
        self.layers().iter().map(|(_, mesh)| mesh.len()).sum()
    }
}

pub trait MapGenerator {
    fn generate(
        &self,
        features: &[VectorFeature],
        elevation: Option<&ElevationGrid>,
        options: &GenerationOptions,
    ) -> MapFragments;
}

/// Generator for OpenStreetMap style vector features
#[derive(Debug, Clone, Copy, Default)]
pub struct OsmMeshGenerator;

impl MapGenerator for OsmMeshGenerator {
    fn generate(
        &self,
        features: &[VectorFeature],
        elevation: Option<&ElevationGrid>,
        options: &GenerationOptions,
    ) -> MapFragments {
        let mut stats = GenerationStats::default();
        let projector = Projector::new(options.center);

        let grid = elevation.filter(|_| options.elevation_enabled);
        let reference = options.ground_level.reference(grid);
        let surface = TerrainSurface::new(grid, reference);
        stats.elevation_used = surface.has_elevation();
        if let Some(grid) = grid {
            debug!(
                "Elevation grid {}x{}, raw {:.1}..{:.1} m, reference {:.1} m",
                grid.size(),
                grid.size(),
                grid.min_sample(),
                grid.max_sample(),
                reference
            );
        }

        let water = WaterBodies::collect(features, &projector, options.radius);
        stats.water_bodies = water.polygon_count();
        stats.waterways = water.waterway_count();

        let ground = generate_ground(options, &surface, &water);
        let foundation = generate_foundation(options);
        let water_mesh = generate_water_surface(&water, &surface, options);
        let buildings = generate_buildings(features, &projector, &surface, options, &mut stats);
        let roads = generate_roads(features, &projector, &surface, options, &mut stats);

        info!(
            "Generated {} buildings, {} parts, {} roads, {} water bodies, {} waterways",
            stats.buildings, stats.building_parts, stats.roads, stats.water_bodies, stats.waterways
        );
        debug!("{:?}", stats);

        MapFragments {
            ground,
            water: water_mesh,
            foundation,
            buildings,
            roads,
            stats,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BaseShape;
    use crate::domain::{FeatureKind, RoadClass, Tags};
    use crate::mesh::{triangle_normal, validate_mesh};
    use approx::assert_relative_eq;

    const CENTER: (f64, f64) = (47.3769, 8.5417);

    /// (lat, lon) for a planar offset from `CENTER`
    fn latlon(x: f64, z: f64) -> (f64, f64) {
        let meters_per_degree = 6378137.0 * std::f64::consts::PI / 180.0;
        let lat = CENTER.0 - z / meters_per_degree;
        let lon = CENTER.1 + x / (meters_per_degree * CENTER.0.to_radians().cos());
        (lat, lon)
    }

    fn tags(pairs: &[(&str, &str)]) -> Tags {
        pairs
            .iter()
            .map(|&(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn polygon(id: u64, kind: FeatureKind, corners: &[(f64, f64)], tag_pairs: &[(&str, &str)]) -> VectorFeature {
        let mut points: Vec<(f64, f64)> = corners.iter().map(|&(x, z)| latlon(x, z)).collect();
        points.push(points[0]);
        VectorFeature::new(id, kind, tags(tag_pairs), points)
    }

    fn square(half: f64) -> Vec<(f64, f64)> {
        vec![(-half, -half), (half, -half), (half, half), (-half, half)]
    }

    fn options() -> GenerationOptions {
        GenerationOptions::new(CENTER, 200.0)
    }

    #[test]
    fn test_empty_square_model() {
        let opts = GenerationOptions::new(CENTER, 500.0).with_resolution(100);
        let fragments = OsmMeshGenerator.generate(&[], None, &opts);

        // grid + skirt quads + cap fan
        assert_eq!(fragments.ground.len(), 2 * 100 * 100 + 8 * 100 + 4 * 100);
        assert_eq!(fragments.foundation.len(), 12);
        assert!(fragments.buildings.is_empty());
        assert!(fragments.roads.is_empty());
        assert!(fragments.water.is_empty());
        assert!(!fragments.stats.elevation_used);

        // flat: every ground vertex is at 0 or on the foundation
        let foundation = opts.foundation_level();
        assert!(
            fragments
                .ground
                .positions
                .iter()
                .all(|p| p[1] == 0.0 || p[1] == foundation)
        );
        assert!(validate_mesh(&fragments.ground).is_watertight());
    }

    #[test]
    fn test_merged_ground_rests_on_slab() {
        let opts = GenerationOptions::new(CENTER, 500.0).with_resolution(100);
        let fragments = OsmMeshGenerator.generate(&[], None, &opts);
        let merged = fragments.merged();

        assert_eq!(merged.len(), fragments.triangle_count() - 4 * 100);

        // only the slab's upward top remains at the foundation level
        let foundation = opts.foundation_level();
        let at_foundation: Vec<_> = merged
            .triangle_positions()
            .filter(|t| t.iter().all(|p| (p[1] - foundation).abs() < 1e-9))
            .collect();
        assert_eq!(at_foundation.len(), 2);
        assert!(at_foundation.iter().all(|t| triangle_normal(t)[1] > 0.99));
    }

    #[test]
    fn test_rectangle_building() {
        let building = polygon(
            1,
            FeatureKind::Building,
            &[(-10.0, -6.0), (10.0, -6.0), (10.0, 6.0), (-10.0, 6.0)],
            &[("building", "yes"), ("height", "12")],
        );
        let fragments = OsmMeshGenerator.generate(&[building], None, &options());

        let mesh = &fragments.buildings;
        assert_eq!(mesh.len(), 12);
        let floor = mesh.positions.iter().map(|p| p[1]).fold(f64::MAX, f64::min);
        let roof = mesh.positions.iter().map(|p| p[1]).fold(f64::MIN, f64::max);
        assert_relative_eq!(roof - floor, 12.0, epsilon = 1e-9);
        assert!(validate_mesh(mesh).is_watertight());
    }

    #[test]
    fn test_part_suppresses_building() {
        let building = polygon(1, FeatureKind::Building, &square(30.0), &[("building", "yes")]);
        let part = polygon(
            2,
            FeatureKind::BuildingPart,
            &square(10.0),
            &[("building:part", "yes"), ("building:levels", "4")],
        );
        let fragments = OsmMeshGenerator.generate(&[building, part], None, &options());

        assert_eq!(fragments.stats.buildings, 0);
        assert_eq!(fragments.stats.building_parts, 1);
        assert_eq!(fragments.buildings.len(), 12);
    }

    #[test]
    fn test_short_road_produces_nothing() {
        let road = VectorFeature::new(
            3,
            FeatureKind::Road(RoadClass::Local),
            tags(&[("highway", "residential")]),
            vec![latlon(0.0, 0.0), latlon(0.05, 0.0)],
        );
        let fragments = OsmMeshGenerator.generate(&[road], None, &options());
        assert!(fragments.roads.is_empty());
    }

    #[test]
    fn test_water_is_carved() {
        let lake = polygon(4, FeatureKind::Water, &square(50.0), &[("natural", "water")]);
        let fragments = OsmMeshGenerator.generate(&[lake], None, &options());

        assert_eq!(fragments.stats.water_bodies, 1);
        assert!(!fragments.water.is_empty());

        let lowest_surface = fragments
            .ground
            .positions
            .iter()
            .filter(|p| p[0].abs() < 40.0 && p[2].abs() < 40.0)
            .map(|p| p[1])
            .fold(f64::MAX, f64::min);
        assert_relative_eq!(lowest_surface, -3.0, epsilon = 1e-9);
        assert!(validate_mesh(&fragments.ground).is_watertight());
    }

    #[test]
    fn test_elevation_toggle() {
        let grid = ElevationGrid::new(2, 200.0, vec![400.0, 410.0, 420.0, 430.0]).unwrap();

        let with = OsmMeshGenerator.generate(&[], Some(&grid), &options());
        assert!(with.stats.elevation_used);
        let highest = with.ground.positions.iter().map(|p| p[1]).fold(f64::MIN, f64::max);
        assert_relative_eq!(highest, 45.0, epsilon = 1e-9);

        let mut flat_options = options();
        flat_options.elevation_enabled = false;
        let without = OsmMeshGenerator.generate(&[], Some(&grid), &flat_options);
        assert!(!without.stats.elevation_used);
        assert!(without.ground.positions.iter().all(|p| p[1] <= 0.0));
    }

    #[test]
    fn test_merged_indices_valid() {
        let features = vec![
            polygon(1, FeatureKind::Building, &square(8.0), &[("building", "yes")]),
            polygon(5, FeatureKind::Water, &[(60.0, 60.0), (90.0, 60.0), (90.0, 90.0)], &[]),
            VectorFeature::new(
                6,
                FeatureKind::Road(RoadClass::Primary),
                tags(&[("highway", "primary")]),
                vec![latlon(-150.0, 20.0), latlon(150.0, 20.0)],
            ),
        ];
        let opts = options().with_base_shape(BaseShape::Circular).with_road_thickness(0.5);
        let fragments = OsmMeshGenerator.generate(&features, None, &opts);

        let merged = fragments.merged();
        // ground bottom cap dropped in favour of the slab top
        let cap = 4 * opts.grid_divisions() as usize;
        assert_eq!(merged.len(), fragments.triangle_count() - cap);
        assert_eq!(merged.vertex_count(), fragments.layers().iter().map(|(_, m)| m.vertex_count()).sum::<usize>());

        let report = validate_mesh(&merged);
        assert_eq!(report.invalid_indices, 0);
        assert_eq!(report.invalid_coords, 0);
        assert!(validate_mesh(&fragments.ground).is_watertight());
        assert!(validate_mesh(&fragments.foundation).is_watertight());
        assert!(validate_mesh(&fragments.buildings).is_watertight());
    }
}
