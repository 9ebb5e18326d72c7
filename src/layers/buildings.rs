use log::debug;

use crate::config::{GenerationOptions, terrain};
use crate::domain::{BuildingVolume, FeatureKind, VectorFeature};
use crate::generator::GenerationStats;
use crate::geometry::footprint::centroid;
use crate::geometry::{Bounds, Footprint, PlanarPoint, Projector, normalize_footprint};
use crate::mesh::{Mesh, extrude_footprint, normalize_ring};

use super::terrain::TerrainSurface;

/// A building or part footprint that survived projection and clamping
struct PlacedFootprint<'a> {
    feature: &'a VectorFeature,
    ring: Vec<PlanarPoint>,
}

impl PlacedFootprint<'_> {
    fn is_part(&self) -> bool {
        self.feature.kind == FeatureKind::BuildingPart
    }
}

/// Generate all building volumes
///
/// Building parts win over the building they belong to: a plain building is
/// skipped when its outline contains the centroid of any part.
pub fn generate_buildings(
    features: &[VectorFeature],
    projector: &Projector,
    surface: &TerrainSurface,
    options: &GenerationOptions,
    stats: &mut GenerationStats,
) -> Mesh {
    let placed = place_footprints(features, projector, options.radius, stats);

    let part_centroids: Vec<PlanarPoint> = placed
        .iter()
        .filter(|f| f.is_part())
        .map(|f| centroid(&f.ring))
        .collect();

    let mut mesh = Mesh::new();

    for footprint in &placed {
        if !footprint.is_part() {
            if covers_any_part(&footprint.ring, &part_centroids) {
                stats.buildings_replaced_by_parts += 1;
                continue;
            }
            if below_detail_level(&footprint.ring, options.resolution) {
                stats.buildings_lod_skipped += 1;
                continue;
            }
        }

        let volume = BuildingVolume::from_tags(&footprint.feature.tags, options.is_3d);
        let building = extrude_building(&footprint.ring, volume, surface, options);
        if building.is_empty() {
            debug!("Building {} did not triangulate", footprint.feature.id);
            stats.invalid_footprints += 1;
            continue;
        }

        if footprint.is_part() {
            stats.building_parts += 1;
        } else {
            stats.buildings += 1;
        }
        mesh.append(&building);
    }

    mesh
}

fn place_footprints<'a>(
    features: &'a [VectorFeature],
    projector: &Projector,
    radius: f64,
    stats: &mut GenerationStats,
) -> Vec<PlacedFootprint<'a>> {
    features
        .iter()
        .filter(|f| matches!(f.kind, FeatureKind::Building | FeatureKind::BuildingPart))
        .filter_map(|feature| {
            if !feature.is_valid() {
                stats.invalid_footprints += 1;
                return None;
            }
            // outside the map entirely
            let points = normalize_footprint(&feature.points, projector, radius)?;
            let ring = normalize_ring(&points);
            if ring.len() < 3 {
                stats.invalid_footprints += 1;
                return None;
            }
            Some(PlacedFootprint { feature, ring })
        })
        .collect()
}

fn covers_any_part(ring: &[PlanarPoint], part_centroids: &[PlanarPoint]) -> bool {
    if part_centroids.is_empty() {
        return false;
    }
    Footprint::new(ring).is_some_and(|outline| part_centroids.iter().any(|&c| outline.contains(c)))
}

/// Small buildings are dropped at low resolution
fn below_detail_level(ring: &[PlanarPoint], resolution: u32) -> bool {
    if resolution >= terrain::BUILDING_LOD_RESOLUTION {
        return false;
    }
    let min_area = 100.0 - resolution as f64 * 0.5;
    Bounds::from_points(ring).is_some_and(|b| b.area() < min_area)
}

/// Extrude one footprint onto the terrain
///
/// The floor follows the terrain (sunk slightly so it fuses with the ground)
/// unless the volume starts above ground, in which case it is flat at the
/// lowest terrain point plus `min_height`. The roof is flat.
fn extrude_building(
    ring: &[PlanarPoint],
    volume: BuildingVolume,
    surface: &TerrainSurface,
    options: &GenerationOptions,
) -> Mesh {
    let ground = |p: PlanarPoint| surface.height_at(p) + options.building_offset;
    let lowest_ground = ring.iter().map(|&p| ground(p)).fold(f64::INFINITY, f64::min);

    let floor = |p: PlanarPoint| {
        if volume.min_height > 0.0 {
            lowest_ground + volume.min_height
        } else {
            ground(p) - terrain::BUILDING_SINK
        }
    };

    let (min_floor, max_floor) = ring
        .iter()
        .map(|&p| floor(p))
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), y| (lo.min(y), hi.max(y)));
    let height = volume.max_height - volume.min_height;
    let roof = (min_floor + height).max(max_floor + terrain::MIN_ROOF_CLEARANCE);

    extrude_footprint(ring, floor, roof)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Tags;
    use crate::geometry::ElevationGrid;
    use crate::mesh::validate_mesh;

    const METERS_PER_DEGREE: f64 = 6378137.0 * std::f64::consts::PI / 180.0;

    fn rect(id: u64, kind: FeatureKind, x0: f64, z0: f64, x1: f64, z1: f64, tags: &[(&str, &str)]) -> VectorFeature {
        let points = [(x0, z0), (x1, z0), (x1, z1), (x0, z1), (x0, z0)]
            .iter()
            .map(|&(x, z)| (-z / METERS_PER_DEGREE, x / METERS_PER_DEGREE))
            .collect();
        let tags: Tags = tags.iter().map(|&(k, v)| (k.to_string(), v.to_string())).collect();
        VectorFeature::new(id, kind, tags, points)
    }

    fn run(features: &[VectorFeature], options: &GenerationOptions) -> (Mesh, GenerationStats) {
        let mut stats = GenerationStats::default();
        let projector = Projector::new(options.center);
        let mesh = generate_buildings(features, &projector, &TerrainSurface::flat(), options, &mut stats);
        (mesh, stats)
    }

    fn height_range(mesh: &Mesh) -> (f64, f64) {
        mesh.positions
            .iter()
            .fold((f64::MAX, f64::MIN), |(lo, hi), p| (lo.min(p[1]), hi.max(p[1])))
    }

    #[test]
    fn test_plain_building_volume() {
        let building = rect(1, FeatureKind::Building, -10.0, -10.0, 10.0, 10.0, &[("height", "12")]);
        let (mesh, stats) = run(&[building], &GenerationOptions::new((0.0, 0.0), 100.0));

        assert_eq!(mesh.len(), 12);
        assert_eq!(stats.buildings, 1);
        let (floor, roof) = height_range(&mesh);
        assert!((floor + terrain::BUILDING_SINK).abs() < 1e-9);
        assert!((roof - floor - 12.0).abs() < 1e-9);
        assert!(validate_mesh(&mesh).is_watertight());
    }

    #[test]
    fn test_part_replaces_building() {
        let building = rect(1, FeatureKind::Building, -20.0, -20.0, 20.0, 20.0, &[("height", "30")]);
        let part = rect(2, FeatureKind::BuildingPart, -5.0, -5.0, 5.0, 5.0, &[("height", "50")]);
        let (mesh, stats) = run(&[building, part], &GenerationOptions::new((0.0, 0.0), 100.0));

        assert_eq!(stats.buildings, 0);
        assert_eq!(stats.building_parts, 1);
        assert_eq!(stats.buildings_replaced_by_parts, 1);
        assert_eq!(mesh.len(), 12);
        assert!(mesh.positions.iter().all(|p| p[0].abs() <= 5.0 + 1e-9));
    }

    #[test]
    fn test_raised_part_floats() {
        let part = rect(
            3,
            FeatureKind::BuildingPart,
            -5.0,
            -5.0,
            5.0,
            5.0,
            &[("min_height", "10"), ("height", "25")],
        );
        let (mesh, _) = run(&[part], &GenerationOptions::new((0.0, 0.0), 100.0));

        let (floor, roof) = height_range(&mesh);
        assert!((floor - 10.0).abs() < 1e-9);
        assert!((roof - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_roof_clears_sloped_floor() {
        let grid = ElevationGrid::new(2, 100.0, vec![0.0, 100.0, 0.0, 100.0]).unwrap();
        let surface = TerrainSurface::new(Some(&grid), 0.0);
        let options = GenerationOptions::new((0.0, 0.0), 100.0);
        let building = rect(4, FeatureKind::Building, -50.0, -5.0, 50.0, 5.0, &[("height", "3")]);

        let mut stats = GenerationStats::default();
        let mesh = generate_buildings(&[building], &Projector::new((0.0, 0.0)), &surface, &options, &mut stats);

        // floor spans 37.5..112.5 m after exaggeration; 3 m would sink the roof
        let (_, roof) = height_range(&mesh);
        let highest_floor = 112.5 - terrain::BUILDING_SINK;
        assert!((roof - (highest_floor + terrain::MIN_ROOF_CLEARANCE)).abs() < 1e-6);
        assert!(validate_mesh(&mesh).is_watertight());
    }

    #[test]
    fn test_small_buildings_dropped_at_low_resolution() {
        let shed = rect(5, FeatureKind::Building, 0.0, 0.0, 5.0, 5.0, &[]);
        let options = GenerationOptions::new((0.0, 0.0), 100.0).with_resolution(40);
        let (mesh, stats) = run(&[shed.clone()], &options);
        assert!(mesh.is_empty());
        assert_eq!(stats.buildings_lod_skipped, 1);

        // 25 m² survives at full resolution
        let (mesh, _) = run(&[shed], &GenerationOptions::new((0.0, 0.0), 100.0));
        assert_eq!(mesh.len(), 12);
    }

    #[test]
    fn test_corner_clamped_building_is_closed() {
        // two vertices lie past the same map corner and clamp onto it
        let corners = [(90.0, 90.0), (110.0, 90.0), (120.0, 110.0), (105.0, 120.0), (90.0, 110.0), (90.0, 90.0)];
        let points = corners
            .iter()
            .map(|&(x, z)| (-z / METERS_PER_DEGREE, x / METERS_PER_DEGREE))
            .collect();
        let building = VectorFeature::new(9, FeatureKind::Building, Tags::new(), points);

        let (mesh, stats) = run(&[building], &GenerationOptions::new((0.0, 0.0), 100.0));

        assert_eq!(stats.buildings, 1);
        assert_eq!(mesh.len(), 12);
        assert!(validate_mesh(&mesh).is_watertight());
    }

    #[test]
    fn test_outside_and_invalid_skipped() {
        let far = rect(6, FeatureKind::Building, 500.0, 500.0, 510.0, 510.0, &[]);
        let mut line = rect(7, FeatureKind::Building, 0.0, 0.0, 10.0, 10.0, &[]);
        line.points.truncate(2);

        let (mesh, stats) = run(&[far, line], &GenerationOptions::new((0.0, 0.0), 100.0));
        assert!(mesh.is_empty());
        assert_eq!(stats.invalid_footprints, 1);
    }

    #[test]
    fn test_building_offset() {
        let building = rect(8, FeatureKind::Building, -10.0, -10.0, 10.0, 10.0, &[("height", "5")]);
        let options = GenerationOptions::new((0.0, 0.0), 100.0).with_building_offset(2.0);
        let (mesh, _) = run(&[building], &options);

        let (floor, roof) = height_range(&mesh);
        assert!((floor - (2.0 - terrain::BUILDING_SINK)).abs() < 1e-9);
        assert!((roof - floor - 5.0).abs() < 1e-9);
    }
}
