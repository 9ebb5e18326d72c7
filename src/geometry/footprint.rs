use geo::{Contains, Coord, LineString, Point, Polygon};

use super::{PlanarPoint, Projector};

/// Axis-aligned bounding box on the ground plane (meters)
#[derive(Debug, Clone)]
pub struct Bounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_z: f64,
    pub max_z: f64,
}

impl Bounds {
    /// Create bounds from a set of points
    pub fn from_points(points: &[PlanarPoint]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }

        let mut bounds = Self {
            min_x: f64::MAX,
            max_x: f64::MIN,
            min_z: f64::MAX,
            max_z: f64::MIN,
        };
        for p in points {
            bounds.min_x = bounds.min_x.min(p.x);
            bounds.max_x = bounds.max_x.max(p.x);
            bounds.min_z = bounds.min_z.min(p.z);
            bounds.max_z = bounds.max_z.max(p.z);
        }
        Some(bounds)
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn depth(&self) -> f64 {
        self.max_z - self.min_z
    }

    pub fn area(&self) -> f64 {
        self.width() * self.depth()
    }
}

/// Project raw (lat, lon) points and clamp them into `[-radius, radius]²`
///
/// Returns `None` when no raw vertex lies inside the square, so that far-away
/// ways are not dragged onto the map edge by clamping alone. Clamping is
/// per-vertex, not a polygon clip: footprints straddling the edge can come out
/// degenerate.
pub fn normalize_footprint(
    points: &[(f64, f64)],
    projector: &Projector,
    radius: f64,
) -> Option<Vec<PlanarPoint>> {
    let raw = projector.project_points(points);

    let any_inside = raw.iter().any(|p| p.x.abs() <= radius && p.z.abs() <= radius);
    if !any_inside {
        return None;
    }

    Some(
        raw.into_iter()
            .map(|p| PlanarPoint::new(p.x.clamp(-radius, radius), p.z.clamp(-radius, radius)))
            .collect(),
    )
}

/// Arithmetic mean of the footprint vertices
pub fn centroid(points: &[PlanarPoint]) -> PlanarPoint {
    if points.is_empty() {
        return PlanarPoint::default();
    }
    let n = points.len() as f64;
    let (sx, sz) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sz), p| (sx + p.x, sz + p.z));
    PlanarPoint::new(sx / n, sz / n)
}

/// Shoelace signed area in the (x, z) plane
///
/// Positive for rings running counter-clockwise with x to the right and z up.
pub fn signed_area(points: &[PlanarPoint]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let twice: f64 = (0..n)
        .map(|i| {
            let a = points[i];
            let b = points[(i + 1) % n];
            a.x * b.z - b.x * a.z
        })
        .sum();
    twice / 2.0
}

/// Planar footprint wrapped for point containment queries
#[derive(Debug, Clone)]
pub struct Footprint {
    polygon: Polygon<f64>,
}

impl Footprint {
    /// `None` for rings with fewer than three points
    pub fn new(points: &[PlanarPoint]) -> Option<Self> {
        if points.len() < 3 {
            return None;
        }
        let ring: LineString<f64> = points.iter().map(|p| Coord { x: p.x, y: p.z }).collect();
        Some(Self {
            polygon: Polygon::new(ring, Vec::new()),
        })
    }

    /// Strict interior test; points on the outline are outside
    pub fn contains(&self, p: PlanarPoint) -> bool {
        self.polygon.contains(&Point::new(p.x, p.z))
    }
}

/// Shortest distance from `p` to the polyline through `line`
pub fn distance_to_polyline(p: PlanarPoint, line: &[PlanarPoint]) -> f64 {
    match line {
        [] => f64::INFINITY,
        [only] => only.distance_squared(&p).sqrt(),
        _ => line
            .windows(2)
            .map(|seg| distance_to_segment(p, seg[0], seg[1]))
            .fold(f64::INFINITY, f64::min),
    }
}

fn distance_to_segment(p: PlanarPoint, a: PlanarPoint, b: PlanarPoint) -> f64 {
    let (dx, dz) = (b.x - a.x, b.z - a.z);
    let len_sq = dx * dx + dz * dz;
    if len_sq < 1e-12 {
        return a.distance_squared(&p).sqrt();
    }
    let t = (((p.x - a.x) * dx + (p.z - a.z) * dz) / len_sq).clamp(0.0, 1.0);
    let closest = PlanarPoint::new(a.x + t * dx, a.z + t * dz);
    closest.distance_squared(&p).sqrt()
}
