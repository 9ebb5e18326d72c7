//! Ear-clipping triangulation of simple polygons on the ground plane
//!
//! All rings are brought to positive signed area in (x, z) before clipping, so
//! every emitted triangle has positive 2D orientation. In the y-up mesh that
//! means a triangle used as-is faces down and a reversed one faces up.

use crate::geometry::PlanarPoint;
use crate::geometry::footprint::signed_area;

/// Vertices closer than this (squared meters) are treated as one
const DUPLICATE_DISTANCE_SQ: f64 = 1e-18;

/// Drop repeated vertices, including a closing one, and orient the ring to
/// positive signed area
///
/// Repeats are common after clamping footprints to the map corner.
pub fn normalize_ring(points: &[PlanarPoint]) -> Vec<PlanarPoint> {
    let mut ring = points.to_vec();
    ring.dedup_by(|a, b| a.distance_squared(b) < DUPLICATE_DISTANCE_SQ);
    while ring.len() > 1 && ring[0].distance_squared(&ring[ring.len() - 1]) < DUPLICATE_DISTANCE_SQ {
        ring.pop();
    }
    if signed_area(&ring) < 0.0 {
        ring.reverse();
    }
    ring
}

/// Triangulate a polygon given as a ring already passed through [`normalize_ring`]
///
/// Returns index triples into `ring`. Simple polygons yield `n - 2` triangles;
/// degenerate or self-intersecting input stops after `2 * n` clipping rounds
/// and keeps whatever was produced so far.
pub fn triangulate_ring(ring: &[PlanarPoint]) -> Vec<[usize; 3]> {
    let mut triangles = Vec::new();
    if ring.len() < 3 {
        return triangles;
    }

    let mut remaining: Vec<usize> = (0..ring.len()).collect();
    let max_iterations = ring.len() * 2;
    let mut iterations = 0;

    while remaining.len() > 3 && iterations < max_iterations {
        iterations += 1;

        let Some(ear) = find_ear(ring, &remaining) else {
            break;
        };
        let n = remaining.len();
        let prev = remaining[(ear + n - 1) % n];
        let next = remaining[(ear + 1) % n];
        triangles.push([prev, remaining[ear], next]);
        remaining.remove(ear);
    }

    if remaining.len() == 3 {
        triangles.push([remaining[0], remaining[1], remaining[2]]);
    }

    triangles
}

/// Triangulate an arbitrary-winding polygon into point triples
pub fn triangulate(polygon: &[PlanarPoint]) -> Vec<(PlanarPoint, PlanarPoint, PlanarPoint)> {
    let ring = normalize_ring(polygon);
    triangulate_ring(&ring)
        .into_iter()
        .map(|[a, b, c]| (ring[a], ring[b], ring[c]))
        .collect()
}

fn find_ear(ring: &[PlanarPoint], remaining: &[usize]) -> Option<usize> {
    let n = remaining.len();
    (0..n).find(|&i| {
        let prev = (i + n - 1) % n;
        let next = (i + 1) % n;
        let (a, b, c) = (ring[remaining[prev]], ring[remaining[i]], ring[remaining[next]]);

        is_convex(a, b, c)
            && !remaining
                .iter()
                .enumerate()
                .filter(|&(j, _)| j != prev && j != i && j != next)
                .any(|(_, &idx)| point_in_triangle(ring[idx], a, b, c))
    })
}

fn cross(o: PlanarPoint, a: PlanarPoint, b: PlanarPoint) -> f64 {
    (a.x - o.x) * (b.z - o.z) - (a.z - o.z) * (b.x - o.x)
}

fn is_convex(a: PlanarPoint, b: PlanarPoint, c: PlanarPoint) -> bool {
    cross(a, b, c) > 0.0
}

/// Barycentric sign test; points on an edge count as inside
fn point_in_triangle(p: PlanarPoint, a: PlanarPoint, b: PlanarPoint, c: PlanarPoint) -> bool {
    let d1 = cross(a, b, p);
    let d2 = cross(b, c, p);
    let d3 = cross(c, a, p);

    let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
    let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;

    !(has_neg && has_pos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn pts(coords: &[(f64, f64)]) -> Vec<PlanarPoint> {
        coords.iter().map(|&(x, z)| PlanarPoint::new(x, z)).collect()
    }

    fn tri_area(t: &(PlanarPoint, PlanarPoint, PlanarPoint)) -> f64 {
        cross(t.0, t.1, t.2) / 2.0
    }

    #[test]
    fn test_triangulate_square() {
        let square = pts(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]);
        let triangles = triangulate(&square);
        assert_eq!(triangles.len(), 2);
    }

    #[test]
    fn test_triangulate_empty() {
        assert!(triangulate(&[]).is_empty());
        assert!(triangulate(&pts(&[(0.0, 0.0), (1.0, 0.0)])).is_empty());
    }

    #[test]
    fn test_convex_polygons_cover_area() {
        for n in 3..=24 {
            let polygon: Vec<PlanarPoint> = (0..n)
                .map(|i| {
                    let a = i as f64 / n as f64 * std::f64::consts::TAU;
                    PlanarPoint::new(10.0 * a.cos(), 10.0 * a.sin())
                })
                .collect();
            let triangles = triangulate(&polygon);

            assert_eq!(triangles.len(), n - 2, "n = {n}");
            let total: f64 = triangles.iter().map(tri_area).sum();
            assert_relative_eq!(total, signed_area(&polygon), epsilon = 1e-9);
        }
    }

    #[test]
    fn test_concave_l_shape() {
        let l_shape = pts(&[
            (0.0, 0.0),
            (4.0, 0.0),
            (4.0, 1.0),
            (1.0, 1.0),
            (1.0, 3.0),
            (0.0, 3.0),
        ]);
        let triangles = triangulate(&l_shape);

        assert_eq!(triangles.len(), 4);
        let total: f64 = triangles.iter().map(tri_area).sum();
        assert_relative_eq!(total, 6.0, epsilon = 1e-9);
    }

    #[test]
    fn test_winding_is_normalized() {
        let ccw = pts(&[(0.0, 0.0), (2.0, 0.0), (2.0, 2.0), (0.0, 2.0)]);
        let mut cw = ccw.clone();
        cw.reverse();

        for polygon in [ccw, cw] {
            let triangles = triangulate(&polygon);
            assert_eq!(triangles.len(), 2);
            assert!(triangles.iter().all(|t| tri_area(t) > 0.0));
        }
    }

    #[test]
    fn test_closing_vertex_dropped() {
        let closed = pts(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0), (0.0, 0.0)]);
        assert_eq!(normalize_ring(&closed).len(), 4);
        assert_eq!(triangulate(&closed).len(), 2);
    }

    #[test]
    fn test_repeated_vertices_dropped() {
        // two corners clamped onto the same map corner
        let clamped = pts(&[
            (490.0, 490.0),
            (500.0, 490.0),
            (500.0, 500.0),
            (500.0, 500.0),
            (490.0, 500.0),
            (490.0, 490.0),
        ]);
        assert_eq!(normalize_ring(&clamped).len(), 4);

        let triangles = triangulate(&clamped);
        assert_eq!(triangles.len(), 2);
        let total: f64 = triangles.iter().map(tri_area).sum();
        assert_relative_eq!(total, 100.0, epsilon = 1e-9);

        let collapsed = pts(&[(1.0, 1.0), (1.0, 1.0), (1.0, 1.0)]);
        assert_eq!(normalize_ring(&collapsed).len(), 1);
        assert!(triangulate(&collapsed).is_empty());
    }

    #[test]
    fn test_self_intersecting_terminates() {
        // bow tie
        let bow_tie = pts(&[(0.0, 0.0), (2.0, 2.0), (2.0, 0.0), (0.0, 2.0)]);
        let triangles = triangulate(&bow_tie);
        assert!(triangles.len() <= 2);

        let star: Vec<PlanarPoint> = (0..10)
            .map(|i| {
                let a = (i * 3) as f64 / 10.0 * std::f64::consts::TAU;
                PlanarPoint::new(a.cos(), a.sin())
            })
            .collect();
        assert!(triangulate(&star).len() <= 8);
    }
}
