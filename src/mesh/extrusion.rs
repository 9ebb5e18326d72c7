use super::Mesh;
use super::triangulation::{normalize_ring, triangulate_ring};
use crate::geometry::PlanarPoint;

/// Extrude a footprint into a closed volume with a sloped floor and a flat roof
///
/// `base_heights` yields the floor elevation of each footprint vertex (called
/// on the normalized ring, so the order may be reversed from the input).
/// The roof sits at `roof` for every vertex. Vertices are shared between the
/// floor, roof and walls, so a fully triangulated footprint gives a watertight
/// volume.
///
/// Returns an empty mesh for footprints with fewer than three vertices or when
/// triangulation produces nothing.
pub fn extrude_footprint<F>(footprint: &[PlanarPoint], base_heights: F, roof: f64) -> Mesh
where
    F: Fn(PlanarPoint) -> f64,
{
    let ring = normalize_ring(footprint);
    if ring.len() < 3 {
        return Mesh::new();
    }

    let indices = triangulate_ring(&ring);
    if indices.is_empty() {
        return Mesh::new();
    }

    let mut mesh = Mesh::new();
    let n = ring.len() as u32;

    // floor vertices are 0..n, roof vertices are n..2n
    for p in &ring {
        mesh.add_vertex([p.x, base_heights(*p), p.z]);
    }
    for p in &ring {
        mesh.add_vertex([p.x, roof, p.z]);
    }

    for &[a, b, c] in &indices {
        let (a, b, c) = (a as u32, b as u32, c as u32);
        // floor faces down as emitted, roof reversed to face up
        mesh.add_triangle(a, b, c);
        mesh.add_triangle(n + c, n + b, n + a);
    }

    add_side_walls(&mut mesh, n);

    mesh
}

/// Extrude a footprint between two flat levels
pub fn extrude_prism(footprint: &[PlanarPoint], bottom: f64, top: f64) -> Mesh {
    extrude_footprint(footprint, |_| bottom, top)
}

/// One outward-facing quad per ring edge, joining floor vertex `i` to roof
/// vertex `n + i`
fn add_side_walls(mesh: &mut Mesh, n: u32) {
    for i in 0..n {
        let j = (i + 1) % n;
        let (b1, b2) = (i, j);
        let (t1, t2) = (n + i, n + j);

        mesh.add_triangle(b1, t1, t2);
        mesh.add_triangle(b1, t2, b2);
    }
}
