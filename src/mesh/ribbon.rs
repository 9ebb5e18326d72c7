use super::Mesh;
use crate::geometry::PlanarPoint;

/// Segments shorter than this (squared meters) are skipped
pub const MIN_SEGMENT_LENGTH_SQ: f64 = 0.01;

/// Extrude a polyline into one flat ribbon quad per segment
///
/// Each segment gets its own quad of `width`, offset perpendicular to the
/// segment on the ground plane. `surface` gives the ribbon top elevation at
/// each segment endpoint, so ribbons follow the terrain. With `thickness > 0`
/// every segment becomes a closed box reaching `thickness` below the top.
///
/// # Arguments
/// * `points` - Centerline on the ground plane, in meters
/// * `width` - Ribbon width in meters
/// * `thickness` - Solid depth below the top face, 0 for a bare quad
/// * `surface` - Top elevation at a centerline point
///
/// # Returns
/// Mesh with all ribbon segments, empty for fewer than two points
pub fn extrude_ribbon<F>(points: &[PlanarPoint], width: f64, thickness: f64, surface: F) -> Mesh
where
    F: Fn(PlanarPoint) -> f64,
{
    let mut mesh = Mesh::new();
    if points.len() < 2 {
        return mesh;
    }

    let half_width = width / 2.0;

    for pair in points.windows(2) {
        let (start, end) = (pair[0], pair[1]);
        // degenerate after clamping to the map edge
        if start.distance_squared(&end) < MIN_SEGMENT_LENGTH_SQ {
            continue;
        }

        let (dx, dz) = direction(start, end);
        // perpendicular on the ground plane
        let (px, pz) = (-dz * half_width, dx * half_width);

        let y0 = surface(start);
        let y1 = surface(end);

        let corners = [
            (start.x - px, start.z - pz, y0),
            (start.x + px, start.z + pz, y0),
            (end.x + px, end.z + pz, y1),
            (end.x - px, end.z - pz, y1),
        ];
        let top: Vec<u32> = corners
            .iter()
            .map(|&(x, z, y)| mesh.add_vertex([x, y, z]))
            .collect();

        // counter-clockwise seen from above
        mesh.add_quad(top[0], top[1], top[2], top[3]);

        if thickness > 0.0 {
            let bottom: Vec<u32> = corners
                .iter()
                .map(|&(x, z, y)| mesh.add_vertex([x, y - thickness, z]))
                .collect();
            add_box_sides(&mut mesh, &top, &bottom);
        }
    }

    mesh
}

/// Bottom face plus four sides closing a ribbon segment into a box
fn add_box_sides(mesh: &mut Mesh, top: &[u32], bottom: &[u32]) {
    // Bottom face (reverse of the top)
    mesh.add_quad(bottom[3], bottom[2], bottom[1], bottom[0]);

    for i in 0..4 {
        let j = (i + 1) % 4;
        mesh.add_quad(bottom[i], bottom[j], top[j], top[i]);
    }
}

/// Calculate normalized direction vector between two points
fn direction(p1: PlanarPoint, p2: PlanarPoint) -> (f64, f64) {
    let dx = p2.x - p1.x;
    let dz = p2.z - p1.z;
    let len = (dx * dx + dz * dz).sqrt();
    if len > 1e-10 {
        (dx / len, dz / len)
    } else {
        (1.0, 0.0)
    }
}
