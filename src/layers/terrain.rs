//! Ground solid: a regular height grid clipped to the base outline, carved
//! under water, with a vertical skirt and a flat bottom cap.
//!
//! The grid is wound so every cell faces up. Its boundary runs clockwise in
//! the (x, z) plane, and the skirt and cap are built from the reversed
//! boundary edges, which closes the shell.

use crate::config::{BaseShape, GenerationOptions, terrain};
use crate::geometry::{ElevationGrid, PlanarPoint, elevation_at};
use crate::mesh::Mesh;

use super::water::WaterBodies;

/// Exaggerated terrain height above the ground reference
#[derive(Debug, Clone, Copy)]
pub struct TerrainSurface<'a> {
    grid: Option<&'a ElevationGrid>,
    reference: f64,
}

impl<'a> TerrainSurface<'a> {
    pub fn new(grid: Option<&'a ElevationGrid>, reference: f64) -> Self {
        Self { grid, reference }
    }

    /// Terrain without elevation data, 0 everywhere
    pub fn flat() -> Self {
        Self::new(None, 0.0)
    }

    pub fn has_elevation(&self) -> bool {
        self.grid.is_some()
    }

    /// Surface height at `p` before any water carving
    pub fn height_at(&self, p: PlanarPoint) -> f64 {
        elevation_at(self.grid, p.x, p.z, self.reference) * terrain::VERTICAL_EXAGGERATION
    }
}

/// Build the ground fragment
///
/// Vertices outside the radius of a circular base are pinned to the
/// foundation level; vertices covered by water are lowered by the exaggerated
/// water depth.
pub fn generate_ground(
    options: &GenerationOptions,
    surface: &TerrainSurface,
    water: &WaterBodies,
) -> Mesh {
    let divisions = options.grid_divisions() as usize;
    let radius = options.radius;
    let step = 2.0 * radius / divisions as f64;
    let foundation = options.foundation_level();
    let carve = options.water_depth.max(0.0) * terrain::VERTICAL_EXAGGERATION;
    let stride = divisions + 1;

    let mut mesh = Mesh::new();

    for row in 0..stride {
        let z = -radius + row as f64 * step;
        for col in 0..stride {
            let x = -radius + col as f64 * step;
            let p = PlanarPoint::new(x, z);

            let y = if options.base_shape == BaseShape::Circular && x * x + z * z > radius * radius {
                foundation
            } else if water.covers(p) {
                // never dig through the foundation
                (surface.height_at(p) - carve).max(foundation)
            } else {
                surface.height_at(p)
            };
            mesh.add_vertex([x, y, z]);
        }
    }

    let index = |row: usize, col: usize| (row * stride + col) as u32;

    for row in 0..divisions {
        for col in 0..divisions {
            let a = index(row, col);
            let b = index(row, col + 1);
            let c = index(row + 1, col + 1);
            let d = index(row + 1, col);
            // split along a-c, both halves facing up
            mesh.add_quad(a, d, c, b);
        }
    }

    let perimeter = perimeter_loop(divisions, index);
    close_with_skirt(&mut mesh, &perimeter, foundation);

    mesh
}

/// Ground shell without its bottom cap, for stacking onto the foundation slab
///
/// The cap is the fan around the last vertex of a mesh from [`generate_ground`].
pub fn without_bottom_cap(ground: &Mesh) -> Mesh {
    let Some(center) = ground.vertex_count().checked_sub(1) else {
        return Mesh::new();
    };
    let center = center as u32;
    Mesh {
        positions: ground.positions.clone(),
        triangles: ground
            .triangles
            .iter()
            .copied()
            .filter(|t| !t.contains(&center))
            .collect(),
    }
}

/// Boundary vertices in the direction of the surface's own boundary edges
///
/// North edge westwards, west edge southwards, south edge eastwards, east
/// edge northwards.
fn perimeter_loop(divisions: usize, index: impl Fn(usize, usize) -> u32) -> Vec<u32> {
    let n = divisions;
    let mut ring = Vec::with_capacity(4 * n);
    ring.extend((1..=n).rev().map(|col| index(0, col)));
    ring.extend((0..n).map(|row| index(row, 0)));
    ring.extend((0..n).map(|col| index(n, col)));
    ring.extend((1..=n).rev().map(|row| index(row, n)));
    ring
}

/// Drop a wall from every boundary edge to `floor` and cap it with a fan
fn close_with_skirt(mesh: &mut Mesh, perimeter: &[u32], floor: f64) {
    let bottom: Vec<u32> = perimeter
        .iter()
        .map(|&top| {
            let [x, _, z] = mesh.positions[top as usize];
            mesh.add_vertex([x, floor, z])
        })
        .collect();
    let center = mesh.add_vertex([0.0, floor, 0.0]);

    let n = perimeter.len();
    for i in 0..n {
        let j = (i + 1) % n;
        mesh.add_quad(perimeter[j], perimeter[i], bottom[i], bottom[j]);
        mesh.add_triangle(center, bottom[j], bottom[i]);
    }
}
