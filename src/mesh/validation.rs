//! Mesh validation utilities
//!
//! Checks meshes for 3D printing compatibility:
//! - Triangle indices out of range
//! - NaN/Inf coordinates
//! - Degenerate triangles (zero area)
//! - Open edges, i.e. edges without a matching opposite half-edge

use std::collections::HashSet;

use super::Mesh;

/// Result of mesh validation
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// Total number of triangles validated
    pub total: usize,
    /// Triangles referencing a vertex that does not exist
    pub invalid_indices: usize,
    /// Triangles with NaN/Inf coordinates
    pub invalid_coords: usize,
    /// Triangles with zero or near-zero area
    pub degenerate: usize,
    /// Directed edges whose reverse edge is missing
    pub open_edges: usize,
}

impl ValidationResult {
    /// The mesh can be exported as-is
    pub fn is_valid(&self) -> bool {
        self.invalid_indices == 0 && self.invalid_coords == 0
    }

    /// Every edge is shared by exactly two consistently wound triangles
    pub fn is_watertight(&self) -> bool {
        self.is_valid() && self.open_edges == 0
    }

    pub fn summary(&self) -> String {
        format!(
            "{} triangles, {} bad indices, {} invalid coords, {} degenerate, {} open edges",
            self.total, self.invalid_indices, self.invalid_coords, self.degenerate, self.open_edges
        )
    }
}

/// Minimum area threshold for non-degenerate triangles (square meters)
const MIN_TRIANGLE_AREA: f64 = 1e-10;

/// Validate a mesh and return a detailed report
pub fn validate_mesh(mesh: &Mesh) -> ValidationResult {
    let mut result = ValidationResult {
        total: mesh.triangles.len(),
        ..Default::default()
    };
    let mut half_edges = HashSet::with_capacity(mesh.triangles.len() * 3);

    for tri in &mesh.triangles {
        if !indices_valid(mesh, tri) {
            result.invalid_indices += 1;
            continue;
        }

        for k in 0..3 {
            half_edges.insert((tri[k], tri[(k + 1) % 3]));
        }

        let vertices = resolve(mesh, tri);
        if has_invalid_coords(&vertices) {
            result.invalid_coords += 1;
        } else if triangle_area(&vertices) < MIN_TRIANGLE_AREA {
            result.degenerate += 1;
        }
    }

    result.open_edges = half_edges
        .iter()
        .filter(|&&(a, b)| !half_edges.contains(&(b, a)))
        .count();

    result
}

/// Drop triangles that cannot be exported (bad indices or non-finite coords)
///
/// Degenerate triangles are kept: removing them would open the shell.
pub fn remove_invalid(mesh: Mesh) -> Mesh {
    let triangles = mesh
        .triangles
        .iter()
        .copied()
        .filter(|tri| indices_valid(&mesh, tri) && !has_invalid_coords(&resolve(&mesh, tri)))
        .collect();
    Mesh {
        positions: mesh.positions,
        triangles,
    }
}

fn indices_valid(mesh: &Mesh, tri: &[u32; 3]) -> bool {
    tri.iter().all(|&i| (i as usize) < mesh.positions.len())
}

fn resolve(mesh: &Mesh, tri: &[u32; 3]) -> [[f64; 3]; 3] {
    tri.map(|i| mesh.positions[i as usize])
}

/// Check if a triangle has any invalid (NaN/Inf) coordinates
fn has_invalid_coords(vertices: &[[f64; 3]; 3]) -> bool {
    vertices.iter().flatten().any(|c| !c.is_finite())
}

/// Calculate the area of a triangle from its vertices
fn triangle_area(vertices: &[[f64; 3]; 3]) -> f64 {
    let [v0, v1, v2] = vertices;

    let edge_a = [v1[0] - v0[0], v1[1] - v0[1], v1[2] - v0[2]];
    let edge_b = [v2[0] - v0[0], v2[1] - v0[1], v2[2] - v0[2]];

    let cx = edge_a[1] * edge_b[2] - edge_a[2] * edge_b[1];
    let cy = edge_a[2] * edge_b[0] - edge_a[0] * edge_b[2];
    let cz = edge_a[0] * edge_b[1] - edge_a[1] * edge_b[0];

    0.5 * (cx * cx + cy * cy + cz * cz).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mesh_of(positions: &[[f64; 3]], triangles: &[[u32; 3]]) -> Mesh {
        Mesh {
            positions: positions.to_vec(),
            triangles: triangles.to_vec(),
        }
    }

    fn tetrahedron() -> Mesh {
        mesh_of(
            &[
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0],
                [0.0, 1.0, 0.0],
            ],
            &[[0, 1, 2], [0, 3, 1], [1, 3, 2], [2, 3, 0]],
        )
    }

    #[test]
    fn test_closed_tetrahedron() {
        let report = validate_mesh(&tetrahedron());

        assert_eq!(report.total, 4);
        assert_eq!(report.open_edges, 0);
        assert!(report.is_watertight());
    }

    #[test]
    fn test_missing_face_opens_edges() {
        let mut mesh = tetrahedron();
        mesh.triangles.pop();
        let report = validate_mesh(&mesh);

        assert_eq!(report.open_edges, 3);
        assert!(report.is_valid());
        assert!(!report.is_watertight());
    }

    #[test]
    fn test_flipped_face_opens_edges() {
        let mut mesh = tetrahedron();
        mesh.triangles[0] = [0, 2, 1];
        assert!(validate_mesh(&mesh).open_edges > 0);
    }

    #[test]
    fn test_degenerate_triangle_collinear() {
        let mesh = mesh_of(
            &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0]],
            &[[0, 1, 2]],
        );
        assert_eq!(validate_mesh(&mesh).degenerate, 1);
    }

    #[test]
    fn test_invalid_coords_and_indices() {
        let mesh = mesh_of(
            &[[f64::NAN, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]],
            &[[0, 1, 2], [1, 2, 7]],
        );
        let report = validate_mesh(&mesh);

        assert_eq!(report.invalid_coords, 1);
        assert_eq!(report.invalid_indices, 1);
        assert!(!report.is_valid());

        let cleaned = remove_invalid(mesh);
        assert!(cleaned.is_empty());
    }

    #[test]
    fn test_remove_invalid_keeps_degenerate() {
        let mesh = mesh_of(
            &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0]],
            &[[0, 1, 2], [0, 1, 3]],
        );
        assert_eq!(remove_invalid(mesh).len(), 1);
    }

    #[test]
    fn test_triangle_area() {
        let vertices = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        assert!((triangle_area(&vertices) - 0.5).abs() < 0.001);
    }
}
