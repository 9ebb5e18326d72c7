use super::Mesh;
use super::builder::triangle_normal;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Rotate a y-up mesh point into the z-up frame slicers expect and scale it
///
/// (x, y, z) maps to (x, -z, y): east stays +x, north becomes +y and
/// elevation becomes +z. The rotation keeps triangle winding intact.
fn to_print_frame(p: [f64; 3], scale: f64) -> [f32; 3] {
    [
        (p[0] * scale) as f32,
        (-p[2] * scale) as f32,
        (p[1] * scale) as f32,
    ]
}

/// Convert a mesh into `stl_io` triangles in the print frame
pub fn to_stl_triangles(mesh: &Mesh, scale: f64) -> Vec<stl_io::Triangle> {
    mesh.triangle_positions()
        .map(|tri| {
            let vertices = tri.map(|p| to_print_frame(p, scale));
            let normal = triangle_normal(&vertices.map(|v| v.map(f64::from)));
            stl_io::Triangle {
                normal: stl_io::Normal::new(normal.map(|c| c as f32)),
                vertices: vertices.map(stl_io::Vertex::new),
            }
        })
        .collect()
}

/// Write a mesh as binary STL to any writer
pub fn write_stl_to<W: Write>(writer: &mut W, mesh: &Mesh, scale: f64) -> Result<()> {
    let triangles = to_stl_triangles(mesh, scale);
    stl_io::write_stl(writer, triangles.iter()).context("Failed to encode STL")?;
    Ok(())
}

/// Write a mesh to a binary STL file
///
/// # Arguments
/// * `path` - Output file path
/// * `mesh` - Mesh in meters, y up
/// * `scale` - Uniform factor applied on export (e.g. 1000 for millimeters)
pub fn write_stl(path: &Path, mesh: &Mesh, scale: f64) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create STL file: {}", path.display()))?;
    let mut writer = BufWriter::new(file);

    write_stl_to(&mut writer, mesh, scale)?;
    writer.flush()?;

    Ok(())
}

/// Get the file size of an STL with the given number of triangles
pub fn estimate_stl_size(triangle_count: usize) -> usize {
    // 80 (header) + 4 (count) + triangles * (12 normal + 36 vertices + 2 attribute)
    80 + 4 + triangle_count * 50
}
