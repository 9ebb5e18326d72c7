use std::f64::consts::TAU;

use crate::config::{BaseShape, GenerationOptions, terrain};
use crate::geometry::PlanarPoint;
use crate::mesh::{Mesh, extrude_prism};

/// Generate the foundation slab under the ground solid
///
/// The slab spans `base_thickness` below the foundation level, as a box for
/// square bases or a 64-sided cylinder for circular ones.
pub fn generate_foundation(options: &GenerationOptions) -> Mesh {
    let top = options.foundation_level();
    let bottom = top - options.base_thickness.max(0.0);
    if top - bottom <= 0.0 {
        return Mesh::new();
    }

    let outline = match options.base_shape {
        BaseShape::Square => square_outline(options.radius),
        BaseShape::Circular => circle_outline(options.radius, terrain::CIRCLE_SEGMENTS),
    };

    extrude_prism(&outline, bottom, top)
}

fn square_outline(radius: f64) -> Vec<PlanarPoint> {
    vec![
        PlanarPoint::new(-radius, -radius),
        PlanarPoint::new(radius, -radius),
        PlanarPoint::new(radius, radius),
        PlanarPoint::new(-radius, radius),
    ]
}

fn circle_outline(radius: f64, segments: usize) -> Vec<PlanarPoint> {
    (0..segments)
        .map(|i| {
            let angle = TAU * i as f64 / segments as f64;
            PlanarPoint::new(radius * angle.cos(), radius * angle.sin())
        })
        .collect()
}
