pub mod builder;
pub mod extrusion;
pub mod ribbon;
pub mod stl;
pub mod triangulation;
pub mod validation;

pub use builder::{Mesh, triangle_normal};
pub use extrusion::{extrude_footprint, extrude_prism};
pub use ribbon::extrude_ribbon;
pub use stl::write_stl;
pub use triangulation::{normalize_ring, triangulate, triangulate_ring};
pub use validation::{ValidationResult, remove_invalid, validate_mesh};
