pub mod elevation;
pub mod footprint;
pub mod projection;

pub use elevation::{ElevationGrid, ElevationGridError, elevation_at};
pub use footprint::{Bounds, Footprint, normalize_footprint};
pub use projection::{PlanarPoint, Projector, project};
