pub mod base;
pub mod buildings;
pub mod roads;
pub mod terrain;
pub mod water;

pub use base::generate_foundation;
pub use buildings::generate_buildings;
pub use roads::generate_roads;
pub use terrain::{TerrainSurface, generate_ground, without_bottom_cap};
pub use water::{WaterBodies, generate_water_surface};
