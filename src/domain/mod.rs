pub mod building;
pub mod feature;
pub mod road;

pub use building::{BuildingVolume, resolve_height};
pub use feature::{FeatureKind, Tags, VectorFeature};
pub use road::RoadClass;
