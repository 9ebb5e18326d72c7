pub mod overpass;

pub use overpass::{OverpassResponse, fetch_features};
