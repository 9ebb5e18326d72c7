//! mapsolid - Turn OpenStreetMap data and terrain elevation into watertight,
//! 3D-printable map models

pub mod api;
pub mod config;
pub mod domain;
pub mod generator;
pub mod geometry;
pub mod layers;
pub mod mesh;
pub mod osm;
