use crate::api::OverpassResponse;
use crate::domain::{FeatureKind, VectorFeature};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Failure to read a saved Overpass response
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path} is not an Overpass JSON response: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Load an Overpass JSON response saved to disk
pub fn load_response(path: &Path) -> Result<OverpassResponse, InputError> {
    let contents = fs::read_to_string(path).map_err(|source| InputError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| InputError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse an Overpass response into vector features
///
/// # Algorithm
/// 1. Build node_id → (lat, lon) lookup map from all node elements
/// 2. For each tagged way:
///    - Resolve node refs to coordinates, dropping unknown nodes
///    - Classify from tags; polygon kinds need a closed way
///    - Keep features with enough points for their geometry
pub fn parse_features(response: &OverpassResponse) -> Vec<VectorFeature> {
    let nodes = build_node_lookup(response);
    let mut features = Vec::new();

    for element in &response.elements {
        if element.type_ != "way" {
            continue;
        }
        let (Some(tags), Some(node_refs)) = (&element.tags, &element.nodes) else {
            continue;
        };

        let points = resolve_way_to_points(node_refs, &nodes);
        let closed = is_closed_way(&points);

        let Some(kind) = FeatureKind::classify(tags, closed) else {
            continue;
        };

        let feature = VectorFeature::new(element.id, kind, tags.clone(), points);
        if feature.is_valid() {
            features.push(feature);
        }
    }

    features
}

fn build_node_lookup(response: &OverpassResponse) -> HashMap<u64, (f64, f64)> {
    response
        .elements
        .iter()
        .filter(|e| e.type_ == "node")
        .filter_map(|e| {
            let lat = e.lat?;
            let lon = e.lon?;
            Some((e.id, (lat, lon)))
        })
        .collect()
}

fn resolve_way_to_points(node_refs: &[u64], nodes: &HashMap<u64, (f64, f64)>) -> Vec<(f64, f64)> {
    node_refs
        .iter()
        .filter_map(|id| nodes.get(id).copied())
        .collect()
}

/// First and last point coincide and there is an area in between
fn is_closed_way(points: &[(f64, f64)]) -> bool {
    if points.len() < 4 {
        return false;
    }
    match (points.first(), points.last()) {
        (Some(first), Some(last)) => {
            (first.0 - last.0).abs() < 1e-9 && (first.1 - last.1).abs() < 1e-9
        }
        _ => false,
    }
}
