use anyhow::{Context, Result, bail};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::config::OverpassConfig;

const USER_AGENT: &str = concat!("mapsolid/", env!("CARGO_PKG_VERSION"));

/// Raw Overpass API response
#[derive(Debug, Deserialize, Serialize)]
pub struct OverpassResponse {
    pub elements: Vec<Element>,
}

/// A single element from Overpass (node or way)
#[derive(Debug, Deserialize, Serialize)]
pub struct Element {
    #[serde(rename = "type")]
    pub type_: String,
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nodes: Option<Vec<u64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<HashMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
}

/// Calculate bounding box from center point and radius
///
/// The box is slightly larger than the model square so that ways crossing
/// the edge are still fetched.
fn calculate_bbox(center: (f64, f64), radius_m: f64) -> (f64, f64, f64, f64) {
    let (lat, lon) = center;
    let radius_km = radius_m * 1.1 / 1000.0;

    // 1 degree latitude ≈ 111 km
    // 1 degree longitude ≈ 111 km * cos(lat)
    let lat_delta = radius_km / 111.0;
    let lon_delta = radius_km / (111.0 * lat.to_radians().cos().max(0.01));

    (lat - lat_delta, lon - lon_delta, lat + lat_delta, lon + lon_delta)
}

fn build_query(center: (f64, f64), radius_m: f64, timeout_secs: u64) -> String {
    let (south, west, north, east) = calculate_bbox(center, radius_m);
    let bbox = format!("{south},{west},{north},{east}");
    // server timeout stays below the client's
    let server_timeout = timeout_secs.saturating_sub(20).max(25);

    format!(
        r#"[out:json][timeout:{server_timeout}];
(
  way["building"]({bbox});
  way["building:part"]({bbox});
  way["highway"]({bbox});
  way["natural"="water"]({bbox});
  way["waterway"]({bbox});
  way["landuse"~"^(reservoir|basin)$"]({bbox});
);
out body;
>;
out skel qt;"#
    )
}

/// Fetch buildings, building parts, roads and water around a center point
///
/// # Arguments
/// * `center` - (lat, lon) center point
/// * `radius_m` - Half extent of the model in meters
/// * `config` - Mirrors, timeout and retry budget
///
/// # Returns
/// * `OverpassResponse` containing all matching ways and their nodes
pub fn fetch_features(
    center: (f64, f64),
    radius_m: f64,
    config: &OverpassConfig,
) -> Result<OverpassResponse> {
    let query = build_query(center, radius_m, config.timeout_secs);
    execute_overpass_query(&query, config)
}

/// Execute an Overpass API query, rotating through mirrors on retriable errors
fn execute_overpass_query(query: &str, config: &OverpassConfig) -> Result<OverpassResponse> {
    if config.urls.is_empty() {
        bail!("No Overpass API URLs configured");
    }

    let client = reqwest::blocking::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
        .context("Failed to create HTTP client")?;

    let attempts = config.max_retries.max(1);
    let mut last_error = None;

    for attempt in 0..attempts {
        let url = &config.urls[attempt as usize % config.urls.len()];
        if attempt > 0 {
            // back off harder once every mirror has been tried
            let wait_secs = if (attempt as usize) < config.urls.len() {
                2
            } else {
                30 * attempt as u64
            };
            warn!(
                "Overpass request failed, retrying {} in {}s (attempt {}/{})",
                url,
                wait_secs,
                attempt + 1,
                attempts
            );
            std::thread::sleep(Duration::from_secs(wait_secs));
        }

        // Overpass expects form-encoded POST data: data=<query>
        let response = match client.post(url).form(&[("data", query)]).send() {
            Ok(response) => response,
            Err(e) => {
                last_error = Some(format!("{url}: {e}"));
                continue;
            }
        };

        match response.status().as_u16() {
            200 => {
                let result: OverpassResponse = response
                    .json()
                    .context("Failed to parse Overpass JSON response")?;
                info!("Overpass returned {} elements from {}", result.elements.len(), url);
                return Ok(result);
            }
            // Too Many Requests / Gateway Timeout
            429 | 504 => {
                last_error = Some(format!("{url} returned status {}", response.status()));
            }
            status => {
                bail!("Overpass API {} returned error status: {}", url, status);
            }
        }
    }

    bail!(
        "Overpass API failed after {} attempts: {}",
        attempts,
        last_error.unwrap_or_else(|| "Unknown error".to_string())
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calculate_bbox() {
        let (south, west, north, east) = calculate_bbox((37.7749, -122.4194), 10000.0);

        // 11 km margin ≈ ±0.099 degrees latitude
        assert!((north - south - 0.198).abs() < 0.01);
        // Longitude spread is wider away from the equator
        assert!(east - west > north - south);
    }

    #[test]
    fn test_query_covers_all_layers() {
        let query = build_query((48.0, 11.0), 500.0, 200);

        assert!(query.starts_with("[out:json][timeout:180];"));
        for key in ["\"building\"", "\"building:part\"", "\"highway\"", "\"natural\"=\"water\"", "\"waterway\""] {
            assert!(query.contains(key), "missing {key}");
        }
    }

    #[test]
    fn test_empty_mirror_list() {
        let config = OverpassConfig {
            urls: Vec::new(),
            ..Default::default()
        };
        assert!(fetch_features((0.0, 0.0), 100.0, &config).is_err());
    }

    #[test]
    fn test_parse_overpass_response() {
        let json = r#"{
            "elements": [
                {"type": "node", "id": 1, "lat": 37.77, "lon": -122.42},
                {"type": "way", "id": 2, "nodes": [1, 3], "tags": {"highway": "primary"}}
            ]
        }"#;

        let response: OverpassResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.elements.len(), 2);
        assert_eq!(response.elements[0].type_, "node");
        assert_eq!(response.elements[1].nodes, Some(vec![1, 3]));

        let saved = serde_json::to_string(&response).unwrap();
        assert!(!saved.contains("null"));
    }
}
