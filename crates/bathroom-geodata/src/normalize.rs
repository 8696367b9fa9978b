//! Normalization of Overpass elements into restroom records

use bathroom_core::models::{Coordinates, Timestamp, Toilet, ToiletId, ToiletOrigin, ToiletStatus};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;

/// Top-level Overpass JSON response
///
/// Elements are kept as raw JSON so that one malformed element does not
/// discard the rest of the batch.
#[derive(Debug, Deserialize)]
pub struct OverpassResponse {
    #[serde(default)]
    pub elements: Vec<serde_json::Value>,
}

/// A single node, way or relation
#[derive(Debug, Clone, Deserialize)]
pub struct OverpassElement {
    #[serde(rename = "type", default = "default_element_type")]
    pub element_type: String,
    pub id: u64,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
    #[serde(default)]
    pub center: Option<OverpassCenter>,
    #[serde(default)]
    pub tags: HashMap<String, String>,
}

/// Centroid that `out center` attaches to ways and relations
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct OverpassCenter {
    pub lat: f64,
    pub lon: f64,
}

fn default_element_type() -> String {
    "node".to_string()
}

impl OverpassElement {
    /// Direct coordinates, else the center; `None` unless both axes resolve
    /// to a valid position
    pub fn coordinates(&self) -> Option<Coordinates> {
        let (lat, lon) = match (self.lat, self.lon, self.center) {
            (Some(lat), Some(lon), _) => (lat, lon),
            (_, _, Some(center)) => (center.lat, center.lon),
            _ => return None,
        };
        Coordinates::new(lat, lon).ok()
    }

    /// Convert into a restroom record fetched at `fetched_at`
    pub fn into_toilet(self, fetched_at: DateTime<Utc>) -> Option<Toilet> {
        let coordinates = self.coordinates()?;
        let tag = |key: &str| self.tags.get(key).map(String::as_str);

        Some(Toilet {
            id: ToiletId::geodata(&self.element_type, self.id),
            coordinates,
            status: ToiletStatus::Unknown,
            last_confirmed: Timestamp::Native(fetched_at),
            is_accessible: tag("wheelchair") == Some("yes"),
            report_count: 0,
            name: tag("name").map(str::to_string),
            fee: tag("fee").map(|fee| fee == "yes"),
            origin: ToiletOrigin::Geodata,
        })
    }
}

/// Normalize every usable element of a response
///
/// Elements that fail to decode or have no resolvable coordinates are dropped.
pub fn normalize_response(response: OverpassResponse, fetched_at: DateTime<Utc>) -> Vec<Toilet> {
    let total = response.elements.len();
    let toilets: Vec<Toilet> = response
        .elements
        .into_iter()
        .filter_map(|raw| match serde_json::from_value::<OverpassElement>(raw) {
            Ok(element) => element.into_toilet(fetched_at),
            Err(e) => {
                tracing::debug!(error = %e, "Skipping undecodable Overpass element");
                None
            }
        })
        .collect();

    if toilets.len() < total {
        tracing::debug!(kept = toilets.len(), total, "Dropped elements without usable coordinates");
    }
    toilets
}
