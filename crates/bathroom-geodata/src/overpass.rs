//! Overpass API client

use async_trait::async_trait;
use bathroom_core::models::{Toilet, ViewWindow};
use bathroom_core::ports::GeodataSource;
use chrono::Utc;
use std::time::Duration;
use thiserror::Error;

use crate::normalize::{normalize_response, OverpassResponse};

/// Server-side query timeout, in seconds
const QUERY_TIMEOUT_SECS: u64 = 25;

/// Why a fetch produced no data
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Failed to reach Overpass at {url}: {reason}")]
    Transport { url: String, reason: String },

    #[error("Overpass API error ({status}): {body}")]
    Status { status: u16, body: String },

    #[error("Failed to parse Overpass response: {0}")]
    Parse(String),
}

/// Overpass QL query for restrooms inside the window's bounding box
pub fn build_query(window: &ViewWindow) -> String {
    let b = window.bounds();
    let bbox = format!("{},{},{},{}", b.south, b.west, b.north, b.east);
    format!(
        "[out:json][timeout:{timeout}];\n(\n  node[\"amenity\"=\"toilets\"]({bbox});\n  way[\"amenity\"=\"toilets\"]({bbox});\n  relation[\"amenity\"=\"toilets\"]({bbox});\n);\nout center;\n",
        timeout = QUERY_TIMEOUT_SECS,
        bbox = bbox,
    )
}

/// Geodata source backed by an Overpass interpreter endpoint
pub struct OverpassClient {
    /// Interpreter URL (e.g., "https://overpass-api.de/api/interpreter")
    url: String,

    /// HTTP client
    client: reqwest::Client,
}

impl OverpassClient {
    pub fn new(url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(QUERY_TIMEOUT_SECS + 5))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Falling back to default HTTP client");
                reqwest::Client::new()
            });
        Self { url: url.into(), client }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch and normalize, surfacing the failure cause
    pub async fn try_fetch(&self, window: &ViewWindow) -> Result<Vec<Toilet>, FetchError> {
        let response = self
            .client
            .post(&self.url)
            .body(build_query(window))
            .send()
            .await
            .map_err(|e| FetchError::Transport { url: self.url.clone(), reason: e.to_string() })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status { status, body });
        }

        let parsed: OverpassResponse =
            response.json().await.map_err(|e| FetchError::Parse(e.to_string()))?;

        Ok(normalize_response(parsed, Utc::now()))
    }
}

#[async_trait]
impl GeodataSource for OverpassClient {
    async fn fetch(&self, window: &ViewWindow) -> Vec<Toilet> {
        match self.try_fetch(window).await {
            Ok(toilets) => {
                tracing::debug!(count = toilets.len(), span = window.span(), "Fetched restrooms");
                toilets
            }
            Err(e) => {
                tracing::warn!(error = %e, "Geodata fetch failed; treating as empty");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bathroom_core::models::Coordinates;

    #[test]
    fn test_build_query() {
        let window = ViewWindow::new(Coordinates::new(10.0, 20.0).unwrap(), 0.5, 1.0).unwrap();
        let query = build_query(&window);

        assert!(query.starts_with("[out:json][timeout:25];"));
        assert!(query.contains("node[\"amenity\"=\"toilets\"](9.75,19.5,10.25,20.5);"));
        assert!(query.contains("way[\"amenity\"=\"toilets\"](9.75,19.5,10.25,20.5);"));
        assert!(query.contains("relation[\"amenity\"=\"toilets\"](9.75,19.5,10.25,20.5);"));
        assert!(query.trim_end().ends_with("out center;"));
    }

    #[test]
    fn test_build_query_near_antimeridian() {
        let window = ViewWindow::new(Coordinates::new(0.0, 179.5).unwrap(), 1.0, 2.0).unwrap();
        let query = build_query(&window);

        assert!(query.contains("node[\"amenity\"=\"toilets\"](-0.5,178.5,0.5,180);"));
    }

    #[test]
    fn test_client_creation() {
        let client = OverpassClient::new("http://localhost:12345/api/interpreter");
        assert_eq!(client.url(), "http://localhost:12345/api/interpreter");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_yields_empty() {
        let client = OverpassClient::new("http://127.0.0.1:9/api/interpreter");
        let window = ViewWindow::around(Coordinates::new(0.0, 0.0).unwrap()).unwrap();

        assert!(matches!(client.try_fetch(&window).await, Err(FetchError::Transport { .. })));
        assert!(client.fetch(&window).await.is_empty());
    }
}
