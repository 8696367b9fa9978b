//! Remote write store over the Firestore REST API
//!
//! Documents are appended with `POST .../documents/{collection}`; the server
//! assigns the document id, which is read back from the returned `name`.

use async_trait::async_trait;
use bathroom_core::error::RemoteError;
use bathroom_core::models::{Coordinates, NewReport, NewToilet, ReportId, ToiletId};
use bathroom_core::ports::RemoteWriteStore;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::time::Duration;

/// Public Firestore REST endpoint
pub const DEFAULT_BASE_URL: &str = "https://firestore.googleapis.com/v1";

const TOILETS_COLLECTION: &str = "toilets";
const REPORTS_COLLECTION: &str = "reports";
const REQUEST_TIMEOUT_SECS: u64 = 15;

pub struct FirestoreRestStore {
    base_url: String,
    project: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct DocumentResponse {
    name: String,
}

impl FirestoreRestStore {
    pub fn new(project: impl Into<String>, api_key: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Falling back to default HTTP client");
                reqwest::Client::new()
            });

        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            project: project.into(),
            api_key,
            client,
        }
    }

    /// Point at another endpoint, e.g. the local emulator
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn collection_url(&self, collection: &str) -> String {
        format!(
            "{}/projects/{}/databases/(default)/documents/{}",
            self.base_url, self.project, collection
        )
    }

    /// POST request appending a document to `collection`
    fn document_request(&self, collection: &str, fields: Map<String, Value>) -> reqwest::Result<reqwest::Request> {
        let mut request = self.client.post(self.collection_url(collection));
        if let Some(key) = &self.api_key {
            request = request.query(&[("key", key)]);
        }
        request.json(&json!({ "fields": fields })).build()
    }

    /// Append a document and return the server-assigned id
    async fn create_document(&self, collection: &str, fields: Map<String, Value>) -> Result<String, RemoteError> {
        let request = self
            .document_request(collection, fields)
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        let response = self
            .client
            .execute(request)
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(RemoteError::Rejected { status, message });
        }

        let document: DocumentResponse = response
            .json()
            .await
            .map_err(|e| RemoteError::MalformedResponse(e.to_string()))?;

        document_id(&document.name)
    }
}

/// Last path segment of a document resource name
fn document_id(name: &str) -> Result<String, RemoteError> {
    let id = name.rsplit('/').next().unwrap_or_default();
    if id.is_empty() {
        return Err(RemoteError::MalformedResponse(format!("document name '{}' has no id", name)));
    }
    if id.starts_with(ToiletId::TEMP_PREFIX) {
        return Err(RemoteError::ReservedId(id.to_string()));
    }
    Ok(id.to_string())
}

fn string_value(value: &str) -> Value {
    json!({ "stringValue": value })
}

fn timestamp_value(value: DateTime<Utc>) -> Value {
    json!({ "timestampValue": value.to_rfc3339_opts(SecondsFormat::Millis, true) })
}

fn geo_point_value(coordinates: Coordinates) -> Value {
    json!({ "geoPointValue": { "latitude": coordinates.latitude, "longitude": coordinates.longitude } })
}

fn toilet_fields(toilet: &NewToilet) -> Map<String, Value> {
    let mut fields = Map::new();
    fields.insert("coordinates".into(), geo_point_value(toilet.coordinates));
    fields.insert("status".into(), string_value(toilet.status.as_str()));
    fields.insert("isAccessible".into(), json!({ "booleanValue": toilet.is_accessible }));
    fields.insert("lastConfirmed".into(), timestamp_value(toilet.last_confirmed));
    // int64 values travel as decimal strings
    fields.insert("reportCount".into(), json!({ "integerValue": toilet.report_count.to_string() }));
    fields.insert("createdBy".into(), string_value(toilet.created_by.as_str()));
    fields.insert("createdAt".into(), timestamp_value(toilet.created_at));
    fields
}

fn report_fields(report: &NewReport) -> Map<String, Value> {
    let mut fields = Map::new();
    fields.insert("toiletId".into(), string_value(report.toilet_id.as_str()));
    fields.insert("statusReported".into(), string_value(&report.status_reported.to_string()));
    fields.insert("timestamp".into(), timestamp_value(report.timestamp));
    fields.insert("deviceId".into(), string_value(report.device_id.as_str()));
    fields.insert("location".into(), geo_point_value(report.location));
    fields
}

#[async_trait]
impl RemoteWriteStore for FirestoreRestStore {
    async fn create_toilet(&self, toilet: &NewToilet) -> Result<ToiletId, RemoteError> {
        let id = self.create_document(TOILETS_COLLECTION, toilet_fields(toilet)).await?;
        tracing::debug!(toilet_id = %id, "Created remote toilet document");
        Ok(ToiletId::new(id))
    }

    async fn submit_report(&self, report: &NewReport) -> Result<ReportId, RemoteError> {
        let id = self.create_document(REPORTS_COLLECTION, report_fields(report)).await?;
        tracing::debug!(report_id = %id, toilet_id = %report.toilet_id, "Created remote report document");
        Ok(ReportId::new(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bathroom_core::models::{DeviceId, ReportedStatus, ToiletStatus};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap()
    }

    #[test]
    fn test_collection_url() {
        let store = FirestoreRestStore::new("bathroom-now", None).with_base_url("http://localhost:8080/v1/");
        assert_eq!(
            store.collection_url("toilets"),
            "http://localhost:8080/v1/projects/bathroom-now/databases/(default)/documents/toilets"
        );
    }

    #[test]
    fn test_api_key_is_url_encoded() {
        let store = FirestoreRestStore::new("bathroom-now", Some("a&b=c d".to_string()))
            .with_base_url("http://localhost:8080/v1");
        let request = store.document_request("reports", Map::new()).unwrap();

        assert_eq!(request.url().query(), Some("key=a%26b%3Dc+d"));
        let pairs: Vec<_> = request.url().query_pairs().into_owned().collect();
        assert_eq!(pairs, vec![("key".to_string(), "a&b=c d".to_string())]);
        assert_eq!(request.url().path(), "/v1/projects/bathroom-now/databases/(default)/documents/reports");
    }

    #[test]
    fn test_request_without_api_key_has_no_query() {
        let store = FirestoreRestStore::new("bathroom-now", None).with_base_url("http://localhost:8080/v1");
        let request = store.document_request("toilets", Map::new()).unwrap();
        assert_eq!(request.url().query(), None);
    }

    #[test]
    fn test_document_id() {
        assert_eq!(
            document_id("projects/p/databases/(default)/documents/toilets/AbC123").unwrap(),
            "AbC123"
        );
        assert!(matches!(
            document_id("projects/p/databases/(default)/documents/toilets/"),
            Err(RemoteError::MalformedResponse(_))
        ));
        assert!(matches!(
            document_id("projects/p/databases/(default)/documents/toilets/temp-1"),
            Err(RemoteError::ReservedId(_))
        ));
    }

    #[test]
    fn test_toilet_fields() {
        let device_id = DeviceId::generate();
        let toilet = NewToilet {
            coordinates: Coordinates::new(28.6, 77.2).unwrap(),
            status: ToiletStatus::Open,
            is_accessible: true,
            last_confirmed: now(),
            report_count: 1,
            created_by: device_id.clone(),
            created_at: now(),
        };

        let fields = Value::Object(toilet_fields(&toilet));
        assert_eq!(fields["coordinates"]["geoPointValue"]["latitude"], json!(28.6));
        assert_eq!(fields["status"]["stringValue"], json!("open"));
        assert_eq!(fields["isAccessible"]["booleanValue"], json!(true));
        assert_eq!(fields["lastConfirmed"]["timestampValue"], json!("2024-05-01T12:30:00.000Z"));
        assert_eq!(fields["reportCount"]["integerValue"], json!("1"));
        assert_eq!(fields["createdBy"]["stringValue"], json!(device_id.as_str()));
    }

    #[test]
    fn test_report_fields() {
        let report = NewReport {
            toilet_id: ToiletId::new("AbC123"),
            status_reported: ReportedStatus::Closed,
            timestamp: now(),
            device_id: DeviceId::generate(),
            location: Coordinates::new(1.0, 2.0).unwrap(),
        };

        let fields = Value::Object(report_fields(&report));
        assert_eq!(fields["toiletId"]["stringValue"], json!("AbC123"));
        assert_eq!(fields["statusReported"]["stringValue"], json!("closed"));
        assert_eq!(fields["location"]["geoPointValue"]["longitude"], json!(2.0));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transport_error() {
        let store = FirestoreRestStore::new("p", None).with_base_url("http://127.0.0.1:9/v1");
        let report = NewReport {
            toilet_id: ToiletId::new("x"),
            status_reported: ReportedStatus::Open,
            timestamp: now(),
            device_id: DeviceId::generate(),
            location: Coordinates::new(0.0, 0.0).unwrap(),
        };

        assert!(matches!(store.submit_report(&report).await, Err(RemoteError::Transport(_))));
    }
}
