use bathroom_core::models::{Toilet, ToiletOrigin, ToiletStatus, ViewWindow};
use bathroom_core::status::age_label;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tabled::Tabled;

/// One restroom as shown to the user
#[derive(Debug, Serialize)]
pub struct ToiletOutput {
    pub id: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Status after staleness decay
    pub status: ToiletStatus,
    pub stored_status: ToiletStatus,
    pub confirmed: String,
    pub is_accessible: bool,
    pub report_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fee: Option<bool>,
    pub origin: ToiletOrigin,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_meters: Option<u64>,
}

impl ToiletOutput {
    pub fn new(toilet: &Toilet, status: ToiletStatus, now: DateTime<Utc>, distance_meters: Option<u64>) -> Self {
        Self {
            id: toilet.id.to_string(),
            latitude: toilet.coordinates.latitude,
            longitude: toilet.coordinates.longitude,
            status,
            stored_status: toilet.status,
            confirmed: age_label(&toilet.last_confirmed, now),
            is_accessible: toilet.is_accessible,
            report_count: toilet.report_count,
            name: toilet.name.clone(),
            fee: toilet.fee,
            origin: toilet.origin,
            distance_meters,
        }
    }
}

/// Table row for a restroom
#[derive(Tabled)]
pub struct ToiletRow {
    #[tabled(rename = "ID")]
    pub id: String,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Status")]
    pub status: String,
    #[tabled(rename = "Confirmed")]
    pub confirmed: String,
    #[tabled(rename = "Accessible")]
    pub accessible: String,
    #[tabled(rename = "Fee")]
    pub fee: String,
    #[tabled(rename = "Distance")]
    pub distance: String,
}

impl From<&ToiletOutput> for ToiletRow {
    fn from(t: &ToiletOutput) -> Self {
        let yes_no = |b: bool| if b { "yes" } else { "no" }.to_string();
        Self {
            id: t.id.clone(),
            name: t.name.clone().unwrap_or_else(|| "-".to_string()),
            status: t.status.to_string(),
            confirmed: t.confirmed.clone(),
            accessible: yes_no(t.is_accessible),
            fee: t.fee.map(yes_no).unwrap_or_else(|| "?".to_string()),
            distance: t.distance_meters.map(|d| format!("{} m", d)).unwrap_or_else(|| "-".to_string()),
        }
    }
}

/// Output for nearby command
#[derive(Debug, Serialize)]
pub struct NearbyOutput {
    pub window: ViewWindow,
    pub fetch: String,
    pub toilets: Vec<ToiletOutput>,
}

/// Output for nearest command
#[derive(Debug, Serialize)]
pub struct NearestOutput {
    pub toilet: Option<ToiletOutput>,
}

/// Output for add command
#[derive(Debug, Serialize)]
pub struct AddOutput {
    pub id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub status: ToiletStatus,
    pub is_accessible: bool,
}

/// Output for report command
#[derive(Debug, Serialize)]
pub struct ReportOutput {
    pub report_id: String,
    pub toilet_id: String,
    pub status: String,
}

/// Output for list command
#[derive(Debug, Serialize)]
pub struct ListOutput {
    pub count: usize,
    pub toilets: Vec<ToiletOutput>,
}

/// Table row for a configuration value
#[derive(Debug, Serialize, Tabled)]
pub struct ConfigRow {
    #[tabled(rename = "Key")]
    pub key: String,
    #[tabled(rename = "Value")]
    pub value: String,
    #[tabled(rename = "Source")]
    pub source: String,
}

/// Output for device-id command
#[derive(Debug, Serialize)]
pub struct DeviceIdOutput {
    pub device_id: String,
    pub store: String,
}

/// Output for directions command
#[derive(Debug, Serialize)]
pub struct DirectionsOutput {
    pub id: String,
    pub url: String,
}
