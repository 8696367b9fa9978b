use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::{DeviceId, Timestamp};
use crate::error::{BathroomError, Result};

/// Latitude/longitude pair in degrees (WGS 84)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    /// Create validated coordinates
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        let coordinates = Self { latitude, longitude };
        if let Some(reason) = coordinates.invalid_reason() {
            return Err(BathroomError::InvalidCoordinates {
                latitude,
                longitude,
                reason: reason.to_string(),
            });
        }
        Ok(coordinates)
    }

    /// Finite and within the WGS 84 value ranges
    pub fn is_valid(&self) -> bool {
        self.invalid_reason().is_none()
    }

    fn invalid_reason(&self) -> Option<&'static str> {
        if !self.latitude.is_finite() || !self.longitude.is_finite() {
            Some("coordinates must be finite")
        } else if !(-90.0..=90.0).contains(&self.latitude) {
            Some("latitude must be within [-90, 90]")
        } else if !(-180.0..=180.0).contains(&self.longitude) {
            Some("longitude must be within [-180, 180]")
        } else {
            None
        }
    }

    /// Convert to a `geo` point (x = longitude, y = latitude)
    pub fn to_point(&self) -> geo::Point<f64> {
        geo::Point::new(self.longitude, self.latitude)
    }
}

impl From<Coordinates> for geo::Point<f64> {
    fn from(coordinates: Coordinates) -> Self {
        coordinates.to_point()
    }
}

/// Stored status of a restroom
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ToiletStatus {
    Open,
    Closed,
    #[default]
    Unknown,
}

impl ToiletStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToiletStatus::Open => "open",
            ToiletStatus::Closed => "closed",
            ToiletStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ToiletStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToiletStatus {
    type Err = BathroomError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "open" => Ok(ToiletStatus::Open),
            "closed" => Ok(ToiletStatus::Closed),
            "unknown" => Ok(ToiletStatus::Unknown),
            _ => Err(BathroomError::InvalidStatus { value: s.to_string() }),
        }
    }
}

/// Identifier of a restroom record
///
/// Three disjoint id spaces share this type: geodata ids (`node/123`),
/// provisional ids minted before a remote write confirms (`temp-<uuid>`),
/// and opaque durable ids assigned by the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToiletId(String);

impl ToiletId {
    /// Prefix reserved for provisional ids
    pub const TEMP_PREFIX: &'static str = "temp-";

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Mint a fresh provisional id
    pub fn temporary() -> Self {
        Self(format!("{}{}", Self::TEMP_PREFIX, Uuid::new_v4()))
    }

    /// Id for an upstream OpenStreetMap element, e.g. `way/4242`
    pub fn geodata(element_type: &str, element_id: u64) -> Self {
        Self(format!("{}/{}", element_type, element_id))
    }

    pub fn is_temporary(&self) -> bool {
        self.0.starts_with(Self::TEMP_PREFIX)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ToiletId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ToiletId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for ToiletId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Where a record came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ToiletOrigin {
    /// Sourced from the public geodata service; read-only
    #[default]
    Geodata,
    /// Created by a user on this device; mutable
    Local,
}

/// Restroom record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Toilet {
    pub id: ToiletId,

    pub coordinates: Coordinates,

    #[serde(default)]
    pub status: ToiletStatus,

    /// Most recent status confirmation, in whatever encoding the source used
    #[serde(default)]
    pub last_confirmed: Timestamp,

    #[serde(default)]
    pub is_accessible: bool,

    #[serde(default)]
    pub report_count: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee: Option<bool>,

    #[serde(default)]
    pub origin: ToiletOrigin,
}

impl Toilet {
    /// Record freshly created by a user, confirmed once at `now`
    pub fn local(
        id: ToiletId,
        coordinates: Coordinates,
        status: ToiletStatus,
        is_accessible: bool,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            coordinates,
            status,
            last_confirmed: Timestamp::Native(now),
            is_accessible,
            report_count: 1,
            name: None,
            fee: None,
            origin: ToiletOrigin::Local,
        }
    }

    /// Same record under another id; every other field is preserved
    pub fn with_id(&self, id: ToiletId) -> Self {
        Self { id, ..self.clone() }
    }

    pub fn is_local(&self) -> bool {
        self.origin == ToiletOrigin::Local
    }
}

/// Fields submitted to the remote store when creating a record
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewToilet {
    pub coordinates: Coordinates,
    pub status: ToiletStatus,
    pub is_accessible: bool,
    pub last_confirmed: DateTime<Utc>,
    pub report_count: u32,
    pub created_by: DeviceId,
    pub created_at: DateTime<Utc>,
}

impl NewToilet {
    pub fn from_toilet(toilet: &Toilet, device_id: DeviceId, now: DateTime<Utc>) -> Self {
        Self {
            coordinates: toilet.coordinates,
            status: toilet.status,
            is_accessible: toilet.is_accessible,
            last_confirmed: toilet.last_confirmed.parse().unwrap_or(now),
            report_count: toilet.report_count,
            created_by: device_id,
            created_at: now,
        }
    }
}
