use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{Coordinates, DeviceId, ToiletId, ToiletStatus};
use crate::error::{BathroomError, Result};

/// Identifier assigned to a report by the remote store
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportId(String);

impl ReportId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Status a user can report; there is no "unknown" report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportedStatus {
    Open,
    Closed,
}

impl From<ReportedStatus> for ToiletStatus {
    fn from(status: ReportedStatus) -> Self {
        match status {
            ReportedStatus::Open => ToiletStatus::Open,
            ReportedStatus::Closed => ToiletStatus::Closed,
        }
    }
}

impl fmt::Display for ReportedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        ToiletStatus::from(*self).fmt(f)
    }
}

impl FromStr for ReportedStatus {
    type Err = BathroomError;

    fn from_str(s: &str) -> Result<Self> {
        match s.parse::<ToiletStatus>()? {
            ToiletStatus::Open => Ok(ReportedStatus::Open),
            ToiletStatus::Closed => Ok(ReportedStatus::Closed),
            ToiletStatus::Unknown => Err(BathroomError::InvalidStatus { value: s.to_string() }),
        }
    }
}

/// Report payload before the remote store assigns an id
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReport {
    pub toilet_id: ToiletId,
    pub status_reported: ReportedStatus,
    pub timestamp: DateTime<Utc>,
    pub device_id: DeviceId,
    /// Reporter position, kept for proximity sanity checks
    pub location: Coordinates,
}

/// Status report as stored remotely
///
/// `toilet_id` is a reference; the report does not own the restroom record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: ReportId,
    pub toilet_id: ToiletId,
    pub status_reported: ReportedStatus,
    pub timestamp: DateTime<Utc>,
    pub device_id: DeviceId,
    pub location: Coordinates,
}

impl Report {
    pub fn from_new(id: ReportId, report: NewReport) -> Self {
        Self {
            id,
            toilet_id: report.toilet_id,
            status_reported: report.status_reported,
            timestamp: report.timestamp,
            device_id: report.device_id,
            location: report.location,
        }
    }
}
