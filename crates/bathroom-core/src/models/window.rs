use geo::{Intersects, Rect};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

use super::Coordinates;
use crate::error::{BathroomError, Result};

/// Rectangular region of interest: a center plus latitude/longitude spans
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(try_from = "RawWindow")]
pub struct ViewWindow {
    center: Coordinates,
    latitude_delta: f64,
    longitude_delta: f64,
}

/// Bounding box edges in degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl ViewWindow {
    /// Span used when centering on a position
    pub const DEFAULT_DELTA: f64 = 0.02;

    /// Create a validated window
    pub fn new(center: Coordinates, latitude_delta: f64, longitude_delta: f64) -> Result<Self> {
        if !center.is_valid() {
            return Err(BathroomError::InvalidWindow {
                reason: format!(
                    "center ({}, {}) is not a valid coordinate",
                    center.latitude, center.longitude
                ),
            });
        }
        check_delta("latitude", latitude_delta, 180.0)?;
        check_delta("longitude", longitude_delta, 360.0)?;

        Ok(Self { center, latitude_delta, longitude_delta })
    }

    /// Square window of [`Self::DEFAULT_DELTA`] around a position
    pub fn around(center: Coordinates) -> Result<Self> {
        Self::new(center, Self::DEFAULT_DELTA, Self::DEFAULT_DELTA)
    }

    pub fn center(&self) -> Coordinates {
        self.center
    }

    pub fn latitude_delta(&self) -> f64 {
        self.latitude_delta
    }

    pub fn longitude_delta(&self) -> f64 {
        self.longitude_delta
    }

    /// Angular span of the window: the larger of the two deltas
    pub fn span(&self) -> f64 {
        self.latitude_delta.max(self.longitude_delta)
    }

    /// Whether the span is over the admission threshold
    pub fn exceeds_span(&self, max_span_degrees: f64) -> bool {
        self.span() > max_span_degrees
    }

    /// Edges of the window, clamped to the poles and to the antimeridian
    ///
    /// A window straddling ±180° is cut at the antimeridian, keeping the
    /// side its center lies on.
    pub fn bounds(&self) -> Bounds {
        let half_lat = self.latitude_delta / 2.0;
        let half_lng = self.longitude_delta / 2.0;
        Bounds {
            south: (self.center.latitude - half_lat).max(-90.0),
            west: (self.center.longitude - half_lng).max(-180.0),
            north: (self.center.latitude + half_lat).min(90.0),
            east: (self.center.longitude + half_lng).min(180.0),
        }
    }

    /// The window as a `geo` rectangle (x = longitude, y = latitude)
    pub fn to_rect(&self) -> Rect<f64> {
        let b = self.bounds();
        Rect::new(geo::coord! { x: b.west, y: b.south }, geo::coord! { x: b.east, y: b.north })
    }

    /// Whether a position lies inside the window (edges included)
    pub fn contains(&self, coordinates: &Coordinates) -> bool {
        coordinates.is_valid() && self.to_rect().intersects(&coordinates.to_point())
    }
}

fn check_delta(axis: &str, delta: f64, max: f64) -> Result<()> {
    if !delta.is_finite() || delta <= 0.0 || delta > max {
        return Err(BathroomError::InvalidWindow {
            reason: format!("{} delta {} must be within (0, {}]", axis, delta, max),
        });
    }
    Ok(())
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawWindow {
    latitude: f64,
    longitude: f64,
    latitude_delta: f64,
    longitude_delta: f64,
}

impl TryFrom<RawWindow> for ViewWindow {
    type Error = BathroomError;

    fn try_from(raw: RawWindow) -> Result<Self> {
        let center = Coordinates { latitude: raw.latitude, longitude: raw.longitude };
        ViewWindow::new(center, raw.latitude_delta, raw.longitude_delta)
    }
}

impl Serialize for ViewWindow {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ViewWindow", 4)?;
        state.serialize_field("latitude", &self.center.latitude)?;
        state.serialize_field("longitude", &self.center.longitude)?;
        state.serialize_field("latitudeDelta", &self.latitude_delta)?;
        state.serialize_field("longitudeDelta", &self.longitude_delta)?;
        state.end()
    }
}
