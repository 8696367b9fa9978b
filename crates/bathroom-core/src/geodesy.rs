//! Great-circle distance and nearest-restroom search

use geo::{Distance, HaversineMeasure};
use std::cmp::Ordering;

use crate::models::{Coordinates, Toilet};

/// Mean Earth radius used for surface distances, in meters
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Haversine distance between two positions in meters
pub fn haversine_distance(a: Coordinates, b: Coordinates) -> f64 {
    HaversineMeasure::new(EARTH_RADIUS_METERS).distance(a.to_point(), b.to_point())
}

/// Closest restroom to a position
#[derive(Debug, Clone, PartialEq)]
pub struct NearestToilet {
    pub toilet: Toilet,
    /// Distance rounded to the nearest meter
    pub distance_meters: u64,
}

/// Find the restroom closest to `position`
///
/// Equal distances are broken by the lexicographically smallest id, so the
/// answer does not depend on collection iteration order. Records with invalid
/// coordinates are skipped. Returns `None` for an empty collection.
pub fn nearest<'a, I>(position: Coordinates, toilets: I) -> Option<NearestToilet>
where
    I: IntoIterator<Item = &'a Toilet>,
{
    toilets
        .into_iter()
        .filter(|t| t.coordinates.is_valid())
        .map(|t| (haversine_distance(position, t.coordinates), t))
        .min_by(|(da, a), (db, b)| {
            da.partial_cmp(db).unwrap_or(Ordering::Equal).then_with(|| a.id.cmp(&b.id))
        })
        .map(|(distance, toilet)| NearestToilet {
            toilet: toilet.clone(),
            distance_meters: distance.round() as u64,
        })
}

/// Target of a directions hand-off
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapPlatform {
    Ios,
    Android,
}

/// Deep link asking the platform map application for directions
pub fn directions_url(platform: MapPlatform, destination: Coordinates) -> String {
    let Coordinates { latitude, longitude } = destination;
    match platform {
        MapPlatform::Ios => format!("maps://app?daddr={},{}", latitude, longitude),
        MapPlatform::Android => format!("google.navigation:q={},{}", latitude, longitude),
    }
}
