//! Staleness decay of reported status
//!
//! A stored status is only shown while its confirmation is fresh. Once the
//! freshness threshold has passed (or the confirmation time cannot be read)
//! the displayed status falls back to `unknown`. Stored data is never altered.

use chrono::{DateTime, Duration, Utc};

use crate::models::{Timestamp, Toilet, ToiletStatus};

/// Default freshness threshold in hours
pub const DEFAULT_FRESHNESS_HOURS: i64 = 6;

/// Default freshness threshold
pub fn default_freshness() -> Duration {
    Duration::hours(DEFAULT_FRESHNESS_HOURS)
}

/// Status to display for `toilet` at `now`, using the default threshold
pub fn visual_status(toilet: &Toilet, now: DateTime<Utc>) -> ToiletStatus {
    visual_status_with(toilet, now, default_freshness())
}

/// Status to display for `toilet` at `now`
///
/// Returns `Unknown` when `now - lastConfirmed` exceeds `freshness` or when
/// `lastConfirmed` does not parse; otherwise the stored status.
pub fn visual_status_with(toilet: &Toilet, now: DateTime<Utc>, freshness: Duration) -> ToiletStatus {
    match toilet.last_confirmed.parse() {
        Ok(confirmed) if now.signed_duration_since(confirmed) <= freshness => toilet.status,
        _ => ToiletStatus::Unknown,
    }
}

/// Human readable age of a confirmation ("Just now", "5m ago", "3h ago", "2d ago")
pub fn age_label(last_confirmed: &Timestamp, now: DateTime<Utc>) -> String {
    let Ok(confirmed) = last_confirmed.parse() else {
        return "Unknown".to_string();
    };

    let seconds = now.signed_duration_since(confirmed).num_seconds().max(0);
    match seconds {
        s if s < 60 => "Just now".to_string(),
        s if s < 3_600 => format!("{}m ago", s / 60),
        s if s < 86_400 => format!("{}h ago", s / 3_600),
        s => format!("{}d ago", s / 86_400),
    }
}
