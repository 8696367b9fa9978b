use bathroom_core::models::{Coordinates, ToiletId};

/// User-visible notice raised by the engine
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    /// An added restroom was rolled back
    WriteFailed { toilet_id: ToiletId, reason: String },

    /// A status report did not reach the remote store
    ReportFailed { toilet_id: ToiletId, reason: String },

    /// Location access was refused; position-dependent features are off
    LocationDenied,
}

/// Result of a location permission request
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LocationFix {
    Granted(Coordinates),
    Denied,
}
