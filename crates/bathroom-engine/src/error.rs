//! Error types for engine intents

use bathroom_core::models::ToiletId;
use bathroom_core::RemoteError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Failed to add restroom: {0}")]
    WriteRejected(#[source] RemoteError),

    #[error("Failed to submit report for '{toilet_id}': {source}")]
    ReportRejected {
        toilet_id: ToiletId,
        #[source]
        source: RemoteError,
    },

    #[error("Unknown restroom '{0}'")]
    UnknownToilet(ToiletId),

    #[error("Restroom '{0}' is still awaiting confirmation")]
    PendingConfirmation(ToiletId),
}
