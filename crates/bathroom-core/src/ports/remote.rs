use async_trait::async_trait;

use crate::error::RemoteError;
use crate::models::{NewReport, NewToilet, ReportId, ToiletId};

/// Port for the remote document store
///
/// Both writes are single-shot: no retries happen behind this boundary and
/// every failure is returned to the caller.
#[async_trait]
pub trait RemoteWriteStore: Send + Sync {
    /// Append a restroom record and return its durable id
    async fn create_toilet(&self, toilet: &NewToilet) -> Result<ToiletId, RemoteError>;

    /// Append a status report and return its id
    async fn submit_report(&self, report: &NewReport) -> Result<ReportId, RemoteError>;
}
