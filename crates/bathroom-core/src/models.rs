pub mod device;
pub mod report;
pub mod timestamp;
pub mod toilet;
pub mod window;

pub use device::DeviceId;
pub use report::{NewReport, Report, ReportId, ReportedStatus};
pub use timestamp::Timestamp;
pub use toilet::{Coordinates, NewToilet, Toilet, ToiletId, ToiletOrigin, ToiletStatus};
pub use window::{Bounds, ViewWindow};
