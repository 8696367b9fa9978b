//! Port trait definitions
//!
//! These traits define the interfaces that adapters must implement.

pub mod geodata;
pub mod remote;
pub mod storage;

pub use geodata::GeodataSource;
pub use remote::RemoteWriteStore;
pub use storage::{KeyValueSlot, ToiletCache};
