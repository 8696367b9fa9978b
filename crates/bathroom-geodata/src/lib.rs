//! Bathroom Now geodata - public restroom data sources
//!
//! This crate implements the [`GeodataSource`](bathroom_core::ports::GeodataSource)
//! port against an Overpass API endpoint, plus an in-memory fixture source.

pub mod memory;
pub mod normalize;
pub mod overpass;

pub use memory::MemoryGeodataSource;
pub use normalize::{normalize_response, OverpassElement, OverpassResponse};
pub use overpass::{build_query, FetchError, OverpassClient};
