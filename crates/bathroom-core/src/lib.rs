//! Bathroom Now Core - Domain models, status decay, and configuration
//!
//! This crate contains the restroom entity model, the staleness-decay rules,
//! the geodesy helpers and the port definitions implemented by the adapters.

pub mod config;
pub mod error;
pub mod geodesy;
pub mod models;
pub mod ports;
pub mod status;

pub use error::{BathroomError, RemoteError, Result, TimestampError};
