//! In-memory geodata source for tests and offline use

use async_trait::async_trait;
use bathroom_core::models::{Toilet, ViewWindow};
use bathroom_core::ports::GeodataSource;
use parking_lot::RwLock;

/// Serves a fixed set of restrooms, filtered by window containment
///
/// Every request is recorded so callers can assert how often, and for which
/// windows, the source was queried.
#[derive(Default)]
pub struct MemoryGeodataSource {
    fixtures: RwLock<Vec<Toilet>>,
    requests: RwLock<Vec<ViewWindow>>,
}

impl MemoryGeodataSource {
    pub fn new(fixtures: Vec<Toilet>) -> Self {
        Self { fixtures: RwLock::new(fixtures), requests: RwLock::new(Vec::new()) }
    }

    /// Replace the served data
    pub fn set_fixtures(&self, fixtures: Vec<Toilet>) {
        *self.fixtures.write() = fixtures;
    }

    /// Windows requested so far, oldest first
    pub fn requests(&self) -> Vec<ViewWindow> {
        self.requests.read().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.read().len()
    }
}

#[async_trait]
impl GeodataSource for MemoryGeodataSource {
    async fn fetch(&self, window: &ViewWindow) -> Vec<Toilet> {
        self.requests.write().push(*window);
        self.fixtures
            .read()
            .iter()
            .filter(|t| window.contains(&t.coordinates))
            .cloned()
            .collect()
    }
}
