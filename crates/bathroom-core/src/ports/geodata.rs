use async_trait::async_trait;

use crate::models::{Toilet, ViewWindow};

/// Port for the public geodata service
#[async_trait]
pub trait GeodataSource: Send + Sync {
    /// Restrooms inside the window's bounding box
    ///
    /// Results are normalized: resolvable coordinates only, status `unknown`.
    /// Network or parse failures yield an empty list.
    async fn fetch(&self, window: &ViewWindow) -> Vec<Toilet>;
}
