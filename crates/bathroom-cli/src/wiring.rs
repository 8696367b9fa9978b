//! Construction of the engine and its adapters from configuration

use anyhow::{Context, Result};
use async_trait::async_trait;
use bathroom_core::config::LayeredConfig;
use bathroom_core::models::{DeviceId, NewReport, NewToilet, ReportId, ToiletId};
use bathroom_core::ports::{RemoteWriteStore, ToiletCache};
use bathroom_core::RemoteError;
use bathroom_engine::{EngineSettings, ReconciliationEngine};
use bathroom_geodata::OverpassClient;
use bathroom_store::{load_or_create_device_id, FileKeyValueStore, FirestoreRestStore, MemoryToiletCache, SqliteCache};
use std::sync::Arc;

/// Remote store used when no project is configured; every write fails
struct UnconfiguredRemote;

#[async_trait]
impl RemoteWriteStore for UnconfiguredRemote {
    async fn create_toilet(&self, _toilet: &NewToilet) -> Result<ToiletId, RemoteError> {
        Err(RemoteError::NotConfigured("firestore_project".to_string()))
    }

    async fn submit_report(&self, _report: &NewReport) -> Result<ReportId, RemoteError> {
        Err(RemoteError::NotConfigured("firestore_project".to_string()))
    }
}

pub async fn device_id(config: &LayeredConfig) -> DeviceId {
    let slot = FileKeyValueStore::new(&config.device_store_path.value);
    load_or_create_device_id(&slot).await
}

async fn cache(config: &LayeredConfig) -> Arc<dyn ToiletCache> {
    let path = &config.cache_path.value;
    match SqliteCache::open(path).await {
        Ok(cache) => Arc::new(cache),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Cache unavailable; continuing without persistence");
            Arc::new(MemoryToiletCache::new())
        }
    }
}

fn remote(config: &LayeredConfig) -> Arc<dyn RemoteWriteStore> {
    match &config.firestore_project.value {
        Some(project) => Arc::new(FirestoreRestStore::new(project.clone(), config.firestore_api_key.value.clone())),
        None => Arc::new(UnconfiguredRemote),
    }
}

/// Build an engine and load the cached collection into it
pub async fn engine(config: &LayeredConfig) -> Result<ReconciliationEngine> {
    let engine = ReconciliationEngine::new(
        Arc::new(OverpassClient::new(config.overpass_url.value.clone())),
        cache(config).await,
        remote(config),
        device_id(config).await,
        EngineSettings::from(config),
    );
    engine.hydrate().await;
    Ok(engine)
}

/// Like [`engine`], but refuses to start without a remote store
pub async fn writable_engine(config: &LayeredConfig) -> Result<ReconciliationEngine> {
    config
        .require_firestore_project()
        .context("Writes need a remote store; set firestore_project or BATHROOM_FIRESTORE_PROJECT")?;
    engine(config).await
}
