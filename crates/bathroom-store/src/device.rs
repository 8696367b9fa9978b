//! Durable key-value slot and the anonymous device id

use async_trait::async_trait;
use bathroom_core::models::DeviceId;
use bathroom_core::ports::KeyValueSlot;
use bathroom_core::BathroomError;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Slot key holding the device id
pub const DEVICE_ID_KEY: &str = "device_id";

/// Key-value slot persisted as a flat JSON object in one file
#[derive(Debug)]
pub struct FileKeyValueStore {
    path: PathBuf,
    // Serializes read-modify-write cycles
    write_lock: Mutex<()>,
}

impl FileKeyValueStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), write_lock: Mutex::new(()) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sibling file that new contents are staged in before replacing the slot
    fn staging_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    async fn read_all(&self) -> bathroom_core::Result<BTreeMap<String, String>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) if contents.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(contents) => serde_json::from_str(&contents).map_err(|e| {
                BathroomError::Serialization(format!("{}: {}", self.path.display(), e))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl KeyValueSlot for FileKeyValueStore {
    async fn get(&self, key: &str) -> bathroom_core::Result<Option<String>> {
        Ok(self.read_all().await?.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> bathroom_core::Result<()> {
        let _guard = self.write_lock.lock().await;

        let mut values = self.read_all().await?;
        values.insert(key.to_string(), value.to_string());
        let contents = serde_json::to_string_pretty(&values)
            .map_err(|e| BathroomError::Serialization(e.to_string()))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        // Staged and renamed; a crash never leaves a torn slot
        let staging = self.staging_path();
        tokio::fs::write(&staging, contents).await?;
        tokio::fs::rename(&staging, &self.path).await?;
        Ok(())
    }
}

/// Read the device id from the slot, minting and persisting one on first use
///
/// Never fails: when the slot cannot be read or written, a fresh id is used
/// for this session only.
pub async fn load_or_create_device_id(slot: &dyn KeyValueSlot) -> DeviceId {
    match slot.get(DEVICE_ID_KEY).await {
        Ok(Some(stored)) => {
            if let Some(id) = DeviceId::parse(&stored) {
                return id;
            }
            tracing::warn!(value = %stored, "Stored device id is malformed; replacing it");
        }
        Ok(None) => {}
        Err(e) => {
            tracing::warn!(error = %e, "Device id slot unreadable; using a non-persistent id");
            return DeviceId::generate();
        }
    }

    let id = DeviceId::generate();
    match slot.set(DEVICE_ID_KEY, id.as_str()).await {
        Ok(()) => tracing::info!(device_id = %id, "Generated new device id"),
        Err(e) => tracing::warn!(error = %e, "Could not persist device id; using a non-persistent id"),
    }
    id
}
