//! In-memory storage implementations for development and testing.

use async_trait::async_trait;
use bathroom_core::error::RemoteError;
use bathroom_core::models::{NewReport, NewToilet, Report, ReportId, Toilet, ToiletId};
use bathroom_core::ports::{KeyValueSlot, RemoteWriteStore, ToiletCache};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// In-memory implementation of ToiletCache
#[derive(Debug, Clone, Default)]
pub struct MemoryToiletCache {
    toilets: Arc<RwLock<BTreeMap<ToiletId, Toilet>>>,
}

impl MemoryToiletCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache pre-populated with records
    pub fn with_toilets(toilets: impl IntoIterator<Item = Toilet>) -> Self {
        let cache = Self::new();
        cache.toilets.write().extend(toilets.into_iter().map(|t| (t.id.clone(), t)));
        cache
    }

    pub fn get(&self, id: &ToiletId) -> Option<Toilet> {
        self.toilets.read().get(id).cloned()
    }

    pub fn ids(&self) -> Vec<ToiletId> {
        self.toilets.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.toilets.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.toilets.read().is_empty()
    }
}

#[async_trait]
impl ToiletCache for MemoryToiletCache {
    async fn init(&self) {}

    async fn save(&self, toilets: &[Toilet]) {
        let mut stored = self.toilets.write();
        for toilet in toilets {
            stored.insert(toilet.id.clone(), toilet.clone());
        }
    }

    async fn load_all(&self) -> Vec<Toilet> {
        self.toilets.read().values().cloned().collect()
    }

    async fn remove(&self, ids: &[ToiletId]) {
        let mut stored = self.toilets.write();
        for id in ids {
            stored.remove(id);
        }
    }
}

/// In-memory implementation of RemoteWriteStore
///
/// Ids are minted as `<prefix><n>`. The store can be switched into a failing
/// mode in which every write is rejected.
#[derive(Debug)]
pub struct MemoryRemoteStore {
    id_prefix: String,
    next_id: AtomicU64,
    failing: AtomicBool,
    toilets: RwLock<Vec<(ToiletId, NewToilet)>>,
    reports: RwLock<Vec<Report>>,
}

impl Default for MemoryRemoteStore {
    fn default() -> Self {
        Self::with_id_prefix("doc-")
    }
}

impl MemoryRemoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id_prefix(prefix: impl Into<String>) -> Self {
        Self {
            id_prefix: prefix.into(),
            next_id: AtomicU64::new(1),
            failing: AtomicBool::new(false),
            toilets: RwLock::new(Vec::new()),
            reports: RwLock::new(Vec::new()),
        }
    }

    /// Store whose every write fails
    pub fn failing() -> Self {
        let store = Self::default();
        store.set_failing(true);
        store
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Created records with their assigned ids, in write order
    pub fn created_toilets(&self) -> Vec<(ToiletId, NewToilet)> {
        self.toilets.read().clone()
    }

    pub fn reports(&self) -> Vec<Report> {
        self.reports.read().clone()
    }

    fn check_available(&self) -> Result<(), RemoteError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(RemoteError::Rejected {
                status: 503,
                message: "store unavailable".to_string(),
            });
        }
        Ok(())
    }

    fn mint_id(&self) -> String {
        format!("{}{}", self.id_prefix, self.next_id.fetch_add(1, Ordering::SeqCst))
    }
}

#[async_trait]
impl RemoteWriteStore for MemoryRemoteStore {
    async fn create_toilet(&self, toilet: &NewToilet) -> Result<ToiletId, RemoteError> {
        self.check_available()?;
        let id = ToiletId::new(self.mint_id());
        self.toilets.write().push((id.clone(), toilet.clone()));
        Ok(id)
    }

    async fn submit_report(&self, report: &NewReport) -> Result<ReportId, RemoteError> {
        self.check_available()?;
        let id = ReportId::new(self.mint_id());
        self.reports.write().push(Report::from_new(id.clone(), report.clone()));
        Ok(id)
    }
}

/// In-memory implementation of KeyValueSlot
#[derive(Debug, Clone, Default)]
pub struct MemoryKeyValueStore {
    values: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueSlot for MemoryKeyValueStore {
    async fn get(&self, key: &str) -> bathroom_core::Result<Option<String>> {
        Ok(self.values.read().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> bathroom_core::Result<()> {
        self.values.write().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bathroom_core::models::{Coordinates, DeviceId, ReportedStatus, ToiletStatus};
    use chrono::Utc;

    fn toilet(id: &str) -> Toilet {
        Toilet::local(
            ToiletId::new(id),
            Coordinates::new(1.0, 2.0).unwrap(),
            ToiletStatus::Open,
            true,
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn test_cache_upsert_and_remove() {
        let cache = MemoryToiletCache::new();
        cache.save(&[toilet("a"), toilet("b")]).await;

        let mut updated = toilet("a");
        updated.status = ToiletStatus::Closed;
        cache.save(&[updated]).await;

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&ToiletId::new("a")).unwrap().status, ToiletStatus::Closed);

        cache.remove(&[ToiletId::new("a"), ToiletId::new("missing")]).await;
        assert_eq!(cache.ids(), vec![ToiletId::new("b")]);
    }

    #[tokio::test]
    async fn test_remote_store_mints_ids() {
        let store = MemoryRemoteStore::new();
        let new = NewToilet::from_toilet(&toilet("temp-1"), DeviceId::generate(), Utc::now());

        let first = store.create_toilet(&new).await.unwrap();
        let second = store.create_toilet(&new).await.unwrap();

        assert_eq!(first.as_str(), "doc-1");
        assert_eq!(second.as_str(), "doc-2");
        assert_eq!(store.created_toilets().len(), 2);
    }

    #[tokio::test]
    async fn test_failing_remote_store() {
        let store = MemoryRemoteStore::failing();
        let report = NewReport {
            toilet_id: ToiletId::new("doc-1"),
            status_reported: ReportedStatus::Closed,
            timestamp: Utc::now(),
            device_id: DeviceId::generate(),
            location: Coordinates::new(1.0, 2.0).unwrap(),
        };

        assert!(matches!(
            store.submit_report(&report).await,
            Err(RemoteError::Rejected { status: 503, .. })
        ));
        assert!(store.reports().is_empty());

        store.set_failing(false);
        assert!(store.submit_report(&report).await.is_ok());
        assert_eq!(store.reports().len(), 1);
    }
}
