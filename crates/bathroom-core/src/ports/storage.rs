use async_trait::async_trait;

use crate::models::{Toilet, ToiletId};

/// Port for the on-device restroom cache
///
/// The cache is a best-effort accelerator. Implementations log failures and
/// degrade to an empty result or a no-op instead of returning errors.
#[async_trait]
pub trait ToiletCache: Send + Sync {
    /// Prepare the backing schema; safe to call any number of times
    async fn init(&self);

    /// Upsert each record by id, stamping the write time
    async fn save(&self, toilets: &[Toilet]);

    /// Every cached record
    async fn load_all(&self) -> Vec<Toilet>;

    /// Drop records by id; unknown ids are ignored
    async fn remove(&self, ids: &[ToiletId]);
}

/// Port for a durable string key-value slot (secure storage on a device)
#[async_trait]
pub trait KeyValueSlot: Send + Sync {
    /// Read a value
    async fn get(&self, key: &str) -> crate::Result<Option<String>>;

    /// Write a value, replacing any previous one
    async fn set(&self, key: &str, value: &str) -> crate::Result<()>;
}
