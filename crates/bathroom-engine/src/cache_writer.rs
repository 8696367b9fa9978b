use bathroom_core::models::{Toilet, ToiletId};
use bathroom_core::ports::ToiletCache;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

enum CacheOp {
    Save(Vec<Toilet>),
    Remove(Vec<ToiletId>),
    Flush(oneshot::Sender<()>),
}

/// Fire-and-forget cache writes, applied in submission order
///
/// A single background task owns the write side of the cache, so a removal
/// queued after a save can never overtake it.
pub(crate) struct CacheWriter {
    tx: mpsc::UnboundedSender<CacheOp>,
}

impl CacheWriter {
    /// Start the writer task; it stops once the writer is dropped
    pub(crate) fn spawn(cache: Arc<dyn ToiletCache>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            cache.init().await;
            while let Some(op) = rx.recv().await {
                match op {
                    CacheOp::Save(toilets) => cache.save(&toilets).await,
                    CacheOp::Remove(ids) => cache.remove(&ids).await,
                    CacheOp::Flush(done) => {
                        let _ = done.send(());
                    }
                }
            }
        });

        Self { tx }
    }

    pub(crate) fn save(&self, toilets: Vec<Toilet>) {
        if !toilets.is_empty() {
            self.submit(CacheOp::Save(toilets));
        }
    }

    pub(crate) fn remove(&self, ids: Vec<ToiletId>) {
        if !ids.is_empty() {
            self.submit(CacheOp::Remove(ids));
        }
    }

    /// Wait until every write queued so far has been applied
    pub(crate) async fn flush(&self) {
        let (done, wait) = oneshot::channel();
        self.submit(CacheOp::Flush(done));
        let _ = wait.await;
    }

    fn submit(&self, op: CacheOp) {
        if self.tx.send(op).is_err() {
            tracing::warn!("Cache writer has stopped; dropping cache write");
        }
    }
}
