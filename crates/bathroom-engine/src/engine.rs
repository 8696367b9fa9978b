//! The reconciliation engine

use bathroom_core::geodesy::{self, NearestToilet};
use bathroom_core::models::{
    Coordinates, DeviceId, NewReport, NewToilet, ReportId, ReportedStatus, Timestamp, Toilet,
    ToiletId, ToiletStatus, ViewWindow,
};
use bathroom_core::ports::{GeodataSource, RemoteWriteStore, ToiletCache};
use bathroom_core::status::visual_status_with;
use bathroom_core::RemoteError;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{broadcast, watch};

use crate::cache_writer::CacheWriter;
use crate::error::EngineError;
use crate::notice::{LocationFix, Notice};
use crate::reconcile::{merge_into, MergeStats};
use crate::scheduler::{Debouncer, TimerHandle};
use crate::settings::EngineSettings;

const NOTICE_CAPACITY: usize = 32;

/// What became of one fetch attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// No view window has been set yet
    NoWindow,
    /// The window is wider than the admission threshold; nothing was requested
    SpanTooWide,
    /// The batch was merged
    Merged(MergeStats),
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
enum LocationAccess {
    #[default]
    Unknown,
    Granted(Coordinates),
    Denied,
}

#[derive(Default)]
struct State {
    toilets: HashMap<ToiletId, Toilet>,
    window: Option<ViewWindow>,
    /// Temporary ids whose remote write has not resolved
    pending: HashSet<ToiletId>,
    location: LocationAccess,
}

struct Inner {
    geodata: Arc<dyn GeodataSource>,
    cache: Arc<dyn ToiletCache>,
    remote: Arc<dyn RemoteWriteStore>,
    writer: CacheWriter,
    device_id: DeviceId,
    settings: EngineSettings,
    debouncer: Debouncer,
    state: RwLock<State>,
    revision: watch::Sender<u64>,
    notices: broadcast::Sender<Notice>,
}

/// Single consistent view of restroom state
///
/// Cloning is cheap; clones share the same collection. State is only touched
/// inside short synchronous sections; no lock is held across an await, and
/// every continuation after an await re-checks the record it is about to
/// change.
#[derive(Clone)]
pub struct ReconciliationEngine {
    inner: Arc<Inner>,
}

impl ReconciliationEngine {
    /// Create an engine over its collaborators
    ///
    /// Must be called from within a tokio runtime: the cache writer task is
    /// spawned here.
    pub fn new(
        geodata: Arc<dyn GeodataSource>,
        cache: Arc<dyn ToiletCache>,
        remote: Arc<dyn RemoteWriteStore>,
        device_id: DeviceId,
        settings: EngineSettings,
    ) -> Self {
        let (revision, _) = watch::channel(0);
        let (notices, _) = broadcast::channel(NOTICE_CAPACITY);

        Self {
            inner: Arc::new(Inner {
                writer: CacheWriter::spawn(Arc::clone(&cache)),
                geodata,
                cache,
                remote,
                device_id,
                debouncer: Debouncer::new(settings.debounce),
                settings,
                state: RwLock::new(State::default()),
                revision,
                notices,
            }),
        }
    }

    pub fn device_id(&self) -> &DeviceId {
        &self.inner.device_id
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.inner.settings
    }

    /// Receiver that changes whenever the collection does
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.revision.subscribe()
    }

    /// Receiver for user-visible notices
    pub fn subscribe_notices(&self) -> broadcast::Receiver<Notice> {
        self.inner.notices.subscribe()
    }

    /// Load the cached collection on cold start
    ///
    /// Temporary records left behind by an interrupted write are discarded,
    /// both here and in the cache. Records already in memory are kept. Returns
    /// the number of records loaded.
    pub async fn hydrate(&self) -> usize {
        self.inner.cache.init().await;
        let cached = self.inner.cache.load_all().await;

        let (stale, cached): (Vec<Toilet>, Vec<Toilet>) =
            cached.into_iter().partition(|t| t.id.is_temporary());
        if !stale.is_empty() {
            tracing::info!(count = stale.len(), "Discarding unconfirmed records from cache");
            self.inner.writer.remove(stale.into_iter().map(|t| t.id).collect());
        }

        let loaded = {
            let mut state = self.inner.state.write();
            let mut loaded = 0;
            for toilet in cached {
                if !state.toilets.contains_key(&toilet.id) {
                    state.toilets.insert(toilet.id.clone(), toilet);
                    loaded += 1;
                }
            }
            loaded
        };

        tracing::info!(count = loaded, "Hydrated collection from cache");
        self.publish();
        loaded
    }

    /// Record a window change and schedule a debounced fetch for it
    pub fn set_view_window(&self, window: ViewWindow) -> TimerHandle {
        self.inner.state.write().window = Some(window);

        let engine = self.clone();
        self.inner.debouncer.schedule(async move {
            engine.run_fetch(window).await;
        })
    }

    pub fn view_window(&self) -> Option<ViewWindow> {
        self.inner.state.read().window
    }

    /// Fetch the current window now, cancelling a scheduled fetch that has
    /// not started yet
    ///
    /// A scheduled fetch that is already in flight still merges its batch.
    pub async fn refresh(&self) -> FetchOutcome {
        self.inner.debouncer.cancel();
        let Some(window) = self.view_window() else {
            return FetchOutcome::NoWindow;
        };
        self.run_fetch(window).await
    }

    async fn run_fetch(&self, window: ViewWindow) -> FetchOutcome {
        if window.exceeds_span(self.inner.settings.max_span_degrees) {
            tracing::debug!(
                span = window.span(),
                max = self.inner.settings.max_span_degrees,
                "Window too wide; skipping fetch"
            );
            return FetchOutcome::SpanTooWide;
        }

        let batch = self.inner.geodata.fetch(&window).await;

        let stats = merge_into(&mut self.inner.state.write().toilets, batch.clone());

        tracing::info!(added = stats.added, replaced = stats.replaced, "Merged fetched batch");
        if !batch.is_empty() {
            self.publish();
            self.inner.writer.save(batch);
        }
        FetchOutcome::Merged(stats)
    }

    /// Add a restroom at `coordinates` with an initial status
    ///
    /// The record is visible immediately under a temporary id. On remote
    /// confirmation it is re-keyed under the durable id; on failure it is
    /// removed and a [`Notice::WriteFailed`] is broadcast.
    ///
    /// The remote write runs on its own task: dropping the returned future
    /// does not stop it, and the record is still confirmed or rolled back.
    pub async fn add_toilet(
        &self,
        coordinates: Coordinates,
        status: ToiletStatus,
        is_accessible: bool,
    ) -> Result<ToiletId, EngineError> {
        let now = Utc::now();
        let temp_id = ToiletId::temporary();
        let toilet = Toilet::local(temp_id.clone(), coordinates, status, is_accessible, now);

        {
            let mut state = self.inner.state.write();
            state.toilets.insert(temp_id.clone(), toilet.clone());
            state.pending.insert(temp_id.clone());
        }
        self.publish();
        self.inner.writer.save(vec![toilet.clone()]);
        tracing::debug!(toilet_id = %temp_id, "Inserted optimistic record");

        let request = NewToilet::from_toilet(&toilet, self.inner.device_id.clone(), now);
        let commit = tokio::spawn({
            let engine = self.clone();
            let temp_id = temp_id.clone();
            async move { engine.commit_write(temp_id, request).await }
        });

        match commit.await {
            Ok(result) => result,
            Err(e) => {
                let error = RemoteError::Transport(format!("write task failed: {}", e));
                self.roll_back_write(&temp_id, &error);
                Err(EngineError::WriteRejected(error))
            }
        }
    }

    async fn commit_write(&self, temp_id: ToiletId, request: NewToilet) -> Result<ToiletId, EngineError> {
        let result = match self.inner.remote.create_toilet(&request).await {
            Ok(id) if id.is_temporary() => Err(RemoteError::ReservedId(id.to_string())),
            other => other,
        };

        match result {
            Ok(durable_id) => {
                self.confirm_write(&temp_id, &durable_id);
                Ok(durable_id)
            }
            Err(e) => {
                self.roll_back_write(&temp_id, &e);
                Err(EngineError::WriteRejected(e))
            }
        }
    }

    fn confirm_write(&self, temp_id: &ToiletId, durable_id: &ToiletId) {
        let confirmed = {
            let mut state = self.inner.state.write();
            if state.pending.remove(temp_id) {
                state.toilets.remove(temp_id).map(|record| {
                    let record = record.with_id(durable_id.clone());
                    state.toilets.insert(durable_id.clone(), record.clone());
                    record
                })
            } else {
                None
            }
        };

        match confirmed {
            Some(record) => {
                tracing::info!(temp_id = %temp_id, toilet_id = %durable_id, "Write committed");
                self.publish();
                self.inner.writer.save(vec![record]);
                self.inner.writer.remove(vec![temp_id.clone()]);
            }
            None => {
                tracing::warn!(temp_id = %temp_id, toilet_id = %durable_id, "Confirmed record no longer pending");
            }
        }
    }

    fn roll_back_write(&self, temp_id: &ToiletId, error: &RemoteError) {
        {
            let mut state = self.inner.state.write();
            state.pending.remove(temp_id);
            state.toilets.remove(temp_id);
        }
        tracing::warn!(temp_id = %temp_id, error = %error, "Write rolled back");

        self.publish();
        self.inner.writer.remove(vec![temp_id.clone()]);
        self.notify(Notice::WriteFailed { toilet_id: temp_id.clone(), reason: error.to_string() });
    }

    /// Report a restroom as open or closed from `location`
    ///
    /// Records created on this device take the reported status; records from
    /// the geodata source keep theirs.
    pub async fn report_status(
        &self,
        toilet_id: &ToiletId,
        status: ReportedStatus,
        location: Coordinates,
    ) -> Result<ReportId, EngineError> {
        {
            let state = self.inner.state.read();
            if !state.toilets.contains_key(toilet_id) {
                return Err(EngineError::UnknownToilet(toilet_id.clone()));
            }
            if toilet_id.is_temporary() || state.pending.contains(toilet_id) {
                return Err(EngineError::PendingConfirmation(toilet_id.clone()));
            }
        }

        let now = Utc::now();
        let report = NewReport {
            toilet_id: toilet_id.clone(),
            status_reported: status,
            timestamp: now,
            device_id: self.inner.device_id.clone(),
            location,
        };

        let report_id = match self.inner.remote.submit_report(&report).await {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!(toilet_id = %toilet_id, error = %e, "Report failed");
                self.notify(Notice::ReportFailed { toilet_id: toilet_id.clone(), reason: e.to_string() });
                return Err(EngineError::ReportRejected { toilet_id: toilet_id.clone(), source: e });
            }
        };
        tracing::info!(toilet_id = %toilet_id, report_id = %report_id, status = %status, "Report submitted");

        let updated = {
            let mut state = self.inner.state.write();
            state.toilets.get_mut(toilet_id).filter(|t| t.is_local()).map(|toilet| {
                toilet.status = status.into();
                toilet.last_confirmed = Timestamp::Native(now);
                toilet.report_count = toilet.report_count.saturating_add(1);
                toilet.clone()
            })
        };
        if let Some(toilet) = updated {
            self.publish();
            self.inner.writer.save(vec![toilet]);
        }

        Ok(report_id)
    }

    /// Apply the outcome of a location permission request
    pub fn set_location(&self, fix: LocationFix) {
        let access = match fix {
            LocationFix::Granted(position) => LocationAccess::Granted(position),
            LocationFix::Denied => LocationAccess::Denied,
        };
        self.inner.state.write().location = access;

        if access == LocationAccess::Denied {
            tracing::warn!("Location access denied; nearest restroom unavailable");
            self.notify(Notice::LocationDenied);
        }
    }

    /// Current user position, if location access was granted
    pub fn location(&self) -> Option<Coordinates> {
        match self.inner.state.read().location {
            LocationAccess::Granted(position) => Some(position),
            LocationAccess::Unknown | LocationAccess::Denied => None,
        }
    }

    /// Closest restroom to the user; `None` without a position or records
    pub fn nearest_toilet(&self) -> Option<NearestToilet> {
        let state = self.inner.state.read();
        match state.location {
            LocationAccess::Granted(position) => geodesy::nearest(position, state.toilets.values()),
            LocationAccess::Unknown | LocationAccess::Denied => None,
        }
    }

    /// Every record, ordered by id
    pub fn snapshot(&self) -> Vec<Toilet> {
        let mut toilets: Vec<Toilet> = self.inner.state.read().toilets.values().cloned().collect();
        toilets.sort_by(|a, b| a.id.cmp(&b.id));
        toilets
    }

    pub fn get(&self, id: &ToiletId) -> Option<Toilet> {
        self.inner.state.read().toilets.get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.state.read().toilets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Temporary ids awaiting remote confirmation
    pub fn pending(&self) -> Vec<ToiletId> {
        let mut pending: Vec<ToiletId> = self.inner.state.read().pending.iter().cloned().collect();
        pending.sort();
        pending
    }

    /// Displayed status of a record under the configured freshness threshold
    pub fn visual_status(&self, toilet: &Toilet, now: DateTime<Utc>) -> ToiletStatus {
        visual_status_with(toilet, now, self.inner.settings.freshness)
    }

    pub fn visual_status_of(&self, id: &ToiletId, now: DateTime<Utc>) -> Option<ToiletStatus> {
        self.get(id).map(|toilet| self.visual_status(&toilet, now))
    }

    /// Wait until all queued cache writes have been applied
    pub async fn flush_cache(&self) {
        self.inner.writer.flush().await;
    }

    fn publish(&self) {
        self.inner.revision.send_modify(|revision| *revision += 1);
    }

    fn notify(&self, notice: Notice) {
        // No subscribers is fine
        let _ = self.inner.notices.send(notice);
    }
}
