use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::control::{ControlApi, ControlResult};
use crate::scan::request::{ScanId, ScanRequest};
use crate::schedule::snapshot::{ScheduleSnapshot, ScheduleView};

/// Local copy of the server-held schedule. Only ever replaced wholesale.
///
/// Every outgoing schedule request takes a sequence number from [`ScheduleCache::begin`];
/// a response is applied only if it is newer than the last one applied, so a slow
/// refresh can never overwrite the result of a later cancel.
#[derive(Debug, Default)]
pub struct ScheduleCache {
    snapshot: ScheduleSnapshot,
    issued: u64,
    applied: u64,
}

impl ScheduleCache {
    pub fn begin(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }

    pub fn apply(&mut self, seq: u64, snapshot: ScheduleSnapshot) -> bool {
        if seq <= self.applied {
            return false;
        }
        self.applied = seq;
        self.snapshot = snapshot;
        true
    }

    pub fn snapshot(&self) -> &ScheduleSnapshot {
        &self.snapshot
    }
}

pub struct ScheduleService<A> {
    api: Arc<A>,
    cache: Arc<Mutex<ScheduleCache>>,
}

impl<A> Clone for ScheduleService<A> {
    fn clone(&self) -> Self {
        Self {
            api: self.api.clone(),
            cache: self.cache.clone(),
        }
    }
}

impl<A: ControlApi> ScheduleService<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self {
            api,
            cache: Arc::default(),
        }
    }

    pub fn api(&self) -> &Arc<A> {
        &self.api
    }

    fn cache(&self) -> MutexGuard<'_, ScheduleCache> {
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Sends one schedule-returning request and applies its response if still current.
    /// Returns whatever the cache holds afterwards.
    async fn exchange<F>(&self, request: F) -> ControlResult<ScheduleSnapshot>
    where
        F: Future<Output = ControlResult<ScheduleSnapshot>>,
    {
        let seq = self.cache().begin();
        let snapshot = request.await?;

        let mut cache = self.cache();
        if !cache.apply(seq, snapshot) {
            log::debug!("discarding stale schedule response #{}", seq);
        }
        Ok(cache.snapshot().clone())
    }

    pub async fn refresh(&self) -> ControlResult<ScheduleSnapshot> {
        self.exchange(self.api.schedule()).await
    }

    /// Dequeues a scan. Ids the server no longer knows are not an error, the
    /// returned snapshot is applied either way.
    pub async fn cancel(&self, id: &ScanId) -> ControlResult<ScheduleSnapshot> {
        let snapshot = self.exchange(self.api.cancel_scan(id)).await?;
        if snapshot.contains(id) {
            log::warn!("scan {} is still scheduled after cancel", id);
        } else {
            log::info!("scan {} removed from schedule", id);
        }
        Ok(snapshot)
    }

    pub async fn submit(&self, request: &ScanRequest) -> ControlResult<ScheduleSnapshot> {
        let snapshot = self.exchange(self.api.submit_scan(request)).await?;
        if let Some(id) = &request.id {
            if !snapshot.contains(id) {
                log::info!("provisional scan id {} not echoed by the server", id);
            }
        }
        Ok(snapshot)
    }

    #[cfg(test)]
    pub fn snapshot(&self) -> ScheduleSnapshot {
        self.cache().snapshot().clone()
    }

    pub fn view(&self) -> ScheduleView {
        self.cache().snapshot().view()
    }
}
