use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use utoipa::ToSchema;

use crate::control::{ControlApi, HistoryEntry};

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct HistoryView {
    pub entries: Vec<HistoryEntry>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct HistoryHandle {
    view: Arc<watch::Sender<HistoryView>>,
}

impl Default for HistoryHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryHandle {
    pub fn new() -> Self {
        let (view, _) = watch::channel(HistoryView::default());
        Self {
            view: Arc::new(view),
        }
    }

    pub fn view(&self) -> HistoryView {
        self.view.borrow().clone()
    }

    pub fn replace(&self, entries: Vec<HistoryEntry>) {
        self.view.send_replace(HistoryView {
            entries,
            updated_at: Some(Utc::now()),
        });
    }
}

/// Keeps the recent scan history shown on the dashboard.
pub struct HistoryPoller<A> {
    api: Arc<A>,
    period: Duration,
    handle: HistoryHandle,
}

impl<A: ControlApi> HistoryPoller<A> {
    pub fn new(api: Arc<A>, period: Duration, handle: HistoryHandle) -> Self {
        Self {
            api,
            period,
            handle,
        }
    }

    pub fn spawn(api: Arc<A>, period: Duration) -> HistoryHandle {
        let handle = HistoryHandle::new();
        let poller = Self::new(api, period, handle.clone());
        tokio::spawn(poller.run());
        handle
    }

    async fn run(self) {
        let mut timer = interval(self.period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            timer.tick().await;
            self.refresh().await;
        }
    }

    pub async fn refresh(&self) {
        match self.api.history().await {
            Ok(entries) => {
                log::debug!("scan history has {} entries", entries.len());
                self.handle.replace(entries);
            }
            Err(e) => log::warn!("scan history unavailable, keeping previous list: {}", e),
        }
    }
}
