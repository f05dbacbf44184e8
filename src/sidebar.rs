use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use utoipa::ToSchema;

use crate::control::{ControlApi, Telemetry};

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct SidebarView {
    pub azimuth: Option<f64>,
    pub altitude: Option<f64>,
    pub active_scan: Option<String>,
    pub window_start: Option<String>,
    pub window_end: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl SidebarView {
    fn replace(&mut self, telemetry: &Telemetry) {
        *self = SidebarView {
            azimuth: telemetry.az,
            altitude: telemetry.al,
            active_scan: telemetry.name.clone(),
            window_start: telemetry.start.clone(),
            window_end: telemetry.end.clone(),
            updated_at: Some(Utc::now()),
        };
    }

    fn merge(&mut self, telemetry: &Telemetry) {
        if let Some(az) = telemetry.az {
            self.azimuth = Some(az);
        }
        if let Some(al) = telemetry.al {
            self.altitude = Some(al);
        }
        if let Some(name) = &telemetry.name {
            self.active_scan = Some(name.clone());
        }
        if let Some(start) = &telemetry.start {
            self.window_start = Some(start.clone());
        }
        if let Some(end) = &telemetry.end {
            self.window_end = Some(end.clone());
        }
        self.updated_at = Some(Utc::now());
    }
}

/// Shared display state, written by the sidebar poller and the status monitor.
#[derive(Debug, Clone)]
pub struct SidebarHandle {
    view: Arc<watch::Sender<SidebarView>>,
}

impl Default for SidebarHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl SidebarHandle {
    pub fn new() -> Self {
        let (view, _) = watch::channel(SidebarView::default());
        Self {
            view: Arc::new(view),
        }
    }

    pub fn view(&self) -> SidebarView {
        self.view.borrow().clone()
    }

    pub fn replace(&self, telemetry: &Telemetry) {
        self.view.send_modify(|view| view.replace(telemetry));
    }

    pub fn merge(&self, telemetry: &Telemetry) {
        if telemetry.is_empty() {
            return;
        }
        self.view.send_modify(|view| view.merge(telemetry));
    }
}

/// Polls coarse station status independently of the status monitor.
pub struct SidebarSummary<A> {
    api: Arc<A>,
    period: Duration,
    handle: SidebarHandle,
}

impl<A: ControlApi> SidebarSummary<A> {
    pub fn new(api: Arc<A>, period: Duration, handle: SidebarHandle) -> Self {
        Self {
            api,
            period,
            handle,
        }
    }

    pub fn spawn(api: Arc<A>, period: Duration) -> SidebarHandle {
        let handle = SidebarHandle::new();
        let summary = Self::new(api, period, handle.clone());
        tokio::spawn(summary.run());
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

    /// A failed fetch keeps whatever was displayed before.
    pub async fn refresh(&self) {
        match self.api.station_status().await {
            Ok(telemetry) => self.handle.replace(&telemetry),
            Err(e) => log::warn!("station status unavailable, keeping previous display: {}", e),
        }
    }
}
