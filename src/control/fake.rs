//! In-process control server used by the unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::control::client::ControlApi;
use crate::control::error::{ControlError, ControlResult};
use crate::control::types::{
    ArchivedScan, ConfigSection, ConfigValue, HistoryEntry, SearchQuery, Source, Telemetry,
};
use crate::monitor::status::{ReportCode, StatusReport};
use crate::scan::request::{ScanId, ScanRequest};
use crate::schedule::snapshot::{ScheduleSnapshot, ScheduledScan};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    SubmitScan(ScanRequest),
    Schedule,
    CancelScan(ScanId),
    Status,
    Acknowledge(StatusReport),
    StationStatus,
    Sources,
    AddSource(Source),
    RemoveSource(String),
    ConfigSection(ConfigSection),
    UpdateConfigSection(ConfigSection, Vec<String>),
    History,
    SearchScans(SearchQuery),
    DownloadScans(Vec<ScanId>),
    DeleteScans(Vec<ScanId>),
}

#[derive(Default)]
pub struct FakeControl {
    calls: Mutex<Vec<Call>>,
    /// `None` entries make the corresponding poll fail.
    statuses: Mutex<VecDeque<Option<StatusReport>>>,
    telemetry: Mutex<VecDeque<Option<Telemetry>>>,
    schedule: Mutex<Vec<ScheduledScan>>,
    sources: Mutex<Vec<Source>>,
    config: Mutex<Vec<(ConfigSection, Vec<ConfigValue>)>>,
    history: Mutex<Vec<HistoryEntry>>,
    archive: Mutex<Vec<ArchivedScan>>,
    admin: AtomicBool,
    next_id: AtomicU64,
    schedule_down: AtomicBool,
    acknowledge_down: AtomicBool,
    /// Schedule fetches answer with the schedule as it was when the request arrived.
    schedule_delay: Mutex<Duration>,
}

fn unavailable<T>() -> ControlResult<T> {
    Err(ControlError::Status {
        status: 503,
        body: "unavailable".to_string(),
    })
}

impl FakeControl {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(100),
            ..Self::default()
        }
    }

    pub fn with_schedule(self, scans: Vec<ScheduledScan>) -> Self {
        self.set_schedule(scans);
        self
    }

    pub fn set_schedule(&self, scans: Vec<ScheduledScan>) {
        *self.schedule.lock().unwrap() = scans;
    }

    pub fn with_history(self, history: Vec<HistoryEntry>) -> Self {
        *self.history.lock().unwrap() = history;
        self
    }

    pub fn with_archive(self, archive: Vec<ArchivedScan>) -> Self {
        *self.archive.lock().unwrap() = archive;
        self
    }

    pub fn as_admin(self) -> Self {
        self.admin.store(true, Ordering::SeqCst);
        self
    }

    pub fn archive(&self) -> Vec<ArchivedScan> {
        self.archive.lock().unwrap().clone()
    }

    pub fn fail_schedule(&self, down: bool) {
        self.schedule_down.store(down, Ordering::SeqCst);
    }

    pub fn fail_acknowledge(&self, down: bool) {
        self.acknowledge_down.store(down, Ordering::SeqCst);
    }

    pub fn delay_schedule(&self, delay: Duration) {
        *self.schedule_delay.lock().unwrap() = delay;
    }

    pub fn push_status(&self, report: StatusReport) {
        self.statuses.lock().unwrap().push_back(Some(report));
    }

    pub fn push_status_failure(&self) {
        self.statuses.lock().unwrap().push_back(None);
    }

    pub fn push_telemetry(&self, telemetry: Option<Telemetry>) {
        self.telemetry.lock().unwrap().push_back(telemetry);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, matches: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| matches(c)).count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn snapshot(&self) -> ControlResult<ScheduleSnapshot> {
        if self.schedule_down.load(Ordering::SeqCst) {
            return unavailable();
        }
        Ok(ScheduleSnapshot::new(self.schedule.lock().unwrap().clone()))
    }
}

impl ControlApi for FakeControl {
    async fn submit_scan(&self, request: &ScanRequest) -> ControlResult<ScheduleSnapshot> {
        self.record(Call::SubmitScan(request.clone()));
        if self.schedule_down.load(Ordering::SeqCst) {
            return unavailable();
        }
        let id = request
            .id
            .clone()
            .unwrap_or_else(|| ScanId::Number(self.next_id.fetch_add(1, Ordering::SeqCst)));
        self.schedule.lock().unwrap().push(ScheduledScan {
            id,
            name: request.name.clone(),
            kind: request.kind,
            source: request.source.clone(),
            ras: request.ras.clone(),
            dec: request.dec.clone(),
            lat: request.lat.clone(),
            lon: request.lon.clone(),
            start: None,
            end: None,
            freq_lower: Some(request.freq_lower.clone()),
            freq_upper: Some(request.freq_upper.clone()),
            current: false,
        });
        self.snapshot()
    }

    async fn schedule(&self) -> ControlResult<ScheduleSnapshot> {
        self.record(Call::Schedule);
        let snapshot = self.snapshot();
        let delay = *self.schedule_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        snapshot
    }

    async fn cancel_scan(&self, id: &ScanId) -> ControlResult<ScheduleSnapshot> {
        self.record(Call::CancelScan(id.clone()));
        self.schedule
            .lock()
            .unwrap()
            .retain(|scan| !scan.id.same_as(id));
        self.snapshot()
    }

    async fn status(&self) -> ControlResult<StatusReport> {
        self.record(Call::Status);
        match self.statuses.lock().unwrap().pop_front() {
            Some(Some(report)) => Ok(report),
            Some(None) => unavailable(),
            None => Ok(StatusReport::new(ReportCode::Ok, None)),
        }
    }

    async fn acknowledge(&self, report: &StatusReport) -> ControlResult<()> {
        self.record(Call::Acknowledge(report.clone()));
        if self.acknowledge_down.load(Ordering::SeqCst) {
            return unavailable();
        }
        Ok(())
    }

    async fn station_status(&self) -> ControlResult<Telemetry> {
        self.record(Call::StationStatus);
        match self.telemetry.lock().unwrap().pop_front() {
            Some(Some(telemetry)) => Ok(telemetry),
            Some(None) => unavailable(),
            None => Ok(Telemetry::default()),
        }
    }

    async fn sources(&self) -> ControlResult<Vec<Source>> {
        self.record(Call::Sources);
        Ok(self.sources.lock().unwrap().clone())
    }

    async fn add_source(&self, source: &Source) -> ControlResult<Vec<Source>> {
        self.record(Call::AddSource(source.clone()));
        let mut sources = self.sources.lock().unwrap();
        sources.push(source.clone());
        Ok(sources.clone())
    }

    async fn remove_source(&self, name: &str) -> ControlResult<Vec<Source>> {
        self.record(Call::RemoveSource(name.to_string()));
        let mut sources = self.sources.lock().unwrap();
        sources.retain(|s| s.name != name);
        Ok(sources.clone())
    }

    async fn config_section(&self, section: ConfigSection) -> ControlResult<Vec<ConfigValue>> {
        self.record(Call::ConfigSection(section));
        Ok(self
            .config
            .lock()
            .unwrap()
            .iter()
            .find(|(s, _)| *s == section)
            .map(|(_, values)| values.clone())
            .unwrap_or_default())
    }

    async fn update_config_section(
        &self,
        section: ConfigSection,
        values: &[String],
    ) -> ControlResult<Vec<ConfigValue>> {
        self.record(Call::UpdateConfigSection(section, values.to_vec()));
        let stored: Vec<ConfigValue> = values.iter().cloned().map(ConfigValue::String).collect();
        let mut config = self.config.lock().unwrap();
        config.retain(|(s, _)| *s != section);
        config.push((section, stored.clone()));
        Ok(stored)
    }

    async fn history(&self) -> ControlResult<Vec<HistoryEntry>> {
        self.record(Call::History);
        Ok(self.history.lock().unwrap().clone())
    }

    async fn search_scans(&self, query: &SearchQuery) -> ControlResult<Vec<ArchivedScan>> {
        self.record(Call::SearchScans(query.clone()));
        Ok(self
            .archive
            .lock()
            .unwrap()
            .iter()
            .filter(|scan| query.name.is_empty() || scan.name == query.name)
            .cloned()
            .collect())
    }

    async fn download_scans(&self, ids: &[ScanId]) -> ControlResult<Vec<u8>> {
        self.record(Call::DownloadScans(ids.to_vec()));
        let mut archive = b"PK".to_vec();
        for id in ids {
            archive.extend(id.to_string().bytes());
        }
        Ok(archive)
    }

    async fn delete_scans(&self, ids: &[ScanId]) -> ControlResult<()> {
        self.record(Call::DeleteScans(ids.to_vec()));
        if !self.admin.load(Ordering::SeqCst) {
            return Err(ControlError::NotAdmin);
        }
        self.archive
            .lock()
            .unwrap()
            .retain(|scan| !ids.iter().any(|id| scan.id.same_as(id)));
        Ok(())
    }
}
