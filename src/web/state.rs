use std::sync::Arc;
use tokio::sync::Mutex;

use crate::control::HttpControlClient;
use crate::history::HistoryHandle;
use crate::monitor::MonitorHandle;
use crate::scan::SubmissionForm;
use crate::schedule::ScheduleService;
use crate::sidebar::SidebarHandle;

use super::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub schedule: ScheduleService<HttpControlClient>,
    pub form: Arc<Mutex<SubmissionForm>>,
    pub monitor: MonitorHandle,
    pub sidebar: SidebarHandle,
    pub history: HistoryHandle,
}

impl AppState {
    pub fn control(&self) -> &HttpControlClient {
        self.schedule.api()
    }
}
