use askama::Template;
use askama_web::WebTemplate;

use crate::control::HistoryEntry;
use crate::history::HistoryView;
use crate::monitor::{MonitorState, MonitorView};
use crate::schedule::{ScheduleView, ScheduledScan};
use crate::sidebar::SidebarView;

#[derive(Debug, Clone, Default)]
pub struct ScanRow {
    pub id: String,
    pub name: String,
    pub kind: String,
    pub target: String,
    pub window: String,
    pub band: String,
}

impl From<&ScheduledScan> for ScanRow {
    fn from(scan: &ScheduledScan) -> Self {
        ScanRow {
            id: scan.id.to_string(),
            name: scan.name.clone(),
            kind: scan.kind.to_string(),
            target: scan.target(),
            window: scan.window(),
            band: format!(
                "{} - {} MHz",
                scan.freq_lower.as_deref().unwrap_or("?"),
                scan.freq_upper.as_deref().unwrap_or("?")
            ),
        }
    }
}

pub struct ActionButton {
    pub value: String,
    pub label: String,
}

#[derive(Template, WebTemplate)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub station: String,
    pub azimuth: String,
    pub altitude: String,
    pub current_scan: String,
    pub updated: String,
    pub has_active: bool,
    pub active: ScanRow,
    pub queued: Vec<ScanRow>,
    pub history: Vec<HistoryEntry>,
    pub suspended: bool,
    pub prompt_title: String,
    pub prompt_lines: Vec<String>,
    pub prompt_actions: Vec<ActionButton>,
}

fn degrees(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.1}°", v))
        .unwrap_or_else(|| "-".to_string())
}

impl DashboardTemplate {
    pub fn new(
        station: &str,
        sidebar: &SidebarView,
        schedule: &ScheduleView,
        history: &HistoryView,
        monitor: &MonitorView,
    ) -> Self {
        let window = (&sidebar.window_start, &sidebar.window_end);
        let current_scan = match (&sidebar.active_scan, window) {
            (Some(name), (Some(start), Some(end))) => format!("{} ({} - {})", name, start, end),
            (Some(name), _) => name.clone(),
            (None, _) => "No active scan".to_string(),
        };
        let (prompt_title, prompt_lines, prompt_actions) = match &monitor.prompt {
            Some(prompt) => (
                prompt.title.clone(),
                prompt.message.clone(),
                prompt
                    .actions
                    .iter()
                    .map(|action| ActionButton {
                        value: action.to_string(),
                        label: action.label().to_string(),
                    })
                    .collect(),
            ),
            None => (String::new(), Vec::new(), Vec::new()),
        };

        DashboardTemplate {
            station: station.to_string(),
            azimuth: degrees(sidebar.azimuth),
            altitude: degrees(sidebar.altitude),
            current_scan,
            updated: sidebar
                .updated_at
                .map(|t| t.format("%H:%M:%S UTC").to_string())
                .unwrap_or_else(|| "never".to_string()),
            has_active: schedule.active.is_some(),
            active: schedule.active.as_ref().map(ScanRow::from).unwrap_or_default(),
            queued: schedule.queued.iter().map(ScanRow::from).collect(),
            history: history.entries.clone(),
            suspended: monitor.state == MonitorState::AwaitingOperator,
            prompt_title,
            prompt_lines,
            prompt_actions,
        }
    }
}
