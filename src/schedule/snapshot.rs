use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::scan::request::{optional_text, text, ScanId, ScanKind, NO_SOURCE};

/// A scan as confirmed by the control server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ScheduledScan {
    pub id: ScanId,
    #[serde(default, deserialize_with = "text")]
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ScanKind,
    #[serde(default = "no_source", deserialize_with = "text")]
    pub source: String,
    #[serde(default, deserialize_with = "optional_text")]
    pub ras: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub dec: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub lat: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub lon: Option<String>,
    #[serde(default, rename = "starttime", deserialize_with = "optional_text")]
    pub start: Option<String>,
    #[serde(default, rename = "endtime", deserialize_with = "optional_text")]
    pub end: Option<String>,
    #[serde(default, rename = "freqlower", deserialize_with = "optional_text")]
    pub freq_lower: Option<String>,
    #[serde(default, rename = "frequpper", deserialize_with = "optional_text")]
    pub freq_upper: Option<String>,
    #[serde(default)]
    pub current: bool,
}

fn no_source() -> String {
    NO_SOURCE.to_string()
}

impl ScheduledScan {
    /// Short description of what the scan points at.
    pub fn target(&self) -> String {
        if self.kind == ScanKind::Track && !self.source.is_empty() && self.source != NO_SOURCE {
            return format!("Source: {}", self.source);
        }
        match (&self.ras, &self.dec, &self.lat, &self.lon) {
            (Some(ra), Some(dec), _, _) => format!("RA: {} Dec: {}", ra, dec),
            (_, _, Some(lat), Some(lon)) => format!("Gal. lat: {} Gal. lon: {}", lat, lon),
            _ => "unknown position".to_string(),
        }
    }

    pub fn window(&self) -> String {
        match (&self.start, &self.end) {
            (Some(start), Some(end)) => format!("{} - {}", start, end),
            (Some(start), None) => start.clone(),
            _ => "not yet scheduled".to_string(),
        }
    }
}

/// The server-held schedule, in server order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScheduleSnapshot {
    pub scans: Vec<ScheduledScan>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct ScheduleView {
    pub active: Option<ScheduledScan>,
    pub queued: Vec<ScheduledScan>,
}

impl ScheduleSnapshot {
    #[cfg(test)]
    pub fn new(scans: Vec<ScheduledScan>) -> Self {
        Self { scans }
    }

    pub fn contains(&self, id: &ScanId) -> bool {
        self.scans.iter().any(|scan| scan.id.same_as(id))
    }

    pub fn view(&self) -> ScheduleView {
        let mut view = ScheduleView::default();
        for scan in &self.scans {
            if scan.current && view.active.is_none() {
                view.active = Some(scan.clone());
                continue;
            }
            if scan.current {
                log::warn!(
                    "control server marked scan {} active alongside another, listing it as queued",
                    scan.id
                );
            }
            view.queued.push(scan.clone());
        }
        view
    }
}

#[cfg(test)]
pub(crate) fn scan(id: u64, name: &str, current: bool) -> ScheduledScan {
    ScheduledScan {
        id: ScanId::Number(id),
        name: name.to_string(),
        kind: ScanKind::Track,
        source: "Cygnus A".to_string(),
        ras: Some("0h0m0s".into()),
        dec: Some("0d0m0s".into()),
        lat: None,
        lon: None,
        start: None,
        end: None,
        freq_lower: Some("1400".into()),
        freq_upper: Some("1420".into()),
        current,
    }
}
