use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

use crate::control::types::Telemetry;
use crate::scan::request::ScanId;

/// Outcome code of the most recent scan operation on the telescope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema, strum_macros::Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ReportCode {
    Ok,
    Timeout,
    ScheduleFailed,
    InvalidParam,
    Cancelled,
    UnknownError,
}

impl ReportCode {
    /// Accepts kebab, snake and the controller's compact spellings. Anything else is
    /// an unknown error.
    pub fn from_wire(code: &str) -> Self {
        let compact: String = code
            .trim()
            .chars()
            .filter(|c| !matches!(c, '-' | '_'))
            .collect::<String>()
            .to_ascii_lowercase();
        match compact.as_str() {
            "ok" => ReportCode::Ok,
            "timeout" => ReportCode::Timeout,
            "schedulefailed" => ReportCode::ScheduleFailed,
            "invalidparam" => ReportCode::InvalidParam,
            "cancelled" | "canceled" => ReportCode::Cancelled,
            "unknownerror" => ReportCode::UnknownError,
            other => {
                log::debug!("unrecognised status code '{}'", other);
                ReportCode::UnknownError
            }
        }
    }

    /// Spelling the controller stores and compares against.
    pub fn wire(self) -> &'static str {
        match self {
            ReportCode::Ok => "ok",
            ReportCode::Timeout => "timeout",
            ReportCode::ScheduleFailed => "schedulefailed",
            ReportCode::InvalidParam => "invalidparam",
            ReportCode::Cancelled => "cancelled",
            ReportCode::UnknownError => "unknownerror",
        }
    }
}

impl<'de> Deserialize<'de> for ReportCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(ReportCode::from_wire(&raw))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StatusReport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ScanId>,
    pub code: ReportCode,
    #[serde(flatten)]
    pub telemetry: Telemetry,
}

impl StatusReport {
    /// Body posted back to the controller to clear this report.
    pub fn acknowledgement(&self) -> Acknowledgement<'_> {
        Acknowledgement {
            id: self.id.as_ref(),
            code: self.code.wire(),
        }
    }

    #[cfg(test)]
    pub fn new(code: ReportCode, id: Option<ScanId>) -> Self {
        Self {
            id,
            code,
            telemetry: Telemetry::default(),
        }
    }
}

/// The controller resets its status to ok when `id` matches the scan it last reported.
#[derive(Debug, Serialize)]
pub struct Acknowledgement<'a> {
    pub id: Option<&'a ScanId>,
    pub code: &'static str,
}
