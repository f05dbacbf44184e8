use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::monitor::status::{ReportCode, StatusReport};
use crate::scan::request::ScanId;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, strum_macros::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RecoveryAction {
    CancelScan,
    Resume,
    Acknowledge,
}

impl RecoveryAction {
    pub fn label(self) -> &'static str {
        match self {
            RecoveryAction::CancelScan => "Cancel scan",
            RecoveryAction::Resume => "Resume",
            RecoveryAction::Acknowledge => "Ok",
        }
    }
}

/// Dialog raised for a fault report. The monitor stays suspended until one of `actions`
/// is chosen.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct FaultPrompt {
    pub code: ReportCode,
    pub scan_id: Option<ScanId>,
    pub title: String,
    pub message: Vec<String>,
    pub actions: Vec<RecoveryAction>,
}

impl FaultPrompt {
    pub fn for_report(report: &StatusReport) -> Option<Self> {
        let (title, message, actions) = match report.code {
            ReportCode::Ok | ReportCode::Cancelled => return None,
            ReportCode::Timeout => (
                "Telescope motion timed out",
                [
                    "The telescope timed out during movement. It may be blocked or damaged.",
                    "Please check the telescope before continuing.",
                ],
                vec![RecoveryAction::CancelScan, RecoveryAction::Resume],
            ),
            ReportCode::ScheduleFailed => (
                "Scan could not be scheduled",
                [
                    "The scan could not be added to the schedule.",
                    "Check the schedule to make sure there is a time slot large enough for the \
                     scan, and check that the path of the scan is valid.",
                ],
                vec![RecoveryAction::Acknowledge],
            ),
            ReportCode::InvalidParam => (
                "Invalid scan parameters",
                [
                    "One or more of the scan's parameters are invalid.",
                    "Please check that all entered parameters are valid.",
                ],
                vec![RecoveryAction::Acknowledge],
            ),
            ReportCode::UnknownError => (
                "Telescope error",
                [
                    "An unknown error occurred. Please retry the last action.",
                    "If the problem persists, please contact the station operator.",
                ],
                vec![RecoveryAction::Acknowledge],
            ),
        };
        Some(FaultPrompt {
            code: report.code,
            scan_id: report.id.clone(),
            title: title.to_string(),
            message: message.iter().map(|line| line.to_string()).collect(),
            actions,
        })
    }

    pub fn offers(&self, action: RecoveryAction) -> bool {
        self.actions.contains(&action)
    }
}
