use utoipa::OpenApi;

use super::api::error::ErrorResponse;
use super::api::monitor::ResolveRequest;
use super::api::schedules::ConfigureForm;

#[derive(OpenApi)]
#[openapi(
    paths(
        super::api::schedules::get_schedule,
        super::api::schedules::refresh_schedule,
        super::api::schedules::submit_scan,
        super::api::schedules::cancel_scan,
        super::api::schedules::get_form,
        super::api::schedules::configure_form,
        super::api::monitor::get_monitor,
        super::api::monitor::resolve,
        super::api::monitor::get_sidebar,
        super::api::sources::list_sources,
        super::api::sources::add_source,
        super::api::sources::remove_source,
        super::api::station::get_section,
        super::api::station::update_section,
        super::api::archive::get_history,
        super::api::archive::search_scans,
        super::api::archive::download_scans,
        super::api::archive::delete_scans,
    ),
    components(
        schemas(
            ErrorResponse,
            ResolveRequest,
            ConfigureForm,
            crate::scan::request::ScanRequest,
            crate::scan::request::ScanId,
            crate::scan::request::ScanKind,
            crate::scan::request::TargetMode,
            crate::scan::validator::FieldId,
            crate::scan::validator::FieldError,
            crate::scan::form::FormView,
            crate::schedule::snapshot::ScheduledScan,
            crate::schedule::snapshot::ScheduleView,
            crate::monitor::monitor::MonitorState,
            crate::monitor::monitor::MonitorView,
            crate::monitor::recovery::FaultPrompt,
            crate::monitor::recovery::RecoveryAction,
            crate::monitor::status::ReportCode,
            crate::monitor::status::StatusReport,
            crate::sidebar::SidebarView,
            crate::control::types::Source,
            crate::control::types::ConfigSection,
            crate::control::types::HistoryEntry,
            crate::control::types::SearchQuery,
            crate::control::types::ArchivedScan,
            crate::history::HistoryView,
        )
    ),
    info(
        title = "SRT Operator Console API",
        description = "Operator console for a small radio telescope",
        version = "0.1.0"
    ),
    tags(
        (name = "schedule", description = "Scan submission and the cached schedule"),
        (name = "monitor", description = "Scan status monitoring and fault recovery"),
        (name = "sources", description = "Source catalogue"),
        (name = "station", description = "Station configuration"),
        (name = "archive", description = "Scan history and archived scan data")
    )
)]
pub struct ApiDoc;
