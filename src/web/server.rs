use axum::{routing::delete, routing::get, routing::post, Router};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{interval, MissedTickBehavior};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::control::{ControlApi, ControlResult, HttpControlClient};
use crate::history::HistoryPoller;
use crate::monitor::StatusMonitor;
use crate::scan::SubmissionForm;
use crate::schedule::ScheduleService;
use crate::sidebar::SidebarSummary;

use super::api::archive as archive_handlers;
use super::api::monitor as monitor_handlers;
use super::api::schedules as schedule_handlers;
use super::api::sources as source_handlers;
use super::api::station as station_handlers;
use super::api_doc::ApiDoc;
use super::config::Config;
use super::state::AppState;
use super::ui::handlers as ui_handlers;

/// Connects to the control server and starts the background pollers.
pub fn start_services(config: Config) -> ControlResult<AppState> {
    let client = HttpControlClient::new(&config.control.base_url, config.control.request_timeout)?;
    log::info!("using control server at {}", client.base_url());

    let schedule = ScheduleService::new(Arc::new(client));
    let sidebar = SidebarSummary::spawn(schedule.api().clone(), config.polling.sidebar_interval);
    let history = HistoryPoller::spawn(schedule.api().clone(), config.polling.history_interval);
    let monitor = StatusMonitor::spawn(
        schedule.clone(),
        config.polling.status_interval,
        Some(sidebar.clone()),
    );
    tokio::spawn(poll_schedule(
        schedule.clone(),
        config.polling.schedule_interval,
    ));

    let form = SubmissionForm::new(config.station.coordinates, config.station.id_policy);
    Ok(AppState {
        config: Arc::new(config),
        schedule,
        form: Arc::new(Mutex::new(form)),
        monitor,
        sidebar,
        history,
    })
}

async fn poll_schedule<A: ControlApi>(schedule: ScheduleService<A>, period: Duration) {
    let mut timer = interval(period);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        timer.tick().await;
        if let Err(e) = schedule.refresh().await {
            log::warn!("schedule refresh failed, keeping cached copy: {}", e);
        }
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // UI routes
        .route("/", get(ui_handlers::dashboard))
        // Schedule and scan submission
        .route("/api/schedule", get(schedule_handlers::get_schedule))
        .route(
            "/api/schedule/refresh",
            post(schedule_handlers::refresh_schedule),
        )
        .route("/api/scans", post(schedule_handlers::submit_scan))
        .route(
            "/api/scans/{id}/cancel",
            post(schedule_handlers::cancel_scan),
        )
        .route("/api/form", get(schedule_handlers::get_form))
        .route(
            "/api/form/configure",
            post(schedule_handlers::configure_form),
        )
        // Scan history and archive
        .route("/api/history", get(archive_handlers::get_history))
        .route("/api/scans/search", post(archive_handlers::search_scans))
        .route(
            "/api/scans/download",
            post(archive_handlers::download_scans),
        )
        .route("/api/scans/delete", post(archive_handlers::delete_scans))
        // Status monitor
        .route("/api/monitor", get(monitor_handlers::get_monitor))
        .route("/api/monitor/resolve", post(monitor_handlers::resolve))
        .route("/api/sidebar", get(monitor_handlers::get_sidebar))
        // Sources and station configuration
        .route(
            "/api/sources",
            get(source_handlers::list_sources).post(source_handlers::add_source),
        )
        .route(
            "/api/sources/{name}",
            delete(source_handlers::remove_source),
        )
        .route(
            "/api/config/{section}",
            get(station_handlers::get_section).put(station_handlers::update_section),
        )
        // OpenAPI / Swagger
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run_server(config: Config) -> std::io::Result<()> {
    let bind_addr = config.web.bind.clone();
    let state = start_services(config).map_err(std::io::Error::other)?;
    let app = router(state);

    log::info!("Starting server on {}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await
}
