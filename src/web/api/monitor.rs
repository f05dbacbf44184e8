use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::monitor::{MonitorView, RecoveryAction};
use crate::sidebar::SidebarView;
use crate::web::api::error::{ApiResult, ErrorResponse};
use crate::web::state::AppState;

#[utoipa::path(
    get,
    path = "/api/monitor",
    tag = "monitor",
    responses(
        (status = 200, description = "Status monitor state and pending fault", body = MonitorView)
    )
)]
pub async fn get_monitor(State(state): State<AppState>) -> Json<MonitorView> {
    Json(state.monitor.view())
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ResolveRequest {
    pub action: RecoveryAction,
}

#[utoipa::path(
    post,
    path = "/api/monitor/resolve",
    tag = "monitor",
    request_body = ResolveRequest,
    responses(
        (status = 200, description = "Fault resolved, polling resumed", body = MonitorView),
        (status = 400, description = "Unknown action", body = ErrorResponse),
        (status = 409, description = "No fault pending or action not offered", body = ErrorResponse)
    )
)]
pub async fn resolve(
    State(state): State<AppState>,
    payload: Result<Json<ResolveRequest>, JsonRejection>,
) -> ApiResult<Json<MonitorView>> {
    let Json(request) = payload?;
    Ok(Json(state.monitor.resolve(request.action).await?))
}

#[utoipa::path(
    get,
    path = "/api/sidebar",
    tag = "monitor",
    responses(
        (status = 200, description = "Coarse station status", body = SidebarView)
    )
)]
pub async fn get_sidebar(State(state): State<AppState>) -> Json<SidebarView> {
    Json(state.sidebar.view())
}
