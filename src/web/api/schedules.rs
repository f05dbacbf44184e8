use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::scan::request::{ScanId, ScanKind, ScanRequest, TargetMode};
use crate::scan::FormView;
use crate::schedule::ScheduleView;
use crate::web::api::error::{ApiResult, ErrorResponse};
use crate::web::state::AppState;

#[utoipa::path(
    get,
    path = "/api/schedule",
    tag = "schedule",
    responses(
        (status = 200, description = "Cached schedule", body = ScheduleView)
    )
)]
pub async fn get_schedule(State(state): State<AppState>) -> Json<ScheduleView> {
    Json(state.schedule.view())
}

#[utoipa::path(
    post,
    path = "/api/schedule/refresh",
    tag = "schedule",
    responses(
        (status = 200, description = "Fresh copy of the schedule", body = ScheduleView),
        (status = 502, description = "Control server unreachable", body = ErrorResponse)
    )
)]
pub async fn refresh_schedule(State(state): State<AppState>) -> ApiResult<Json<ScheduleView>> {
    state.schedule.refresh().await?;
    Ok(Json(state.schedule.view()))
}

#[utoipa::path(
    post,
    path = "/api/scans",
    tag = "schedule",
    request_body = ScanRequest,
    responses(
        (status = 201, description = "Scan submitted", body = ScheduleView),
        (status = 400, description = "Invalid fields, nothing was sent", body = ErrorResponse),
        (status = 502, description = "Control server unreachable", body = ErrorResponse)
    )
)]
pub async fn submit_scan(
    State(state): State<AppState>,
    payload: Result<Json<ScanRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(request) = payload?;
    let mut form = state.form.lock().await;
    form.open();
    form.fill(&request);
    form.submit(&state.schedule).await?;

    Ok((StatusCode::CREATED, Json(state.schedule.view())))
}

#[utoipa::path(
    post,
    path = "/api/scans/{id}/cancel",
    tag = "schedule",
    params(
        ("id" = String, Path, description = "Scan ID")
    ),
    responses(
        (status = 200, description = "Schedule after removal", body = ScheduleView),
        (status = 502, description = "Control server unreachable", body = ErrorResponse)
    )
)]
pub async fn cancel_scan(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ScheduleView>> {
    state.schedule.cancel(&ScanId::from(id.as_str())).await?;
    Ok(Json(state.schedule.view()))
}

#[utoipa::path(
    get,
    path = "/api/form",
    tag = "schedule",
    responses(
        (status = 200, description = "Current scan form", body = FormView)
    )
)]
pub async fn get_form(State(state): State<AppState>) -> Json<FormView> {
    Json(state.form.lock().await.view())
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ConfigureForm {
    pub kind: ScanKind,
    #[serde(default)]
    pub target: TargetMode,
}

#[utoipa::path(
    post,
    path = "/api/form/configure",
    tag = "schedule",
    request_body = ConfigureForm,
    responses(
        (status = 200, description = "Form switched to the requested mode", body = FormView),
        (status = 400, description = "Malformed request", body = ErrorResponse)
    )
)]
pub async fn configure_form(
    State(state): State<AppState>,
    payload: Result<Json<ConfigureForm>, JsonRejection>,
) -> ApiResult<Json<FormView>> {
    let Json(request) = payload?;
    let mut form = state.form.lock().await;
    form.open();
    form.configure_for(request.kind, request.target);
    Ok(Json(form.view()))
}
