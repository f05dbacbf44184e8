use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};

use crate::control::{ArchivedScan, ControlApi, SearchQuery};
use crate::history::HistoryView;
use crate::scan::request::ScanId;
use crate::scan::validator::validate_search;
use crate::web::api::error::{ApiError, ApiResult, ErrorResponse};
use crate::web::state::AppState;

#[utoipa::path(
    get,
    path = "/api/history",
    tag = "archive",
    responses(
        (status = 200, description = "Recently run scans and how they ended", body = HistoryView)
    )
)]
pub async fn get_history(State(state): State<AppState>) -> Json<HistoryView> {
    Json(state.history.view())
}

#[utoipa::path(
    post,
    path = "/api/scans/search",
    tag = "archive",
    request_body = SearchQuery,
    responses(
        (status = 200, description = "Archived scans matching the query", body = Vec<ArchivedScan>),
        (status = 400, description = "Invalid query, nothing was sent", body = ErrorResponse),
        (status = 502, description = "Control server unreachable", body = ErrorResponse)
    )
)]
pub async fn search_scans(
    State(state): State<AppState>,
    payload: Result<Json<SearchQuery>, JsonRejection>,
) -> ApiResult<Json<Vec<ArchivedScan>>> {
    let Json(query) = payload?;
    let query = SearchQuery {
        name: query.name.trim().to_string(),
        month: query.month.trim().to_string(),
        year: query.year.trim().to_string(),
    };
    validate_search(&query)?;
    Ok(Json(state.control().search_scans(&query).await?))
}

fn selection(payload: Result<Json<Vec<ScanId>>, JsonRejection>) -> ApiResult<Vec<ScanId>> {
    let Json(ids) = payload?;
    if ids.is_empty() {
        return Err(ApiError::BadRequest("Select at least one scan.".to_string()));
    }
    Ok(ids)
}

#[utoipa::path(
    post,
    path = "/api/scans/download",
    tag = "archive",
    request_body = Vec<ScanId>,
    responses(
        (
            status = 200,
            description = "Zip archive of the scans' data files",
            body = Vec<u8>,
            content_type = "application/zip"
        ),
        (status = 400, description = "No scans selected", body = ErrorResponse),
        (status = 502, description = "Control server unreachable", body = ErrorResponse)
    )
)]
pub async fn download_scans(
    State(state): State<AppState>,
    payload: Result<Json<Vec<ScanId>>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let ids = selection(payload)?;
    let archive = state.control().download_scans(&ids).await?;
    Ok((
        [
            (header::CONTENT_TYPE, "application/zip"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"scans.zip\""),
        ],
        archive,
    ))
}

#[utoipa::path(
    post,
    path = "/api/scans/delete",
    tag = "archive",
    request_body = Vec<ScanId>,
    responses(
        (status = 204, description = "Scans deleted from the station"),
        (status = 400, description = "No scans selected", body = ErrorResponse),
        (status = 403, description = "Not the station administrator", body = ErrorResponse),
        (status = 502, description = "Control server unreachable", body = ErrorResponse)
    )
)]
pub async fn delete_scans(
    State(state): State<AppState>,
    payload: Result<Json<Vec<ScanId>>, JsonRejection>,
) -> ApiResult<StatusCode> {
    let ids = selection(payload)?;
    state.control().delete_scans(&ids).await?;
    log::info!("deleted {} archived scans", ids.len());
    Ok(StatusCode::NO_CONTENT)
}
