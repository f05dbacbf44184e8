use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::control::{ControlApi, Source};
use crate::scan::validator::validate_source;
use crate::web::api::error::{ApiResult, ErrorResponse};
use crate::web::state::AppState;

#[utoipa::path(
    get,
    path = "/api/sources",
    tag = "sources",
    responses(
        (status = 200, description = "Source catalogue", body = Vec<Source>),
        (status = 502, description = "Control server unreachable", body = ErrorResponse)
    )
)]
pub async fn list_sources(State(state): State<AppState>) -> ApiResult<Json<Vec<Source>>> {
    Ok(Json(state.control().sources().await?))
}

#[utoipa::path(
    post,
    path = "/api/sources",
    tag = "sources",
    request_body = Source,
    responses(
        (status = 201, description = "Source added", body = Vec<Source>),
        (status = 400, description = "Invalid source", body = ErrorResponse),
        (status = 502, description = "Control server unreachable", body = ErrorResponse)
    )
)]
pub async fn add_source(
    State(state): State<AppState>,
    payload: Result<Json<Source>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(source) = payload?;
    validate_source(&source, state.config.station.coordinates)?;
    let sources = state.control().add_source(&source).await?;
    log::info!("source '{}' added", source.name);
    Ok((StatusCode::CREATED, Json(sources)))
}

#[utoipa::path(
    delete,
    path = "/api/sources/{name}",
    tag = "sources",
    params(
        ("name" = String, Path, description = "Source name")
    ),
    responses(
        (status = 200, description = "Source removed", body = Vec<Source>),
        (status = 502, description = "Control server unreachable", body = ErrorResponse)
    )
)]
pub async fn remove_source(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Json<Vec<Source>>> {
    let sources = state.control().remove_source(&name).await?;
    log::info!("source '{}' removed", name);
    Ok(Json(sources))
}
