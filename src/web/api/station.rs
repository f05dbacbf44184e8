use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};

use crate::control::{ConfigSection, ConfigValue, ControlApi};
use crate::scan::validator::validate_section;
use crate::web::api::error::{ApiResult, ErrorResponse};
use crate::web::state::AppState;

#[utoipa::path(
    get,
    path = "/api/config/{section}",
    tag = "station",
    params(
        ("section" = ConfigSection, Path, description = "nameloc, movelimits or freqrange")
    ),
    responses(
        (status = 200, description = "Section values in wire order", body = Vec<serde_json::Value>),
        (status = 502, description = "Control server unreachable", body = ErrorResponse)
    )
)]
pub async fn get_section(
    State(state): State<AppState>,
    Path(section): Path<ConfigSection>,
) -> ApiResult<Json<Vec<ConfigValue>>> {
    Ok(Json(state.control().config_section(section).await?))
}

#[utoipa::path(
    put,
    path = "/api/config/{section}",
    tag = "station",
    params(
        ("section" = ConfigSection, Path, description = "nameloc, movelimits or freqrange")
    ),
    request_body = Vec<String>,
    responses(
        (status = 200, description = "Section updated", body = Vec<serde_json::Value>),
        (status = 400, description = "Invalid values", body = ErrorResponse),
        (status = 502, description = "Control server unreachable", body = ErrorResponse)
    )
)]
pub async fn update_section(
    State(state): State<AppState>,
    Path(section): Path<ConfigSection>,
    payload: Result<Json<Vec<String>>, JsonRejection>,
) -> ApiResult<Json<Vec<ConfigValue>>> {
    let Json(values) = payload?;
    let values: Vec<String> = values.into_iter().map(|v| v.trim().to_string()).collect();
    validate_section(section, &values)?;
    let updated = state
        .control()
        .update_config_section(section, &values)
        .await?;
    log::info!("station config section {} updated", section);
    Ok(Json(updated))
}
