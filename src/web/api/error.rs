use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::control::ControlError;
use crate::monitor::MonitorError;
use crate::scan::validator::{FieldError, ValidationErrors};
use crate::scan::SubmitError;

pub enum ApiError {
    Validation(ValidationErrors),
    BadRequest(String),
    Forbidden(String),
    Conflict(String),
    Control(ControlError),
    Unavailable(&'static str),
}

impl From<ControlError> for ApiError {
    fn from(e: ControlError) -> Self {
        match e {
            ControlError::NotAdmin => ApiError::Forbidden(e.to_string()),
            e => ApiError::Control(e),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(e: ValidationErrors) -> Self {
        ApiError::Validation(e)
    }
}

impl From<SubmitError> for ApiError {
    fn from(e: SubmitError) -> Self {
        match e {
            SubmitError::Invalid(errors) => ApiError::Validation(errors),
            SubmitError::Control(e) => e.into(),
        }
    }
}

impl From<MonitorError> for ApiError {
    fn from(e: MonitorError) -> Self {
        match e {
            MonitorError::Stopped => ApiError::Unavailable("status_monitor_stopped"),
            e => ApiError::Conflict(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: "validation_failed".to_string(),
                    message: Some(errors.summary().to_string()),
                    fields: errors.errors,
                }),
            )
                .into_response(),
            ApiError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::with_message("bad_request", &msg)),
            )
                .into_response(),
            ApiError::Forbidden(msg) => (
                StatusCode::FORBIDDEN,
                Json(ErrorResponse::with_message("not_admin", &msg)),
            )
                .into_response(),
            ApiError::Conflict(msg) => (
                StatusCode::CONFLICT,
                Json(ErrorResponse::with_message("not_applicable", &msg)),
            )
                .into_response(),
            ApiError::Control(e) => (
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse::with_message("control_server_error", &e.to_string())),
            )
                .into_response(),
            ApiError::Unavailable(reason) => (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ErrorResponse::new(reason)),
            )
                .into_response(),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    /// For validation failures this is the form's tip, the first failing rule.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldError>,
}

impl ErrorResponse {
    pub fn new(error: &str) -> Self {
        ErrorResponse {
            error: error.to_string(),
            message: None,
            fields: Vec::new(),
        }
    }

    pub fn with_message(error: &str, message: &str) -> Self {
        ErrorResponse {
            error: error.to_string(),
            message: Some(message.to_string()),
            fields: Vec::new(),
        }
    }
}
