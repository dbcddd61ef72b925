//! Error handling for the HTTP server.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::fmt;

use rota_core::error::RotaError;

/// API error type.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: String,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.status, self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.code,
                message: self.message,
                details: self.details,
            },
        };

        (self.status, Json(body)).into_response()
    }
}

// Convert from rota-core errors, keeping the core error code
impl From<RotaError> for ApiError {
    fn from(err: RotaError) -> Self {
        let code = err.code().as_str();
        match err {
            RotaError::ScheduleConflict {
                date,
                occupied_on,
                ref occupied_by,
            } => {
                let details = serde_json::json!({
                    "date": date,
                    "occupied_on": occupied_on,
                    "occupied_by": occupied_by,
                });
                ApiError::new(StatusCode::CONFLICT, code, err.to_string()).with_details(details)
            }
            RotaError::NotFound { .. } => {
                ApiError::new(StatusCode::NOT_FOUND, code, err.to_string())
            }
            RotaError::Configuration(msg) => ApiError::new(StatusCode::BAD_REQUEST, code, msg),
            other => ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, code, other.to_string()),
        }
    }
}

/// Result type alias for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_conflict_maps_to_409() {
        let err = RotaError::ScheduleConflict {
            date: NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
            occupied_on: NaiveDate::from_ymd_opt(2024, 6, 10).unwrap(),
            occupied_by: "<@A> and <@B>".to_string(),
        };
        let api: ApiError = err.into();
        assert_eq!(api.status, StatusCode::CONFLICT);
        assert_eq!(api.code, "SCHED_001");
        assert_eq!(api.details.unwrap()["occupied_on"], "2024-06-10");
    }

    #[test]
    fn test_other_errors_map_to_status() {
        let api: ApiError = RotaError::Configuration("bad cron".to_string()).into();
        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        assert_eq!(api.message, "bad cron");

        let api: ApiError = RotaError::not_found("<@Z>").into();
        assert_eq!(api.status, StatusCode::NOT_FOUND);
        assert_eq!(api.code, "SCHED_002");

        let api: ApiError = RotaError::store("disk gone").into();
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(api.code.starts_with("STORE_"));
    }
}
