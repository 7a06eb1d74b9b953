//! HTTP error mapping for handlers.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sadbin_core::AppError;
use serde_json::json;

/// [`AppError`] rendered as a JSON error response.
#[derive(Debug)]
pub struct HttpError(pub AppError);

impl From<AppError> for HttpError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<sadbin_core::validation::ValidationErrors> for HttpError {
    fn from(errors: sadbin_core::validation::ValidationErrors) -> Self {
        Self(AppError::Validation(errors))
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let (status, body) = match self.0 {
            AppError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "Validation failed", "fields": errors.errors }),
            ),
            AppError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, json!({ "error": message }))
            }
            err => {
                tracing::error!("Request failed: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal server error" }),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::HttpError;
    use axum::{http::StatusCode, response::IntoResponse};
    use sadbin_core::validation::ValidationErrors;
    use sadbin_core::AppError;

    #[test]
    fn errors_map_to_request_or_server_statuses() {
        let cases = [
            (
                HttpError::from(ValidationErrors::single("content", "required")),
                StatusCode::BAD_REQUEST,
            ),
            (
                HttpError(AppError::BadRequest("Unknown lexer".to_string())),
                StatusCode::BAD_REQUEST,
            ),
            (
                HttpError(AppError::StorageMessage("disk full".to_string())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (HttpError(AppError::Internal), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }
}
