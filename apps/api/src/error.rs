use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use ephemera_core::AppError;
use serde::Serialize;
use tracing::error;

/// API error payload.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    message: String,
}

/// HTTP API error wrapper around core application errors.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(value: AppError) -> Self {
        Self(value)
    }
}

/// Maps an application error to its HTTP status and user-facing message.
/// Internal errors and rate-limit counters carry backend detail that must
/// stay server-side; everything else wears its own message.
fn status_and_message(error: &AppError) -> (StatusCode, String) {
    match error {
        AppError::Validation(_) => (StatusCode::BAD_REQUEST, error.to_string()),
        AppError::NotFound(_) => (StatusCode::NOT_FOUND, error.to_string()),
        AppError::Conflict(_) => (StatusCode::CONFLICT, error.to_string()),
        AppError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, error.to_string()),
        AppError::Forbidden(_) => (StatusCode::FORBIDDEN, error.to_string()),
        AppError::RateLimited { .. } => (
            StatusCode::TOO_MANY_REQUESTS,
            "too many attempts, please wait and try again".to_owned(),
        ),
        AppError::Internal(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal server error".to_owned(),
        ),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = status_and_message(&self.0);

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            // The detail goes to the log, not the response body.
            error!(error = %self.0, "internal error");
        }

        (status, Json(ErrorResponse { message })).into_response()
    }
}

/// Standard API result type.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;

    #[test]
    fn rate_limited_maps_to_429_without_the_identifier() {
        let error = ApiError(AppError::RateLimited {
            event: "conceal_secret".to_owned(),
            identifier: "203.0.113.7".to_owned(),
            count: 26,
        });
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[test]
    fn validation_maps_to_400() {
        let response = ApiError(AppError::Validation("bad input".to_owned())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn internal_errors_hide_backend_detail() {
        let backend_detail = "failed to connect to redis: connection refused";
        let (status, message) =
            status_and_message(&AppError::Internal(backend_detail.to_owned()));

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(message, "internal server error");
        assert!(!message.contains("redis"));
    }

    #[test]
    fn rate_limited_message_names_no_counter() {
        let (_, message) = status_and_message(&AppError::RateLimited {
            event: "conceal_secret".to_owned(),
            identifier: "203.0.113.7".to_owned(),
            count: 26,
        });
        assert!(!message.contains("203.0.113.7"));
        assert!(!message.contains("26"));
    }
}
