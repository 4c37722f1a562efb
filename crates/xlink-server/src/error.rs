use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{error, warn};
use xlink_core::LinkError;

/// JSON error body: `{"error": "..."}`
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Application error type
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Link(#[from] LinkError),

    #[error("X account {0} is not connected. Link it first via /connect.")]
    NotFound(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Link(err) => match err {
                LinkError::MissingToken | LinkError::MissingVerifier => StatusCode::BAD_REQUEST,
                // Revocation is a fetch failure; the message tells it apart
                LinkError::InvalidCredential
                | LinkError::Configuration(_)
                | LinkError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();

        match &self {
            ApiError::Link(err) if !err.is_user_recoverable() => error!("{} - {}", status, message),
            _ => warn!("{} - {}", status, message),
        }

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::from(LinkError::MissingToken).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(LinkError::MissingVerifier).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(LinkError::InvalidCredential).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::from(LinkError::Upstream("down".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::from(LinkError::Configuration("unset".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::NotFound("42".into()).status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_message_passthrough() {
        let err = ApiError::from(LinkError::Upstream("Request token failed (401)".into()));
        assert_eq!(err.to_string(), "X API error: Request token failed (401)");
    }
}
