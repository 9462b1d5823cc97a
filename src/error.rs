use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::domain::DealStatus;
use crate::identity::IdentityError;

/// Engine error taxonomy, reported to callers verbatim.
///
/// The one exception is `Conflict` during a moderation transition, which the
/// workflow retries once against the latest state before surfacing.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("invalid state: {0}")]
    InvalidState(String),
    #[error("cannot {action} a deal in status {from}")]
    InvalidTransition {
        from: DealStatus,
        action: &'static str,
    },
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("identity service unavailable: {0}")]
    IdentityUnavailable(String),
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

impl From<IdentityError> for EngineError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::MissingToken => {
                EngineError::Unauthenticated("missing bearer token".to_string())
            }
            IdentityError::InvalidToken => {
                EngineError::Unauthenticated("invalid bearer token".to_string())
            }
            other => EngineError::IdentityUnavailable(other.to_string()),
        }
    }
}

impl IntoResponse for EngineError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            EngineError::Unauthenticated(_) => (StatusCode::UNAUTHORIZED, self.to_string()),
            EngineError::Forbidden(_) => (StatusCode::FORBIDDEN, self.to_string()),
            EngineError::InvalidState(_) => (StatusCode::UNPROCESSABLE_ENTITY, self.to_string()),
            EngineError::InvalidTransition { .. } => (StatusCode::CONFLICT, self.to_string()),
            EngineError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            EngineError::Conflict(_) => (StatusCode::CONFLICT, self.to_string()),
            EngineError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            EngineError::IdentityUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, self.to_string())
            }
            // Storage details stay out of responses.
            EngineError::Db(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_transition_message_names_state_and_action() {
        let err = EngineError::InvalidTransition {
            from: DealStatus::Draft,
            action: "approve",
        };
        assert_eq!(err.to_string(), "cannot approve a deal in status draft");
    }

    #[test]
    fn test_identity_errors_map_to_unauthenticated() {
        let err: EngineError = IdentityError::MissingToken.into();
        assert!(matches!(err, EngineError::Unauthenticated(_)));

        let err: EngineError = IdentityError::InvalidToken.into();
        assert!(matches!(err, EngineError::Unauthenticated(_)));
    }

    #[test]
    fn test_transport_errors_do_not_masquerade_as_auth_failures() {
        let err: EngineError = IdentityError::Network("timeout".to_string()).into();
        assert!(matches!(err, EngineError::IdentityUnavailable(_)));
    }
}
