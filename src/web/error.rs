use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use thiserror::Error;

use crate::game_logic::{GameError, RuleError};
use crate::lobby::LobbyError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum WebError {
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Internal server error: {0}")]
    InternalServerError(String),
}

impl From<LobbyError> for WebError {
    fn from(err: LobbyError) -> Self {
        let message = err.to_string();
        match err {
            LobbyError::Game(GameError::Validation(_)) => WebError::BadRequest(message),
            LobbyError::Game(GameError::Rule(rule)) => match rule {
                RuleError::NotCreator | RuleError::NotYourTurn | RuleError::Eliminated => {
                    WebError::Forbidden(message)
                }
                RuleError::Full | RuleError::InvalidTransition { .. } => WebError::Conflict(message),
                RuleError::PlayerNotFound(_) => WebError::NotFound(message),
                RuleError::NotActive | RuleError::InvalidPhase(_) | RuleError::NoCurrentTurn => {
                    WebError::BadRequest(message)
                }
            },
            LobbyError::Store(StoreError::GameNotFound(_)) => WebError::NotFound(message),
            LobbyError::Store(StoreError::AlreadyExists(_)) => WebError::Conflict(message),
            LobbyError::Game(GameError::Invariant(_)) | LobbyError::Store(_) => {
                tracing::error!(error = %message, "Game operation aborted");
                WebError::InternalServerError(message)
            }
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            WebError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            WebError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            WebError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            WebError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            WebError::InternalServerError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

pub type Result<T, E = WebError> = std::result::Result<T, E>;
