use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;
use wiki::{ArticleRef, Rejection, WikiError};

use crate::{auth::AuthError, database::StoreError};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("Forbidden: you do not have permission to access this game")]
    Forbidden,

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Invalid win: {0}")]
    Rejected(#[from] Rejection),

    #[error("Invalid move: {0}")]
    InvalidMove(Rejection),

    #[error("Invalid move: not currently at {0}")]
    NotAtArticle(ArticleRef),

    #[error(transparent)]
    Wiki(#[from] WikiError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Internal error: {0}")]
    InternalError(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::MalformedPayload(rejection.body_text())
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MalformedPayload(_)
            | AppError::Rejected(_)
            | AppError::InvalidMove(_)
            | AppError::NotAtArticle(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Wiki(WikiError::MalformedReference(_)) => StatusCode::BAD_REQUEST,
            AppError::Wiki(WikiError::UpstreamUnavailable(_)) => StatusCode::BAD_GATEWAY,
            AppError::Wiki(WikiError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Wiki(WikiError::RetriesExhausted(_)) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Auth(AuthError::MissingToken | AuthError::InvalidToken) => {
                StatusCode::UNAUTHORIZED
            }
            AppError::Auth(_) | AppError::Store(_) | AppError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            error!("{status}: {self}");
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
