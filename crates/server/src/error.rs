use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::auth::AuthError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    #[error("authentication required")]
    AuthenticationRequired,

    #[error("{0}")]
    InvalidCredentials(String),

    #[error("{0}")]
    Validation(String),

    #[error("this poll has ended")]
    PollEnded,

    #[error("poll not found")]
    NotFound,

    #[error("the `polls` table does not exist; run `load_polls` to create it")]
    TableMissing,

    #[error("auth provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("store error: {0}")]
    Store(String),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => AppError::NotFound,
            StoreError::TableMissing => AppError::TableMissing,
            StoreError::Backend(msg) => AppError::Store(msg),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Rejected(msg) => AppError::InvalidCredentials(msg),
            AuthError::InvalidToken => AppError::AuthenticationRequired,
            AuthError::Unavailable(msg) => AppError::ProviderUnavailable(msg),
        }
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotConfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::AuthenticationRequired | AppError::InvalidCredentials(_) => {
                StatusCode::UNAUTHORIZED
            }
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::PollEnded => StatusCode::FORBIDDEN,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::ProviderUnavailable(_) => StatusCode::BAD_GATEWAY,
            AppError::TableMissing | AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::Store(msg) => {
                tracing::error!("Store error: {}", msg);
                "Database error".to_string()
            }
            AppError::ProviderUnavailable(msg) => {
                tracing::error!("Auth provider error: {}", msg);
                "Authentication service unavailable".to_string()
            }
            AppError::TableMissing => {
                tracing::error!("{}", self);
                self.to_string()
            }
            _ => self.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
