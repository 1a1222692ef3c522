use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

use crate::auth::session::TokenRejection;
use crate::db::StoreError;

/// Error kind as seen by API clients. Several internal failures collapse
/// into one kind so responses don't reveal which check failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    MissingCredentials,
    InvalidToken,
    InvalidCredentials,
    NotFound,
    ValidationFailed,
    Conflict,
    EmptyInput,
    Internal,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("missing credentials: {0}")]
    MissingCredentials(&'static str),

    #[error("invalid token: {0}")]
    InvalidToken(#[from] TokenRejection),

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("validation failed: {0}")]
    ValidationFailed(String),

    #[error("conflict: {0}")]
    Conflict(&'static str),

    #[error("no meals recorded")]
    EmptyInput,

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorKind,
    pub message: String,
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::MissingCredentials(_) => ErrorKind::MissingCredentials,
            AppError::InvalidToken(_) => ErrorKind::InvalidToken,
            AppError::InvalidCredentials => ErrorKind::InvalidCredentials,
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::ValidationFailed(_) => ErrorKind::ValidationFailed,
            AppError::Conflict(_) => ErrorKind::Conflict,
            AppError::EmptyInput => ErrorKind::EmptyInput,
            AppError::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::MissingCredentials
            | ErrorKind::InvalidToken
            | ErrorKind::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ErrorKind::NotFound | ErrorKind::EmptyInput => StatusCode::NOT_FOUND,
            ErrorKind::ValidationFailed => StatusCode::BAD_REQUEST,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to send to the client.
    fn public_message(&self) -> String {
        match self {
            AppError::MissingCredentials(_) => "Missing or malformed Authorization header".into(),
            AppError::InvalidToken(_) => "Invalid or expired token".into(),
            AppError::InvalidCredentials => "Invalid credentials".into(),
            AppError::NotFound(what) => format!("{what} not found"),
            AppError::ValidationFailed(msg) => msg.clone(),
            AppError::Conflict(msg) => (*msg).to_string(),
            AppError::EmptyInput => "No meals recorded yet".into(),
            AppError::Internal(_) => "Internal server error".into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            AppError::Internal(e) => error!(error = ?e, "request failed"),
            AppError::InvalidToken(reason) => warn!(%reason, "token rejected"),
            other => warn!(error = %other, "request rejected"),
        }
        let body = ErrorBody {
            error: self.kind(),
            message: self.public_message(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict(what) => AppError::Conflict(what),
            StoreError::Backend(e) => AppError::Internal(e),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(e: JsonRejection) -> Self {
        AppError::ValidationFailed(e.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(e: PathRejection) -> Self {
        AppError::ValidationFailed(e.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(e: QueryRejection) -> Self {
        AppError::ValidationFailed(e.body_text())
    }
}

pub type AppResult<T> = Result<T, AppError>;
