use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Authentication(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Authentication(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Storage(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to hand back to the caller.
    pub fn public_message(&self) -> String {
        match self {
            Self::Storage(e) => {
                tracing::error!(error = ?e, "Storage error");
                "Storage error".to_owned()
            }
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                "Internal server error".to_owned()
            }
            other => other.to_string(),
        }
    }
}

/// Device API shape: `{"error": "..."}` with the mapped status code.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({ "error": self.public_message() }));
        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

/// Admin API shape: every failure is `400 {"success": false, "error": "..."}`.
#[derive(Debug)]
pub struct AdminError(pub AppError);

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "success": false, "error": self.0.public_message() }));
        (StatusCode::BAD_REQUEST, body).into_response()
    }
}

impl From<AppError> for AdminError {
    fn from(e: AppError) -> Self {
        Self(e)
    }
}
