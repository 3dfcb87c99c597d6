use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Failure to obtain one listing page.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Connection, DNS, timeout or a non-2xx status.
    #[error("transport error: {0}")]
    Transport(#[from] wreq::Error),
    #[error("empty response body")]
    EmptyResponse,
    #[error("malformed listing response: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store write failed: {0}")]
    Write(#[source] sea_orm::DbErr),
    #[error("store read failed: {0}")]
    Read(#[source] sea_orm::DbErr),
}

/// Anything that makes a single page sync get skipped.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SyncError {
    /// Stable label for logs and reports.
    pub fn kind(&self) -> &'static str {
        match self {
            SyncError::Fetch(FetchError::Transport(_)) => "transport",
            SyncError::Fetch(FetchError::EmptyResponse) => "empty_response",
            SyncError::Fetch(FetchError::Parse(_)) => "parse",
            SyncError::Store(StoreError::Write(_)) => "store_write",
            SyncError::Store(StoreError::Read(_)) => "store_read",
        }
    }
}

#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    inner: anyhow::Error,
}

impl AppError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self { status: StatusCode::NOT_FOUND, inner: anyhow::anyhow!(msg.into()) }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self { status: StatusCode::BAD_REQUEST, inner: anyhow::anyhow!(msg.into()) }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.inner.fmt(f)
    }
}

impl std::error::Error for AppError {}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self { status: StatusCode::INTERNAL_SERVER_ERROR, inner: err }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        Self::from(anyhow::Error::new(err))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(error = %self.inner, "request failed");
        }
        (self.status, Json(json!({ "error": self.inner.to_string() }))).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
