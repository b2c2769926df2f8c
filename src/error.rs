use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Body returned for every failed listing, whatever went wrong underneath.
pub const FETCH_ERROR_MESSAGE: &str = "Error fetching products";

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("could not acquire a database connection: {0}")]
    Connection(#[source] sqlx::Error),

    #[error("query failed: {0}")]
    Query(#[source] sqlx::Error),

    #[error("could not serialize row: {0}")]
    Serialization(String),
}

impl AppError {
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Connection(_) => "connection",
            AppError::Query(_) => "query",
            AppError::Serialization(_) => "serialization",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!(kind = self.kind(), error = %self, "Error fetching products");

        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": FETCH_ERROR_MESSAGE })),
        )
            .into_response()
    }
}
