//! HTTP API handlers for shelfmark-web

pub mod authors;
pub mod copies;
pub mod health;
pub mod locations;
pub mod search;
pub mod tags;
pub mod users;
pub mod works;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Error surface shared by the CRUD handlers.
///
/// The JSON body always carries a single `error` message.
#[derive(Debug)]
pub enum ApiError {
    /// Missing or malformed request data
    BadRequest(String),
    /// Target row does not exist
    NotFound(String),
    /// Write refused because it would collide with existing data
    Conflict(String),
    /// Database failure
    Database(String),
    /// Anything else (including corrupt hierarchy data)
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Database(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, format!("Database error: {}", msg))
            }
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => ApiError::NotFound("Row not found".to_string()),
            e => ApiError::Database(e.to_string()),
        }
    }
}

impl From<shelfmark_common::Error> for ApiError {
    fn from(e: shelfmark_common::Error) -> Self {
        use shelfmark_common::Error;
        match e {
            Error::NotFound(msg) => ApiError::NotFound(msg),
            Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            Error::Database(e) => ApiError::from(e),
            other => ApiError::Internal(other.to_string()),
        }
    }
}
