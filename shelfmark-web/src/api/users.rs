//! User endpoints
//!
//! Users own and borrow copies. Roles are plain permission levels on the
//! row; there is no login surface here.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use shelfmark_common::db::models::User;

use crate::api::ApiError;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub users: Vec<User>,
}

#[derive(Debug, Deserialize)]
pub struct UserRequest {
    pub name: String,
    pub email: Option<String>,
    pub info: Option<String>,
    #[serde(default = "default_permissions")]
    pub permissions: i64,
}

fn default_permissions() -> i64 {
    1
}

#[derive(Debug, Serialize)]
pub struct UserCreatedResponse {
    pub status: String,
    pub id: i64,
    pub name: String,
}

/// GET /api/users
pub async fn list_users(State(state): State<AppState>) -> Result<Json<UserListResponse>, ApiError> {
    let users: Vec<User> = sqlx::query_as(
        "SELECT id, name, email, info, join_date, permissions FROM users ORDER BY id ASC",
    )
    .fetch_all(&state.db)
    .await?;

    Ok(Json(UserListResponse { users }))
}

/// GET /api/users/:id
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<User>, ApiError> {
    let user: Option<User> = sqlx::query_as(
        "SELECT id, name, email, info, join_date, permissions FROM users WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(&state.db)
    .await?;

    user.map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("User {} not found", id)))
}

/// POST /api/users
pub async fn create_user(
    State(state): State<AppState>,
    Json(req): Json<UserRequest>,
) -> Result<(StatusCode, Json<UserCreatedResponse>), ApiError> {
    let name = req.name.trim().to_string();
    if name.is_empty() {
        return Err(ApiError::BadRequest("Name is required".to_string()));
    }

    let existing: Option<(i64,)> =
        sqlx::query_as("SELECT id FROM users WHERE LOWER(name) = LOWER(?)")
            .bind(&name)
            .fetch_optional(&state.db)
            .await?;
    if existing.is_some() {
        return Err(ApiError::Conflict("User already exists".to_string()));
    }

    let result = sqlx::query("INSERT INTO users (name, email, info, permissions) VALUES (?, ?, ?, ?)")
        .bind(&name)
        .bind(&req.email)
        .bind(&req.info)
        .bind(req.permissions)
        .execute(&state.db)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(UserCreatedResponse {
            status: "created".to_string(),
            id: result.last_insert_rowid(),
            name,
        }),
    ))
}

/// PUT /api/users/:id
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<UserRequest>,
) -> Result<Json<UserCreatedResponse>, ApiError> {
    let name = req.name.trim().to_string();
    if name.is_empty() {
        return Err(ApiError::BadRequest("Name is required".to_string()));
    }

    let clash: Option<(i64,)> =
        sqlx::query_as("SELECT id FROM users WHERE LOWER(name) = LOWER(?) AND id != ?")
            .bind(&name)
            .bind(id)
            .fetch_optional(&state.db)
            .await?;
    if clash.is_some() {
        return Err(ApiError::Conflict("User already exists".to_string()));
    }

    let result = sqlx::query(
        "UPDATE users SET name = ?, email = ?, info = ?, permissions = ? WHERE id = ?",
    )
    .bind(&name)
    .bind(&req.email)
    .bind(&req.info)
    .bind(req.permissions)
    .bind(id)
    .execute(&state.db)
    .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound(format!("User {} not found", id)));
    }

    Ok(Json(UserCreatedResponse {
        status: "updated".to_string(),
        id,
        name,
    }))
}

/// DELETE /api/users/:id
///
/// Copies owned by or lent to the user keep existing with the reference
/// cleared.
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound(format!("User {} not found", id)));
    }
    Ok(StatusCode::NO_CONTENT)
}
