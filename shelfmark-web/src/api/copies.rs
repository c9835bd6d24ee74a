//! Copy endpoints
//!
//! A copy is one physical book on one shelf, optionally owned by a user
//! and optionally lent out to another.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use shelfmark_common::db::models::Copy;

use crate::api::ApiError;
use crate::pagination::{Pagination, PAGE_SIZE};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CopyListQuery {
    /// Page number (1-indexed)
    #[serde(default = "default_page")]
    pub page: i64,
}

fn default_page() -> i64 {
    1
}

#[derive(Debug, Serialize)]
pub struct CopySummary {
    pub id: i64,
    pub work_id: i64,
    pub work_title: String,
    pub location_id: i64,
    pub location_name: String,
    pub condition: Option<String>,
    pub acquired: String,
}

#[derive(Debug, Serialize)]
pub struct CopyListResponse {
    pub total_copies: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
    pub copies: Vec<CopySummary>,
}

#[derive(Debug, Serialize)]
pub struct CopyDetailResponse {
    pub id: i64,
    pub work_id: i64,
    pub work_title: String,
    pub location_id: i64,
    pub location_name: String,
    pub owner_id: Option<i64>,
    pub owner_name: Option<String>,
    pub condition: Option<String>,
    pub acquired: String,
    pub lended_to: Option<i64>,
    pub borrower_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CopyRequest {
    pub work_id: i64,
    pub location_id: i64,
    pub owner_id: Option<i64>,
    pub condition: Option<String>,
    pub lended_to: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct CopyCreatedResponse {
    pub status: String,
    pub id: i64,
}

#[derive(Debug, Serialize)]
pub struct RecentCopiesResponse {
    pub copies: Vec<CopySummary>,
}

/// GET /api/copies
pub async fn list_copies(
    State(state): State<AppState>,
    Query(query): Query<CopyListQuery>,
) -> Result<Json<CopyListResponse>, ApiError> {
    let total_copies: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM copies")
        .fetch_one(&state.db)
        .await?;

    let pagination = Pagination::for_page(total_copies, query.page);

    let rows: Vec<(i64, i64, String, i64, String, Option<String>, String)> = sqlx::query_as(
        r#"
        SELECT c.id, c.work_id, w.title, c.location_id, l.name, c.condition, c.acquired
        FROM copies c
        JOIN works w ON w.id = c.work_id
        JOIN locations l ON l.id = c.location_id
        ORDER BY c.id ASC
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(PAGE_SIZE)
    .bind(pagination.offset)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(CopyListResponse {
        total_copies,
        page: pagination.page,
        page_size: PAGE_SIZE,
        total_pages: pagination.total_pages,
        copies: rows.into_iter().map(copy_summary).collect(),
    }))
}

/// GET /api/copies/:id
pub async fn get_copy(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<CopyDetailResponse>, ApiError> {
    let copy: Option<Copy> = sqlx::query_as(
        "SELECT id, work_id, location_id, owner_id, condition, acquired, lended_to FROM copies WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(&state.db)
    .await?;
    let copy = copy.ok_or_else(|| ApiError::NotFound(format!("Copy {} not found", id)))?;

    let (work_title,): (String,) = sqlx::query_as("SELECT title FROM works WHERE id = ?")
        .bind(copy.work_id)
        .fetch_one(&state.db)
        .await?;
    let (location_name,): (String,) = sqlx::query_as("SELECT name FROM locations WHERE id = ?")
        .bind(copy.location_id)
        .fetch_one(&state.db)
        .await?;

    let owner_name = user_name(&state, copy.owner_id).await?;
    let borrower_name = user_name(&state, copy.lended_to).await?;

    Ok(Json(CopyDetailResponse {
        id: copy.id,
        work_id: copy.work_id,
        work_title,
        location_id: copy.location_id,
        location_name,
        owner_id: copy.owner_id,
        owner_name,
        condition: copy.condition,
        acquired: copy.acquired.to_rfc3339(),
        lended_to: copy.lended_to,
        borrower_name,
    }))
}

/// POST /api/copies
pub async fn create_copy(
    State(state): State<AppState>,
    Json(req): Json<CopyRequest>,
) -> Result<(StatusCode, Json<CopyCreatedResponse>), ApiError> {
    ensure_work_exists(&state, req.work_id).await?;
    ensure_location_exists(&state, req.location_id).await?;

    // The form sends 0 for "-none-"
    let owner_id = req.owner_id.filter(|&o| o != 0);
    let lended_to = req.lended_to.filter(|&l| l != 0);

    let result = sqlx::query(
        "INSERT INTO copies (work_id, location_id, owner_id, condition, lended_to) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(req.work_id)
    .bind(req.location_id)
    .bind(owner_id)
    .bind(&req.condition)
    .bind(lended_to)
    .execute(&state.db)
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(CopyCreatedResponse {
            status: "created".to_string(),
            id: result.last_insert_rowid(),
        }),
    ))
}

/// PUT /api/copies/:id
pub async fn update_copy(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<CopyRequest>,
) -> Result<Json<CopyCreatedResponse>, ApiError> {
    ensure_work_exists(&state, req.work_id).await?;
    ensure_location_exists(&state, req.location_id).await?;

    let owner_id = req.owner_id.filter(|&o| o != 0);
    let lended_to = req.lended_to.filter(|&l| l != 0);

    let result = sqlx::query(
        "UPDATE copies SET work_id = ?, location_id = ?, owner_id = ?, condition = ?, lended_to = ? WHERE id = ?",
    )
    .bind(req.work_id)
    .bind(req.location_id)
    .bind(owner_id)
    .bind(&req.condition)
    .bind(lended_to)
    .bind(id)
    .execute(&state.db)
    .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound(format!("Copy {} not found", id)));
    }

    Ok(Json(CopyCreatedResponse {
        status: "updated".to_string(),
        id,
    }))
}

/// DELETE /api/copies/:id
pub async fn delete_copy(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let result = sqlx::query("DELETE FROM copies WHERE id = ?")
        .bind(id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound(format!("Copy {} not found", id)));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/recent
///
/// The ten most recently acquired copies, for the front page.
pub async fn recent_copies(
    State(state): State<AppState>,
) -> Result<Json<RecentCopiesResponse>, ApiError> {
    let rows: Vec<(i64, i64, String, i64, String, Option<String>, String)> = sqlx::query_as(
        r#"
        SELECT c.id, c.work_id, w.title, c.location_id, l.name, c.condition, c.acquired
        FROM copies c
        JOIN works w ON w.id = c.work_id
        JOIN locations l ON l.id = c.location_id
        ORDER BY c.acquired DESC, c.id DESC
        LIMIT 10
        "#,
    )
    .fetch_all(&state.db)
    .await?;

    Ok(Json(RecentCopiesResponse {
        copies: rows.into_iter().map(copy_summary).collect(),
    }))
}

fn copy_summary(
    (id, work_id, work_title, location_id, location_name, condition, acquired): (
        i64,
        i64,
        String,
        i64,
        String,
        Option<String>,
        String,
    ),
) -> CopySummary {
    CopySummary {
        id,
        work_id,
        work_title,
        location_id,
        location_name,
        condition,
        acquired,
    }
}

async fn user_name(state: &AppState, user_id: Option<i64>) -> Result<Option<String>, ApiError> {
    let Some(user_id) = user_id else {
        return Ok(None);
    };

    let name: Option<(String,)> = sqlx::query_as("SELECT name FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(&state.db)
        .await?;
    Ok(name.map(|(n,)| n))
}

async fn ensure_work_exists(state: &AppState, id: i64) -> Result<(), ApiError> {
    let exists: Option<(i64,)> = sqlx::query_as("SELECT id FROM works WHERE id = ?")
        .bind(id)
        .fetch_optional(&state.db)
        .await?;
    if exists.is_none() {
        return Err(ApiError::BadRequest(format!("Work {} not found", id)));
    }
    Ok(())
}

async fn ensure_location_exists(state: &AppState, id: i64) -> Result<(), ApiError> {
    let exists: Option<(i64,)> = sqlx::query_as("SELECT id FROM locations WHERE id = ?")
        .bind(id)
        .fetch_optional(&state.db)
        .await?;
    if exists.is_none() {
        return Err(ApiError::BadRequest(format!("Location {} not found", id)));
    }
    Ok(())
}
