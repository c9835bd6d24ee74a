//! Author endpoints
//!
//! CRUD plus the duplicate-detection search the create flow calls before
//! inserting: the fuzzy matcher runs over every author's primary and
//! alternate names and reports the strongest candidates.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use shelfmark_common::db::models::Author;
use shelfmark_common::db::queries::author_candidates;
use shelfmark_common::matching::{find_matches, MATCH_THRESHOLD, MAX_MATCH_RESULTS};

use crate::api::ApiError;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct AuthorSummary {
    pub id: i64,
    pub primary_name: String,
    pub alt_names: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct AuthorListResponse {
    pub authors: Vec<AuthorSummary>,
}

#[derive(Debug, Serialize)]
pub struct AuthorWorkRef {
    pub id: i64,
    pub title: String,
}

#[derive(Debug, Serialize)]
pub struct AuthorDetailResponse {
    pub id: i64,
    pub primary_name: String,
    pub bio: Option<String>,
    pub alt_names: Vec<String>,
    pub works: Vec<AuthorWorkRef>,
}

#[derive(Debug, Deserialize)]
pub struct AuthorRequest {
    pub name: String,
    pub bio: Option<String>,
    #[serde(default)]
    pub alt_names: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct AuthorCreatedResponse {
    pub status: String,
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct AuthorSearchRequest {
    pub name: String,
}

/// One fuzzy match, shaped the way the create-author dialog expects
#[derive(Debug, Serialize)]
pub struct AuthorMatch {
    pub id: i64,
    pub name: String,
    pub score: u8,
}

#[derive(Debug, Serialize)]
pub struct AuthorSearchResponse {
    pub matches: Vec<AuthorMatch>,
}

/// GET /api/authors
pub async fn list_authors(
    State(state): State<AppState>,
) -> Result<Json<AuthorListResponse>, ApiError> {
    let authors = author_candidates(&state.db)
        .await?
        .into_iter()
        .map(|a| AuthorSummary {
            id: a.author.id,
            primary_name: a.author.primary_name,
            alt_names: a.alt_names,
        })
        .collect();

    Ok(Json(AuthorListResponse { authors }))
}

/// GET /api/authors/:id
pub async fn get_author(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<AuthorDetailResponse>, ApiError> {
    let author: Option<Author> =
        sqlx::query_as("SELECT id, primary_name, bio FROM authors WHERE id = ?")
            .bind(id)
            .fetch_optional(&state.db)
            .await?;

    let author = author.ok_or_else(|| ApiError::NotFound(format!("Author {} not found", id)))?;

    let alt_names: Vec<(Option<String>,)> =
        sqlx::query_as("SELECT alt_name FROM author_names WHERE author_id = ? ORDER BY id ASC")
            .bind(id)
            .fetch_all(&state.db)
            .await?;

    let works: Vec<(i64, String)> = sqlx::query_as(
        r#"
        SELECT w.id, w.title
        FROM works w
        JOIN works_authors wa ON wa.work_id = w.id
        WHERE wa.author_id = ?
        ORDER BY w.title ASC
        "#,
    )
    .bind(id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(AuthorDetailResponse {
        id: author.id,
        primary_name: author.primary_name,
        bio: author.bio,
        alt_names: alt_names.into_iter().filter_map(|(n,)| n).collect(),
        works: works
            .into_iter()
            .map(|(id, title)| AuthorWorkRef { id, title })
            .collect(),
    }))
}

/// POST /api/authors
///
/// Refuses an exact (case-insensitive) primary-name duplicate. Near-misses
/// are the search endpoint's job; the create dialog is expected to call
/// that first and let the user decide.
pub async fn create_author(
    State(state): State<AppState>,
    Json(req): Json<AuthorRequest>,
) -> Result<(StatusCode, Json<AuthorCreatedResponse>), ApiError> {
    let name = req.name.trim().to_string();
    if name.is_empty() {
        return Err(ApiError::BadRequest("Name is required".to_string()));
    }

    let existing: Option<(i64,)> =
        sqlx::query_as("SELECT id FROM authors WHERE LOWER(primary_name) = LOWER(?)")
            .bind(&name)
            .fetch_optional(&state.db)
            .await?;
    if existing.is_some() {
        return Err(ApiError::Conflict("Author already exists".to_string()));
    }

    let mut tx = state.db.begin().await?;

    let result = sqlx::query("INSERT INTO authors (primary_name, bio) VALUES (?, ?)")
        .bind(&name)
        .bind(&req.bio)
        .execute(&mut *tx)
        .await?;
    let author_id = result.last_insert_rowid();

    for alt_name in req.alt_names.iter().filter(|n| !n.trim().is_empty()) {
        sqlx::query("INSERT INTO author_names (author_id, alt_name) VALUES (?, ?)")
            .bind(author_id)
            .bind(alt_name.trim())
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    Ok((
        StatusCode::CREATED,
        Json(AuthorCreatedResponse {
            status: "created".to_string(),
            id: author_id,
            name,
        }),
    ))
}

/// PUT /api/authors/:id
///
/// Replaces name, bio and the full alternate-name list.
pub async fn update_author(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<AuthorRequest>,
) -> Result<Json<AuthorCreatedResponse>, ApiError> {
    let name = req.name.trim().to_string();
    if name.is_empty() {
        return Err(ApiError::BadRequest("Name is required".to_string()));
    }

    let mut tx = state.db.begin().await?;

    let result = sqlx::query("UPDATE authors SET primary_name = ?, bio = ? WHERE id = ?")
        .bind(&name)
        .bind(&req.bio)
        .bind(id)
        .execute(&mut *tx)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound(format!("Author {} not found", id)));
    }

    sqlx::query("DELETE FROM author_names WHERE author_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    for alt_name in req.alt_names.iter().filter(|n| !n.trim().is_empty()) {
        sqlx::query("INSERT INTO author_names (author_id, alt_name) VALUES (?, ?)")
            .bind(id)
            .bind(alt_name.trim())
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    Ok(Json(AuthorCreatedResponse {
        status: "updated".to_string(),
        id,
        name,
    }))
}

/// DELETE /api/authors/:id
pub async fn delete_author(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let result = sqlx::query("DELETE FROM authors WHERE id = ?")
        .bind(id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound(format!("Author {} not found", id)));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/authors/search
///
/// Find similar authors before creating a new one. Materializes the full
/// author list, then runs the pure matcher over it.
pub async fn search_authors(
    State(state): State<AppState>,
    Json(req): Json<AuthorSearchRequest>,
) -> Result<Json<AuthorSearchResponse>, ApiError> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(ApiError::BadRequest("Name is required".to_string()));
    }

    let candidates = author_candidates(&state.db).await?;
    let matches = find_matches(name, &candidates, MATCH_THRESHOLD, MAX_MATCH_RESULTS)
        .into_iter()
        .map(|m| AuthorMatch {
            id: m.id,
            name: m.label,
            score: m.score,
        })
        .collect();

    Ok(Json(AuthorSearchResponse { matches }))
}
