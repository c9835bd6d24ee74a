//! Work endpoints
//!
//! A work is the abstract book (title, ISBN, description); the physical
//! copies on the shelves hang off it and are managed separately.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use shelfmark_common::db::models::Work;

use crate::api::ApiError;
use crate::pagination::{Pagination, PAGE_SIZE};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct WorkListQuery {
    /// Page number (1-indexed)
    #[serde(default = "default_page")]
    pub page: i64,
}

fn default_page() -> i64 {
    1
}

#[derive(Debug, Serialize)]
pub struct WorkListResponse {
    pub total_works: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
    pub works: Vec<Work>,
}

#[derive(Debug, Serialize)]
pub struct WorkAuthorRef {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct WorkTagRef {
    pub id: i64,
    pub label: String,
    #[serde(rename = "type")]
    pub tag_type: String,
}

#[derive(Debug, Serialize)]
pub struct WorkDetailResponse {
    pub id: i64,
    pub title: String,
    pub publisher: Option<String>,
    pub isbn: Option<i64>,
    pub description: Option<String>,
    pub cover_url: Option<String>,
    pub authors: Vec<WorkAuthorRef>,
    pub tags: Vec<WorkTagRef>,
    pub copy_count: i64,
}

#[derive(Debug, Deserialize)]
pub struct WorkRequest {
    pub title: String,
    pub publisher: Option<String>,
    pub isbn: Option<i64>,
    pub description: Option<String>,
    pub cover_url: Option<String>,
    #[serde(default)]
    pub author_ids: Vec<i64>,
    #[serde(default)]
    pub tag_ids: Vec<i64>,
}

#[derive(Debug, Serialize)]
pub struct WorkCreatedResponse {
    pub status: String,
    pub id: i64,
    pub title: String,
}

#[derive(Debug, Serialize)]
pub struct WorkCopyInfo {
    pub id: i64,
    pub location_id: i64,
    pub location_name: String,
    pub owner_id: Option<i64>,
    pub condition: Option<String>,
    pub acquired: String,
    pub lended_to: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct WorkCopiesResponse {
    pub work_id: i64,
    pub title: String,
    pub copies: Vec<WorkCopyInfo>,
}

/// GET /api/works
pub async fn list_works(
    State(state): State<AppState>,
    Query(query): Query<WorkListQuery>,
) -> Result<Json<WorkListResponse>, ApiError> {
    let total_works: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM works")
        .fetch_one(&state.db)
        .await?;

    let pagination = Pagination::for_page(total_works, query.page);

    let works: Vec<Work> = sqlx::query_as(
        r#"
        SELECT id, title, publisher, isbn, description, cover_url
        FROM works
        ORDER BY title ASC
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(PAGE_SIZE)
    .bind(pagination.offset)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(WorkListResponse {
        total_works,
        page: pagination.page,
        page_size: PAGE_SIZE,
        total_pages: pagination.total_pages,
        works,
    }))
}

/// GET /api/works/:id
pub async fn get_work(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<WorkDetailResponse>, ApiError> {
    let work: Option<Work> = sqlx::query_as(
        "SELECT id, title, publisher, isbn, description, cover_url FROM works WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(&state.db)
    .await?;
    let work = work.ok_or_else(|| ApiError::NotFound(format!("Work {} not found", id)))?;

    let authors: Vec<(i64, String)> = sqlx::query_as(
        r#"
        SELECT a.id, a.primary_name
        FROM authors a
        JOIN works_authors wa ON wa.author_id = a.id
        WHERE wa.work_id = ?
        ORDER BY a.primary_name ASC
        "#,
    )
    .bind(id)
    .fetch_all(&state.db)
    .await?;

    let tags: Vec<(i64, String, String)> = sqlx::query_as(
        r#"
        SELECT t.id, t.label, t.type
        FROM tags t
        JOIN works_tags wt ON wt.tag_id = t.id
        WHERE wt.work_id = ?
        ORDER BY t.label ASC
        "#,
    )
    .bind(id)
    .fetch_all(&state.db)
    .await?;

    let copy_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM copies WHERE work_id = ?")
        .bind(id)
        .fetch_one(&state.db)
        .await?;

    Ok(Json(WorkDetailResponse {
        id: work.id,
        title: work.title,
        publisher: work.publisher,
        isbn: work.isbn,
        description: work.description,
        cover_url: work.cover_url,
        authors: authors
            .into_iter()
            .map(|(id, name)| WorkAuthorRef { id, name })
            .collect(),
        tags: tags
            .into_iter()
            .map(|(id, label, tag_type)| WorkTagRef { id, label, tag_type })
            .collect(),
        copy_count,
    }))
}

/// POST /api/works
///
/// A work whose ISBN is already catalogued is refused with a conflict;
/// the right move there is adding a copy to the existing work.
pub async fn create_work(
    State(state): State<AppState>,
    Json(req): Json<WorkRequest>,
) -> Result<(StatusCode, Json<WorkCreatedResponse>), ApiError> {
    let title = req.title.trim().to_string();
    if title.is_empty() {
        return Err(ApiError::BadRequest("Title is required".to_string()));
    }

    if let Some(isbn) = req.isbn {
        let existing: Option<(i64,)> = sqlx::query_as("SELECT id FROM works WHERE isbn = ?")
            .bind(isbn)
            .fetch_optional(&state.db)
            .await?;
        if let Some((existing_id,)) = existing {
            return Err(ApiError::Conflict(format!(
                "A work with this ISBN already exists (work {})",
                existing_id
            )));
        }
    }

    let mut tx = state.db.begin().await?;

    let result = sqlx::query(
        "INSERT INTO works (title, publisher, isbn, description, cover_url) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&title)
    .bind(&req.publisher)
    .bind(req.isbn)
    .bind(&req.description)
    .bind(&req.cover_url)
    .execute(&mut *tx)
    .await?;
    let work_id = result.last_insert_rowid();

    link_authors_and_tags(&mut tx, work_id, &req.author_ids, &req.tag_ids).await?;

    tx.commit().await?;

    Ok((
        StatusCode::CREATED,
        Json(WorkCreatedResponse {
            status: "created".to_string(),
            id: work_id,
            title,
        }),
    ))
}

/// PUT /api/works/:id
///
/// Replaces the work's fields and its full author/tag link sets.
pub async fn update_work(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<WorkRequest>,
) -> Result<Json<WorkCreatedResponse>, ApiError> {
    let title = req.title.trim().to_string();
    if title.is_empty() {
        return Err(ApiError::BadRequest("Title is required".to_string()));
    }

    if let Some(isbn) = req.isbn {
        let existing: Option<(i64,)> =
            sqlx::query_as("SELECT id FROM works WHERE isbn = ? AND id != ?")
                .bind(isbn)
                .bind(id)
                .fetch_optional(&state.db)
                .await?;
        if let Some((existing_id,)) = existing {
            return Err(ApiError::Conflict(format!(
                "A work with this ISBN already exists (work {})",
                existing_id
            )));
        }
    }

    let mut tx = state.db.begin().await?;

    let result = sqlx::query(
        "UPDATE works SET title = ?, publisher = ?, isbn = ?, description = ?, cover_url = ? WHERE id = ?",
    )
    .bind(&title)
    .bind(&req.publisher)
    .bind(req.isbn)
    .bind(&req.description)
    .bind(&req.cover_url)
    .bind(id)
    .execute(&mut *tx)
    .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound(format!("Work {} not found", id)));
    }

    sqlx::query("DELETE FROM works_authors WHERE work_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM works_tags WHERE work_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    link_authors_and_tags(&mut tx, id, &req.author_ids, &req.tag_ids).await?;

    tx.commit().await?;

    Ok(Json(WorkCreatedResponse {
        status: "updated".to_string(),
        id,
        title,
    }))
}

/// DELETE /api/works/:id
///
/// Copies of the work and its author/tag links go with it.
pub async fn delete_work(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let result = sqlx::query("DELETE FROM works WHERE id = ?")
        .bind(id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound(format!("Work {} not found", id)));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/works/:id/copies
pub async fn work_copies(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<WorkCopiesResponse>, ApiError> {
    let title: Option<(String,)> = sqlx::query_as("SELECT title FROM works WHERE id = ?")
        .bind(id)
        .fetch_optional(&state.db)
        .await?;
    let (title,) = title.ok_or_else(|| ApiError::NotFound(format!("Work {} not found", id)))?;

    let copies: Vec<(i64, i64, String, Option<i64>, Option<String>, String, Option<i64>)> =
        sqlx::query_as(
            r#"
            SELECT c.id, c.location_id, l.name, c.owner_id, c.condition, c.acquired, c.lended_to
            FROM copies c
            JOIN locations l ON l.id = c.location_id
            WHERE c.work_id = ?
            ORDER BY c.id ASC
            "#,
        )
        .bind(id)
        .fetch_all(&state.db)
        .await?;

    Ok(Json(WorkCopiesResponse {
        work_id: id,
        title,
        copies: copies
            .into_iter()
            .map(
                |(id, location_id, location_name, owner_id, condition, acquired, lended_to)| {
                    WorkCopyInfo {
                        id,
                        location_id,
                        location_name,
                        owner_id,
                        condition,
                        acquired,
                        lended_to,
                    }
                },
            )
            .collect(),
    }))
}

/// Link a work to the authors and tags that actually exist; ids pointing
/// nowhere are dropped silently, as the selection widgets only offer real
/// rows.
async fn link_authors_and_tags(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    work_id: i64,
    author_ids: &[i64],
    tag_ids: &[i64],
) -> Result<(), ApiError> {
    for author_id in author_ids {
        sqlx::query(
            "INSERT OR IGNORE INTO works_authors (work_id, author_id) SELECT ?, id FROM authors WHERE id = ?",
        )
        .bind(work_id)
        .bind(author_id)
        .execute(&mut **tx)
        .await?;
    }

    for tag_id in tag_ids {
        sqlx::query(
            "INSERT OR IGNORE INTO works_tags (work_id, tag_id) SELECT ?, id FROM tags WHERE id = ?",
        )
        .bind(work_id)
        .bind(tag_id)
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}
