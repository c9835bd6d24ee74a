//! Catalogue search
//!
//! One query string matched as a case-insensitive substring against work
//! titles, ISBNs, descriptions, author names (primary and alternate), tag
//! labels and holding-location names. An empty query returns an empty
//! result rather than the whole catalogue.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use shelfmark_common::db::models::Work;

use crate::api::ApiError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Serialize)]
pub struct SearchAuthorRef {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct SearchTagRef {
    pub id: i64,
    pub label: String,
}

#[derive(Debug, Serialize)]
pub struct SearchWorkEntry {
    pub id: i64,
    pub title: String,
    pub isbn: Option<i64>,
    pub description: Option<String>,
    pub cover_url: Option<String>,
    pub authors: Vec<SearchAuthorRef>,
    pub tags: Vec<SearchTagRef>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub total_results: usize,
    pub works: Vec<SearchWorkEntry>,
}

/// GET /api/search?q=...
pub async fn search_catalogue(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResponse>, ApiError> {
    let q = query.q.trim().to_string();
    if q.is_empty() {
        return Ok(Json(SearchResponse {
            query: q,
            total_results: 0,
            works: vec![],
        }));
    }

    let pattern = format!("%{}%", q);

    let works: Vec<Work> = sqlx::query_as(
        r#"
        SELECT DISTINCT w.id, w.title, w.publisher, w.isbn, w.description, w.cover_url
        FROM works w
        LEFT JOIN works_authors wa ON wa.work_id = w.id
        LEFT JOIN authors a ON a.id = wa.author_id
        LEFT JOIN author_names an ON an.author_id = a.id
        LEFT JOIN works_tags wt ON wt.work_id = w.id
        LEFT JOIN tags t ON t.id = wt.tag_id
        LEFT JOIN copies c ON c.work_id = w.id
        LEFT JOIN locations l ON l.id = c.location_id
        WHERE w.title LIKE ?
           OR CAST(w.isbn AS TEXT) LIKE ?
           OR w.description LIKE ?
           OR a.primary_name LIKE ?
           OR an.alt_name LIKE ?
           OR t.label LIKE ?
           OR l.name LIKE ?
        ORDER BY w.title ASC
        "#,
    )
    .bind(&pattern)
    .bind(&pattern)
    .bind(&pattern)
    .bind(&pattern)
    .bind(&pattern)
    .bind(&pattern)
    .bind(&pattern)
    .fetch_all(&state.db)
    .await?;

    let mut entries = Vec::with_capacity(works.len());
    for work in works {
        let authors: Vec<(i64, String)> = sqlx::query_as(
            r#"
            SELECT a.id, a.primary_name
            FROM authors a
            JOIN works_authors wa ON wa.author_id = a.id
            WHERE wa.work_id = ?
            ORDER BY a.primary_name ASC
            "#,
        )
        .bind(work.id)
        .fetch_all(&state.db)
        .await?;

        let tags: Vec<(i64, String)> = sqlx::query_as(
            r#"
            SELECT t.id, t.label
            FROM tags t
            JOIN works_tags wt ON wt.tag_id = t.id
            WHERE wt.work_id = ?
            ORDER BY t.label ASC
            "#,
        )
        .bind(work.id)
        .fetch_all(&state.db)
        .await?;

        entries.push(SearchWorkEntry {
            id: work.id,
            title: work.title,
            isbn: work.isbn,
            description: work.description,
            cover_url: work.cover_url,
            authors: authors
                .into_iter()
                .map(|(id, name)| SearchAuthorRef { id, name })
                .collect(),
            tags: tags
                .into_iter()
                .map(|(id, label)| SearchTagRef { id, label })
                .collect(),
        });
    }

    Ok(Json(SearchResponse {
        query: q,
        total_results: entries.len(),
        works: entries,
    }))
}
