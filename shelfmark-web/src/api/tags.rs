//! Tag endpoints
//!
//! Tags form a forest (optional parent reference); list and detail views
//! report whole-subtree work counts and the works endpoint flattens a
//! subtree depth-first. The create flow gets the same fuzzy duplicate
//! search as authors, over tag labels.

use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use shelfmark_common::db::queries::{tag_candidates, tag_nodes, TagNode, WorkRef};
use shelfmark_common::hierarchy::{collect_attached, count_attached, subtree_ids};
use shelfmark_common::matching::{find_matches, MATCH_THRESHOLD, MAX_MATCH_RESULTS};

use crate::api::ApiError;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct TagSummary {
    pub id: i64,
    pub parent_id: Option<i64>,
    #[serde(rename = "type")]
    pub tag_type: String,
    pub label: String,
    /// Works in this tag's whole subtree
    pub work_count: usize,
}

#[derive(Debug, Serialize)]
pub struct TagListResponse {
    pub tags: Vec<TagSummary>,
}

#[derive(Debug, Serialize)]
pub struct TagChildRef {
    pub id: i64,
    pub label: String,
}

#[derive(Debug, Serialize)]
pub struct TagDetailResponse {
    pub id: i64,
    pub parent_id: Option<i64>,
    #[serde(rename = "type")]
    pub tag_type: String,
    pub label: String,
    pub description: Option<String>,
    pub children: Vec<TagChildRef>,
    /// Works tagged directly with this tag
    pub works: Vec<WorkRef>,
    /// Works in the whole subtree
    pub work_count: usize,
}

#[derive(Debug, Serialize)]
pub struct TagWorksResponse {
    pub id: i64,
    pub label: String,
    pub total_works: usize,
    /// Subtree works, this tag's own first, then each child subtree in turn
    pub works: Vec<WorkRef>,
}

#[derive(Debug, Deserialize)]
pub struct TagRequest {
    pub label: String,
    #[serde(rename = "type", default = "default_tag_type")]
    pub tag_type: String,
    pub description: Option<String>,
    pub parent_id: Option<i64>,
}

fn default_tag_type() -> String {
    "genre".to_string()
}

#[derive(Debug, Serialize)]
pub struct TagCreatedResponse {
    pub status: String,
    pub id: i64,
    pub label: String,
    #[serde(rename = "type")]
    pub tag_type: String,
}

#[derive(Debug, Deserialize)]
pub struct TagSearchRequest {
    pub label: String,
}

/// One fuzzy match, shaped the way the create-tag dialog expects
#[derive(Debug, Serialize)]
pub struct TagMatch {
    pub id: i64,
    pub label: String,
    #[serde(rename = "type")]
    pub tag_type: String,
    pub score: u8,
}

#[derive(Debug, Serialize)]
pub struct TagSearchResponse {
    pub matches: Vec<TagMatch>,
}

/// GET /api/tags
pub async fn list_tags(State(state): State<AppState>) -> Result<Json<TagListResponse>, ApiError> {
    let nodes = tag_nodes(&state.db).await?;

    let mut tags = Vec::with_capacity(nodes.len());
    for node in &nodes {
        let work_count = count_attached(node, &nodes)?;
        tags.push(TagSummary {
            id: node.tag.id,
            parent_id: node.tag.parent_id,
            tag_type: node.tag.tag_type.clone(),
            label: node.tag.label.clone(),
            work_count,
        });
    }

    Ok(Json(TagListResponse { tags }))
}

/// GET /api/tags/:id
pub async fn get_tag(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<TagDetailResponse>, ApiError> {
    let nodes = tag_nodes(&state.db).await?;
    let node = find_tag(&nodes, id)?;

    let children = nodes
        .iter()
        .filter(|n| n.tag.parent_id == Some(id))
        .map(|n| TagChildRef {
            id: n.tag.id,
            label: n.tag.label.clone(),
        })
        .collect();

    let work_count = count_attached(node, &nodes)?;

    Ok(Json(TagDetailResponse {
        id: node.tag.id,
        parent_id: node.tag.parent_id,
        tag_type: node.tag.tag_type.clone(),
        label: node.tag.label.clone(),
        description: node.tag.description.clone(),
        children,
        works: node.works.clone(),
        work_count,
    }))
}

/// GET /api/tags/:id/works
///
/// Every work in the tag's subtree, depth-first, the tag's own works first.
pub async fn tag_works(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<TagWorksResponse>, ApiError> {
    let nodes = tag_nodes(&state.db).await?;
    let node = find_tag(&nodes, id)?;

    let works = collect_attached(node, &nodes)?;

    Ok(Json(TagWorksResponse {
        id: node.tag.id,
        label: node.tag.label.clone(),
        total_works: works.len(),
        works,
    }))
}

/// POST /api/tags
pub async fn create_tag(
    State(state): State<AppState>,
    Json(req): Json<TagRequest>,
) -> Result<(StatusCode, Json<TagCreatedResponse>), ApiError> {
    let label = req.label.trim().to_string();
    if label.is_empty() {
        return Err(ApiError::BadRequest("Label is required".to_string()));
    }
    let tag_type = req.tag_type.trim().to_string();

    let existing: Option<(i64,)> =
        sqlx::query_as("SELECT id FROM tags WHERE LOWER(label) = LOWER(?)")
            .bind(&label)
            .fetch_optional(&state.db)
            .await?;
    if existing.is_some() {
        return Err(ApiError::Conflict("Tag already exists".to_string()));
    }

    // The form sends 0 for "no parent"
    let parent_id = req.parent_id.filter(|&p| p != 0);
    if let Some(parent) = parent_id {
        ensure_tag_exists(&state, parent).await?;
    }

    let result = sqlx::query(
        "INSERT INTO tags (parent_id, type, label, description) VALUES (?, ?, ?, ?)",
    )
    .bind(parent_id)
    .bind(&tag_type)
    .bind(&label)
    .bind(&req.description)
    .execute(&state.db)
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(TagCreatedResponse {
            status: "created".to_string(),
            id: result.last_insert_rowid(),
            label,
            tag_type,
        }),
    ))
}

/// PUT /api/tags/:id
///
/// Re-parenting a tag beneath its own subtree is refused; it would close a
/// cycle in the parent graph.
pub async fn update_tag(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<TagRequest>,
) -> Result<Json<TagCreatedResponse>, ApiError> {
    let label = req.label.trim().to_string();
    if label.is_empty() {
        return Err(ApiError::BadRequest("Label is required".to_string()));
    }
    let tag_type = req.tag_type.trim().to_string();

    let nodes = tag_nodes(&state.db).await?;
    let node = find_tag(&nodes, id)?;

    let parent_id = req.parent_id.filter(|&p| p != 0);
    if let Some(parent) = parent_id {
        ensure_tag_exists(&state, parent).await?;

        let descendants = subtree_ids(node, &nodes)?;
        if descendants.contains(&parent) {
            return Err(ApiError::BadRequest(
                "Cannot move a tag beneath its own subtree".to_string(),
            ));
        }
    }

    sqlx::query("UPDATE tags SET parent_id = ?, type = ?, label = ?, description = ? WHERE id = ?")
        .bind(parent_id)
        .bind(&tag_type)
        .bind(&label)
        .bind(&req.description)
        .bind(id)
        .execute(&state.db)
        .await?;

    Ok(Json(TagCreatedResponse {
        status: "updated".to_string(),
        id,
        label,
        tag_type,
    }))
}

/// DELETE /api/tags/:id
///
/// Children of a deleted tag become roots (parent reference cleared).
pub async fn delete_tag(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let result = sqlx::query("DELETE FROM tags WHERE id = ?")
        .bind(id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound(format!("Tag {} not found", id)));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/tags/search
///
/// Find similar tags before creating a new one.
pub async fn search_tags(
    State(state): State<AppState>,
    Json(req): Json<TagSearchRequest>,
) -> Result<Json<TagSearchResponse>, ApiError> {
    let label = req.label.trim();
    if label.is_empty() {
        return Err(ApiError::BadRequest("Label is required".to_string()));
    }

    let candidates = tag_candidates(&state.db).await?;
    let types: HashMap<i64, String> = candidates
        .iter()
        .map(|c| (c.id, c.tag_type.clone()))
        .collect();

    let matches = find_matches(label, &candidates, MATCH_THRESHOLD, MAX_MATCH_RESULTS)
        .into_iter()
        .map(|m| TagMatch {
            tag_type: types.get(&m.id).cloned().unwrap_or_default(),
            id: m.id,
            label: m.label,
            score: m.score,
        })
        .collect();

    Ok(Json(TagSearchResponse { matches }))
}

fn find_tag(nodes: &[TagNode], id: i64) -> Result<&TagNode, ApiError> {
    nodes
        .iter()
        .find(|n| n.tag.id == id)
        .ok_or_else(|| ApiError::NotFound(format!("Tag {} not found", id)))
}

async fn ensure_tag_exists(state: &AppState, id: i64) -> Result<(), ApiError> {
    let exists: Option<(i64,)> = sqlx::query_as("SELECT id FROM tags WHERE id = ?")
        .bind(id)
        .fetch_optional(&state.db)
        .await?;
    if exists.is_none() {
        return Err(ApiError::BadRequest(format!("Parent tag {} not found", id)));
    }
    Ok(())
}
