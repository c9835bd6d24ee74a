//! Location endpoints
//!
//! Locations form a forest of rooms, bookcases and shelves. The list view
//! carries whole-subtree copy counts and the detail view flattens every
//! copy shelved anywhere under the location, depth-first.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use shelfmark_common::db::queries::{location_nodes, CopyRef, LocationNode};
use shelfmark_common::hierarchy::{collect_attached, count_attached, subtree_ids};

use crate::api::ApiError;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct LocationSummary {
    pub id: i64,
    pub parent_id: Option<i64>,
    pub name: String,
    #[serde(rename = "type")]
    pub location_type: String,
    /// Copies shelved in this location's whole subtree
    pub total_copies: usize,
}

#[derive(Debug, Serialize)]
pub struct LocationListResponse {
    pub locations: Vec<LocationSummary>,
}

#[derive(Debug, Serialize)]
pub struct LocationChildRef {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct LocationDetailResponse {
    pub id: i64,
    pub parent_id: Option<i64>,
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub location_type: String,
    pub children: Vec<LocationChildRef>,
    pub total_copies: usize,
    /// Every copy in the subtree, this location's own shelf first
    pub copies: Vec<CopyRef>,
}

#[derive(Debug, Deserialize)]
pub struct LocationRequest {
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub location_type: String,
    pub parent_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct LocationCreatedResponse {
    pub status: String,
    pub id: i64,
    pub name: String,
}

/// GET /api/locations
pub async fn list_locations(
    State(state): State<AppState>,
) -> Result<Json<LocationListResponse>, ApiError> {
    let nodes = location_nodes(&state.db).await?;

    let mut locations = Vec::with_capacity(nodes.len());
    for node in &nodes {
        let total_copies = count_attached(node, &nodes)?;
        locations.push(LocationSummary {
            id: node.location.id,
            parent_id: node.location.parent_id,
            name: node.location.name.clone(),
            location_type: node.location.location_type.clone(),
            total_copies,
        });
    }

    Ok(Json(LocationListResponse { locations }))
}

/// GET /api/locations/:id
pub async fn get_location(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<LocationDetailResponse>, ApiError> {
    let nodes = location_nodes(&state.db).await?;
    let node = find_location(&nodes, id)?;

    let children = nodes
        .iter()
        .filter(|n| n.location.parent_id == Some(id))
        .map(|n| LocationChildRef {
            id: n.location.id,
            name: n.location.name.clone(),
        })
        .collect();

    let copies = collect_attached(node, &nodes)?;

    Ok(Json(LocationDetailResponse {
        id: node.location.id,
        parent_id: node.location.parent_id,
        name: node.location.name.clone(),
        description: node.location.description.clone(),
        location_type: node.location.location_type.clone(),
        children,
        total_copies: copies.len(),
        copies,
    }))
}

/// POST /api/locations
pub async fn create_location(
    State(state): State<AppState>,
    Json(req): Json<LocationRequest>,
) -> Result<(StatusCode, Json<LocationCreatedResponse>), ApiError> {
    let name = req.name.trim().to_string();
    if name.is_empty() {
        return Err(ApiError::BadRequest("Name is required".to_string()));
    }
    let location_type = req.location_type.trim().to_string();
    if location_type.is_empty() {
        return Err(ApiError::BadRequest("Type is required".to_string()));
    }

    // The form sends 0 for "no parent"
    let parent_id = req.parent_id.filter(|&p| p != 0);
    if let Some(parent) = parent_id {
        ensure_location_exists(&state, parent).await?;
    }

    let result = sqlx::query(
        "INSERT INTO locations (parent_id, name, description, type) VALUES (?, ?, ?, ?)",
    )
    .bind(parent_id)
    .bind(&name)
    .bind(&req.description)
    .bind(&location_type)
    .execute(&state.db)
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(LocationCreatedResponse {
            status: "created".to_string(),
            id: result.last_insert_rowid(),
            name,
        }),
    ))
}

/// PUT /api/locations/:id
///
/// Re-parenting a location beneath its own subtree is refused; it would
/// close a cycle in the parent graph.
pub async fn update_location(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<LocationRequest>,
) -> Result<Json<LocationCreatedResponse>, ApiError> {
    let name = req.name.trim().to_string();
    if name.is_empty() {
        return Err(ApiError::BadRequest("Name is required".to_string()));
    }
    let location_type = req.location_type.trim().to_string();

    let nodes = location_nodes(&state.db).await?;
    let node = find_location(&nodes, id)?;

    let parent_id = req.parent_id.filter(|&p| p != 0);
    if let Some(parent) = parent_id {
        ensure_location_exists(&state, parent).await?;

        let descendants = subtree_ids(node, &nodes)?;
        if descendants.contains(&parent) {
            return Err(ApiError::BadRequest(
                "Cannot move a location beneath its own subtree".to_string(),
            ));
        }
    }

    sqlx::query(
        "UPDATE locations SET parent_id = ?, name = ?, description = ?, type = ? WHERE id = ?",
    )
    .bind(parent_id)
    .bind(&name)
    .bind(&req.description)
    .bind(&location_type)
    .bind(id)
    .execute(&state.db)
    .await?;

    Ok(Json(LocationCreatedResponse {
        status: "updated".to_string(),
        id,
        name,
    }))
}

/// DELETE /api/locations/:id
///
/// Refused while copies are still shelved directly at the location; child
/// locations become roots (parent reference cleared).
pub async fn delete_location(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let copy_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM copies WHERE location_id = ?")
        .bind(id)
        .fetch_one(&state.db)
        .await?;
    if copy_count > 0 {
        return Err(ApiError::Conflict(format!(
            "Location still holds {} copies",
            copy_count
        )));
    }

    let result = sqlx::query("DELETE FROM locations WHERE id = ?")
        .bind(id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound(format!("Location {} not found", id)));
    }
    Ok(StatusCode::NO_CONTENT)
}

fn find_location(nodes: &[LocationNode], id: i64) -> Result<&LocationNode, ApiError> {
    nodes
        .iter()
        .find(|n| n.location.id == id)
        .ok_or_else(|| ApiError::NotFound(format!("Location {} not found", id)))
}

async fn ensure_location_exists(state: &AppState, id: i64) -> Result<(), ApiError> {
    let exists: Option<(i64,)> = sqlx::query_as("SELECT id FROM locations WHERE id = ?")
        .bind(id)
        .fetch_optional(&state.db)
        .await?;
    if exists.is_none() {
        return Err(ApiError::BadRequest(format!(
            "Parent location {} not found",
            id
        )));
    }
    Ok(())
}
