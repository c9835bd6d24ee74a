//! shelfmark-web library - catalogue JSON API
//!
//! CRUD endpoints for works, copies, authors, tags, locations and users,
//! plus duplicate detection for the author/tag create flows and subtree
//! aggregate views for locations and tags.

use axum::Router;
use sqlx::SqlitePool;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod pagination;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
}

impl AppState {
    /// Create new application state
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};

    Router::new()
        .route(
            "/api/works",
            get(api::works::list_works).post(api::works::create_work),
        )
        .route(
            "/api/works/:id",
            get(api::works::get_work)
                .put(api::works::update_work)
                .delete(api::works::delete_work),
        )
        .route("/api/works/:id/copies", get(api::works::work_copies))
        .route(
            "/api/copies",
            get(api::copies::list_copies).post(api::copies::create_copy),
        )
        .route(
            "/api/copies/:id",
            get(api::copies::get_copy)
                .put(api::copies::update_copy)
                .delete(api::copies::delete_copy),
        )
        .route("/api/recent", get(api::copies::recent_copies))
        .route(
            "/api/authors",
            get(api::authors::list_authors).post(api::authors::create_author),
        )
        .route(
            "/api/authors/:id",
            get(api::authors::get_author)
                .put(api::authors::update_author)
                .delete(api::authors::delete_author),
        )
        .route("/api/authors/search", post(api::authors::search_authors))
        .route(
            "/api/tags",
            get(api::tags::list_tags).post(api::tags::create_tag),
        )
        .route(
            "/api/tags/:id",
            get(api::tags::get_tag)
                .put(api::tags::update_tag)
                .delete(api::tags::delete_tag),
        )
        .route("/api/tags/:id/works", get(api::tags::tag_works))
        .route("/api/tags/search", post(api::tags::search_tags))
        .route(
            "/api/locations",
            get(api::locations::list_locations).post(api::locations::create_location),
        )
        .route(
            "/api/locations/:id",
            get(api::locations::get_location)
                .put(api::locations::update_location)
                .delete(api::locations::delete_location),
        )
        .route(
            "/api/users",
            get(api::users::list_users).post(api::users::create_user),
        )
        .route(
            "/api/users/:id",
            get(api::users::get_user)
                .put(api::users::update_user)
                .delete(api::users::delete_user),
        )
        .route("/api/search", get(api::search::search_catalogue))
        .merge(api::health::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
