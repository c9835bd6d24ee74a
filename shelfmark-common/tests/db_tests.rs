//! Tests for database initialization and the snapshot queries feeding the
//! matcher and the aggregator

use shelfmark_common::db::init::{create_schema, init_database};
use shelfmark_common::db::queries::{
    author_candidates, location_nodes, tag_candidates, tag_nodes,
};
use shelfmark_common::hierarchy::{collect_attached, count_attached};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

/// In-memory database with the full schema; single connection so every
/// statement sees the same memory database
async fn setup_test_db() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Should connect to in-memory database");

    create_schema(&pool).await.expect("Should create schema");
    pool
}

#[tokio::test]
async fn test_database_creation_when_missing() {
    let dir = tempfile::tempdir().expect("Should create temp dir");
    let db_path = dir.path().join("shelfmark.db");

    let result = init_database(&db_path).await;
    assert!(result.is_ok(), "Database initialization failed: {:?}", result.err());
    assert!(db_path.exists(), "Database file was not created");
}

#[tokio::test]
async fn test_database_opens_existing() {
    let dir = tempfile::tempdir().expect("Should create temp dir");
    let db_path = dir.path().join("shelfmark.db");

    let pool1 = init_database(&db_path).await;
    assert!(pool1.is_ok());
    drop(pool1);

    let pool2 = init_database(&db_path).await;
    assert!(pool2.is_ok(), "Failed to open existing database: {:?}", pool2.err());
}

#[tokio::test]
async fn test_default_settings_initialized() {
    let dir = tempfile::tempdir().expect("Should create temp dir");
    let db_path = dir.path().join("shelfmark.db");

    let pool = init_database(&db_path).await.expect("Should initialize");

    let port: String = sqlx::query_scalar("SELECT value FROM settings WHERE key = 'listen_port'")
        .fetch_one(&pool)
        .await
        .expect("listen_port setting should exist");
    assert_eq!(port, "5780");
}

#[tokio::test]
async fn test_author_candidates_group_alternate_names() {
    let pool = setup_test_db().await;

    sqlx::query("INSERT INTO authors (primary_name, bio) VALUES ('Eric Arthur Blair', NULL)")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query("INSERT INTO authors (primary_name, bio) VALUES ('J.R.R. Tolkien', NULL)")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query("INSERT INTO author_names (author_id, alt_name) VALUES (1, 'George Orwell')")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query("INSERT INTO author_names (author_id, alt_name) VALUES (1, 'Orwell')")
        .execute(&pool)
        .await
        .unwrap();
    // NULL alternate rows are tolerated and skipped
    sqlx::query("INSERT INTO author_names (author_id, alt_name) VALUES (2, NULL)")
        .execute(&pool)
        .await
        .unwrap();

    let candidates = author_candidates(&pool).await.unwrap();

    assert_eq!(candidates.len(), 2);
    assert_eq!(candidates[0].author.primary_name, "Eric Arthur Blair");
    assert_eq!(candidates[0].alt_names, vec!["George Orwell", "Orwell"]);
    assert_eq!(candidates[1].author.primary_name, "J.R.R. Tolkien");
    assert!(candidates[1].alt_names.is_empty());
}

#[tokio::test]
async fn test_tag_candidates_in_id_order() {
    let pool = setup_test_db().await;

    sqlx::query("INSERT INTO tags (type, label) VALUES ('genre', 'Fantasy')")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query("INSERT INTO tags (type, label) VALUES ('genre', 'Science Fiction')")
        .execute(&pool)
        .await
        .unwrap();

    let candidates = tag_candidates(&pool).await.unwrap();

    assert_eq!(candidates.len(), 2);
    assert_eq!(candidates[0].label, "Fantasy");
    assert_eq!(candidates[1].label, "Science Fiction");
    assert_eq!(candidates[1].tag_type, "genre");
}

#[tokio::test]
async fn test_location_nodes_feed_the_aggregator() {
    let pool = setup_test_db().await;

    sqlx::query("INSERT INTO locations (parent_id, name, type) VALUES (NULL, 'Office', 'room')")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query("INSERT INTO locations (parent_id, name, type) VALUES (1, 'Bookcase', 'shelf')")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query("INSERT INTO locations (parent_id, name, type) VALUES (2, 'Top shelf', 'shelf')")
        .execute(&pool)
        .await
        .unwrap();

    sqlx::query("INSERT INTO works (title) VALUES ('The Hobbit')")
        .execute(&pool)
        .await
        .unwrap();

    // One copy at each level of the chain
    for location_id in 1..=3 {
        sqlx::query("INSERT INTO copies (work_id, location_id) VALUES (1, ?)")
            .bind(location_id)
            .execute(&pool)
            .await
            .unwrap();
    }

    let nodes = location_nodes(&pool).await.unwrap();
    assert_eq!(nodes.len(), 3);

    assert_eq!(count_attached(&nodes[0], &nodes).unwrap(), 3);
    assert_eq!(count_attached(&nodes[1], &nodes).unwrap(), 2);
    assert_eq!(count_attached(&nodes[2], &nodes).unwrap(), 1);

    let copies = collect_attached(&nodes[0], &nodes).unwrap();
    assert_eq!(copies.len(), 3);
    assert_eq!(copies[0].work_title, "The Hobbit");
}

#[tokio::test]
async fn test_tag_nodes_feed_the_aggregator() {
    let pool = setup_test_db().await;

    sqlx::query("INSERT INTO tags (parent_id, type, label) VALUES (NULL, 'genre', 'Fiction')")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query("INSERT INTO tags (parent_id, type, label) VALUES (1, 'genre', 'Fantasy')")
        .execute(&pool)
        .await
        .unwrap();

    sqlx::query("INSERT INTO works (title) VALUES ('The Hobbit')")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query("INSERT INTO works (title) VALUES ('Middlemarch')")
        .execute(&pool)
        .await
        .unwrap();

    sqlx::query("INSERT INTO works_tags (work_id, tag_id) VALUES (1, 2)")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query("INSERT INTO works_tags (work_id, tag_id) VALUES (2, 1)")
        .execute(&pool)
        .await
        .unwrap();

    let nodes = tag_nodes(&pool).await.unwrap();
    assert_eq!(nodes.len(), 2);

    // "Fiction" aggregates its own work plus the "Fantasy" subtree
    assert_eq!(count_attached(&nodes[0], &nodes).unwrap(), 2);
    assert_eq!(count_attached(&nodes[1], &nodes).unwrap(), 1);

    let works = collect_attached(&nodes[0], &nodes).unwrap();
    let titles: Vec<&str> = works.iter().map(|w| w.title.as_str()).collect();
    assert_eq!(titles, vec!["Middlemarch", "The Hobbit"]);
}
