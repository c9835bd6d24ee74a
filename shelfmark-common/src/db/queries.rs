//! Materialized snapshots consumed by the core algorithms
//!
//! The matcher and the aggregator are pure functions over in-memory
//! collections; these queries load those collections. Each call materializes
//! the snapshot up front, so the algorithms themselves never touch the pool
//! and callers on concurrent request handlers need no extra locking.

use std::collections::HashMap;

use serde::Serialize;
use sqlx::SqlitePool;

use crate::db::models::{Author, Location, Tag};
use crate::hierarchy::TreeNode;
use crate::matching::Matchable;
use crate::Result;

/// Author snapshot for duplicate detection: the row plus any alternate names
#[derive(Debug, Clone)]
pub struct AuthorCandidate {
    pub author: Author,
    pub alt_names: Vec<String>,
}

impl Matchable for AuthorCandidate {
    fn match_id(&self) -> i64 {
        self.author.id
    }

    fn primary_label(&self) -> &str {
        &self.author.primary_name
    }

    fn alternate_labels(&self) -> &[String] {
        &self.alt_names
    }
}

/// Tags carry no alternate labels; the row itself is the candidate
impl Matchable for Tag {
    fn match_id(&self) -> i64 {
        self.id
    }

    fn primary_label(&self) -> &str {
        &self.label
    }

    fn alternate_labels(&self) -> &[String] {
        &[]
    }
}

/// One copy as seen from a location subtree
#[derive(Debug, Clone, Serialize)]
pub struct CopyRef {
    pub id: i64,
    pub work_id: i64,
    pub work_title: String,
}

/// Location snapshot for subtree aggregation: the row plus the copies
/// shelved directly at it
#[derive(Debug, Clone)]
pub struct LocationNode {
    pub location: Location,
    pub copies: Vec<CopyRef>,
}

impl TreeNode for LocationNode {
    type Item = CopyRef;

    fn node_id(&self) -> i64 {
        self.location.id
    }

    fn parent_id(&self) -> Option<i64> {
        self.location.parent_id
    }

    fn attached(&self) -> &[CopyRef] {
        &self.copies
    }
}

/// One work as seen from a tag subtree
#[derive(Debug, Clone, Serialize)]
pub struct WorkRef {
    pub id: i64,
    pub title: String,
}

/// Tag snapshot for subtree aggregation: the row plus the works tagged
/// directly with it
#[derive(Debug, Clone)]
pub struct TagNode {
    pub tag: Tag,
    pub works: Vec<WorkRef>,
}

impl TreeNode for TagNode {
    type Item = WorkRef;

    fn node_id(&self) -> i64 {
        self.tag.id
    }

    fn parent_id(&self) -> Option<i64> {
        self.tag.parent_id
    }

    fn attached(&self) -> &[WorkRef] {
        &self.works
    }
}

/// All authors with their alternate names, in id order
pub async fn author_candidates(pool: &SqlitePool) -> Result<Vec<AuthorCandidate>> {
    let authors: Vec<Author> =
        sqlx::query_as("SELECT id, primary_name, bio FROM authors ORDER BY id ASC")
            .fetch_all(pool)
            .await?;

    let alt_rows: Vec<(i64, Option<String>)> =
        sqlx::query_as("SELECT author_id, alt_name FROM author_names ORDER BY author_id ASC, id ASC")
            .fetch_all(pool)
            .await?;

    let mut alt_names: HashMap<i64, Vec<String>> = HashMap::new();
    for (author_id, alt_name) in alt_rows {
        if let Some(alt) = alt_name {
            alt_names.entry(author_id).or_default().push(alt);
        }
    }

    Ok(authors
        .into_iter()
        .map(|author| AuthorCandidate {
            alt_names: alt_names.remove(&author.id).unwrap_or_default(),
            author,
        })
        .collect())
}

/// All tags, in id order
pub async fn tag_candidates(pool: &SqlitePool) -> Result<Vec<Tag>> {
    let tags = sqlx::query_as(
        "SELECT id, parent_id, type, label, description FROM tags ORDER BY id ASC",
    )
    .fetch_all(pool)
    .await?;

    Ok(tags)
}

/// All locations with their directly-shelved copies, in id order
pub async fn location_nodes(pool: &SqlitePool) -> Result<Vec<LocationNode>> {
    let locations: Vec<Location> = sqlx::query_as(
        "SELECT id, parent_id, name, description, type FROM locations ORDER BY id ASC",
    )
    .fetch_all(pool)
    .await?;

    let copies: Vec<(i64, i64, i64, String)> = sqlx::query_as(
        r#"
        SELECT c.id, c.location_id, c.work_id, w.title
        FROM copies c
        JOIN works w ON w.id = c.work_id
        ORDER BY c.id ASC
        "#,
    )
    .fetch_all(pool)
    .await?;

    let mut by_location: HashMap<i64, Vec<CopyRef>> = HashMap::new();
    for (id, location_id, work_id, work_title) in copies {
        by_location.entry(location_id).or_default().push(CopyRef {
            id,
            work_id,
            work_title,
        });
    }

    Ok(locations
        .into_iter()
        .map(|location| LocationNode {
            copies: by_location.remove(&location.id).unwrap_or_default(),
            location,
        })
        .collect())
}

/// All tags with their directly-tagged works, in id order
pub async fn tag_nodes(pool: &SqlitePool) -> Result<Vec<TagNode>> {
    let tags: Vec<Tag> = sqlx::query_as(
        "SELECT id, parent_id, type, label, description FROM tags ORDER BY id ASC",
    )
    .fetch_all(pool)
    .await?;

    let works: Vec<(i64, i64, String)> = sqlx::query_as(
        r#"
        SELECT wt.tag_id, w.id, w.title
        FROM works_tags wt
        JOIN works w ON w.id = wt.work_id
        ORDER BY w.id ASC
        "#,
    )
    .fetch_all(pool)
    .await?;

    let mut by_tag: HashMap<i64, Vec<WorkRef>> = HashMap::new();
    for (tag_id, id, title) in works {
        by_tag.entry(tag_id).or_default().push(WorkRef { id, title });
    }

    Ok(tags
        .into_iter()
        .map(|tag| TagNode {
            works: by_tag.remove(&tag.id).unwrap_or_default(),
            tag,
        })
        .collect())
}
