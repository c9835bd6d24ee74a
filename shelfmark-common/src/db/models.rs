//! Database models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Work {
    pub id: i64,
    pub title: String,
    pub publisher: Option<String>,
    pub isbn: Option<i64>,
    pub description: Option<String>,
    pub cover_url: Option<String>,
}

/// A physical copy of a work, shelved at one location
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Copy {
    pub id: i64,
    pub work_id: i64,
    pub location_id: i64,
    pub owner_id: Option<i64>,
    pub condition: Option<String>,
    pub acquired: DateTime<Utc>,
    pub lended_to: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Author {
    pub id: i64,
    pub primary_name: String,
    pub bio: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Tag {
    pub id: i64,
    pub parent_id: Option<i64>,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub tag_type: String,
    pub label: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Location {
    pub id: i64,
    pub parent_id: Option<i64>,
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub location_type: String,
}

/// Role levels; the gaps leave room for intermediate roles
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserRole {
    Viewer = 1,
    Editor = 4,
    Admin = 7,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
    pub info: Option<String>,
    pub join_date: DateTime<Utc>,
    pub permissions: i64,
}

impl User {
    pub fn is_viewer(&self) -> bool {
        self.permissions >= UserRole::Viewer as i64
    }

    pub fn is_editor(&self) -> bool {
        self.permissions >= UserRole::Editor as i64
    }

    pub fn is_admin(&self) -> bool {
        self.permissions >= UserRole::Admin as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_with_permissions(permissions: i64) -> User {
        User {
            id: 1,
            name: "test".to_string(),
            email: None,
            info: None,
            join_date: Utc::now(),
            permissions,
        }
    }

    #[test]
    fn test_role_thresholds() {
        let viewer = user_with_permissions(1);
        assert!(viewer.is_viewer());
        assert!(!viewer.is_editor());
        assert!(!viewer.is_admin());

        let editor = user_with_permissions(4);
        assert!(editor.is_viewer());
        assert!(editor.is_editor());
        assert!(!editor.is_admin());

        let admin = user_with_permissions(7);
        assert!(admin.is_viewer());
        assert!(admin.is_editor());
        assert!(admin.is_admin());
    }
}
