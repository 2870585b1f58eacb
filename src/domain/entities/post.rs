use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;
use validator::Validate;

use crate::{entities::form_fields::FormFields, errors::AppError};

const MAX_TITLE_LENGTH: u64 = 200;

pub const POST_REQUIRED_FIELDS: [&str; 2] = ["title", "content"];

// ───── Database Models ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PostInsert {
    pub title: String,
    pub content: String,
    pub image_url: Option<String>,
}

/// Full replacement row written by an update.
#[derive(Debug, Clone, PartialEq)]
pub struct PostUpdate {
    pub title: String,
    pub content: String,
    pub image_url: Option<String>,
}

// ───── Input & Validation Requests ──────────────────────────────────

#[derive(Debug, Clone, Validate)]
pub struct NewPost {
    #[validate(length(min = 1, max = MAX_TITLE_LENGTH, message = "Title must be 1-200 characters"))]
    pub title: String,

    #[validate(length(min = 1, message = "Content cannot be empty"))]
    pub content: String,
}

impl NewPost {
    pub fn from_fields(mut fields: FormFields) -> Result<Self, AppError> {
        fields.require(&POST_REQUIRED_FIELDS)?;

        let post = NewPost {
            title: fields.take_non_blank("title").unwrap_or_default(),
            content: fields.take_non_blank("content").unwrap_or_default(),
        };
        post.validate()?;
        Ok(post)
    }

    pub fn into_insert(self, image_url: Option<String>) -> PostInsert {
        PostInsert {
            title: self.title,
            content: self.content,
            image_url,
        }
    }
}

/// Fields supplied to an update; `None` keeps the stored value.
#[derive(Debug, Clone, Default, Validate)]
pub struct PostChanges {
    #[validate(length(min = 1, max = MAX_TITLE_LENGTH, message = "Title must be 1-200 characters"))]
    pub title: Option<String>,

    pub content: Option<String>,
}

impl PostChanges {
    pub fn from_fields(mut fields: FormFields) -> Result<Self, AppError> {
        fields.reject_blank(&POST_REQUIRED_FIELDS)?;

        let changes = PostChanges {
            title: fields.take_non_blank("title"),
            content: fields.take_non_blank("content"),
        };
        changes.validate()?;
        Ok(changes)
    }

    pub fn merge_over(self, existing: &Post, image_url: Option<String>) -> PostUpdate {
        PostUpdate {
            title: self.title.unwrap_or_else(|| existing.title.clone()),
            content: self.content.unwrap_or_else(|| existing.content.clone()),
            image_url,
        }
    }
}
