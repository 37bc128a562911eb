use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Longest title accepted, in characters.
pub const TITLE_MAX_LEN: usize = 100;

/// Post entity - a single blog entry.
///
/// `author_id` and `date_posted` are fixed at construction; the only
/// mutation path is [`Post::apply`], which touches title and content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub content: String,
    pub date_posted: DateTime<Utc>,
}

impl Post {
    /// Create a new post owned by `author_id`, stamped with the current time.
    pub fn new(author_id: Uuid, input: PostInput) -> Self {
        let input = input.normalized();
        Self {
            id: Uuid::new_v4(),
            author_id,
            title: input.title,
            content: input.content,
            date_posted: Utc::now(),
        }
    }

    /// Replace the client-editable fields.
    pub fn apply(&mut self, input: PostInput) {
        let input = input.normalized();
        self.title = input.title;
        self.content = input.content;
    }
}

/// The fields a client may set on a post. Nothing else is representable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostInput {
    pub title: String,
    pub content: String,
}

impl PostInput {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(DomainError::Validation("Title is required".to_string()));
        }
        if title.chars().count() > TITLE_MAX_LEN {
            return Err(DomainError::Validation(format!(
                "Title must be at most {} characters",
                TITLE_MAX_LEN
            )));
        }
        if self.content.trim().is_empty() {
            return Err(DomainError::Validation("Content is required".to_string()));
        }
        Ok(())
    }

    fn normalized(self) -> Self {
        Self {
            title: self.title.trim().to_string(),
            content: self.content.trim().to_string(),
        }
    }
}

/// A post joined with its author's display name.
#[derive(Debug, Clone, Serialize)]
pub struct AuthoredPost {
    pub post: Post,
    pub author_username: String,
}
