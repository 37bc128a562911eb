//! Blog use cases, composed from the repository ports and the ownership policy.

use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use crate::domain::{AuthoredPost, Post, PostInput};
use crate::error::{DomainError, RepoError};
use crate::policy::can_modify;
use crate::ports::{PostRepository, UserRepository};

/// Shown in place of an author whose account no longer exists.
pub const DELETED_AUTHOR: &str = "[deleted]";

pub struct BlogService {
    posts: Arc<dyn PostRepository>,
    users: Arc<dyn UserRepository>,
}

impl BlogService {
    pub fn new(posts: Arc<dyn PostRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self { posts, users }
    }

    /// Every post, newest first, with author names resolved.
    pub async fn list_posts(&self) -> Result<Vec<AuthoredPost>, DomainError> {
        let posts = self.posts.list_recent().await?;

        let mut names: HashMap<Uuid, String> = HashMap::new();
        let mut feed = Vec::with_capacity(posts.len());
        for post in posts {
            let author_username = match names.get(&post.author_id) {
                Some(name) => name.clone(),
                None => {
                    let name = self.author_name(post.author_id).await?;
                    names.insert(post.author_id, name.clone());
                    name
                }
            };
            feed.push(AuthoredPost {
                post,
                author_username,
            });
        }

        Ok(feed)
    }

    pub async fn get_post(&self, id: Uuid) -> Result<AuthoredPost, DomainError> {
        let post = self.load(id).await?;
        let author_username = self.author_name(post.author_id).await?;
        Ok(AuthoredPost {
            post,
            author_username,
        })
    }

    /// Create a post owned by `author`. The author always comes from the
    /// authenticated caller; `PostInput` has no field that could override it.
    pub async fn create_post(&self, author: Uuid, input: PostInput) -> Result<Post, DomainError> {
        input.validate()?;
        let post = self.posts.create(Post::new(author, input)).await?;
        tracing::info!(post_id = %post.id, user_id = %author, "Post created");
        Ok(post)
    }

    /// Load a post that `actor` is about to modify.
    pub async fn editable_post(&self, actor: Uuid, id: Uuid) -> Result<Post, DomainError> {
        let post = self.load(id).await?;
        if !can_modify(actor, &post) {
            tracing::warn!(post_id = %id, user_id = %actor, "Rejected modification by non-author");
            return Err(DomainError::Forbidden);
        }
        Ok(post)
    }

    /// Replace title and content. `author_id` and `date_posted` are untouched.
    pub async fn update_post(
        &self,
        actor: Uuid,
        id: Uuid,
        input: PostInput,
    ) -> Result<Post, DomainError> {
        let mut post = self.editable_post(actor, id).await?;
        input.validate()?;
        post.apply(input);

        let post = self.posts.update(post).await.map_err(|e| match e {
            RepoError::NotFound => DomainError::post_not_found(id),
            other => other.into(),
        })?;
        tracing::info!(post_id = %id, user_id = %actor, "Post updated");
        Ok(post)
    }

    pub async fn delete_post(&self, actor: Uuid, id: Uuid) -> Result<(), DomainError> {
        self.editable_post(actor, id).await?;

        self.posts.delete(id).await.map_err(|e| match e {
            RepoError::NotFound => DomainError::post_not_found(id),
            other => other.into(),
        })?;
        tracing::info!(post_id = %id, user_id = %actor, "Post deleted");
        Ok(())
    }

    async fn load(&self, id: Uuid) -> Result<Post, DomainError> {
        self.posts
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::post_not_found(id))
    }

    async fn author_name(&self, author_id: Uuid) -> Result<String, DomainError> {
        Ok(self
            .users
            .find_by_id(author_id)
            .await?
            .map(|user| user.username)
            .unwrap_or_else(|| DELETED_AUTHOR.to_string()))
    }
}
