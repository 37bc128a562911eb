//! Authorization rules for post mutation.

use uuid::Uuid;

use crate::domain::Post;

/// Whether `identity` may update or delete `post`: only its author can.
pub fn can_modify(identity: Uuid, post: &Post) -> bool {
    identity == post.author_id
}
