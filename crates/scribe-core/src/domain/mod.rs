//! Domain entities - the core business objects.

mod post;
mod user;

pub use post::{AuthoredPost, Post, PostInput, TITLE_MAX_LEN};
pub use user::{RegisterInput, USERNAME_MAX_LEN, User};
