//! Form payloads accepted by the server.
//!
//! Each struct lists exactly the fields a client may submit. Unknown fields
//! are dropped during deserialization, so server-owned values such as a
//! post's author can never be supplied through a form.

use serde::{Deserialize, Serialize};

/// Create/update post form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostForm {
    pub title: String,
    pub content: String,
}

/// Login form. `next` is where to go after a successful login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub next: Option<String>,
}

/// Registration form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub password: String,
}
