//! Application state - shared across all handlers.

use std::sync::Arc;

use scribe_core::BlogService;
use scribe_core::ports::{
    PasswordService, PostRepository, RenderError, TemplateRenderer, TokenService, UserRepository,
};
use scribe_infra::{
    Argon2PasswordService, InMemoryPostRepository, InMemoryUserRepository, JwtConfig,
    JwtTokenService, LiquidRenderer,
};

#[cfg(feature = "postgres")]
use scribe_infra::database::{PostgresPostRepository, PostgresUserRepository, connect};

use crate::config::AppConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub blog: Arc<BlogService>,
    pub users: Arc<dyn UserRepository>,
    pub tokens: Arc<dyn TokenService>,
    pub passwords: Arc<dyn PasswordService>,
    pub templates: Arc<dyn TemplateRenderer>,
    /// Which store backs the repositories ("postgres" or "memory").
    pub storage: &'static str,
    pub secure_cookies: bool,
}

type Repositories = (Arc<dyn PostRepository>, Arc<dyn UserRepository>, &'static str);

fn in_memory() -> Repositories {
    (
        Arc::new(InMemoryPostRepository::new()),
        Arc::new(InMemoryUserRepository::new()),
        "memory",
    )
}

impl AppState {
    /// Build the application state with appropriate implementations.
    pub async fn new(config: &AppConfig) -> Result<Self, RenderError> {
        #[cfg(feature = "postgres")]
        let (posts, users, storage) = match &config.database {
            Some(db_config) => match connect(db_config).await {
                Ok(conn) => {
                    let posts: Arc<dyn PostRepository> =
                        Arc::new(PostgresPostRepository::new(conn.clone()));
                    let users: Arc<dyn UserRepository> =
                        Arc::new(PostgresUserRepository::new(conn));
                    (posts, users, "postgres")
                }
                Err(e) => {
                    tracing::error!(
                        "Failed to connect to database: {}. Using in-memory fallback.",
                        e
                    );
                    in_memory()
                }
            },
            None => {
                tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
                in_memory()
            }
        };

        #[cfg(not(feature = "postgres"))]
        let (posts, users, storage) = {
            tracing::info!("Running without postgres feature - using in-memory repositories");
            in_memory()
        };

        let state = Self::from_parts(
            posts,
            users,
            storage,
            config.jwt.clone(),
            config.secure_cookies,
        )?;
        tracing::info!(storage, "Application state initialized");
        Ok(state)
    }

    pub fn from_parts(
        posts: Arc<dyn PostRepository>,
        users: Arc<dyn UserRepository>,
        storage: &'static str,
        jwt: JwtConfig,
        secure_cookies: bool,
    ) -> Result<Self, RenderError> {
        Ok(Self {
            blog: Arc::new(BlogService::new(posts, users.clone())),
            users,
            tokens: Arc::new(JwtTokenService::new(jwt)),
            passwords: Arc::new(Argon2PasswordService::new()),
            templates: Arc::new(LiquidRenderer::new()?),
            storage,
            secure_cookies,
        })
    }
}
