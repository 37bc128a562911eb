//! HTTP handlers and route configuration.

mod auth;
mod health;
mod pages;
mod posts;

#[cfg(test)]
mod tests;

use actix_web::http::{StatusCode, header};
use actix_web::{HttpResponse, web};
use serde_json::{Map, Value};

use crate::middleware::error::AppResult;
use crate::state::AppState;

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(posts::list))
        .route("/about", web::get().to(pages::about))
        // Registered before `/post/{id}` so "new" is never parsed as an id
        .service(
            web::resource("/post/new")
                .route(web::get().to(posts::create_form))
                .route(web::post().to(posts::create)),
        )
        .route("/post/{id}", web::get().to(posts::detail))
        .service(
            web::resource("/post/{id}/update")
                .route(web::get().to(posts::update_form))
                .route(web::post().to(posts::update)),
        )
        .service(
            web::resource("/post/{id}/delete")
                .route(web::get().to(posts::delete_confirm))
                .route(web::post().to(posts::delete)),
        )
        // Accounts
        .service(
            web::resource("/register")
                .route(web::get().to(auth::register_form))
                .route(web::post().to(auth::register)),
        )
        .service(
            web::resource("/login")
                .route(web::get().to(auth::login_form))
                .route(web::post().to(auth::login)),
        )
        .route("/logout", web::post().to(auth::logout))
        .service(web::scope("/api").route("/health", web::get().to(health::health_check)));
}

/// A template plus the context it is rendered with.
///
/// Every page gets `user` and `title`, which the layout reads.
pub(crate) struct Page {
    template: &'static str,
    status: StatusCode,
    context: Map<String, Value>,
}

impl Page {
    pub(crate) fn new(template: &'static str, viewer: Option<&str>) -> Self {
        let mut context = Map::new();
        context.insert("user".to_string(), viewer.into());
        context.insert("title".to_string(), Value::Null);
        Self {
            template,
            status: StatusCode::OK,
            context,
        }
    }

    pub(crate) fn title(self, title: impl Into<String>) -> Self {
        let title: String = title.into();
        self.with("title", title)
    }

    pub(crate) fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.context.insert(key.to_string(), value.into());
        self
    }

    pub(crate) fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub(crate) fn render(self, state: &AppState) -> AppResult<HttpResponse> {
        let html = state
            .templates
            .render(self.template, &Value::Object(self.context))?;

        Ok(HttpResponse::build(self.status)
            .content_type("text/html; charset=utf-8")
            .body(html))
    }
}

/// `302 Found` to `location`.
pub(crate) fn redirect(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location))
        .finish()
}
