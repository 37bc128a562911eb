//! Static pages.

use actix_web::{HttpResponse, web};

use crate::handlers::Page;
use crate::middleware::auth::OptionalIdentity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET /about
pub async fn about(state: web::Data<AppState>, viewer: OptionalIdentity) -> AppResult<HttpResponse> {
    Page::new("blog/about.html", viewer.username())
        .title("About")
        .render(&state)
}
