//! Post pages: feed, detail, and the author-only create/update/delete forms.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, web};
use serde_json::{Value, json};
use uuid::Uuid;

use scribe_core::domain::{AuthoredPost, Post, PostInput, TITLE_MAX_LEN};
use scribe_core::{DomainError, can_modify};
use scribe_shared::dto::PostForm;

use crate::handlers::{Page, redirect};
use crate::middleware::auth::{Identity, OptionalIdentity};
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// e.g. "August 27, 2018"
const DATE_FORMAT: &str = "%B %d, %Y";

fn post_view(authored: &AuthoredPost) -> Value {
    let post = &authored.post;
    json!({
        "id": post.id.to_string(),
        "title": post.title,
        "content": post.content,
        "author": authored.author_username,
        "date_posted": post.date_posted.format(DATE_FORMAT).to_string(),
    })
}

fn detail_path(id: Uuid) -> String {
    format!("/post/{}", id)
}

fn post_form_page(
    identity: &Identity,
    action: String,
    legend: &str,
    form: &PostForm,
    error: Option<String>,
) -> Page {
    Page::new("blog/post_form.html", Some(identity.username.as_str()))
        .title(legend)
        .with("action", action)
        .with("legend", legend)
        .with("title_max_len", TITLE_MAX_LEN)
        .with(
            "form",
            json!({ "title": form.title, "content": form.content }),
        )
        .with("error", error)
}

fn to_input(form: PostForm) -> PostInput {
    PostInput::new(form.title, form.content)
}

/// GET /
pub async fn list(state: web::Data<AppState>, viewer: OptionalIdentity) -> AppResult<HttpResponse> {
    let posts = state.blog.list_posts().await?;
    let views: Vec<Value> = posts.iter().map(post_view).collect();

    Page::new("blog/home.html", viewer.username())
        .with("posts", views)
        .render(&state)
}

/// GET /post/{id}
pub async fn detail(
    state: web::Data<AppState>,
    viewer: OptionalIdentity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let authored = state.blog.get_post(path.into_inner()).await?;
    let owner = viewer
        .0
        .as_ref()
        .is_some_and(|identity| can_modify(identity.user_id, &authored.post));

    Page::new("blog/post_detail.html", viewer.username())
        .title(authored.post.title.clone())
        .with("post", post_view(&authored))
        .with("can_modify", owner)
        .render(&state)
}

/// GET /post/new
pub async fn create_form(
    state: web::Data<AppState>,
    identity: Identity,
) -> AppResult<HttpResponse> {
    post_form_page(
        &identity,
        "/post/new".to_string(),
        "New Post",
        &PostForm::default(),
        None,
    )
    .render(&state)
}

/// POST /post/new
pub async fn create(
    state: web::Data<AppState>,
    identity: Identity,
    form: web::Form<PostForm>,
) -> AppResult<HttpResponse> {
    let form = form.into_inner();

    match state
        .blog
        .create_post(identity.user_id, to_input(form.clone()))
        .await
    {
        Ok(post) => Ok(redirect(&detail_path(post.id))),
        Err(DomainError::Validation(msg)) => post_form_page(
            &identity,
            "/post/new".to_string(),
            "New Post",
            &form,
            Some(msg),
        )
        .status(StatusCode::UNPROCESSABLE_ENTITY)
        .render(&state),
        Err(e) => Err(e.into()),
    }
}

/// GET /post/{id}/update
pub async fn update_form(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post: Post = state
        .blog
        .editable_post(identity.user_id, path.into_inner())
        .await?;
    let form = PostForm {
        title: post.title,
        content: post.content,
    };

    post_form_page(
        &identity,
        format!("/post/{}/update", post.id),
        "Update Post",
        &form,
        None,
    )
    .render(&state)
}

/// POST /post/{id}/update
pub async fn update(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    form: web::Form<PostForm>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let form = form.into_inner();

    match state
        .blog
        .update_post(identity.user_id, id, to_input(form.clone()))
        .await
    {
        Ok(post) => Ok(redirect(&detail_path(post.id))),
        Err(DomainError::Validation(msg)) => post_form_page(
            &identity,
            format!("/post/{}/update", id),
            "Update Post",
            &form,
            Some(msg),
        )
        .status(StatusCode::UNPROCESSABLE_ENTITY)
        .render(&state),
        Err(e) => Err(e.into()),
    }
}

/// GET /post/{id}/delete
pub async fn delete_confirm(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post = state
        .blog
        .editable_post(identity.user_id, path.into_inner())
        .await?;

    Page::new("blog/post_confirm_delete.html", Some(identity.username.as_str()))
        .title("Delete Post")
        .with(
            "post",
            json!({ "id": post.id.to_string(), "title": post.title }),
        )
        .render(&state)
}

/// POST /post/{id}/delete
pub async fn delete(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    state
        .blog
        .delete_post(identity.user_id, path.into_inner())
        .await?;

    Ok(redirect("/"))
}
