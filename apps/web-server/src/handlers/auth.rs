//! Account handlers: registration, login and logout.

use actix_web::cookie::{Cookie, SameSite, time::Duration};
use actix_web::http::{StatusCode, header};
use actix_web::{HttpResponse, web};
use serde::Deserialize;
use serde_json::json;

use scribe_core::DomainError;
use scribe_core::domain::{RegisterInput, User};
use scribe_core::error::RepoError;
use scribe_shared::dto::{LoginForm, RegisterForm};

use crate::handlers::{Page, redirect};
use crate::middleware::auth::{LOGIN_PATH, OptionalIdentity, SESSION_COOKIE};
use crate::middleware::error::AppResult;
use crate::state::AppState;

const BAD_CREDENTIALS: &str = "Please enter a correct username and password.";
const DUPLICATE_USERNAME: &str = "A user with that username already exists.";

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub next: Option<String>,
}

/// Only same-site paths are followed after login. Control characters would
/// make the `Location` header invalid.
fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(path)
            if path.starts_with('/')
                && !path.starts_with("//")
                && !path.starts_with("/\\")
                && !path.chars().any(char::is_control) =>
        {
            path
        }
        _ => "/",
    }
}

fn register_page(viewer: Option<&str>, username: &str, email: &str, error: Option<String>) -> Page {
    Page::new("users/register.html", viewer)
        .title("Register")
        .with("form", json!({ "username": username, "email": email }))
        .with("error", error)
}

fn login_page(next: &str, username: &str, error: Option<&str>) -> Page {
    Page::new("users/login.html", None)
        .title("Login")
        .with("next", next)
        .with("username", username)
        .with("error", error)
}

/// GET /register
pub async fn register_form(
    state: web::Data<AppState>,
    viewer: OptionalIdentity,
) -> AppResult<HttpResponse> {
    register_page(viewer.username(), "", "", None).render(&state)
}

/// POST /register
pub async fn register(
    state: web::Data<AppState>,
    form: web::Form<RegisterForm>,
) -> AppResult<HttpResponse> {
    let form = form.into_inner();
    let input = RegisterInput {
        username: form.username.trim().to_string(),
        email: form.email.trim().to_string(),
        password: form.password,
    };

    let mut rejection = match input.validate() {
        Ok(()) => None,
        Err(DomainError::Validation(msg)) => Some(msg),
        Err(e) => return Err(e.into()),
    };
    if rejection.is_none() && state.users.find_by_username(&input.username).await?.is_some() {
        rejection = Some(DUPLICATE_USERNAME.to_string());
    }
    if let Some(msg) = rejection {
        return register_page(None, &input.username, &input.email, Some(msg))
            .status(StatusCode::UNPROCESSABLE_ENTITY)
            .render(&state);
    }

    // Argon2 is CPU-bound; keep it off the async workers
    let passwords = state.passwords.clone();
    let password = input.password;
    let password_hash = web::block(move || passwords.hash(&password)).await??;

    let created = state
        .users
        .create(User::new(input.username.clone(), input.email.clone(), password_hash))
        .await;
    let user = match created {
        Ok(user) => user,
        // A concurrent registration took the name after the lookup above
        Err(RepoError::Constraint(_)) => {
            return register_page(
                None,
                &input.username,
                &input.email,
                Some(DUPLICATE_USERNAME.to_string()),
            )
            .status(StatusCode::UNPROCESSABLE_ENTITY)
            .render(&state);
        }
        Err(e) => return Err(e.into()),
    };
    tracing::info!(user_id = %user.id, "User registered");

    Ok(redirect(LOGIN_PATH))
}

/// GET /login
pub async fn login_form(
    state: web::Data<AppState>,
    query: web::Query<LoginQuery>,
) -> AppResult<HttpResponse> {
    let next = query.into_inner().next.unwrap_or_default();
    login_page(&next, "", None).render(&state)
}

/// POST /login
pub async fn login(
    state: web::Data<AppState>,
    form: web::Form<LoginForm>,
) -> AppResult<HttpResponse> {
    let form = form.into_inner();
    let username = form.username.trim();
    let next = form.next.as_deref().unwrap_or_default();

    let Some(user) = state.users.find_by_username(username).await? else {
        tracing::debug!(username, "Login for unknown user");
        return login_page(next, username, Some(BAD_CREDENTIALS))
            .status(StatusCode::UNAUTHORIZED)
            .render(&state);
    };

    let passwords = state.passwords.clone();
    let password = form.password.clone();
    let hash = user.password_hash.clone();
    let valid = web::block(move || passwords.verify(&password, &hash)).await??;
    if !valid {
        tracing::debug!(user_id = %user.id, "Login with wrong password");
        return login_page(next, username, Some(BAD_CREDENTIALS))
            .status(StatusCode::UNAUTHORIZED)
            .render(&state);
    }

    let token = state.tokens.generate_token(user.id, &user.username)?;
    let cookie = Cookie::build(SESSION_COOKIE, token)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.secure_cookies)
        .max_age(Duration::seconds(state.tokens.expiration_seconds()))
        .finish();
    tracing::info!(user_id = %user.id, "User logged in");

    Ok(HttpResponse::Found()
        .cookie(cookie)
        .insert_header((header::LOCATION, safe_next(form.next.as_deref())))
        .finish())
}

/// POST /logout
pub async fn logout() -> HttpResponse {
    let mut cookie = Cookie::build(SESSION_COOKIE, "").path("/").finish();
    cookie.make_removal();

    HttpResponse::Found()
        .cookie(cookie)
        .insert_header((header::LOCATION, "/"))
        .finish()
}
