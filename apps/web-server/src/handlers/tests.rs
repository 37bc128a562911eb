//! End-to-end handler tests against in-memory storage.

use std::sync::Arc;

use actix_web::body::MessageBody;
use actix_web::cookie::Cookie;
use actix_web::dev::ServiceResponse;
use actix_web::http::{StatusCode, header};
use actix_web::{App, test, web};
use async_trait::async_trait;
use chrono::{TimeDelta, Utc};
use uuid::Uuid;

use scribe_core::domain::{Post, PostInput, User};
use scribe_core::error::RepoError;
use scribe_core::ports::{BaseRepository, PasswordService, PostRepository, UserRepository};
use scribe_infra::{InMemoryPostRepository, InMemoryUserRepository, JwtConfig};

use super::configure_routes;
use crate::middleware::auth::SESSION_COOKIE;
use crate::state::AppState;

struct Fixture {
    state: AppState,
    posts: Arc<InMemoryPostRepository>,
}

fn fixture() -> Fixture {
    let posts = Arc::new(InMemoryPostRepository::new());
    let users = Arc::new(InMemoryUserRepository::new());
    let state = AppState::from_parts(
        posts.clone(),
        users,
        "memory",
        JwtConfig::default(),
        false,
    )
    .unwrap();
    Fixture { state, posts }
}

/// Create a user and a session cookie for them.
async fn sign_up(state: &AppState, username: &str) -> (User, Cookie<'static>) {
    let user = state
        .users
        .create(User::new(
            username.to_string(),
            format!("{username}@example.com"),
            "unused".to_string(),
        ))
        .await
        .unwrap();
    let token = state
        .tokens
        .generate_token(user.id, &user.username)
        .unwrap();
    (user, Cookie::new(SESSION_COOKIE, token))
}

async fn seed_post(fx: &Fixture, author: Uuid, title: &str) -> Post {
    fx.posts
        .create(Post::new(author, PostInput::new(title, "Original content")))
        .await
        .unwrap()
}

fn location<B>(resp: &ServiceResponse<B>) -> &str {
    resp.headers()
        .get(header::LOCATION)
        .expect("redirect has a location")
        .to_str()
        .unwrap()
}

async fn body_text<B: MessageBody>(resp: ServiceResponse<B>) -> String {
    String::from_utf8(test::read_body(resp).await.to_vec()).unwrap()
}

macro_rules! init_app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($state.clone()))
                .configure(configure_routes),
        )
        .await
    };
}

#[actix_web::test]
async fn test_list_shows_newest_first() {
    let fx = fixture();
    let (alice, _) = sign_up(&fx.state, "alice").await;
    let now = Utc::now();
    for (hours_ago, title) in [(5, "Oldest entry"), (1, "Newest entry"), (3, "Middle entry")] {
        let mut post = Post::new(alice.id, PostInput::new(title, "body"));
        post.date_posted = now - TimeDelta::hours(hours_ago);
        fx.posts.create(post).await.unwrap();
    }
    let app = init_app!(fx.state);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_text(resp).await;
    let newest = body.find("Newest entry").unwrap();
    let middle = body.find("Middle entry").unwrap();
    let oldest = body.find("Oldest entry").unwrap();
    assert!(newest < middle && middle < oldest);
    assert!(body.contains("alice"));
}

#[actix_web::test]
async fn test_create_unauthenticated_redirects_to_login() {
    let fx = fixture();
    let app = init_app!(fx.state);

    let req = test::TestRequest::post()
        .uri("/post/new")
        .set_form(&[("title", "Sneaky"), ("content", "Body")])
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/login?next=%2Fpost%2Fnew");
    assert!(fx.posts.list_recent().await.unwrap().is_empty());
}

#[actix_web::test]
async fn test_create_form_requires_login() {
    let fx = fixture();
    let app = init_app!(fx.state);

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/post/new").to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert!(location(&resp).starts_with("/login"));
}

#[actix_web::test]
async fn test_create_sets_author_from_session() {
    let fx = fixture();
    let (alice, cookie) = sign_up(&fx.state, "alice").await;
    let (bob, _) = sign_up(&fx.state, "bob").await;
    let app = init_app!(fx.state);

    let bob_id = bob.id.to_string();
    let req = test::TestRequest::post()
        .uri("/post/new")
        .cookie(cookie)
        .set_form(&[
            ("title", "Hello"),
            ("content", "World"),
            ("author", bob_id.as_str()),
            ("author_id", bob_id.as_str()),
        ])
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    let posts = fx.posts.list_recent().await.unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].author_id, alice.id);
    assert_eq!(location(&resp), format!("/post/{}", posts[0].id));
}

#[actix_web::test]
async fn test_create_invalid_rerenders_form() {
    let fx = fixture();
    let (_, cookie) = sign_up(&fx.state, "alice").await;
    let app = init_app!(fx.state);

    let req = test::TestRequest::post()
        .uri("/post/new")
        .cookie(cookie)
        .set_form(&[("title", "   "), ("content", "World")])
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body_text(resp).await.contains("Title is required"));
    assert!(fx.posts.list_recent().await.unwrap().is_empty());
}

#[actix_web::test]
async fn test_detail_and_missing_post() {
    let fx = fixture();
    let (alice, _) = sign_up(&fx.state, "alice").await;
    let post = seed_post(&fx, alice.id, "Visible").await;
    let app = init_app!(fx.state);

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/post/{}", post.id))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_text(resp).await;
    assert!(body.contains("Visible"));
    assert!(!body.contains("/update\""));

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/post/{}", Uuid::new_v4()))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/post/not-a-uuid").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_detail_offers_actions_to_author_only() {
    let fx = fixture();
    let (alice, alice_cookie) = sign_up(&fx.state, "alice").await;
    let (_, bob_cookie) = sign_up(&fx.state, "bob").await;
    let post = seed_post(&fx, alice.id, "Mine").await;
    let app = init_app!(fx.state);
    let uri = format!("/post/{}", post.id);
    let update_link = format!("/post/{}/update", post.id);

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri(&uri).cookie(alice_cookie).to_request(),
    )
    .await;
    assert!(body_text(resp).await.contains(&update_link));

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri(&uri).cookie(bob_cookie).to_request(),
    )
    .await;
    assert!(!body_text(resp).await.contains(&update_link));
}

#[actix_web::test]
async fn test_update_by_other_user_is_forbidden() {
    let fx = fixture();
    let (alice, _) = sign_up(&fx.state, "alice").await;
    let (_, bob_cookie) = sign_up(&fx.state, "bob").await;
    let post = seed_post(&fx, alice.id, "T1").await;
    let app = init_app!(fx.state);

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/post/{}/update", post.id))
            .cookie(bob_cookie.clone())
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&format!("/post/{}/update", post.id))
            .cookie(bob_cookie)
            .set_form(&[("title", "T2"), ("content", "C2")])
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let stored = fx.posts.find_by_id(post.id).await.unwrap().unwrap();
    assert_eq!(stored, post);
}

#[actix_web::test]
async fn test_update_by_author_changes_title_and_content() {
    let fx = fixture();
    let (alice, cookie) = sign_up(&fx.state, "alice").await;
    let post = seed_post(&fx, alice.id, "T1").await;
    let app = init_app!(fx.state);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&format!("/post/{}/update", post.id))
            .cookie(cookie)
            .set_form(&[("title", "T2"), ("content", "C2")])
            .to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), format!("/post/{}", post.id));
    let stored = fx.posts.find_by_id(post.id).await.unwrap().unwrap();
    assert_eq!(stored.title, "T2");
    assert_eq!(stored.content, "C2");
    assert_eq!(stored.author_id, post.author_id);
    assert_eq!(stored.date_posted, post.date_posted);
}

#[actix_web::test]
async fn test_update_form_is_prefilled_for_author() {
    let fx = fixture();
    let (alice, cookie) = sign_up(&fx.state, "alice").await;
    let post = seed_post(&fx, alice.id, "Prefilled title").await;
    let app = init_app!(fx.state);

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/post/{}/update", post.id))
            .cookie(cookie)
            .to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_text(resp).await;
    assert!(body.contains("value=\"Prefilled title\""));
    assert!(body.contains("Original content"));
}

#[actix_web::test]
async fn test_delete_by_other_user_is_forbidden() {
    let fx = fixture();
    let (alice, _) = sign_up(&fx.state, "alice").await;
    let (_, bob_cookie) = sign_up(&fx.state, "bob").await;
    let post = seed_post(&fx, alice.id, "Keep me").await;
    let app = init_app!(fx.state);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&format!("/post/{}/delete", post.id))
            .cookie(bob_cookie)
            .to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert!(fx.posts.find_by_id(post.id).await.unwrap().is_some());
}

#[actix_web::test]
async fn test_delete_by_author_then_detail_is_not_found() {
    let fx = fixture();
    let (alice, cookie) = sign_up(&fx.state, "alice").await;
    let post = seed_post(&fx, alice.id, "Goodbye").await;
    let app = init_app!(fx.state);

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/post/{}/delete", post.id))
            .cookie(cookie.clone())
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_text(resp).await.contains("Are you sure"));

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&format!("/post/{}/delete", post.id))
            .cookie(cookie)
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/");

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/post/{}", post.id))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_about_page() {
    let fx = fixture();
    let app = init_app!(fx.state);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/about").to_request()).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_text(resp).await;
    assert!(body.contains("About Page"));
    assert!(body.contains("<title>Scribe - About</title>"));
}

#[actix_web::test]
async fn test_register_login_then_create() {
    let fx = fixture();
    let app = init_app!(fx.state);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/register")
            .set_form(&[
                ("username", "jane"),
                ("email", "jane@example.com"),
                ("password", "correct-horse"),
            ])
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/login");

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/login")
            .set_form(&[
                ("username", "jane"),
                ("password", "correct-horse"),
                ("next", "/post/new"),
            ])
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/post/new");
    let session = resp
        .response()
        .cookies()
        .find(|c| c.name() == SESSION_COOKIE)
        .expect("session cookie set")
        .into_owned();
    assert!(session.http_only().unwrap_or(false));

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/post/new")
            .cookie(session)
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_text(resp).await.contains("New Post"));
}

#[actix_web::test]
async fn test_register_duplicate_username() {
    let fx = fixture();
    sign_up(&fx.state, "jane").await;
    let app = init_app!(fx.state);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/register")
            .set_form(&[
                ("username", "jane"),
                ("email", "other@example.com"),
                ("password", "correct-horse"),
            ])
            .to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body_text(resp).await.contains("already exists"));
}

#[actix_web::test]
async fn test_login_rejects_bad_password_and_foreign_next() {
    let fx = fixture();
    let hash = fx.state.passwords.hash("correct-horse").unwrap();
    fx.state
        .users
        .create(User::new("jane".into(), "jane@example.com".into(), hash))
        .await
        .unwrap();
    let app = init_app!(fx.state);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/login")
            .set_form(&[("username", "jane"), ("password", "wrong-horse")])
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(body_text(resp).await.contains("correct username and password"));

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/login")
            .set_form(&[
                ("username", "jane"),
                ("password", "correct-horse"),
                ("next", "//evil.example/"),
            ])
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/");
}

#[actix_web::test]
async fn test_login_ignores_next_with_control_characters() {
    let fx = fixture();
    let hash = fx.state.passwords.hash("correct-horse").unwrap();
    fx.state
        .users
        .create(User::new("jane".into(), "jane@example.com".into(), hash))
        .await
        .unwrap();
    let app = init_app!(fx.state);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/login")
            .set_form(&[
                ("username", "jane"),
                ("password", "correct-horse"),
                ("next", "/\r\nSet-Cookie: x=1"),
            ])
            .to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/");
    assert!(resp.response().cookies().any(|c| c.name() == SESSION_COOKIE));
}

/// Misses every lookup, as if another registration commits between the
/// username check and the insert.
#[derive(Default)]
struct LateUsers(InMemoryUserRepository);

#[async_trait]
impl BaseRepository<User, Uuid> for LateUsers {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        self.0.find_by_id(id).await
    }

    async fn create(&self, user: User) -> Result<User, RepoError> {
        self.0.create(user).await
    }

    async fn update(&self, user: User) -> Result<User, RepoError> {
        self.0.update(user).await
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        BaseRepository::<User, Uuid>::delete(&self.0, id).await
    }
}

#[async_trait]
impl UserRepository for LateUsers {
    async fn find_by_username(&self, _username: &str) -> Result<Option<User>, RepoError> {
        Ok(None)
    }
}

#[actix_web::test]
async fn test_register_username_taken_concurrently_rerenders_form() {
    let users = Arc::new(LateUsers::default());
    let state = AppState::from_parts(
        Arc::new(InMemoryPostRepository::new()),
        users.clone(),
        "memory",
        JwtConfig::default(),
        false,
    )
    .unwrap();
    users
        .create(User::new("jane".into(), "jane@example.com".into(), "h".into()))
        .await
        .unwrap();
    let app = init_app!(state);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/register")
            .set_form(&[
                ("username", "jane"),
                ("email", "other@example.com"),
                ("password", "long-enough-pw"),
            ])
            .to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_text(resp).await;
    assert!(body.contains("already exists"));
    assert!(body.contains("other@example.com"));
}

#[actix_web::test]
async fn test_logout_clears_session() {
    let fx = fixture();
    let app = init_app!(fx.state);

    let resp = test::call_service(&app, test::TestRequest::post().uri("/logout").to_request()).await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    let cookie = resp
        .response()
        .cookies()
        .find(|c| c.name() == SESSION_COOKIE)
        .expect("removal cookie");
    assert_eq!(cookie.value(), "");
}

#[actix_web::test]
async fn test_bearer_token_authenticates() {
    let fx = fixture();
    let (_, cookie) = sign_up(&fx.state, "alice").await;
    let app = init_app!(fx.state);

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/post/new")
            .insert_header((header::AUTHORIZATION, format!("Bearer {}", cookie.value())))
            .to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_health_reports_storage() {
    let fx = fixture();
    let app = init_app!(fx.state);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/api/health").to_request()).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["storage"], "memory");
}
