//! JSON REST API for Socialize.
//!
//! Exposes an axum [`Router`] backed by any [`SocialStore`]. Sessions are
//! stateless JWTs; see [`auth`].

pub mod auth;
pub mod error;
pub mod handlers;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{get, patch, post},
};
use serde::Deserialize;
use socialize_core::store::SocialStore;
use tower_http::trace::TraceLayer;

pub use error::ApiError;

use auth::SessionKeys;
use handlers::{comments, notifications, posts, users};

// ─── Configuration ────────────────────────────────────────────────────────────

fn default_session_ttl() -> u64 { 7 * 24 * 60 * 60 }

/// Runtime server configuration, deserialised from `config.toml` and
/// `SOCIALIZE_*` environment variables.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:               String,
  pub port:               u16,
  pub store_path:         PathBuf,
  /// HS256 signing secret for session tokens.
  pub jwt_secret:         String,
  #[serde(default = "default_session_ttl")]
  pub session_ttl_secs:   u64,
  /// Mark the session cookie `Secure`. Enable behind TLS.
  #[serde(default)]
  pub secure_cookies:     bool,
  /// Repair cached counters before accepting requests.
  #[serde(default)]
  pub recount_on_startup: bool,
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S> {
  pub store:    Arc<S>,
  pub config:   Arc<ServerConfig>,
  pub sessions: Arc<SessionKeys>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:    Arc::clone(&self.store),
      config:   Arc::clone(&self.config),
      sessions: Arc::clone(&self.sessions),
    }
  }
}

impl<S: SocialStore> AppState<S> {
  pub fn new(store: S, config: ServerConfig) -> Self {
    let sessions =
      SessionKeys::new(config.jwt_secret.as_bytes(), config.session_ttl_secs);
    Self {
      store:    Arc::new(store),
      config:   Arc::new(config),
      sessions: Arc::new(sessions),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the API router for `state`.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: SocialStore + Clone + 'static,
{
  Router::new()
    // Auth
    .route("/auth/register", post(handlers::auth::register::<S>))
    .route("/auth/login", post(handlers::auth::login::<S>))
    .route("/auth/logout", post(handlers::auth::logout))
    .route("/auth/me", get(handlers::auth::me::<S>))
    // Posts
    .route("/posts", get(posts::feed::<S>).post(posts::create::<S>))
    .route("/posts/{id}", axum::routing::delete(posts::remove::<S>))
    .route("/posts/{id}/like", post(posts::like::<S>))
    .route(
      "/posts/{id}/comments",
      get(comments::list::<S>).post(comments::create::<S>),
    )
    // Comments
    .route("/comments/{id}", axum::routing::delete(comments::remove::<S>))
    .route("/comments/{id}/like", post(comments::like::<S>))
    // Notifications
    .route("/notifications", get(notifications::list::<S>))
    .route("/notifications/unread-count", get(notifications::unread_count::<S>))
    .route("/notifications/{id}/read", post(notifications::read_one::<S>))
    .route("/notifications/read-all", post(notifications::read_all::<S>))
    // Users
    .route("/users/search", get(users::search::<S>))
    .route("/users/me", patch(users::update_me::<S>))
    .route("/users/{handle}", get(users::profile::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use serde_json::{Value, json};
  use socialize_store_sqlite::SqliteStore;
  use tower::ServiceExt as _;

  use super::*;

  async fn app() -> Router {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let config = ServerConfig {
      host:               "127.0.0.1".into(),
      port:               0,
      store_path:         ":memory:".into(),
      jwt_secret:         "test-secret".into(),
      session_ttl_secs:   3600,
      secure_cookies:     false,
      recount_on_startup: false,
    };
    router(AppState::new(store, config))
  }

  async fn call(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
  ) -> (StatusCode, Value) {
    let (status, _, json) = call_raw(app, method, uri, token, body).await;
    (status, json)
  }

  async fn call_raw(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
  ) -> (StatusCode, axum::http::HeaderMap, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
      req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let req = match body {
      Some(body) => req
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap(),
      None => req.body(Body::empty()).unwrap(),
    };
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let headers = resp.headers().clone();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
      .await
      .unwrap();
    let json = if bytes.is_empty() {
      Value::Null
    } else {
      serde_json::from_slice(&bytes).unwrap()
    };
    (status, headers, json)
  }

  async fn register(app: &Router, handle: &str) -> String {
    let (status, json) = call(
      app,
      "POST",
      "/auth/register",
      None,
      Some(json!({
        "handle": handle,
        "display_name": handle,
        "email": format!("{handle}@example.com"),
        "password": "correct horse",
      })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{json}");
    json["token"].as_str().unwrap().to_owned()
  }

  async fn new_post(app: &Router, token: &str, content: &str) -> String {
    let (status, json) =
      call(app, "POST", "/posts", Some(token), Some(json!({ "content": content })))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    json["post_id"].as_str().unwrap().to_owned()
  }

  // ─── Auth ────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn register_sets_cookie_and_rejects_duplicates() {
    let app = app().await;
    let (status, headers, json) = call_raw(
      &app,
      "POST",
      "/auth/register",
      None,
      Some(json!({
        "handle": "maria",
        "display_name": "Maria",
        "email": "maria@example.com",
        "password": "correct horse",
      })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let cookie = headers
      .get(header::SET_COOKIE)
      .unwrap()
      .to_str()
      .unwrap();
    assert!(cookie.starts_with("token="));
    assert!(cookie.contains("HttpOnly"));
    assert!(json["token"].is_string());
    assert_eq!(json["user"]["handle"], "maria");
    assert!(json["user"].get("password_hash").is_none());

    let (status, json) = call(
      &app,
      "POST",
      "/auth/register",
      None,
      Some(json!({
        "handle": "MARIA",
        "display_name": "Other",
        "email": "other@example.com",
        "password": "correct horse",
      })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["kind"], "conflict");
  }

  #[tokio::test]
  async fn me_requires_a_session() {
    let app = app().await;
    let (status, json) = call(&app, "GET", "/auth/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["kind"], "unauthenticated");

    let (status, _) = call(&app, "GET", "/auth/me", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let token = register(&app, "joao").await;
    let (status, json) = call(&app, "GET", "/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["email"], "joao@example.com");
  }

  #[tokio::test]
  async fn login_checks_the_password() {
    let app = app().await;
    register(&app, "joao").await;

    let (status, json) = call(
      &app,
      "POST",
      "/auth/login",
      None,
      Some(json!({ "email": "joao@example.com", "password": "wrong horse" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"], "invalid email or password");

    let (status, json) = call(
      &app,
      "POST",
      "/auth/login",
      None,
      Some(json!({ "email": "nobody@example.com", "password": "correct horse" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"], "invalid email or password");

    let (status, json) = call(
      &app,
      "POST",
      "/auth/login",
      None,
      Some(json!({ "email": "joao@example.com", "password": "correct horse" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["user"]["handle"], "joao");
  }

  #[tokio::test]
  async fn session_cookie_authenticates() {
    let app = app().await;
    let token = register(&app, "joao").await;
    let req = Request::builder()
      .uri("/auth/me")
      .header(header::COOKIE, format!("token={token}"))
      .body(Body::empty())
      .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let (status, headers, _) = call_raw(&app, "POST", "/auth/logout", None, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let cleared = headers.get(header::SET_COOKIE).unwrap().to_str().unwrap();
    assert!(cleared.starts_with("token=;"));
  }

  // ─── Likes & notifications ───────────────────────────────────────────────

  #[tokio::test]
  async fn like_then_unlike_over_http() {
    let app = app().await;
    let a = register(&app, "ana").await;
    let b = register(&app, "bruno").await;
    let post = new_post(&app, &a, "bom dia").await;

    let (status, json) =
      call(&app, "POST", &format!("/posts/{post}/like"), Some(&b), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({ "active": true, "new_count": 1 }));

    let (_, json) = call(&app, "GET", "/notifications", Some(&a), None).await;
    let items = json["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["kind"], "like_post");
    assert_eq!(items[0]["sender"]["handle"], "bruno");
    let (_, json) = call(&app, "GET", "/notifications/unread-count", Some(&a), None).await;
    assert_eq!(json["count"], 1);

    let (_, json) =
      call(&app, "POST", &format!("/posts/{post}/like"), Some(&b), None).await;
    assert_eq!(json, json!({ "active": false, "new_count": 0 }));

    let (_, json) = call(&app, "GET", "/notifications", Some(&a), None).await;
    assert!(json["items"].as_array().unwrap().is_empty());
  }

  #[tokio::test]
  async fn notifications_are_private_to_their_recipient() {
    let app = app().await;
    let a = register(&app, "ana").await;
    let b = register(&app, "bruno").await;
    let post = new_post(&app, &a, "olá").await;
    call(
      &app,
      "POST",
      &format!("/posts/{post}/comments"),
      Some(&b),
      Some(json!({ "content": "oi @ana" })),
    )
    .await;

    let (_, json) = call(&app, "GET", "/notifications", Some(&a), None).await;
    let id = json["items"][0]["notification_id"].as_str().unwrap().to_owned();

    let (status, json) =
      call(&app, "POST", &format!("/notifications/{id}/read"), Some(&b), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["kind"], "not_found");

    let (status, _) =
      call(&app, "POST", &format!("/notifications/{id}/read"), Some(&a), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, json) = call(&app, "POST", "/notifications/read-all", Some(&a), None).await;
    assert_eq!(json["updated"], 0);
  }

  // ─── Content ─────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn empty_posts_are_rejected() {
    let app = app().await;
    let token = register(&app, "joao").await;
    let (status, json) =
      call(&app, "POST", "/posts", Some(&token), Some(json!({ "content": "   " })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["kind"], "validation");

    let (status, _) =
      call(&app, "POST", "/posts", None, Some(json!({ "content": "hi" }))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
  }

  #[tokio::test]
  async fn only_the_author_deletes() {
    let app = app().await;
    let a = register(&app, "ana").await;
    let b = register(&app, "bruno").await;
    let post = new_post(&app, &a, "meu post").await;

    let (status, json) =
      call(&app, "DELETE", &format!("/posts/{post}"), Some(&b), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["kind"], "forbidden");

    let (status, _) =
      call(&app, "DELETE", &format!("/posts/{post}"), Some(&a), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) =
      call(&app, "POST", &format!("/posts/{post}/like"), Some(&b), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  // ─── Malformed requests ──────────────────────────────────────────────────

  async fn send_text(app: &Router, uri: &str, body: &str) -> (StatusCode, Value) {
    let req = Request::builder()
      .method("POST")
      .uri(uri)
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(body.to_owned()))
      .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
      .await
      .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
  }

  #[tokio::test]
  async fn malformed_bodies_use_the_error_envelope() {
    let app = app().await;

    let (status, json) = send_text(&app, "/auth/login", "{not json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["kind"], "validation");
    assert_eq!(json["error"], "request body is not valid JSON");

    let (status, json) =
      send_text(&app, "/auth/register", r#"{"handle":"x"}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["kind"], "validation");
    assert!(!json["error"].as_str().unwrap().contains("display_name"));
  }

  #[tokio::test]
  async fn bad_path_and_query_values_use_the_error_envelope() {
    let app = app().await;

    let (status, json) =
      call(&app, "GET", "/posts/not-a-uuid/comments", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json, json!({ "error": "invalid path parameter", "kind": "validation" }));

    let (status, json) = call(&app, "GET", "/posts?limit=many", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "invalid query string");
  }

  // ─── Reads ───────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn feed_pages_with_cursors() {
    let app = app().await;
    let token = register(&app, "joao").await;
    for i in 0..5 {
      new_post(&app, &token, &format!("post {i}")).await;
    }

    let (_, first) = call(&app, "GET", "/posts?limit=3", None, None).await;
    assert_eq!(first["items"].as_array().unwrap().len(), 3);
    assert_eq!(first["items"][0]["content"], "post 4");
    let cursor = first["next_cursor"].as_str().unwrap();

    let (_, second) =
      call(&app, "GET", &format!("/posts?limit=3&cursor={cursor}"), None, None).await;
    let items = second["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[1]["content"], "post 0");
    assert!(second["next_cursor"].is_null());

    let (status, json) =
      call(&app, "GET", "/posts?cursor=not-a-cursor", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "invalid cursor");
  }

  #[tokio::test]
  async fn liked_by_viewer_needs_a_viewer() {
    let app = app().await;
    let a = register(&app, "ana").await;
    let post = new_post(&app, &a, "curte aí").await;
    call(&app, "POST", &format!("/posts/{post}/like"), Some(&a), None).await;

    let (_, json) = call(&app, "GET", "/posts", None, None).await;
    assert!(json["items"][0]["liked_by_viewer"].is_null());
    assert_eq!(json["items"][0]["like_count"], 1);

    let (_, json) = call(&app, "GET", "/posts", Some(&a), None).await;
    assert_eq!(json["items"][0]["liked_by_viewer"], true);

    let (_, json) = call(&app, "GET", "/posts", Some("expired-or-bad"), None).await;
    assert!(json["items"][0]["liked_by_viewer"].is_null());
  }

  #[tokio::test]
  async fn profiles_hide_email_and_list_posts() {
    let app = app().await;
    let token = register(&app, "maria").await;
    new_post(&app, &token, "primeiro").await;

    let (status, json) = call(&app, "GET", "/users/@maria", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["user"]["handle"], "maria");
    assert!(json["user"].get("email").is_none());
    assert_eq!(json["posts"]["items"][0]["content"], "primeiro");

    let (status, _) = call(&app, "GET", "/users/nobody", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, json) = call(&app, "GET", "/users/search?query=ma", Some(&token), None).await;
    assert_eq!(json[0]["handle"], "maria");

    let (status, json) = call(
      &app,
      "PATCH",
      "/users/me",
      Some(&token),
      Some(json!({ "bio": "  oi  " })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["bio"], "oi");
    assert_eq!(json["display_name"], "maria");
  }
}
