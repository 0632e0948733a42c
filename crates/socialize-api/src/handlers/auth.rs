//! Handlers for `/auth` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/auth/register` | 201 with `{token, user}` and the session cookie |
//! | `POST` | `/auth/login` | `{token, user}` and the session cookie |
//! | `POST` | `/auth/logout` | Clears the cookie |
//! | `GET`  | `/auth/me` | The current user, email included |

use axum::{Json, extract::State, http::StatusCode};
use axum_extra::extract::{WithRejection, cookie::CookieJar};
use serde::{Deserialize, Serialize};
use socialize_core::{
  actions,
  store::SocialStore,
  user::{Identity, NewUser, User},
};

use crate::{
  AppState,
  auth::{self, Session},
  error::ApiError,
};

pub const PASSWORD_MIN_CHARS: usize = 6;

#[derive(Debug, Serialize)]
pub struct AuthResponse {
  pub token: String,
  pub user:  User,
}

fn signed_in<S: SocialStore>(
  state: &AppState<S>,
  jar: CookieJar,
  user: User,
) -> Result<(CookieJar, Json<AuthResponse>), ApiError> {
  let token = state.sessions.issue(&Identity::from(&user))?;
  let jar = jar.add(auth::session_cookie(token.clone(), state));
  Ok((jar, Json(AuthResponse { token, user })))
}

// ─── Register ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
  pub handle:       String,
  pub display_name: String,
  pub email:        String,
  pub password:     String,
}

/// `POST /auth/register`
pub async fn register<S>(
  State(state): State<AppState<S>>,
  jar: CookieJar,
  WithRejection(Json(body), _): WithRejection<Json<RegisterBody>, ApiError>,
) -> Result<(StatusCode, CookieJar, Json<AuthResponse>), ApiError>
where
  S: SocialStore + Clone + 'static,
{
  if body.password.chars().count() < PASSWORD_MIN_CHARS {
    return Err(ApiError::BadRequest(format!(
      "password must be at least {PASSWORD_MIN_CHARS} characters"
    )));
  }
  let mut input =
    NewUser::new(&body.handle, &body.display_name, &body.email, String::new())?;
  input.password_hash = auth::hash_password(&body.password)?;

  let user = actions::register(state.store.as_ref(), input).await?;
  let (jar, json) = signed_in(&state, jar, user)?;
  Ok((StatusCode::CREATED, jar, json))
}

// ─── Login ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LoginBody {
  pub email:    String,
  pub password: String,
}

/// `POST /auth/login`
///
/// Unknown email and wrong password are indistinguishable.
pub async fn login<S>(
  State(state): State<AppState<S>>,
  jar: CookieJar,
  WithRejection(Json(body), _): WithRejection<Json<LoginBody>, ApiError>,
) -> Result<(CookieJar, Json<AuthResponse>), ApiError>
where
  S: SocialStore + Clone + 'static,
{
  let user = state
    .store
    .find_user_by_email(body.email.trim())
    .await
    .map_err(socialize_core::Error::store)?
    .filter(|u| auth::verify_password(&body.password, &u.password_hash))
    .ok_or(ApiError::InvalidCredentials)?;

  tracing::debug!(user = %user.user_id, "signed in");
  signed_in(&state, jar, user)
}

/// `POST /auth/logout`
pub async fn logout(jar: CookieJar) -> (CookieJar, StatusCode) {
  (jar.add(auth::cleared_session_cookie()), StatusCode::NO_CONTENT)
}

/// `GET /auth/me`
pub async fn me<S>(
  State(state): State<AppState<S>>,
  session: Session,
) -> Result<Json<User>, ApiError>
where
  S: SocialStore + Clone + 'static,
{
  let user = actions::current_user(state.store.as_ref(), session.user_id()).await?;
  Ok(Json(user))
}
