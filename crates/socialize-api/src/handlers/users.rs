//! Handlers for `/users` endpoints.
//!
//! Profiles never expose email addresses; only `/auth/me` does.

use axum::{
  Json,
  extract::{Path, Query, State},
};
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};
use socialize_core::{
  actions,
  store::SocialStore,
  user::{ProfileUpdate, User, UserProfile, UserSummary},
  view::PostView,
};

use super::{PageParams, Paged};
use crate::{AppState, auth::Session, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct SearchParams {
  #[serde(default)]
  pub query: String,
}

/// `GET /users/search?query=<prefix>`
pub async fn search<S>(
  State(state): State<AppState<S>>,
  _session: Session,
  WithRejection(Query(params), _): WithRejection<Query<SearchParams>, ApiError>,
) -> Result<Json<Vec<UserSummary>>, ApiError>
where
  S: SocialStore + Clone + 'static,
{
  let users = actions::search_users(state.store.as_ref(), &params.query).await?;
  Ok(Json(users))
}

#[derive(Debug, Serialize)]
pub struct ProfilePage {
  pub user:  UserProfile,
  pub posts: Paged<PostView>,
}

/// `GET /users/{handle}`
pub async fn profile<S>(
  State(state): State<AppState<S>>,
  viewer: Option<Session>,
  WithRejection(Path(handle), _): WithRejection<Path<String>, ApiError>,
  WithRejection(Query(params), _): WithRejection<Query<PageParams>, ApiError>,
) -> Result<Json<ProfilePage>, ApiError>
where
  S: SocialStore + Clone + 'static,
{
  let (user, posts) = actions::profile(
    state.store.as_ref(),
    &handle,
    viewer.map(|s| s.user_id()),
    params.cursor()?,
    params.limit(),
  )
  .await?;
  Ok(Json(ProfilePage { user, posts: posts.into() }))
}

/// `PATCH /users/me`
pub async fn update_me<S>(
  State(state): State<AppState<S>>,
  session: Session,
  WithRejection(Json(update), _): WithRejection<Json<ProfileUpdate>, ApiError>,
) -> Result<Json<User>, ApiError>
where
  S: SocialStore + Clone + 'static,
{
  let user =
    actions::update_profile(state.store.as_ref(), session.user_id(), update).await?;
  Ok(Json(user))
}
