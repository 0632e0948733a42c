//! Handlers for comment threads and `/comments` endpoints.

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
};
use axum_extra::extract::WithRejection;
use serde::Deserialize;
use socialize_core::{
  actions,
  content::{CascadeReport, Comment},
  reaction::{Target, ToggleOutcome},
  store::SocialStore,
  view::{CommentQuery, CommentView},
};
use uuid::Uuid;

use super::{PageParams, Paged};
use crate::{AppState, auth::Session, error::ApiError};

/// `GET /posts/{id}/comments`, oldest first.
pub async fn list<S>(
  State(state): State<AppState<S>>,
  viewer: Option<Session>,
  WithRejection(Path(post_id), _): WithRejection<Path<Uuid>, ApiError>,
  WithRejection(Query(params), _): WithRejection<Query<PageParams>, ApiError>,
) -> Result<Json<Paged<CommentView>>, ApiError>
where
  S: SocialStore + Clone + 'static,
{
  let query = CommentQuery {
    post_id,
    viewer: viewer.map(|s| s.user_id()),
    cursor: params.cursor()?,
    limit: params.limit(),
  };
  let page = actions::list_comments(state.store.as_ref(), query).await?;
  Ok(Json(page.into()))
}

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub content: String,
}

/// `POST /posts/{id}/comments`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  session: Session,
  WithRejection(Path(post_id), _): WithRejection<Path<Uuid>, ApiError>,
  WithRejection(Json(body), _): WithRejection<Json<CreateBody>, ApiError>,
) -> Result<(StatusCode, Json<Comment>), ApiError>
where
  S: SocialStore + Clone + 'static,
{
  let comment = actions::create_comment(
    state.store.as_ref(),
    session.user_id(),
    post_id,
    &body.content,
  )
  .await?;
  Ok((StatusCode::CREATED, Json(comment)))
}

/// `DELETE /comments/{id}`
pub async fn remove<S>(
  State(state): State<AppState<S>>,
  session: Session,
  WithRejection(Path(id), _): WithRejection<Path<Uuid>, ApiError>,
) -> Result<Json<CascadeReport>, ApiError>
where
  S: SocialStore + Clone + 'static,
{
  let report =
    actions::delete_comment(state.store.as_ref(), session.user_id(), id).await?;
  Ok(Json(report))
}

/// `POST /comments/{id}/like`
pub async fn like<S>(
  State(state): State<AppState<S>>,
  session: Session,
  WithRejection(Path(id), _): WithRejection<Path<Uuid>, ApiError>,
) -> Result<Json<ToggleOutcome>, ApiError>
where
  S: SocialStore + Clone + 'static,
{
  let outcome = actions::toggle_reaction(
    state.store.as_ref(),
    session.user_id(),
    Target::comment(id),
  )
  .await?;
  Ok(Json(outcome))
}
