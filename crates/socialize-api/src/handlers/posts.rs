//! Handlers for `/posts` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/posts` | Feed, newest first. `?cursor&limit` |
//! | `POST`   | `/posts` | Body: `{"content":"...","image_ref":null}` |
//! | `DELETE` | `/posts/{id}` | Author only; removes comments, likes and notifications |
//! | `POST`   | `/posts/{id}/like` | Toggle |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
};
use axum_extra::extract::WithRejection;
use serde::Deserialize;
use socialize_core::{
  actions,
  content::{CascadeReport, Post},
  reaction::{Target, ToggleOutcome},
  store::SocialStore,
  view::{PostQuery, PostView},
};
use uuid::Uuid;

use super::{PageParams, Paged};
use crate::{AppState, auth::Session, error::ApiError};

/// `GET /posts`
pub async fn feed<S>(
  State(state): State<AppState<S>>,
  viewer: Option<Session>,
  WithRejection(Query(params), _): WithRejection<Query<PageParams>, ApiError>,
) -> Result<Json<Paged<PostView>>, ApiError>
where
  S: SocialStore + Clone + 'static,
{
  let query = PostQuery {
    viewer: viewer.map(|s| s.user_id()),
    author: None,
    cursor: params.cursor()?,
    limit:  params.limit(),
  };
  let page = actions::list_posts(state.store.as_ref(), query).await?;
  Ok(Json(page.into()))
}

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  #[serde(default)]
  pub content:   String,
  pub image_ref: Option<String>,
}

/// `POST /posts`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  session: Session,
  WithRejection(Json(body), _): WithRejection<Json<CreateBody>, ApiError>,
) -> Result<(StatusCode, Json<Post>), ApiError>
where
  S: SocialStore + Clone + 'static,
{
  let post = actions::create_post(
    state.store.as_ref(),
    session.user_id(),
    &body.content,
    body.image_ref.as_deref(),
  )
  .await?;
  Ok((StatusCode::CREATED, Json(post)))
}

/// `DELETE /posts/{id}`
pub async fn remove<S>(
  State(state): State<AppState<S>>,
  session: Session,
  WithRejection(Path(id), _): WithRejection<Path<Uuid>, ApiError>,
) -> Result<Json<CascadeReport>, ApiError>
where
  S: SocialStore + Clone + 'static,
{
  let report = actions::delete_post(state.store.as_ref(), session.user_id(), id).await?;
  Ok(Json(report))
}

/// `POST /posts/{id}/like`
pub async fn like<S>(
  State(state): State<AppState<S>>,
  session: Session,
  WithRejection(Path(id), _): WithRejection<Path<Uuid>, ApiError>,
) -> Result<Json<ToggleOutcome>, ApiError>
where
  S: SocialStore + Clone + 'static,
{
  let outcome =
    actions::toggle_reaction(state.store.as_ref(), session.user_id(), Target::post(id))
      .await?;
  Ok(Json(outcome))
}
