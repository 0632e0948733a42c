//! Handlers for `/notifications` endpoints. Every route is scoped to the
//! session's user.

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
};
use axum_extra::extract::WithRejection;
use serde::Serialize;
use socialize_core::{actions, notification::NotificationView, store::SocialStore};
use uuid::Uuid;

use super::{PageParams, Paged};
use crate::{AppState, auth::Session, error::ApiError};

/// `GET /notifications`, newest first.
pub async fn list<S>(
  State(state): State<AppState<S>>,
  session: Session,
  WithRejection(Query(params), _): WithRejection<Query<PageParams>, ApiError>,
) -> Result<Json<Paged<NotificationView>>, ApiError>
where
  S: SocialStore + Clone + 'static,
{
  let page = actions::list_notifications(
    state.store.as_ref(),
    session.user_id(),
    params.cursor()?,
    params.limit(),
  )
  .await?;
  Ok(Json(page.into()))
}

#[derive(Debug, Serialize)]
pub struct UnreadCount {
  pub count: u64,
}

/// `GET /notifications/unread-count`
pub async fn unread_count<S>(
  State(state): State<AppState<S>>,
  session: Session,
) -> Result<Json<UnreadCount>, ApiError>
where
  S: SocialStore + Clone + 'static,
{
  let count = actions::unread_count(state.store.as_ref(), session.user_id()).await?;
  Ok(Json(UnreadCount { count }))
}

/// `POST /notifications/{id}/read`
pub async fn read_one<S>(
  State(state): State<AppState<S>>,
  session: Session,
  WithRejection(Path(id), _): WithRejection<Path<Uuid>, ApiError>,
) -> Result<StatusCode, ApiError>
where
  S: SocialStore + Clone + 'static,
{
  actions::mark_notification_read(state.store.as_ref(), session.user_id(), id).await?;
  Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Serialize)]
pub struct ReadAll {
  pub updated: u64,
}

/// `POST /notifications/read-all`
pub async fn read_all<S>(
  State(state): State<AppState<S>>,
  session: Session,
) -> Result<Json<ReadAll>, ApiError>
where
  S: SocialStore + Clone + 'static,
{
  let updated = actions::mark_all_read(state.store.as_ref(), session.user_id()).await?;
  Ok(Json(ReadAll { updated }))
}
