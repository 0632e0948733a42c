//! User-facing operations.
//!
//! Each action validates and authorises before it mutates anything, writes
//! the primary change, then runs notification fan-out on a best-effort basis.

use uuid::Uuid;

use crate::{
  Error, Result,
  content::{CascadeReport, Comment, Post},
  fanout::{self, Liked},
  ledger,
  notification::NotificationView,
  reaction::{Counter, RecountReport, Target, TargetType, ToggleOutcome},
  store::SocialStore,
  user::{NewUser, ProfileUpdate, User, UserProfile, UserSummary},
  view::{CommentQuery, CommentView, Cursor, Page, PostQuery, PostView},
};

/// A toggle that keeps losing the uniqueness race is retried this many times
/// in total before the caller sees [`Error::Conflict`].
pub const MAX_TOGGLE_ATTEMPTS: usize = 3;

pub const USER_SEARCH_MIN_CHARS: usize = 2;
pub const USER_SEARCH_LIMIT: usize = 10;

// ─── Accounts ────────────────────────────────────────────────────────────────

/// Create an account from validated registration input.
pub async fn register<S: SocialStore>(store: &S, input: NewUser) -> Result<User> {
  if store
    .find_user_by_handle(&input.handle)
    .await
    .map_err(Error::store)?
    .is_some()
  {
    return Err(Error::Conflict("this handle is already taken".into()));
  }
  if store
    .find_user_by_email(&input.email)
    .await
    .map_err(Error::store)?
    .is_some()
  {
    return Err(Error::Conflict("this email is already registered".into()));
  }

  let user = store
    .create_user(input)
    .await
    .map_err(Error::store)?
    .ok_or_else(|| Error::Conflict("handle or email already registered".into()))?;

  tracing::info!(user = %user.user_id, handle = %user.handle, "registered user");
  Ok(user)
}

pub async fn current_user<S: SocialStore>(store: &S, user_id: Uuid) -> Result<User> {
  store
    .get_user(user_id)
    .await
    .map_err(Error::store)?
    .ok_or_else(|| Error::NotFound("user".into()))
}

pub async fn update_profile<S: SocialStore>(
  store: &S,
  actor: Uuid,
  update: ProfileUpdate,
) -> Result<User> {
  let update = update.validated()?;
  if update.is_empty() {
    return Err(Error::Validation("nothing to update".into()));
  }
  store
    .update_profile(actor, update)
    .await
    .map_err(Error::store)?
    .ok_or_else(|| Error::NotFound("user".into()))
}

/// A user's public profile together with the first page of their posts.
pub async fn profile<S: SocialStore>(
  store: &S,
  handle: &str,
  viewer: Option<Uuid>,
  cursor: Option<Cursor>,
  limit: usize,
) -> Result<(UserProfile, Page<PostView>)> {
  let user = store
    .find_user_by_handle(handle.trim_start_matches('@'))
    .await
    .map_err(Error::store)?
    .ok_or_else(|| Error::NotFound("user".into()))?;

  let posts = list_posts(
    store,
    PostQuery { viewer, author: Some(user.user_id), cursor, limit },
  )
  .await?;
  Ok((user.into(), posts))
}

/// Handle-prefix search. Queries shorter than two characters match nothing.
pub async fn search_users<S: SocialStore>(
  store: &S,
  query: &str,
) -> Result<Vec<UserSummary>> {
  let query = query.trim().trim_start_matches('@');
  if query.chars().count() < USER_SEARCH_MIN_CHARS {
    return Ok(Vec::new());
  }
  store
    .search_users(query, USER_SEARCH_LIMIT)
    .await
    .map_err(Error::store)
}

// ─── Posts & comments ────────────────────────────────────────────────────────

pub async fn create_post<S: SocialStore>(
  store: &S,
  actor: Uuid,
  content: &str,
  image_ref: Option<&str>,
) -> Result<Post> {
  let post = Post::new(actor, content, image_ref)?;
  store.insert_post(post.clone()).await.map_err(Error::store)?;
  tracing::debug!(post = %post.post_id, author = %actor, "created post");
  Ok(post)
}

/// Delete a post and everything hanging off it. Only its author may.
pub async fn delete_post<S: SocialStore>(
  store: &S,
  actor: Uuid,
  post_id: Uuid,
) -> Result<CascadeReport> {
  let post = store
    .get_post(post_id)
    .await
    .map_err(Error::store)?
    .ok_or_else(|| Error::NotFound("post".into()))?;
  if post.author_id != actor {
    return Err(Error::Forbidden("only the author can delete this post".into()));
  }

  let report = store
    .delete_post(post_id)
    .await
    .map_err(Error::store)?
    .ok_or_else(|| Error::NotFound("post".into()))?;
  tracing::info!(post = %post_id, ?report, "deleted post");
  Ok(report)
}

/// Comment on a post, bump its comment counter and notify the post author
/// and any mentioned users.
pub async fn create_comment<S: SocialStore>(
  store: &S,
  actor: Uuid,
  post_id: Uuid,
  content: &str,
) -> Result<Comment> {
  let comment = Comment::new(post_id, actor, content)?;
  let post = store
    .get_post(post_id)
    .await
    .map_err(Error::store)?
    .ok_or_else(|| Error::NotFound("post".into()))?;

  // The post may be deleted between the read above and this write.
  let inserted = store
    .insert_comment(comment.clone())
    .await
    .map_err(Error::store)?;
  if !inserted {
    return Err(Error::NotFound("post".into()));
  }
  ledger::adjust(store, Counter::PostComments(post_id), 1).await?;

  let fanout = fanout::on_comment(store, &post, &comment).await;
  tracing::debug!(
    comment = %comment.comment_id,
    post = %post_id,
    delivered = fanout.delivered,
    failed = fanout.failed,
    "created comment"
  );
  Ok(comment)
}

/// Delete a comment and its reactions and notifications. Only its author
/// may.
pub async fn delete_comment<S: SocialStore>(
  store: &S,
  actor: Uuid,
  comment_id: Uuid,
) -> Result<CascadeReport> {
  let comment = store
    .get_comment(comment_id)
    .await
    .map_err(Error::store)?
    .ok_or_else(|| Error::NotFound("comment".into()))?;
  if comment.author_id != actor {
    return Err(Error::Forbidden(
      "only the author can delete this comment".into(),
    ));
  }

  store
    .delete_comment(comment_id)
    .await
    .map_err(Error::store)?
    .ok_or_else(|| Error::NotFound("comment".into()))
}

// ─── Reactions ───────────────────────────────────────────────────────────────

/// Like or unlike a post or comment, then fan out the like notification.
///
/// A toggle that loses a race on the reaction row is retried from a fresh
/// read; after [`MAX_TOGGLE_ATTEMPTS`] losses the caller gets
/// [`Error::Conflict`].
pub async fn toggle_reaction<S: SocialStore>(
  store: &S,
  actor: Uuid,
  target: Target,
) -> Result<ToggleOutcome> {
  let content = load_target(store, target).await?;

  let mut attempt = 0;
  let outcome = loop {
    attempt += 1;
    match ledger::toggle(store, actor, target).await {
      Ok(outcome) => break outcome,
      Err(Error::DuplicateReaction) if attempt < MAX_TOGGLE_ATTEMPTS => {
        tracing::debug!(?target, %actor, attempt, "reaction toggle raced; retrying");
      }
      Err(Error::DuplicateReaction) => {
        return Err(Error::Conflict(
          "this reaction is being changed concurrently, try again".into(),
        ));
      }
      Err(e) => return Err(e),
    }
  };

  let liked = match &content {
    Content::Post(p) => Liked::Post(p),
    Content::Comment(c) => Liked::Comment(c),
  };
  let fanout = fanout::on_reaction(store, actor, liked).await;
  if fanout.failed > 0 {
    tracing::warn!(?target, %actor, "like notification not updated");
  }
  Ok(outcome)
}

enum Content {
  Post(Post),
  Comment(Comment),
}

async fn load_target<S: SocialStore>(store: &S, target: Target) -> Result<Content> {
  match target.target_type {
    TargetType::Post => store
      .get_post(target.target_id)
      .await
      .map_err(Error::store)?
      .map(Content::Post)
      .ok_or_else(|| Error::NotFound("post".into())),
    TargetType::Comment => store
      .get_comment(target.target_id)
      .await
      .map_err(Error::store)?
      .map(Content::Comment)
      .ok_or_else(|| Error::NotFound("comment".into())),
  }
}

// ─── Reads ───────────────────────────────────────────────────────────────────

/// Posts newest first, with per-viewer like state when `viewer` is set.
pub async fn list_posts<S: SocialStore>(
  store: &S,
  query: PostQuery,
) -> Result<Page<PostView>> {
  let items = store.list_posts(&query).await.map_err(Error::store)?;
  Ok(Page::new(items, query.limit, PostView::cursor))
}

/// A post's comments oldest first.
pub async fn list_comments<S: SocialStore>(
  store: &S,
  query: CommentQuery,
) -> Result<Page<CommentView>> {
  store
    .get_post(query.post_id)
    .await
    .map_err(Error::store)?
    .ok_or_else(|| Error::NotFound("post".into()))?;

  let items = store.list_comments(&query).await.map_err(Error::store)?;
  Ok(Page::new(items, query.limit, CommentView::cursor))
}

pub async fn list_notifications<S: SocialStore>(
  store: &S,
  recipient: Uuid,
  cursor: Option<Cursor>,
  limit: usize,
) -> Result<Page<NotificationView>> {
  let items = store
    .list_notifications(recipient, cursor, limit)
    .await
    .map_err(Error::store)?;
  Ok(Page::new(items, limit, |n| Cursor {
    created_at: n.notification.created_at,
    id:         n.notification.notification_id,
  }))
}

/// Mark a notification read on behalf of its recipient.
///
/// A notification owned by someone else is reported exactly like a missing
/// one, so callers cannot probe for other users' notification ids.
pub async fn mark_notification_read<S: SocialStore>(
  store: &S,
  actor: Uuid,
  notification_id: Uuid,
) -> Result<()> {
  let updated = store
    .mark_notification_read(notification_id, actor)
    .await
    .map_err(Error::store)?;
  if updated {
    Ok(())
  } else {
    Err(Error::NotFound("notification".into()))
  }
}

pub async fn unread_count<S: SocialStore>(store: &S, recipient: Uuid) -> Result<u64> {
  store
    .unread_notification_count(recipient)
    .await
    .map_err(Error::store)
}

/// Mark every notification of `recipient` read; returns how many changed.
pub async fn mark_all_read<S: SocialStore>(store: &S, recipient: Uuid) -> Result<u64> {
  store
    .mark_all_notifications_read(recipient)
    .await
    .map_err(Error::store)
}

// ─── Maintenance ─────────────────────────────────────────────────────────────

/// Rewrite every cached counter from ledger truth.
pub async fn recount<S: SocialStore>(store: &S) -> Result<RecountReport> {
  let report = store.recount_counters().await.map_err(Error::store)?;
  if report.total() > 0 {
    tracing::warn!(?report, "repaired drifted counters");
  } else {
    tracing::info!("all cached counters consistent");
  }
  Ok(report)
}
