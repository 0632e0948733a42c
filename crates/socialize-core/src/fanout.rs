//! Notification fan-out: deriving notification rows from primary mutations.
//!
//! Fan-out runs after the primary action has been written and never fails
//! it. Each notification write is attempted on its own; failures are logged
//! and counted, and can be re-derived later from the reaction ledger and the
//! comment table.
//!
//! Rules:
//! - the actor is never notified about their own action;
//! - like notifications are upserted by `(recipient, kind, target, sender)`
//!   while the reaction exists in the ledger and deleted once it is gone;
//! - every comment notifies the post author with a fresh row;
//! - every distinct mentioned handle that resolves to a user gets a fresh
//!   mention row, except the commenter, and except the post author when this
//!   comment already notified them.

use std::collections::HashSet;

use uuid::Uuid;

use crate::{
  content::{Comment, Post},
  mention::extract_mentions,
  notification::NewNotification,
  reaction::Target,
  store::SocialStore,
};

/// Content that a reaction was toggled on.
#[derive(Debug, Clone, Copy)]
pub enum Liked<'a> {
  Post(&'a Post),
  Comment(&'a Comment),
}

/// How many notification writes a fan-out attempted and how they went.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Fanout {
  pub delivered: usize,
  pub failed:    usize,
}

impl Fanout {
  fn record(&mut self, ok: bool) {
    if ok {
      self.delivered += 1;
    } else {
      self.failed += 1;
    }
  }
}

/// Fan out a reaction toggle by `actor`.
///
/// The like notification follows the reaction ledger rather than the
/// toggle's own outcome: it is upserted while the reaction exists and
/// retracted once it is gone, so interleaved like/unlike calls settle on the
/// ledger's final state.
pub async fn on_reaction<S>(store: &S, actor: Uuid, liked: Liked<'_>) -> Fanout
where
  S: SocialStore,
{
  let (target, notification) = match liked {
    Liked::Post(p) => (
      Target::post(p.post_id),
      NewNotification::like_post(p.author_id, actor, p.post_id),
    ),
    Liked::Comment(c) => (
      Target::comment(c.comment_id),
      NewNotification::like_comment(c.author_id, actor, c.post_id, c.comment_id),
    ),
  };

  let mut fanout = Fanout::default();
  if notification.recipient_id == actor {
    return fanout;
  }

  let ok = match liked_now(store, actor, target).await {
    Some(true) => {
      let delivered = deliver(store, notification.clone()).await;
      // An unlike may have retracted before this upsert landed.
      match liked_now(store, actor, target).await {
        Some(true) => delivered,
        Some(false) => retract(store, &notification).await,
        None => false,
      }
    }
    Some(false) => retract(store, &notification).await,
    None => false,
  };
  fanout.record(ok);
  fanout
}

async fn liked_now<S>(store: &S, actor: Uuid, target: Target) -> Option<bool>
where
  S: SocialStore,
{
  match store.find_reaction(actor, target).await {
    Ok(reaction) => Some(reaction.is_some()),
    Err(e) => {
      tracing::warn!(?target, %actor, error = %e, "failed to read reaction ledger");
      None
    }
  }
}

async fn retract<S>(store: &S, notification: &NewNotification) -> bool
where
  S: SocialStore,
{
  match store.retract_notification(notification).await {
    Ok(_) => true,
    Err(e) => {
      tracing::warn!(
        recipient = %notification.recipient_id,
        sender = %notification.sender_id,
        kind = notification.kind.as_ref(),
        error = %e,
        "failed to retract like notification"
      );
      false
    }
  }
}

/// Fan out a newly created comment on `post`: notify the post author, then
/// every mentioned user.
pub async fn on_comment<S>(store: &S, post: &Post, comment: &Comment) -> Fanout
where
  S: SocialStore,
{
  let actor = comment.author_id;
  let mut fanout = Fanout::default();

  let mut notified_author = false;
  if post.author_id != actor {
    let ok = deliver(
      store,
      NewNotification::comment_post(
        post.author_id,
        actor,
        post.post_id,
        comment.comment_id,
      ),
    )
    .await;
    fanout.record(ok);
    notified_author = ok;
  }

  let handles: Vec<String> =
    extract_mentions(&comment.content).into_iter().collect();
  if handles.is_empty() {
    return fanout;
  }

  let mentioned = match store.resolve_handles(&handles).await {
    Ok(users) => users,
    Err(e) => {
      tracing::warn!(
        comment = %comment.comment_id,
        error = %e,
        "failed to resolve mentioned handles"
      );
      fanout.record(false);
      return fanout;
    }
  };

  let mut seen = HashSet::new();
  for user in mentioned {
    if user.user_id == actor
      || (notified_author && user.user_id == post.author_id)
      || !seen.insert(user.user_id)
    {
      continue;
    }
    let ok = deliver(
      store,
      NewNotification::mention_comment(
        user.user_id,
        actor,
        post.post_id,
        comment.comment_id,
      ),
    )
    .await;
    fanout.record(ok);
  }

  fanout
}

async fn deliver<S>(store: &S, notification: NewNotification) -> bool
where
  S: SocialStore,
{
  let (recipient, sender, kind) =
    (notification.recipient_id, notification.sender_id, notification.kind);
  match store.record_notification(notification).await {
    Ok(_) => true,
    Err(e) => {
      tracing::warn!(
        %recipient,
        %sender,
        kind = kind.as_ref(),
        error = %e,
        "failed to record notification"
      );
      false
    }
  }
}
