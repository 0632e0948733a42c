//! Notification records derived from reactions, comments and mentions.
//!
//! Like notifications are keyed so that like/unlike churn never multiplies
//! rows; comment and mention notifications are append-only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};
use uuid::Uuid;

use crate::user::UserSummary;

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NotificationKind {
  LikePost,
  LikeComment,
  CommentPost,
  MentionComment,
  /// Reserved for the follow graph, which nothing in this system produces.
  Follow,
}

impl NotificationKind {
  /// Upserted kinds carry a dedup key; the rest are append-only.
  pub fn is_upserted(self) -> bool {
    matches!(self, Self::LikePost | Self::LikeComment)
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
  pub notification_id: Uuid,
  pub recipient_id:    Uuid,
  pub sender_id:       Uuid,
  pub kind:            NotificationKind,
  pub post_id:         Option<Uuid>,
  pub comment_id:      Option<Uuid>,
  pub is_read:         bool,
  pub created_at:      DateTime<Utc>,
}

/// Input to the store's notification writes. Ids and timestamps are assigned
/// by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
  pub recipient_id: Uuid,
  pub sender_id:    Uuid,
  pub kind:         NotificationKind,
  pub post_id:      Option<Uuid>,
  pub comment_id:   Option<Uuid>,
}

impl NewNotification {
  pub fn like_post(recipient_id: Uuid, sender_id: Uuid, post_id: Uuid) -> Self {
    Self {
      recipient_id,
      sender_id,
      kind: NotificationKind::LikePost,
      post_id: Some(post_id),
      comment_id: None,
    }
  }

  pub fn like_comment(
    recipient_id: Uuid,
    sender_id: Uuid,
    post_id: Uuid,
    comment_id: Uuid,
  ) -> Self {
    Self {
      recipient_id,
      sender_id,
      kind: NotificationKind::LikeComment,
      post_id: Some(post_id),
      comment_id: Some(comment_id),
    }
  }

  pub fn comment_post(
    recipient_id: Uuid,
    sender_id: Uuid,
    post_id: Uuid,
    comment_id: Uuid,
  ) -> Self {
    Self {
      recipient_id,
      sender_id,
      kind: NotificationKind::CommentPost,
      post_id: Some(post_id),
      comment_id: Some(comment_id),
    }
  }

  pub fn mention_comment(
    recipient_id: Uuid,
    sender_id: Uuid,
    post_id: Uuid,
    comment_id: Uuid,
  ) -> Self {
    Self {
      recipient_id,
      sender_id,
      kind: NotificationKind::MentionComment,
      post_id: Some(post_id),
      comment_id: Some(comment_id),
    }
  }

  /// The upsert key `(recipient, kind, target, sender)` for like kinds.
  ///
  /// The target of a comment like is the comment, not its post.
  pub fn dedup_key(&self) -> Option<String> {
    if !self.kind.is_upserted() {
      return None;
    }
    let target = match self.kind {
      NotificationKind::LikeComment => self.comment_id,
      _ => self.post_id,
    }?;
    Some(format!(
      "{}:{}:{}:{}",
      self.recipient_id,
      self.kind.as_ref(),
      target,
      self.sender_id
    ))
  }
}

/// A notification joined with its sender, as listed to the recipient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationView {
  #[serde(flatten)]
  pub notification: Notification,
  pub sender:       UserSummary,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn only_like_kinds_have_dedup_keys() {
    let (a, b, p, c) = (Uuid::now_v7(), Uuid::now_v7(), Uuid::now_v7(), Uuid::now_v7());
    assert!(NewNotification::like_post(a, b, p).dedup_key().is_some());
    assert!(NewNotification::comment_post(a, b, p, c).dedup_key().is_none());
    assert!(NewNotification::mention_comment(a, b, p, c).dedup_key().is_none());
  }

  #[test]
  fn comment_like_key_targets_the_comment() {
    let (a, b, p, c1, c2) = (
      Uuid::now_v7(),
      Uuid::now_v7(),
      Uuid::now_v7(),
      Uuid::now_v7(),
      Uuid::now_v7(),
    );
    let k1 = NewNotification::like_comment(a, b, p, c1).dedup_key();
    let k2 = NewNotification::like_comment(a, b, p, c2).dedup_key();
    assert_ne!(k1, k2);
    assert!(k1.unwrap().contains(&c1.to_string()));
  }
}
