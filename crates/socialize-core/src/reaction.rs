//! Reactions (likes) and the cached counters they drive.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};
use uuid::Uuid;

/// What kind of content a reaction points at. Stored in the `target_type`
/// column of the single `reactions` table.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TargetType {
  Post,
  Comment,
}

/// A reactable piece of content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Target {
  pub target_type: TargetType,
  pub target_id:   Uuid,
}

impl Target {
  pub fn post(id: Uuid) -> Self {
    Self { target_type: TargetType::Post, target_id: id }
  }

  pub fn comment(id: Uuid) -> Self {
    Self { target_type: TargetType::Comment, target_id: id }
  }

  /// The cached counter that mirrors the number of reactions on this target.
  pub fn like_counter(self) -> Counter {
    match self.target_type {
      TargetType::Post => Counter::PostLikes(self.target_id),
      TargetType::Comment => Counter::CommentLikes(self.target_id),
    }
  }
}

/// A like. At most one exists per `(user_id, target)`; presence means liked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reaction {
  pub user_id:    Uuid,
  pub target:     Target,
  pub created_at: DateTime<Utc>,
}

impl Reaction {
  pub fn new(user_id: Uuid, target: Target) -> Self {
    Self { user_id, target, created_at: Utc::now() }
  }
}

// ─── Counters ────────────────────────────────────────────────────────────────

/// A denormalised counter column on a post or comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counter {
  PostLikes(Uuid),
  PostComments(Uuid),
  CommentLikes(Uuid),
}

/// The result of adjusting a cached counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterUpdate {
  pub value:   u64,
  /// The decrement would have gone below zero and was clamped.
  pub clamped: bool,
}

/// Outcome of a reaction toggle as seen by the acting user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleOutcome {
  /// Whether the user now likes the target.
  pub active:    bool,
  pub new_count: u64,
}

/// Rows whose cached counters disagreed with ledger truth and were rewritten.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RecountReport {
  pub post_likes:    u64,
  pub post_comments: u64,
  pub comment_likes: u64,
}

impl RecountReport {
  pub fn total(&self) -> u64 {
    self.post_likes + self.post_comments + self.comment_likes
  }
}

#[cfg(test)]
mod tests {
  use std::str::FromStr;

  use super::*;

  #[test]
  fn target_type_column_encoding() {
    assert_eq!(TargetType::Post.as_ref(), "post");
    assert_eq!(TargetType::from_str("comment").unwrap(), TargetType::Comment);
    assert!(TargetType::from_str("story").is_err());
  }
}
