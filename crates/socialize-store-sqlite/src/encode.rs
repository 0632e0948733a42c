//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 UTC strings with a fixed microsecond precision and
//! a `Z` suffix, so lexicographic order is chronological order and keyset
//! pagination can compare them as text. UUIDs are hyphenated lowercase
//! strings. Enum columns use their `strum` string forms.

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Row;
use socialize_core::{
  content::{Comment, Post},
  notification::{Notification, NotificationView},
  reaction::{Reaction, Target},
  user::{User, UserSummary},
  view::{CommentView, PostView},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn decode_discriminant<T: FromStr>(column: &'static str, s: &str) -> Result<T> {
  T::from_str(s).map_err(|_| Error::UnknownDiscriminant {
    column,
    value: s.to_owned(),
  })
}

fn decode_count(n: i64) -> u64 { u64::try_from(n).unwrap_or(0) }

/// Escape `%`, `_` and `\` for a `LIKE ... ESCAPE '\'` pattern.
pub fn escape_like(s: &str) -> String {
  let mut out = String::with_capacity(s.len());
  for c in s.chars() {
    if matches!(c, '%' | '_' | '\\') {
      out.push('\\');
    }
    out.push(c);
  }
  out
}

// ─── Row types ───────────────────────────────────────────────────────────────

pub const USER_COLUMNS: &str = "user_id, handle, display_name, email, \
                                password_hash, avatar, bio, follower_count, \
                                following_count, created_at";

/// Raw values read directly from a `users` row, in [`USER_COLUMNS`] order.
pub struct RawUser {
  pub user_id:         String,
  pub handle:          String,
  pub display_name:    String,
  pub email:           String,
  pub password_hash:   String,
  pub avatar:          Option<String>,
  pub bio:             String,
  pub follower_count:  i64,
  pub following_count: i64,
  pub created_at:      String,
}

impl RawUser {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:         row.get(0)?,
      handle:          row.get(1)?,
      display_name:    row.get(2)?,
      email:           row.get(3)?,
      password_hash:   row.get(4)?,
      avatar:          row.get(5)?,
      bio:             row.get(6)?,
      follower_count:  row.get(7)?,
      following_count: row.get(8)?,
      created_at:      row.get(9)?,
    })
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      user_id:         decode_uuid(&self.user_id)?,
      handle:          self.handle,
      display_name:    self.display_name,
      email:           self.email,
      password_hash:   self.password_hash,
      avatar:          self.avatar,
      bio:             self.bio,
      follower_count:  decode_count(self.follower_count),
      following_count: decode_count(self.following_count),
      created_at:      decode_dt(&self.created_at)?,
    })
  }
}

/// `user_id, handle, display_name, avatar` read at column `offset`.
pub struct RawSummary {
  pub user_id:      String,
  pub handle:       String,
  pub display_name: String,
  pub avatar:       Option<String>,
}

impl RawSummary {
  pub fn from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:      row.get(offset)?,
      handle:       row.get(offset + 1)?,
      display_name: row.get(offset + 2)?,
      avatar:       row.get(offset + 3)?,
    })
  }

  pub fn into_summary(self) -> Result<UserSummary> {
    Ok(UserSummary {
      user_id:      decode_uuid(&self.user_id)?,
      handle:       self.handle,
      display_name: self.display_name,
      avatar:       self.avatar,
    })
  }
}

pub const POST_COLUMNS: &str = "p.post_id, p.author_id, p.content, p.image_ref, \
                                p.like_count, p.comment_count, p.created_at";

pub struct RawPost {
  pub post_id:       String,
  pub author_id:     String,
  pub content:       String,
  pub image_ref:     Option<String>,
  pub like_count:    i64,
  pub comment_count: i64,
  pub created_at:    String,
}

impl RawPost {
  /// Seven columns in [`POST_COLUMNS`] order.
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      post_id:       row.get(0)?,
      author_id:     row.get(1)?,
      content:       row.get(2)?,
      image_ref:     row.get(3)?,
      like_count:    row.get(4)?,
      comment_count: row.get(5)?,
      created_at:    row.get(6)?,
    })
  }

  pub fn into_post(self) -> Result<Post> {
    Ok(Post {
      post_id:       decode_uuid(&self.post_id)?,
      author_id:     decode_uuid(&self.author_id)?,
      content:       self.content,
      image_ref:     self.image_ref,
      like_count:    decode_count(self.like_count),
      comment_count: decode_count(self.comment_count),
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

pub const COMMENT_COLUMNS: &str = "c.comment_id, c.post_id, c.author_id, \
                                   c.content, c.like_count, c.created_at";

pub struct RawComment {
  pub comment_id: String,
  pub post_id:    String,
  pub author_id:  String,
  pub content:    String,
  pub like_count: i64,
  pub created_at: String,
}

impl RawComment {
  /// Six columns in [`COMMENT_COLUMNS`] order.
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      comment_id: row.get(0)?,
      post_id:    row.get(1)?,
      author_id:  row.get(2)?,
      content:    row.get(3)?,
      like_count: row.get(4)?,
      created_at: row.get(5)?,
    })
  }

  pub fn into_comment(self) -> Result<Comment> {
    Ok(Comment {
      comment_id: decode_uuid(&self.comment_id)?,
      post_id:    decode_uuid(&self.post_id)?,
      author_id:  decode_uuid(&self.author_id)?,
      content:    self.content,
      like_count: decode_count(self.like_count),
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// A post row, its author (columns 7..=10) and the viewer's like state
/// (column 11).
pub struct RawPostView {
  pub post:   RawPost,
  pub author: RawSummary,
  pub liked:  Option<bool>,
}

impl RawPostView {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      post:   RawPost::from_row(row)?,
      author: RawSummary::from_row(row, 7)?,
      liked:  row.get(11)?,
    })
  }

  pub fn into_view(self) -> Result<PostView> {
    Ok(PostView {
      post:            self.post.into_post()?,
      author:          self.author.into_summary()?,
      liked_by_viewer: self.liked,
    })
  }
}

/// A comment row, its author (columns 6..=9) and the viewer's like state
/// (column 10).
pub struct RawCommentView {
  pub comment: RawComment,
  pub author:  RawSummary,
  pub liked:   Option<bool>,
}

impl RawCommentView {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      comment: RawComment::from_row(row)?,
      author:  RawSummary::from_row(row, 6)?,
      liked:   row.get(10)?,
    })
  }

  pub fn into_view(self) -> Result<CommentView> {
    Ok(CommentView {
      comment:         self.comment.into_comment()?,
      author:          self.author.into_summary()?,
      liked_by_viewer: self.liked,
    })
  }
}

pub struct RawReaction {
  pub user_id:     String,
  pub target_type: String,
  pub target_id:   String,
  pub created_at:  String,
}

impl RawReaction {
  pub fn into_reaction(self) -> Result<Reaction> {
    Ok(Reaction {
      user_id:    decode_uuid(&self.user_id)?,
      target:     Target {
        target_type: decode_discriminant("target_type", &self.target_type)?,
        target_id:   decode_uuid(&self.target_id)?,
      },
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

pub const NOTIFICATION_COLUMNS: &str = "notification_id, recipient_id, sender_id, \
                                        kind, post_id, comment_id, is_read, \
                                        created_at";

pub struct RawNotification {
  pub notification_id: String,
  pub recipient_id:    String,
  pub sender_id:       String,
  pub kind:            String,
  pub post_id:         Option<String>,
  pub comment_id:      Option<String>,
  pub is_read:         bool,
  pub created_at:      String,
}

impl RawNotification {
  /// Eight columns in [`NOTIFICATION_COLUMNS`] order.
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      notification_id: row.get(0)?,
      recipient_id:    row.get(1)?,
      sender_id:       row.get(2)?,
      kind:            row.get(3)?,
      post_id:         row.get(4)?,
      comment_id:      row.get(5)?,
      is_read:         row.get(6)?,
      created_at:      row.get(7)?,
    })
  }

  pub fn into_notification(self) -> Result<Notification> {
    Ok(Notification {
      notification_id: decode_uuid(&self.notification_id)?,
      recipient_id:    decode_uuid(&self.recipient_id)?,
      sender_id:       decode_uuid(&self.sender_id)?,
      kind:            decode_discriminant("kind", &self.kind)?,
      post_id:         self.post_id.as_deref().map(decode_uuid).transpose()?,
      comment_id:      self.comment_id.as_deref().map(decode_uuid).transpose()?,
      is_read:         self.is_read,
      created_at:      decode_dt(&self.created_at)?,
    })
  }
}

/// A notification row followed by its sender (columns 8..=11).
pub struct RawNotificationView {
  pub notification: RawNotification,
  pub sender:       RawSummary,
}

impl RawNotificationView {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      notification: RawNotification::from_row(row)?,
      sender:       RawSummary::from_row(row, 8)?,
    })
  }

  pub fn into_view(self) -> Result<NotificationView> {
    Ok(NotificationView {
      notification: self.notification.into_notification()?,
      sender:       self.sender.into_summary()?,
    })
  }
}
