//! Read models for feeds and threads, and keyset pagination.
//!
//! Views are never stored; they are joined on read from content, authors and
//! the reaction ledger.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  content::{Comment, Post},
  user::UserSummary,
};

pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const MAX_PAGE_SIZE: usize = 100;

/// Clamp a client-requested page size into `1..=MAX_PAGE_SIZE`.
pub fn page_size(requested: Option<usize>) -> usize {
  requested.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
}

// ─── Pagination ──────────────────────────────────────────────────────────────

/// Position after which the next page starts: the `(created_at, id)` of the
/// last item of the previous page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
  pub created_at: DateTime<Utc>,
  pub id:         Uuid,
}

#[derive(Debug, Clone)]
pub struct Page<T> {
  pub items:       Vec<T>,
  /// Present when the page is full and more items may follow.
  pub next_cursor: Option<Cursor>,
}

impl<T> Page<T> {
  /// Wrap a page of `items` fetched with `limit`, deriving the next cursor
  /// from the last item.
  pub fn new(items: Vec<T>, limit: usize, key: impl Fn(&T) -> Cursor) -> Self {
    let next_cursor = if items.len() >= limit {
      items.last().map(key)
    } else {
      None
    };
    Self { items, next_cursor }
  }
}

// ─── Queries ─────────────────────────────────────────────────────────────────

/// Parameters for [`crate::store::SocialStore::list_posts`].
/// Posts come newest first.
#[derive(Debug, Clone, Default)]
pub struct PostQuery {
  /// When set, each view reports whether this user likes the post.
  pub viewer: Option<Uuid>,
  /// Restrict to one author (profile pages).
  pub author: Option<Uuid>,
  pub cursor: Option<Cursor>,
  pub limit:  usize,
}

/// Parameters for [`crate::store::SocialStore::list_comments`].
/// Comments come oldest first.
#[derive(Debug, Clone)]
pub struct CommentQuery {
  pub post_id: Uuid,
  pub viewer:  Option<Uuid>,
  pub cursor:  Option<Cursor>,
  pub limit:   usize,
}

// ─── Views ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostView {
  #[serde(flatten)]
  pub post:            Post,
  pub author:          UserSummary,
  /// `None` when there is no viewer.
  pub liked_by_viewer: Option<bool>,
}

impl PostView {
  pub fn cursor(&self) -> Cursor {
    Cursor { created_at: self.post.created_at, id: self.post.post_id }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentView {
  #[serde(flatten)]
  pub comment:         Comment,
  pub author:          UserSummary,
  pub liked_by_viewer: Option<bool>,
}

impl CommentView {
  pub fn cursor(&self) -> Cursor {
    Cursor { created_at: self.comment.created_at, id: self.comment.comment_id }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn page_size_is_clamped() {
    assert_eq!(page_size(None), DEFAULT_PAGE_SIZE);
    assert_eq!(page_size(Some(0)), 1);
    assert_eq!(page_size(Some(10_000)), MAX_PAGE_SIZE);
  }

  #[test]
  fn short_page_has_no_next_cursor() {
    let key = |n: &i64| Cursor {
      created_at: DateTime::from_timestamp(*n, 0).unwrap(),
      id:         Uuid::nil(),
    };
    assert!(Page::new(vec![1, 2], 3, key).next_cursor.is_none());
    let full = Page::new(vec![1, 2, 3], 3, key);
    assert_eq!(full.next_cursor.unwrap().created_at.timestamp(), 3);
  }
}
