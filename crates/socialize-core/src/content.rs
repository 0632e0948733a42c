//! Posts and comments, the content that reactions and notifications refer to.
//!
//! `like_count` and `comment_count` are denormalised caches over the reaction
//! ledger and the comment table. They are adjusted at mutation time and
//! repaired by [`crate::store::SocialStore::recount_counters`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

pub const POST_MAX_CHARS: usize = 500;
pub const COMMENT_MAX_CHARS: usize = 300;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
  pub post_id:       Uuid,
  pub author_id:     Uuid,
  pub content:       String,
  /// Opaque reference to an uploaded image; upload itself happens elsewhere.
  pub image_ref:     Option<String>,
  pub like_count:    u64,
  pub comment_count: u64,
  pub created_at:    DateTime<Utc>,
}

impl Post {
  /// Build a new post with zeroed counters, validating its content.
  ///
  /// Content is trimmed; a post needs text or an image.
  pub fn new(
    author_id: Uuid,
    content: &str,
    image_ref: Option<&str>,
  ) -> Result<Self> {
    let content = content.trim().to_owned();
    let image_ref = image_ref
      .map(str::trim)
      .filter(|s| !s.is_empty())
      .map(str::to_owned);

    if content.is_empty() && image_ref.is_none() {
      return Err(Error::Validation("a post needs text or an image".into()));
    }
    if content.chars().count() > POST_MAX_CHARS {
      return Err(Error::Validation(format!(
        "a post must be at most {POST_MAX_CHARS} characters"
      )));
    }

    Ok(Self {
      post_id: Uuid::now_v7(),
      author_id,
      content,
      image_ref,
      like_count: 0,
      comment_count: 0,
      created_at: Utc::now(),
    })
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
  pub comment_id: Uuid,
  /// A comment belongs to exactly one post.
  pub post_id:    Uuid,
  pub author_id:  Uuid,
  pub content:    String,
  pub like_count: u64,
  pub created_at: DateTime<Utc>,
}

impl Comment {
  /// Build a new comment, rejecting empty or whitespace-only text.
  pub fn new(post_id: Uuid, author_id: Uuid, content: &str) -> Result<Self> {
    let content = content.trim().to_owned();
    if content.is_empty() {
      return Err(Error::Validation("a comment cannot be empty".into()));
    }
    if content.chars().count() > COMMENT_MAX_CHARS {
      return Err(Error::Validation(format!(
        "a comment must be at most {COMMENT_MAX_CHARS} characters"
      )));
    }

    Ok(Self {
      comment_id: Uuid::now_v7(),
      post_id,
      author_id,
      content,
      like_count: 0,
      created_at: Utc::now(),
    })
  }
}

/// What a cascading delete removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CascadeReport {
  pub comments:      u64,
  pub reactions:     u64,
  pub notifications: u64,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn post_needs_text_or_image() {
    let author = Uuid::now_v7();
    assert!(matches!(Post::new(author, "   ", None), Err(Error::Validation(_))));
    assert!(matches!(Post::new(author, "", Some("  ")), Err(Error::Validation(_))));

    let image_only = Post::new(author, "", Some("img/1.png")).unwrap();
    assert_eq!(image_only.image_ref.as_deref(), Some("img/1.png"));
    assert_eq!(image_only.like_count, 0);
  }

  #[test]
  fn post_rejects_oversized_content() {
    let long = "a".repeat(POST_MAX_CHARS + 1);
    assert!(Post::new(Uuid::now_v7(), &long, None).is_err());
  }

  #[test]
  fn comment_is_trimmed_and_non_empty() {
    let c = Comment::new(Uuid::now_v7(), Uuid::now_v7(), "  oi  ").unwrap();
    assert_eq!(c.content, "oi");
    assert!(Comment::new(Uuid::now_v7(), Uuid::now_v7(), " \n\t ").is_err());
  }
}
