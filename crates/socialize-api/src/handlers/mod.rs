//! HTTP handlers, one module per resource.
//!
//! Lists page with an opaque `cursor` (base64 of the last item's timestamp
//! and id) and a `limit` clamped to `1..=100`.

pub mod auth;
pub mod comments;
pub mod notifications;
pub mod posts;
pub mod users;

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use socialize_core::view::{Cursor, Page, page_size};
use uuid::Uuid;

use crate::error::ApiError;

// ─── Cursors ─────────────────────────────────────────────────────────────────

pub fn encode_cursor(cursor: Cursor) -> String {
  let raw = format!(
    "{}|{}",
    cursor.created_at.to_rfc3339_opts(SecondsFormat::Micros, true),
    cursor.id
  );
  URL_SAFE_NO_PAD.encode(raw)
}

pub fn decode_cursor(s: &str) -> Result<Cursor, ApiError> {
  let invalid = || ApiError::BadRequest("invalid cursor".into());
  let bytes = URL_SAFE_NO_PAD.decode(s).map_err(|_| invalid())?;
  let raw = String::from_utf8(bytes).map_err(|_| invalid())?;
  let (ts, id) = raw.split_once('|').ok_or_else(invalid)?;
  Ok(Cursor {
    created_at: DateTime::parse_from_rfc3339(ts)
      .map_err(|_| invalid())?
      .with_timezone(&Utc),
    id:         Uuid::parse_str(id).map_err(|_| invalid())?,
  })
}

// ─── Paging ──────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
  pub cursor: Option<String>,
  pub limit:  Option<usize>,
}

impl PageParams {
  pub fn cursor(&self) -> Result<Option<Cursor>, ApiError> {
    self.cursor.as_deref().map(decode_cursor).transpose()
  }

  pub fn limit(&self) -> usize { page_size(self.limit) }
}

/// A page as sent to clients.
#[derive(Debug, Serialize)]
pub struct Paged<T> {
  pub items:       Vec<T>,
  pub next_cursor: Option<String>,
}

impl<T> From<Page<T>> for Paged<T> {
  fn from(page: Page<T>) -> Self {
    Self {
      items:       page.items,
      next_cursor: page.next_cursor.map(encode_cursor),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn cursor_survives_the_wire() {
    let cursor = Cursor {
      created_at: DateTime::parse_from_rfc3339("2024-05-01T12:00:00.123456Z")
        .unwrap()
        .with_timezone(&Utc),
      id:         Uuid::now_v7(),
    };
    assert_eq!(decode_cursor(&encode_cursor(cursor)).unwrap(), cursor);
  }

  #[test]
  fn garbage_cursors_are_bad_requests() {
    for bad in ["", "%%%", "bm90LWEtY3Vyc29y", URL_SAFE_NO_PAD.encode("x|y").as_str()] {
      assert!(matches!(decode_cursor(bad), Err(ApiError::BadRequest(_))), "{bad}");
    }
  }
}
