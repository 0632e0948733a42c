//! Users, the identities derived from them, and profile validation.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

pub const HANDLE_MAX_CHARS: usize = 30;
pub const DISPLAY_NAME_MAX_CHARS: usize = 50;
pub const BIO_MAX_CHARS: usize = 200;

static HANDLE_RE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]+$").expect("valid handle regex"));
static EMAIL_RE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^.+@.+\..+$").expect("valid email regex"));

// ─── Entities ────────────────────────────────────────────────────────────────

/// A registered account. Users are never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
  pub user_id:         Uuid,
  /// Unique, compared case-insensitively. Always mentionable as `@handle`.
  pub handle:          String,
  pub display_name:    String,
  pub email:           String,
  /// Argon2 PHC string. Never sent to clients.
  #[serde(skip_serializing, default)]
  pub password_hash:   String,
  pub avatar:          Option<String>,
  pub bio:             String,
  pub follower_count:  u64,
  pub following_count: u64,
  pub created_at:      DateTime<Utc>,
}

/// Input to [`crate::store::SocialStore::create_user`].
#[derive(Debug, Clone)]
pub struct NewUser {
  pub handle:        String,
  pub display_name:  String,
  pub email:         String,
  pub password_hash: String,
}

impl NewUser {
  /// Trim and validate registration fields. The password must already be
  /// hashed by the caller.
  pub fn new(
    handle: &str,
    display_name: &str,
    email: &str,
    password_hash: String,
  ) -> Result<Self> {
    let handle = handle.trim().trim_start_matches('@').to_owned();
    validate_handle(&handle)?;
    let display_name = validate_display_name(display_name)?;
    let email = email.trim().to_owned();
    if !EMAIL_RE.is_match(&email) {
      return Err(Error::Validation("a valid email is required".into()));
    }
    Ok(Self { handle, display_name, email, password_hash })
  }
}

/// The stable identity carried by a verified session credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
  pub user_id: Uuid,
  pub handle:  String,
}

impl From<&User> for Identity {
  fn from(u: &User) -> Self {
    Self { user_id: u.user_id, handle: u.handle.clone() }
  }
}

// ─── Read models ─────────────────────────────────────────────────────────────

/// The author block embedded in feed, comment and notification views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
  pub user_id:      Uuid,
  pub handle:       String,
  pub display_name: String,
  pub avatar:       Option<String>,
}

impl From<&User> for UserSummary {
  fn from(u: &User) -> Self {
    Self {
      user_id:      u.user_id,
      handle:       u.handle.clone(),
      display_name: u.display_name.clone(),
      avatar:       u.avatar.clone(),
    }
  }
}

/// Public profile: everything except credentials and contact details.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
  pub user_id:         Uuid,
  pub handle:          String,
  pub display_name:    String,
  pub avatar:          Option<String>,
  pub bio:             String,
  pub follower_count:  u64,
  pub following_count: u64,
  pub created_at:      DateTime<Utc>,
}

impl From<User> for UserProfile {
  fn from(u: User) -> Self {
    Self {
      user_id:         u.user_id,
      handle:          u.handle,
      display_name:    u.display_name,
      avatar:          u.avatar,
      bio:             u.bio,
      follower_count:  u.follower_count,
      following_count: u.following_count,
      created_at:      u.created_at,
    }
  }
}

// ─── Profile edits ───────────────────────────────────────────────────────────

/// A partial profile edit; `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
  pub display_name: Option<String>,
  pub bio:          Option<String>,
  /// An empty string clears the avatar.
  pub avatar:       Option<String>,
}

impl ProfileUpdate {
  /// Trim and validate every present field.
  pub fn validated(self) -> Result<Self> {
    let display_name = self
      .display_name
      .as_deref()
      .map(validate_display_name)
      .transpose()?;
    let bio = match self.bio {
      Some(b) => {
        let b = b.trim().to_owned();
        if b.chars().count() > BIO_MAX_CHARS {
          return Err(Error::Validation(format!(
            "bio must be at most {BIO_MAX_CHARS} characters"
          )));
        }
        Some(b)
      }
      None => None,
    };
    let avatar = self.avatar.map(|a| a.trim().to_owned());
    Ok(Self { display_name, bio, avatar })
  }

  pub fn is_empty(&self) -> bool {
    self.display_name.is_none() && self.bio.is_none() && self.avatar.is_none()
  }
}

// ─── Validation ──────────────────────────────────────────────────────────────

pub fn validate_handle(handle: &str) -> Result<()> {
  if handle.is_empty() || handle.chars().count() > HANDLE_MAX_CHARS {
    return Err(Error::Validation(format!(
      "handle must be 1 to {HANDLE_MAX_CHARS} characters"
    )));
  }
  if !HANDLE_RE.is_match(handle) {
    return Err(Error::Validation(
      "handle may only contain letters, digits and underscores".into(),
    ));
  }
  Ok(())
}

fn validate_display_name(name: &str) -> Result<String> {
  let name = name.trim();
  if name.is_empty() || name.chars().count() > DISPLAY_NAME_MAX_CHARS {
    return Err(Error::Validation(format!(
      "display name must be 1 to {DISPLAY_NAME_MAX_CHARS} characters"
    )));
  }
  Ok(name.to_owned())
}
