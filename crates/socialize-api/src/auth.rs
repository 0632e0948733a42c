//! Session credentials: HS256 JWTs carried in the `token` cookie or an
//! `Authorization: Bearer` header, plus argon2 password hashing.

use std::convert::Infallible;

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::SaltString,
};
use axum::{
  extract::{FromRequestParts, OptionalFromRequestParts},
  http::{header, request::Parts},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
  Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};
use socialize_core::{Error, store::SocialStore, user::Identity};
use uuid::Uuid;

use crate::{AppState, error::ApiError};

pub const SESSION_COOKIE: &str = "token";

// ─── Tokens ──────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Claims {
  user_id: Uuid,
  handle:  String,
  iat:     i64,
  exp:     i64,
}

/// Issues and verifies session tokens. Verification is stateless.
pub struct SessionKeys {
  encoding:   EncodingKey,
  decoding:   DecodingKey,
  validation: Validation,
  ttl:        Duration,
}

impl SessionKeys {
  pub fn new(secret: &[u8], ttl_secs: u64) -> Self {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    Self {
      encoding: EncodingKey::from_secret(secret),
      decoding: DecodingKey::from_secret(secret),
      validation,
      ttl: Duration::seconds(i64::from(u32::try_from(ttl_secs).unwrap_or(u32::MAX))),
    }
  }

  pub fn ttl(&self) -> Duration { self.ttl }

  /// Sign a token for `identity` valid for the configured TTL.
  pub fn issue(&self, identity: &Identity) -> Result<String, ApiError> {
    self.issue_at(identity, Utc::now())
  }

  fn issue_at(
    &self,
    identity: &Identity,
    issued_at: DateTime<Utc>,
  ) -> Result<String, ApiError> {
    let claims = Claims {
      user_id: identity.user_id,
      handle:  identity.handle.clone(),
      iat:     issued_at.timestamp(),
      exp:     (issued_at + self.ttl).timestamp(),
    };
    encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
      .map_err(|e| ApiError::Internal(format!("token signing failed: {e}")))
  }

  /// Check signature and expiry. Every failure is [`Error::Unauthenticated`].
  pub fn verify(&self, token: &str) -> Result<Identity, Error> {
    let data = decode::<Claims>(token, &self.decoding, &self.validation)
      .map_err(|e| {
        tracing::debug!(error = %e, "rejected session token");
        Error::Unauthenticated
      })?;
    Ok(Identity { user_id: data.claims.user_id, handle: data.claims.handle })
  }
}

// ─── Cookies ─────────────────────────────────────────────────────────────────

/// The HTTP-only cookie carrying a freshly issued token.
pub fn session_cookie<S: SocialStore>(token: String, state: &AppState<S>) -> Cookie<'static> {
  Cookie::build((SESSION_COOKIE, token))
    .path("/")
    .http_only(true)
    .same_site(SameSite::Lax)
    .secure(state.config.secure_cookies)
    .max_age(time::Duration::seconds(state.sessions.ttl().num_seconds()))
    .build()
}

/// A cookie that makes the client drop its session.
pub fn cleared_session_cookie() -> Cookie<'static> {
  Cookie::build((SESSION_COOKIE, ""))
    .path("/")
    .http_only(true)
    .same_site(SameSite::Lax)
    .expires(time::OffsetDateTime::now_utc() - time::Duration::days(1))
    .max_age(time::Duration::ZERO)
    .build()
}

// ─── Extractors ──────────────────────────────────────────────────────────────

/// The verified identity of the caller. Rejects with 401 when the request
/// carries no valid credential.
#[derive(Debug, Clone)]
pub struct Session(pub Identity);

impl Session {
  pub fn user_id(&self) -> Uuid { self.0.user_id }
}

/// The cookie wins over the header when both are present.
fn credential(parts: &Parts) -> Option<String> {
  CookieJar::from_headers(&parts.headers)
    .get(SESSION_COOKIE)
    .map(|c| c.value().to_owned())
    .filter(|v| !v.is_empty())
    .or_else(|| {
      parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_owned())
    })
}

impl<S> FromRequestParts<AppState<S>> for Session
where
  S: SocialStore + Clone + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let token = credential(parts).ok_or(Error::Unauthenticated)?;
    Ok(Session(state.sessions.verify(&token)?))
  }
}

/// `Option<Session>`: anonymous when the credential is missing or invalid.
impl<S> OptionalFromRequestParts<AppState<S>> for Session
where
  S: SocialStore + Clone + 'static,
{
  type Rejection = Infallible;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Option<Self>, Self::Rejection> {
    Ok(
      credential(parts)
        .and_then(|token| state.sessions.verify(&token).ok())
        .map(Session),
    )
  }
}

// ─── Passwords ───────────────────────────────────────────────────────────────

/// Hash a password into an argon2 PHC string.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|h| h.to_string())
    .map_err(|e| ApiError::Internal(format!("argon2 error: {e}")))
}

pub fn verify_password(password: &str, hash: &str) -> bool {
  PasswordHash::new(hash).is_ok_and(|parsed| {
    Argon2::default()
      .verify_password(password.as_bytes(), &parsed)
      .is_ok()
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use axum::http::Request;

  fn identity() -> Identity {
    Identity { user_id: Uuid::now_v7(), handle: "joao".into() }
  }

  #[test]
  fn issued_tokens_verify() {
    let keys = SessionKeys::new(b"secret", 3600);
    let id = identity();
    let token = keys.issue(&id).unwrap();
    assert_eq!(keys.verify(&token).unwrap(), id);
  }

  #[test]
  fn expired_tokens_are_rejected() {
    let keys = SessionKeys::new(b"secret", 60);
    let token = keys
      .issue_at(&identity(), Utc::now() - Duration::seconds(120))
      .unwrap();
    assert!(matches!(keys.verify(&token), Err(Error::Unauthenticated)));
  }

  #[test]
  fn foreign_signatures_are_rejected() {
    let ours = SessionKeys::new(b"secret", 3600);
    let theirs = SessionKeys::new(b"other-secret", 3600);
    let token = theirs.issue(&identity()).unwrap();
    assert!(matches!(ours.verify(&token), Err(Error::Unauthenticated)));
    assert!(matches!(ours.verify("not.a.jwt"), Err(Error::Unauthenticated)));
  }

  #[test]
  fn claims_use_camel_case_user_id() {
    let keys = SessionKeys::new(b"secret", 3600);
    let token = keys.issue(&identity()).unwrap();
    let payload = token.split('.').nth(1).unwrap();
    use base64::Engine as _;
    let json = base64::engine::general_purpose::URL_SAFE_NO_PAD
      .decode(payload)
      .unwrap();
    let claims: serde_json::Value = serde_json::from_slice(&json).unwrap();
    assert!(claims.get("userId").is_some());
    assert_eq!(claims["handle"], "joao");
    assert_eq!(
      claims["exp"].as_i64().unwrap() - claims["iat"].as_i64().unwrap(),
      3600
    );
  }

  #[test]
  fn passwords_hash_and_verify() {
    let hash = hash_password("hunter22").unwrap();
    assert!(verify_password("hunter22", &hash));
    assert!(!verify_password("hunter23", &hash));
    assert!(!verify_password("hunter22", "not-a-phc-string"));
  }

  fn parts(header: Option<(header::HeaderName, String)>) -> Parts {
    let mut builder = Request::builder();
    if let Some((name, value)) = header {
      builder = builder.header(name, value);
    }
    builder.body(()).unwrap().into_parts().0
  }

  #[test]
  fn credential_from_cookie_or_bearer() {
    assert_eq!(
      credential(&parts(Some((header::COOKIE, "a=1; token=abc".into())))),
      Some("abc".into())
    );
    assert_eq!(
      credential(&parts(Some((header::AUTHORIZATION, "Bearer xyz".into())))),
      Some("xyz".into())
    );
    assert_eq!(
      credential(&parts(Some((header::AUTHORIZATION, "Basic xyz".into())))),
      None
    );
    assert_eq!(credential(&parts(None)), None);
  }
}
