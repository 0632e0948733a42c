//! The `SocialStore` trait.
//!
//! The trait is implemented by storage backends (e.g.
//! `socialize-store-sqlite`). It exposes single-statement primitives; the
//! toggle algorithm, fan-out rules and validation live in this crate and are
//! composed in [`crate::actions`].
//!
//! Every write is expected to be atomic on its own, but no two calls are
//! wrapped in a shared transaction. Cached counters are therefore eventually
//! consistent with the reaction ledger and repaired by
//! [`SocialStore::recount_counters`].

use std::future::Future;

use uuid::Uuid;

use crate::{
  content::{CascadeReport, Comment, Post},
  notification::{NewNotification, Notification, NotificationView},
  reaction::{Counter, CounterUpdate, Reaction, RecountReport, Target},
  user::{NewUser, ProfileUpdate, User, UserSummary},
  view::{CommentQuery, CommentView, Cursor, PostQuery, PostView},
};

/// Abstraction over a Socialize storage backend.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait SocialStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Persist a new user. Returns `None` if the handle or email is taken
  /// (both compared case-insensitively).
  fn create_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  fn get_user(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// Case-insensitive handle lookup.
  fn find_user_by_handle<'a>(
    &'a self,
    handle: &'a str,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;

  /// Case-insensitive email lookup, used by login.
  fn find_user_by_email<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;

  /// Resolve a set of handles to existing users; unknown handles are
  /// silently dropped.
  fn resolve_handles<'a>(
    &'a self,
    handles: &'a [String],
  ) -> impl Future<Output = Result<Vec<UserSummary>, Self::Error>> + Send + 'a;

  /// Users whose handle starts with `prefix`, case-insensitively.
  fn search_users<'a>(
    &'a self,
    prefix: &'a str,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<UserSummary>, Self::Error>> + Send + 'a;

  /// Apply a validated partial edit. Returns `None` if the user is missing.
  fn update_profile(
    &self,
    id: Uuid,
    update: ProfileUpdate,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  // ── Content ───────────────────────────────────────────────────────────

  fn insert_post(
    &self,
    post: Post,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn get_post(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Post>, Self::Error>> + Send + '_;

  /// Delete a post with its comments, every reaction on the post or its
  /// comments, and every notification referring to any of them.
  /// Returns `None` if the post does not exist.
  fn delete_post(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<CascadeReport>, Self::Error>> + Send + '_;

  /// Insert a comment. Returns `false`, writing nothing, when the parent post
  /// no longer exists. The parent's comment counter is adjusted separately.
  fn insert_comment(
    &self,
    comment: Comment,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn get_comment(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Comment>, Self::Error>> + Send + '_;

  /// Delete a comment, its reactions and the notifications referring to it,
  /// and decrement the parent post's comment counter (clamped at zero).
  /// Returns `None` if the comment does not exist.
  fn delete_comment(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<CascadeReport>, Self::Error>> + Send + '_;

  /// Atomically add `delta` to a cached counter, clamping at zero.
  /// Returns `None` if the owning post or comment does not exist.
  fn adjust_counter(
    &self,
    counter: Counter,
    delta: i64,
  ) -> impl Future<Output = Result<Option<CounterUpdate>, Self::Error>> + Send + '_;

  /// Rewrite every cached counter that disagrees with the reaction ledger or
  /// the comment table.
  fn recount_counters(
    &self,
  ) -> impl Future<Output = Result<RecountReport, Self::Error>> + Send + '_;

  // ── Reaction ledger ───────────────────────────────────────────────────

  fn find_reaction(
    &self,
    user_id: Uuid,
    target: Target,
  ) -> impl Future<Output = Result<Option<Reaction>, Self::Error>> + Send + '_;

  /// Unique-insert a reaction. Returns `false` when a row for the same
  /// `(user, target)` already exists; nothing is written in that case.
  fn insert_reaction(
    &self,
    reaction: Reaction,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Hard-delete a reaction. Returns `false` if there was none.
  fn delete_reaction(
    &self,
    user_id: Uuid,
    target: Target,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Ledger truth for a target's like count. The request path reads cached
  /// counters; this is for diagnosing drift against them.
  fn count_reactions(
    &self,
    target: Target,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  // ── Notifications ─────────────────────────────────────────────────────

  /// Write a notification. Kinds with a
  /// [`dedup_key`](NewNotification::dedup_key) are upserted: an existing row
  /// with the same key is reset to unread with a fresh timestamp. Other kinds
  /// always insert a new row.
  fn record_notification(
    &self,
    input: NewNotification,
  ) -> impl Future<Output = Result<Notification, Self::Error>> + Send + '_;

  /// Delete the keyed notification matching `input`. Returns `false` if
  /// there was none or the kind is not keyed.
  fn retract_notification<'a>(
    &'a self,
    input: &'a NewNotification,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// A recipient's notifications, newest first, joined with their senders.
  fn list_notifications(
    &self,
    recipient_id: Uuid,
    cursor: Option<Cursor>,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<NotificationView>, Self::Error>> + Send + '_;

  fn unread_notification_count(
    &self,
    recipient_id: Uuid,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// Mark one notification read, only if `recipient_id` owns it.
  /// Returns `false` when it is missing or owned by someone else.
  fn mark_notification_read(
    &self,
    id: Uuid,
    recipient_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Mark every unread notification of `recipient_id` read; returns how many
  /// changed.
  fn mark_all_notifications_read(
    &self,
    recipient_id: Uuid,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  // ── Feed reads ────────────────────────────────────────────────────────

  fn list_posts<'a>(
    &'a self,
    query: &'a PostQuery,
  ) -> impl Future<Output = Result<Vec<PostView>, Self::Error>> + Send + 'a;

  fn list_comments<'a>(
    &'a self,
    query: &'a CommentQuery,
  ) -> impl Future<Output = Result<Vec<CommentView>, Self::Error>> + Send + 'a;
}
