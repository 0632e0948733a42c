//! [`SqliteStore`], the SQLite implementation of [`SocialStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use socialize_core::{
  content::{CascadeReport, Comment, Post},
  notification::{NewNotification, Notification, NotificationView},
  reaction::{Counter, CounterUpdate, Reaction, RecountReport, Target},
  store::SocialStore,
  user::{NewUser, ProfileUpdate, User, UserSummary},
  view::{CommentQuery, CommentView, Cursor, PostQuery, PostView},
};

use crate::{
  Error, Result,
  encode::{
    COMMENT_COLUMNS, NOTIFICATION_COLUMNS, POST_COLUMNS, RawComment,
    RawCommentView, RawNotification, RawNotificationView, RawPost,
    RawPostView, RawReaction, RawSummary, RawUser, USER_COLUMNS, encode_dt,
    encode_uuid, escape_like,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Socialize store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn user_where(
    &self,
    column: &'static str,
    value: String,
  ) -> Result<Option<User>> {
    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = ?1"),
            rusqlite::params![value],
            RawUser::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }
}

/// `(table, key column, counter column, row id)` backing a cached counter.
fn counter_column(counter: Counter) -> (&'static str, &'static str, &'static str, Uuid) {
  match counter {
    Counter::PostLikes(id) => ("posts", "post_id", "like_count", id),
    Counter::PostComments(id) => ("posts", "post_id", "comment_count", id),
    Counter::CommentLikes(id) => ("comments", "comment_id", "like_count", id),
  }
}

fn cursor_params(cursor: Option<Cursor>) -> (Option<String>, Option<String>) {
  match cursor {
    Some(c) => (Some(encode_dt(c.created_at)), Some(encode_uuid(c.id))),
    None => (None, None),
  }
}

// ─── SocialStore impl ────────────────────────────────────────────────────────

impl SocialStore for SqliteStore {
  type Error = Error;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn create_user(&self, input: NewUser) -> Result<Option<User>> {
    let user = User {
      user_id:         Uuid::now_v7(),
      handle:          input.handle,
      display_name:    input.display_name,
      email:           input.email,
      password_hash:   input.password_hash,
      avatar:          None,
      bio:             String::new(),
      follower_count:  0,
      following_count: 0,
      created_at:      Utc::now(),
    };

    let id_str   = encode_uuid(user.user_id);
    let at_str   = encode_dt(user.created_at);
    let handle   = user.handle.clone();
    let name     = user.display_name.clone();
    let email    = user.email.clone();
    let hash     = user.password_hash.clone();

    let inserted = self
      .conn
      .call(move |conn| {
        let n = conn.execute(
          "INSERT INTO users (user_id, handle, display_name, email, password_hash, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)
           ON CONFLICT DO NOTHING",
          rusqlite::params![id_str, handle, name, email, hash, at_str],
        )?;
        Ok(n == 1)
      })
      .await?;

    Ok(inserted.then_some(user))
  }

  async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
    self.user_where("user_id", encode_uuid(id)).await
  }

  async fn find_user_by_handle(&self, handle: &str) -> Result<Option<User>> {
    self.user_where("handle", handle.to_owned()).await
  }

  async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
    self.user_where("email", email.trim().to_owned()).await
  }

  async fn resolve_handles(&self, handles: &[String]) -> Result<Vec<UserSummary>> {
    if handles.is_empty() {
      return Ok(Vec::new());
    }
    let handles = handles.to_vec();

    let raws: Vec<RawSummary> = self
      .conn
      .call(move |conn| {
        let placeholders = (1..=handles.len())
          .map(|i| format!("?{i}"))
          .collect::<Vec<_>>()
          .join(", ");
        let mut stmt = conn.prepare(&format!(
          "SELECT user_id, handle, display_name, avatar
           FROM users WHERE handle IN ({placeholders})"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(handles.iter()), |row| {
            RawSummary::from_row(row, 0)
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSummary::into_summary).collect()
  }

  async fn search_users(&self, prefix: &str, limit: usize) -> Result<Vec<UserSummary>> {
    let pattern   = format!("{}%", escape_like(prefix));
    let limit_val = limit as i64;

    let raws: Vec<RawSummary> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT user_id, handle, display_name, avatar
           FROM users
           WHERE handle LIKE ?1 ESCAPE '\\'
           ORDER BY handle COLLATE NOCASE
           LIMIT ?2",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![pattern, limit_val], |row| {
            RawSummary::from_row(row, 0)
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSummary::into_summary).collect()
  }

  async fn update_profile(&self, id: Uuid, update: ProfileUpdate) -> Result<Option<User>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!(
              "UPDATE users SET
                 display_name = COALESCE(?2, display_name),
                 bio          = COALESCE(?3, bio),
                 avatar       = CASE WHEN ?4 IS NULL THEN avatar
                                     WHEN ?4 = ''   THEN NULL
                                     ELSE ?4 END
               WHERE user_id = ?1
               RETURNING {USER_COLUMNS}"
            ),
            rusqlite::params![id_str, update.display_name, update.bio, update.avatar],
            RawUser::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  // ── Content ───────────────────────────────────────────────────────────────

  async fn insert_post(&self, post: Post) -> Result<()> {
    let post_id_str   = encode_uuid(post.post_id);
    let author_id_str = encode_uuid(post.author_id);
    let at_str        = encode_dt(post.created_at);
    let like_count    = post.like_count as i64;
    let comment_count = post.comment_count as i64;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO posts (
             post_id, author_id, content, image_ref,
             like_count, comment_count, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            post_id_str,
            author_id_str,
            post.content,
            post.image_ref,
            like_count,
            comment_count,
            at_str,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_post(&self, id: Uuid) -> Result<Option<Post>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawPost> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {POST_COLUMNS} FROM posts p WHERE p.post_id = ?1"),
            rusqlite::params![id_str],
            RawPost::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawPost::into_post).transpose()
  }

  async fn delete_post(&self, id: Uuid) -> Result<Option<CascadeReport>> {
    let id_str = encode_uuid(id);

    let report = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let exists = tx
          .query_row(
            "SELECT 1 FROM posts WHERE post_id = ?1",
            rusqlite::params![id_str],
            |_| Ok(()),
          )
          .optional()?
          .is_some();
        if !exists {
          return Ok(None);
        }

        let notifications = tx.execute(
          "DELETE FROM notifications
           WHERE post_id = ?1
              OR comment_id IN (SELECT comment_id FROM comments WHERE post_id = ?1)",
          rusqlite::params![id_str],
        )?;
        let reactions = tx.execute(
          "DELETE FROM reactions
           WHERE (target_type = 'post' AND target_id = ?1)
              OR (target_type = 'comment'
                  AND target_id IN (SELECT comment_id FROM comments WHERE post_id = ?1))",
          rusqlite::params![id_str],
        )?;
        let comments = tx.execute(
          "DELETE FROM comments WHERE post_id = ?1",
          rusqlite::params![id_str],
        )?;
        tx.execute("DELETE FROM posts WHERE post_id = ?1", rusqlite::params![id_str])?;
        tx.commit()?;

        Ok(Some(CascadeReport {
          comments:      comments as u64,
          reactions:     reactions as u64,
          notifications: notifications as u64,
        }))
      })
      .await?;

    Ok(report)
  }

  async fn insert_comment(&self, comment: Comment) -> Result<bool> {
    let comment_id_str = encode_uuid(comment.comment_id);
    let post_id_str    = encode_uuid(comment.post_id);
    let author_id_str  = encode_uuid(comment.author_id);
    let at_str         = encode_dt(comment.created_at);
    let like_count     = comment.like_count as i64;

    let inserted = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "INSERT INTO comments (
             comment_id, post_id, author_id, content, like_count, created_at
           )
           SELECT ?1, ?2, ?3, ?4, ?5, ?6
           WHERE EXISTS (SELECT 1 FROM posts WHERE post_id = ?2)",
          rusqlite::params![
            comment_id_str,
            post_id_str,
            author_id_str,
            comment.content,
            like_count,
            at_str,
          ],
        )?;
        Ok(changed == 1)
      })
      .await?;
    Ok(inserted)
  }

  async fn get_comment(&self, id: Uuid) -> Result<Option<Comment>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawComment> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {COMMENT_COLUMNS} FROM comments c WHERE c.comment_id = ?1"),
            rusqlite::params![id_str],
            RawComment::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawComment::into_comment).transpose()
  }

  async fn delete_comment(&self, id: Uuid) -> Result<Option<CascadeReport>> {
    let id_str = encode_uuid(id);

    let report = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let post_id: Option<String> = tx
          .query_row(
            "SELECT post_id FROM comments WHERE comment_id = ?1",
            rusqlite::params![id_str],
            |r| r.get(0),
          )
          .optional()?;
        let Some(post_id) = post_id else {
          return Ok(None);
        };

        let notifications = tx.execute(
          "DELETE FROM notifications WHERE comment_id = ?1",
          rusqlite::params![id_str],
        )?;
        let reactions = tx.execute(
          "DELETE FROM reactions WHERE target_type = 'comment' AND target_id = ?1",
          rusqlite::params![id_str],
        )?;
        tx.execute(
          "DELETE FROM comments WHERE comment_id = ?1",
          rusqlite::params![id_str],
        )?;
        tx.execute(
          "UPDATE posts SET comment_count = MAX(comment_count - 1, 0) WHERE post_id = ?1",
          rusqlite::params![post_id],
        )?;
        tx.commit()?;

        Ok(Some(CascadeReport {
          comments:      1,
          reactions:     reactions as u64,
          notifications: notifications as u64,
        }))
      })
      .await?;

    Ok(report)
  }

  async fn adjust_counter(&self, counter: Counter, delta: i64) -> Result<Option<CounterUpdate>> {
    let (table, key, column, id) = counter_column(counter);
    let id_str = encode_uuid(id);

    let update = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let current: Option<i64> = tx
          .query_row(
            &format!("SELECT {column} FROM {table} WHERE {key} = ?1"),
            rusqlite::params![id_str],
            |r| r.get(0),
          )
          .optional()?;
        let Some(current) = current else {
          return Ok(None);
        };

        let wanted = current + delta;
        let value = wanted.max(0);
        tx.execute(
          &format!("UPDATE {table} SET {column} = ?2 WHERE {key} = ?1"),
          rusqlite::params![id_str, value],
        )?;
        tx.commit()?;

        Ok(Some(CounterUpdate { value: value as u64, clamped: wanted < 0 }))
      })
      .await?;

    Ok(update)
  }

  async fn recount_counters(&self) -> Result<RecountReport> {
    let report = self
      .conn
      .call(|conn| {
        let tx = conn.transaction()?;
        let post_likes = tx.execute(
          "UPDATE posts SET like_count = (
             SELECT COUNT(*) FROM reactions r
             WHERE r.target_type = 'post' AND r.target_id = posts.post_id)
           WHERE like_count != (
             SELECT COUNT(*) FROM reactions r
             WHERE r.target_type = 'post' AND r.target_id = posts.post_id)",
          [],
        )?;
        let post_comments = tx.execute(
          "UPDATE posts SET comment_count = (
             SELECT COUNT(*) FROM comments c WHERE c.post_id = posts.post_id)
           WHERE comment_count != (
             SELECT COUNT(*) FROM comments c WHERE c.post_id = posts.post_id)",
          [],
        )?;
        let comment_likes = tx.execute(
          "UPDATE comments SET like_count = (
             SELECT COUNT(*) FROM reactions r
             WHERE r.target_type = 'comment' AND r.target_id = comments.comment_id)
           WHERE like_count != (
             SELECT COUNT(*) FROM reactions r
             WHERE r.target_type = 'comment' AND r.target_id = comments.comment_id)",
          [],
        )?;
        tx.commit()?;

        Ok(RecountReport {
          post_likes:    post_likes as u64,
          post_comments: post_comments as u64,
          comment_likes: comment_likes as u64,
        })
      })
      .await?;

    Ok(report)
  }

  // ── Reaction ledger ───────────────────────────────────────────────────────

  async fn find_reaction(&self, user_id: Uuid, target: Target) -> Result<Option<Reaction>> {
    let user_str   = encode_uuid(user_id);
    let type_str   = target.target_type.as_ref().to_owned();
    let target_str = encode_uuid(target.target_id);

    let raw: Option<RawReaction> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT user_id, target_type, target_id, created_at FROM reactions
             WHERE user_id = ?1 AND target_type = ?2 AND target_id = ?3",
            rusqlite::params![user_str, type_str, target_str],
            |row| {
              Ok(RawReaction {
                user_id:     row.get(0)?,
                target_type: row.get(1)?,
                target_id:   row.get(2)?,
                created_at:  row.get(3)?,
              })
            },
          )
          .optional()?)
      })
      .await?;

    raw.map(RawReaction::into_reaction).transpose()
  }

  async fn insert_reaction(&self, reaction: Reaction) -> Result<bool> {
    let user_str   = encode_uuid(reaction.user_id);
    let type_str   = reaction.target.target_type.as_ref().to_owned();
    let target_str = encode_uuid(reaction.target.target_id);
    let at_str     = encode_dt(reaction.created_at);

    let inserted = self
      .conn
      .call(move |conn| {
        let n = conn.execute(
          "INSERT INTO reactions (user_id, target_type, target_id, created_at)
           VALUES (?1, ?2, ?3, ?4)
           ON CONFLICT DO NOTHING",
          rusqlite::params![user_str, type_str, target_str, at_str],
        )?;
        Ok(n == 1)
      })
      .await?;

    Ok(inserted)
  }

  async fn delete_reaction(&self, user_id: Uuid, target: Target) -> Result<bool> {
    let user_str   = encode_uuid(user_id);
    let type_str   = target.target_type.as_ref().to_owned();
    let target_str = encode_uuid(target.target_id);

    let deleted = self
      .conn
      .call(move |conn| {
        let n = conn.execute(
          "DELETE FROM reactions
           WHERE user_id = ?1 AND target_type = ?2 AND target_id = ?3",
          rusqlite::params![user_str, type_str, target_str],
        )?;
        Ok(n > 0)
      })
      .await?;

    Ok(deleted)
  }

  async fn count_reactions(&self, target: Target) -> Result<u64> {
    let type_str   = target.target_type.as_ref().to_owned();
    let target_str = encode_uuid(target.target_id);

    let count: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM reactions WHERE target_type = ?1 AND target_id = ?2",
          rusqlite::params![type_str, target_str],
          |r| r.get(0),
        )?)
      })
      .await?;

    Ok(count as u64)
  }

  // ── Notifications ─────────────────────────────────────────────────────────

  async fn record_notification(&self, input: NewNotification) -> Result<Notification> {
    let dedup_key      = input.dedup_key();
    let id_str         = encode_uuid(Uuid::now_v7());
    let recipient_str  = encode_uuid(input.recipient_id);
    let sender_str     = encode_uuid(input.sender_id);
    let kind_str       = input.kind.as_ref().to_owned();
    let post_str       = input.post_id.map(encode_uuid);
    let comment_str    = input.comment_id.map(encode_uuid);
    let at_str         = encode_dt(Utc::now());

    // On a dedup-key hit the existing row keeps its id and is resurfaced.
    let raw: RawNotification = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          &format!(
            "INSERT INTO notifications (
               notification_id, recipient_id, sender_id, kind,
               post_id, comment_id, is_read, created_at, dedup_key
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7, ?8)
             ON CONFLICT (dedup_key) DO UPDATE SET
               is_read    = 0,
               created_at = excluded.created_at
             RETURNING {NOTIFICATION_COLUMNS}"
          ),
          rusqlite::params![
            id_str,
            recipient_str,
            sender_str,
            kind_str,
            post_str,
            comment_str,
            at_str,
            dedup_key,
          ],
          RawNotification::from_row,
        )?)
      })
      .await?;

    raw.into_notification()
  }

  async fn retract_notification(&self, input: &NewNotification) -> Result<bool> {
    let Some(dedup_key) = input.dedup_key() else {
      return Ok(false);
    };

    let deleted = self
      .conn
      .call(move |conn| {
        let n = conn.execute(
          "DELETE FROM notifications WHERE dedup_key = ?1",
          rusqlite::params![dedup_key],
        )?;
        Ok(n > 0)
      })
      .await?;

    Ok(deleted)
  }

  async fn list_notifications(
    &self,
    recipient_id: Uuid,
    cursor: Option<Cursor>,
    limit: usize,
  ) -> Result<Vec<NotificationView>> {
    let recipient_str = encode_uuid(recipient_id);
    let (after_at, after_id) = cursor_params(cursor);
    let limit_val = limit as i64;

    let raws: Vec<RawNotificationView> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT n.notification_id, n.recipient_id, n.sender_id, n.kind,
                  n.post_id, n.comment_id, n.is_read, n.created_at,
                  u.user_id, u.handle, u.display_name, u.avatar
           FROM notifications n
           JOIN users u ON u.user_id = n.sender_id
           WHERE n.recipient_id = ?1
             AND (?2 IS NULL
                  OR n.created_at < ?2
                  OR (n.created_at = ?2 AND n.notification_id < ?3))
           ORDER BY n.created_at DESC, n.notification_id DESC
           LIMIT ?4",
        )?;
        let rows = stmt
          .query_map(
            rusqlite::params![recipient_str, after_at, after_id, limit_val],
            RawNotificationView::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawNotificationView::into_view).collect()
  }

  async fn unread_notification_count(&self, recipient_id: Uuid) -> Result<u64> {
    let recipient_str = encode_uuid(recipient_id);

    let count: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM notifications WHERE recipient_id = ?1 AND is_read = 0",
          rusqlite::params![recipient_str],
          |r| r.get(0),
        )?)
      })
      .await?;

    Ok(count as u64)
  }

  async fn mark_notification_read(&self, id: Uuid, recipient_id: Uuid) -> Result<bool> {
    let id_str        = encode_uuid(id);
    let recipient_str = encode_uuid(recipient_id);

    let updated = self
      .conn
      .call(move |conn| {
        let n = conn.execute(
          "UPDATE notifications SET is_read = 1
           WHERE notification_id = ?1 AND recipient_id = ?2",
          rusqlite::params![id_str, recipient_str],
        )?;
        Ok(n > 0)
      })
      .await?;

    Ok(updated)
  }

  async fn mark_all_notifications_read(&self, recipient_id: Uuid) -> Result<u64> {
    let recipient_str = encode_uuid(recipient_id);

    let n = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE notifications SET is_read = 1 WHERE recipient_id = ?1 AND is_read = 0",
          rusqlite::params![recipient_str],
        )?)
      })
      .await?;

    Ok(n as u64)
  }

  // ── Feed reads ────────────────────────────────────────────────────────────

  async fn list_posts(&self, query: &PostQuery) -> Result<Vec<PostView>> {
    let viewer_str = query.viewer.map(encode_uuid);
    let author_str = query.author.map(encode_uuid);
    let (after_at, after_id) = cursor_params(query.cursor);
    let limit_val = query.limit as i64;

    let raws: Vec<RawPostView> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {POST_COLUMNS},
                  u.user_id, u.handle, u.display_name, u.avatar,
                  CASE WHEN ?1 IS NULL THEN NULL
                       ELSE EXISTS (
                         SELECT 1 FROM reactions r
                         WHERE r.user_id = ?1
                           AND r.target_type = 'post'
                           AND r.target_id = p.post_id)
                  END
           FROM posts p
           JOIN users u ON u.user_id = p.author_id
           WHERE (?2 IS NULL OR p.author_id = ?2)
             AND (?3 IS NULL
                  OR p.created_at < ?3
                  OR (p.created_at = ?3 AND p.post_id < ?4))
           ORDER BY p.created_at DESC, p.post_id DESC
           LIMIT ?5"
        ))?;
        let rows = stmt
          .query_map(
            rusqlite::params![viewer_str, author_str, after_at, after_id, limit_val],
            RawPostView::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPostView::into_view).collect()
  }

  async fn list_comments(&self, query: &CommentQuery) -> Result<Vec<CommentView>> {
    let post_str   = encode_uuid(query.post_id);
    let viewer_str = query.viewer.map(encode_uuid);
    let (after_at, after_id) = cursor_params(query.cursor);
    let limit_val = query.limit as i64;

    let raws: Vec<RawCommentView> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {COMMENT_COLUMNS},
                  u.user_id, u.handle, u.display_name, u.avatar,
                  CASE WHEN ?2 IS NULL THEN NULL
                       ELSE EXISTS (
                         SELECT 1 FROM reactions r
                         WHERE r.user_id = ?2
                           AND r.target_type = 'comment'
                           AND r.target_id = c.comment_id)
                  END
           FROM comments c
           JOIN users u ON u.user_id = c.author_id
           WHERE c.post_id = ?1
             AND (?3 IS NULL
                  OR c.created_at > ?3
                  OR (c.created_at = ?3 AND c.comment_id > ?4))
           ORDER BY c.created_at ASC, c.comment_id ASC
           LIMIT ?5"
        ))?;
        let rows = stmt
          .query_map(
            rusqlite::params![post_str, viewer_str, after_at, after_id, limit_val],
            RawCommentView::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCommentView::into_view).collect()
  }
}
