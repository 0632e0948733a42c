//! The reaction ledger: the toggle algorithm over the store's primitives.
//!
//! The `reactions` table is the single source of truth for "does user X like
//! target Y". Cached like counters follow it by increment/decrement and are
//! never allowed below zero.

use uuid::Uuid;

use crate::{
  Error, Result,
  reaction::{Counter, CounterUpdate, Reaction, Target, ToggleOutcome},
  store::SocialStore,
};

/// Flip `user_id`'s like on `target`.
///
/// Calling this twice in a row flips the state twice. A unique-insert refused
/// by the store, or an unlike that finds no row, means another toggle got
/// there first; both surface as [`Error::DuplicateReaction`] so the caller
/// can retry from a fresh read.
///
/// The caller is responsible for checking that `target` exists.
pub async fn toggle<S>(
  store: &S,
  user_id: Uuid,
  target: Target,
) -> Result<ToggleOutcome>
where
  S: SocialStore,
{
  let existing = store
    .find_reaction(user_id, target)
    .await
    .map_err(Error::store)?;

  if existing.is_some() {
    let deleted = store
      .delete_reaction(user_id, target)
      .await
      .map_err(Error::store)?;
    if !deleted {
      return Err(Error::DuplicateReaction);
    }
    let update = adjust(store, target.like_counter(), -1).await?;
    if update.clamped {
      report_drift(store, target).await;
    }
    Ok(ToggleOutcome { active: false, new_count: update.value })
  } else {
    let inserted = store
      .insert_reaction(Reaction::new(user_id, target))
      .await
      .map_err(Error::store)?;
    if !inserted {
      return Err(Error::DuplicateReaction);
    }
    match adjust(store, target.like_counter(), 1).await {
      Ok(update) => Ok(ToggleOutcome { active: true, new_count: update.value }),
      // The target vanished after the caller checked it.
      Err(Error::NotFound(what)) => {
        if let Err(e) = store.delete_reaction(user_id, target).await {
          tracing::warn!(?target, %user_id, error = %e, "failed to remove orphaned reaction");
        }
        Err(Error::NotFound(what))
      }
      Err(e) => Err(e),
    }
  }
}

/// Log the ledger count next to a clamped like counter.
async fn report_drift<S>(store: &S, target: Target)
where
  S: SocialStore,
{
  match store.count_reactions(target).await {
    Ok(ledger) => tracing::warn!(?target, ledger, "like counter drifted from the ledger"),
    Err(e) => tracing::debug!(?target, error = %e, "could not count reactions"),
  }
}

/// Adjust a cached counter, logging a clamp as a data-integrity warning.
pub(crate) async fn adjust<S>(
  store: &S,
  counter: Counter,
  delta: i64,
) -> Result<CounterUpdate>
where
  S: SocialStore,
{
  let update = store
    .adjust_counter(counter, delta)
    .await
    .map_err(Error::store)?
    .ok_or_else(|| Error::NotFound(counter_owner(counter).into()))?;

  if update.clamped {
    tracing::warn!(
      ?counter,
      delta,
      "cached counter would go below zero; clamped, recount recommended"
    );
  }
  Ok(update)
}

fn counter_owner(counter: Counter) -> &'static str {
  match counter {
    Counter::PostLikes(_) | Counter::PostComments(_) => "post",
    Counter::CommentLikes(_) => "comment",
  }
}
