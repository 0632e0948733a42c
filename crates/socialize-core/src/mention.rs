//! `@handle` extraction from free text.

use std::{collections::BTreeSet, sync::LazyLock};

use regex::Regex;

static MENTION_RE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"@([A-Za-z0-9_]+)").expect("valid mention regex"));

/// Collect the distinct handles mentioned in `text`.
///
/// A mention is `@` followed by one or more ASCII letters, digits or
/// underscores, and ends at the first other character. Every `@` starts a new
/// match, so `"@a@b"` yields both `a` and `b`. Handles are not checked
/// against existing users.
pub fn extract_mentions(text: &str) -> BTreeSet<String> {
  MENTION_RE
    .captures_iter(text)
    .filter_map(|c| c.get(1))
    .map(|m| m.as_str().to_owned())
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn set(handles: &[&str]) -> BTreeSet<String> {
    handles.iter().map(|h| h.to_string()).collect()
  }

  #[test]
  fn finds_each_mention_once() {
    assert_eq!(
      extract_mentions("@joao comeu @maria_23!"),
      set(&["joao", "maria_23"])
    );
    assert_eq!(extract_mentions("@ana oi @ana"), set(&["ana"]));
  }

  #[test]
  fn no_mentions_is_empty() {
    assert!(extract_mentions("sem mencoes").is_empty());
    assert!(extract_mentions("").is_empty());
    assert!(extract_mentions("email@ is not a mention @ either").is_empty());
  }

  #[test]
  fn adjacent_mentions_split() {
    assert_eq!(extract_mentions("@a@b"), set(&["a", "b"]));
  }

  #[test]
  fn stops_at_punctuation() {
    assert_eq!(extract_mentions("(@bob), @carol."), set(&["bob", "carol"]));
    assert_eq!(extract_mentions("@dave-smith"), set(&["dave"]));
  }
}
