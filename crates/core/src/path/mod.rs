//! Per-vendor translation of database records into canonical lookup keys.
//!
//! A key is a `/`-joined token sequence with a trailing `/`, whose final
//! token is a single class character. Both builders emit exactly this form;
//! the trie rejects anything else. Builders carry the expression-indexing
//! counters as plain fields, so a fresh builder starts a fresh database.

mod single;
mod triple;

pub use single::SingleBuilder;
pub use triple::TripleBuilder;

/// Splits a transition bin name (`IDLE -> RUN`) into its endpoint states.
pub(crate) fn split_transition(name: &str) -> Option<(&str, &str)> {
  let (from, to) = name.split_once("->")?;
  Some((from.trim(), to.trim()))
}

/// Extracts the source line encoded between the third and fourth `#`
/// marker of a hierarchical name, the form block scopes use.
pub fn hier_line(hier: &str) -> u32 {
  let marks: Vec<usize> = hier.match_indices('#').map(|(i, _)| i).take(4).collect();
  if marks.len() < 4 {
    return 0;
  }
  hier[marks[2] + 1..marks[3]].parse().unwrap_or(0)
}

/// Strips a leading separator and joins a scope prefix with a key tail.
pub(crate) fn with_tail(prefix: &str, tail: &str) -> String {
  let p = prefix.strip_prefix('/').unwrap_or(prefix);
  format!("{p}/{tail}")
}
