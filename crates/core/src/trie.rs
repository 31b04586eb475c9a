use std::collections::BTreeMap;
use std::io::{self, Write};

use tracing::trace;

use crate::node_info::NodeInfo;
use crate::report::{Reporter, CLASS_DEFAULT, CLASS_FAIL};

/// The closed set of terminal type tokens a well-formed key may end with.
pub const CLASS_CHARS: &[char] = &['b', 'L', 'm', 'X', 's', 't', 'F', 'v', 'a'];

/// Wildcard label covering a concrete class character. A check on "all
/// blocks here" is stored under `L`, a whole expression table under `X`, a
/// whole FSM under `F`; concrete keys collapse onto those on lookup.
fn wildcard_label(class: char) -> char {
  match class {
    'b' => 'L',
    'm' => 'X',
    's' | 't' => 'F',
    c => c,
  }
}

fn path_tokens(path: &str) -> Vec<&str> {
  let p = path.strip_prefix('/').unwrap_or(path);
  let p = p.strip_suffix('/').unwrap_or(p);
  if p.is_empty() {
    Vec::new()
  } else {
    p.split('/').collect()
  }
}

/// Extracts the type class character of a key, or `None` for malformed
/// keys. Well-formed keys end in a single character from [`CLASS_CHARS`];
/// anything else never matches.
fn class_char(tokens: &[&str]) -> Option<char> {
  let last = tokens.last()?;
  let mut chars = last.chars();
  let c = chars.next()?;
  if chars.next().is_some() || !CLASS_CHARS.contains(&c) {
    return None;
  }
  Some(c)
}

/// A variation of a prefix tree over `/`-separated path tokens.
///
/// This is the structure that keeps checks and exclusions. A node with
/// `excluded` set is a leaf of interest regardless of whether it has
/// children; only such nodes own a [`NodeInfo`]. Children are ordered by
/// token so traversal is deterministic.
pub struct ExclTree {
  label: String,
  children: BTreeMap<String, ExclTree>,
  pub excluded: bool,
  pub expanded: bool,
  pub found: bool,
  pub times_hit: i64,
  pub info: Option<NodeInfo>,
}

impl Default for ExclTree {
  fn default() -> Self {
    Self::new("")
  }
}

impl ExclTree {
  pub fn new(label: impl Into<String>) -> Self {
    Self {
      label: label.into(),
      children: BTreeMap::new(),
      excluded: false,
      expanded: false,
      found: false,
      times_hit: 0,
      info: None,
    }
  }

  pub fn label(&self) -> &str {
    &self.label
  }

  /// True if the node has no sub trees.
  pub fn is_empty(&self) -> bool {
    self.children.is_empty()
  }

  /// Adds a check at `path`, creating intermediate nodes on demand.
  /// Inserting the same path again overwrites the stored info.
  pub fn insert(&mut self, path: &str, info: NodeInfo, expanded: bool) {
    trace!(path, "insert");
    let mut node = self;
    for token in path_tokens(path) {
      node = node
        .children
        .entry(token.to_string())
        .or_insert_with(|| ExclTree::new(token));
    }
    node.excluded = true;
    node.expanded = expanded;
    node.info = Some(info);
  }

  /// Searches for the node matching `path`, with typed wildcard fallback:
  /// when the exact next token is missing, a child labeled with the key's
  /// wildcard class character matches instead. Malformed keys never match.
  pub fn find(&self, path: &str) -> Option<&ExclTree> {
    let wildcard = Self::lookup_label(path)?;
    let mut node = self;
    let tokens = path_tokens(path);
    for (i, token) in tokens.iter().enumerate() {
      match node.children.get(*token) {
        Some(child) => node = child,
        None => {
          let hit = node.children.get(&wildcard)?;
          return hit.excluded.then_some(hit);
        }
      }
      if i + 1 == tokens.len() {
        return node.excluded.then_some(node);
      }
    }
    None
  }

  /// Mutable variant of [`find`](Self::find), used by the walker to fold
  /// database results into matched leaves.
  pub fn find_mut(&mut self, path: &str) -> Option<&mut ExclTree> {
    let wildcard = Self::lookup_label(path)?;
    let mut node = self;
    let tokens = path_tokens(path);
    for (i, token) in tokens.iter().enumerate() {
      if node.children.contains_key(*token) {
        node = node.children.get_mut(*token)?;
        if i + 1 == tokens.len() {
          return if node.excluded { Some(node) } else { None };
        }
      } else {
        let hit = node.children.get_mut(&wildcard)?;
        return if hit.excluded { Some(hit) } else { None };
      }
    }
    None
  }

  fn lookup_label(path: &str) -> Option<String> {
    if !path.ends_with('/') {
      return None;
    }
    let tokens = path_tokens(path);
    let class = class_char(&tokens)?;
    Some(wildcard_label(class).to_string())
  }

  /// Credits a matched leaf with a database result.
  pub fn record_hit(&mut self, delta: i64, info: &NodeInfo) {
    self.found = true;
    self.times_hit += delta;
    if let Some(stored) = self.info.as_mut() {
      stored.found = true;
      stored.hit_count += delta;
      stored.line = info.line;
      stored.name = info.name.clone();
      stored.kind = info.kind;
    }
  }

  /// Applies `checker` to each leaf in key order and emits the classified
  /// result. A negated leaf swaps `fail` and `default`; any other class
  /// passes through unchanged.
  pub fn iterate<F, R>(&self, checker: &F, reporter: &mut R)
  where
    F: Fn(&NodeInfo) -> String,
    R: Reporter + ?Sized,
  {
    for child in self.children.values() {
      child.iterate(checker, reporter);
    }
    if !self.excluded {
      return;
    }
    let Some(info) = &self.info else {
      return;
    };
    let mut class = checker(info);
    if info.negated {
      if class == CLASS_FAIL {
        class = CLASS_DEFAULT.to_string();
      } else if class == CLASS_DEFAULT || class.is_empty() {
        class = CLASS_FAIL.to_string();
      }
    }
    reporter.format(info, &class);
  }

  /// Writes every leaf with the hit count collected from the databases.
  pub fn write_hit_map(&self, out: &mut impl Write) -> io::Result<()> {
    writeln!(out)?;
    self.write_hit_map_at(&self.label, out)
  }

  fn write_hit_map_at(&self, prefix: &str, out: &mut impl Write) -> io::Result<()> {
    for child in self.children.values() {
      child.write_hit_map_at(&format!("{prefix}/{}", child.label), out)?;
    }
    if self.excluded {
      writeln!(out, "{prefix} was hit:{}", self.times_hit)?;
    }
    Ok(())
  }
}
