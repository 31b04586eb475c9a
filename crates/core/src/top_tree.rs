use std::io::{self, Write};
use std::ops::BitOr;

use tracing::debug;

use crate::node_info::NodeInfo;
use crate::report::{Reporter, TreeKind};
use crate::trie::ExclTree;

/// Which of the three scope trees a directive targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
  Instance,
  Du,
  File,
}

/// Selects which trees [`TopTree::run_single`] may search.
/// Bit 0 is the instance tree, bit 1 the design-unit tree, bit 2 the
/// source-file tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectSet(u8);

impl SelectSet {
  pub const INSTANCE: SelectSet = SelectSet(1);
  pub const DU: SelectSet = SelectSet(2);
  pub const FILE: SelectSet = SelectSet(4);
  pub const ALL: SelectSet = SelectSet(7);

  pub fn contains(self, other: SelectSet) -> bool {
    self.0 & other.0 != 0
  }
}

impl BitOr for SelectSet {
  type Output = SelectSet;
  fn bitor(self, rhs: SelectSet) -> SelectSet {
    SelectSet(self.0 | rhs.0)
  }
}

/// Wrapper over the three check tries, one per scope kind.
///
/// A directive is inserted into exactly one tree; a database record is
/// looked up in one ([`run_single`](Self::run_single)) or all three
/// ([`run_triple`](Self::run_triple)) depending on the vendor's key shape.
#[derive(Default)]
pub struct TopTree {
  file: ExclTree,
  du: ExclTree,
  instance: ExclTree,
  excl_count: u64,
}

impl TopTree {
  pub fn new() -> Self {
    Self::default()
  }

  /// Total number of insertions, counting overwrites.
  pub fn excl_count(&self) -> u64 {
    self.excl_count
  }

  pub fn tree(&self, kind: ScopeKind) -> &ExclTree {
    match kind {
      ScopeKind::Instance => &self.instance,
      ScopeKind::Du => &self.du,
      ScopeKind::File => &self.file,
    }
  }

  pub fn insert(&mut self, path: &str, kind: ScopeKind, info: NodeInfo, expanded: bool) {
    self.excl_count += 1;
    let tree = match kind {
      ScopeKind::Instance => &mut self.instance,
      ScopeKind::Du => &mut self.du,
      ScopeKind::File => &mut self.file,
    };
    tree.insert(path, info, expanded);
  }

  /// Looks `path` up in the trees selected by `select`, in instance, du,
  /// file order. The first match wins: it is credited with `delta` hits
  /// and the search stops. Returns whether anything matched.
  pub fn run_single(&mut self, path: &str, delta: i64, info: &NodeInfo, select: SelectSet) -> bool {
    if path.is_empty() {
      return false;
    }
    if select.contains(SelectSet::INSTANCE) {
      if let Some(node) = self.instance.find_mut(path) {
        debug!(path, "instance hit");
        node.record_hit(delta, info);
        return true;
      }
    }
    if select.contains(SelectSet::DU) {
      if let Some(node) = self.du.find_mut(path) {
        debug!(path, "du hit");
        node.record_hit(delta, info);
        return true;
      }
    }
    if select.contains(SelectSet::FILE) {
      if let Some(node) = self.file.find_mut(path) {
        debug!(path, "file hit");
        node.record_hit(delta, info);
        return true;
      }
    }
    false
  }

  /// Runs three independent lookups with per-tree keys; every match is
  /// credited. A record naming both an instance and a design unit updates
  /// both leaves.
  pub fn run_triple(&mut self, paths: &[String; 3], delta: i64, info: &NodeInfo) {
    let rounds = [
      (&mut self.instance, &paths[0], "instance"),
      (&mut self.du, &paths[1], "du"),
      (&mut self.file, &paths[2], "file"),
    ];
    for (tree, path, label) in rounds {
      if path.is_empty() {
        continue;
      }
      if let Some(node) = tree.find_mut(path) {
        debug!(path = path.as_str(), "{label} hit");
        node.record_hit(delta, info);
      }
    }
  }

  /// Iterates the non-empty trees in file, du, instance order, classifying
  /// every leaf with `checker` and emitting the rows to `reporter`.
  pub fn gen_report<F, R>(&self, reporter: &mut R, checker: F)
  where
    F: Fn(&NodeInfo) -> String,
    R: Reporter + ?Sized,
  {
    reporter.start();
    reporter.title();

    if !self.file.is_empty() {
      reporter.set_kind(TreeKind::File);
      reporter.tree_title("Tests based on source files:");
      reporter.tree_start();
      self.file.iterate(&checker, reporter);
      reporter.tree_end();
    }

    if !self.du.is_empty() {
      reporter.set_kind(TreeKind::Du);
      reporter.tree_title("Tests based on instance types:");
      reporter.tree_start();
      self.du.iterate(&checker, reporter);
      reporter.tree_end();
    }

    if !self.instance.is_empty() {
      reporter.set_kind(TreeKind::Instance);
      reporter.tree_title("Tests based on instances:");
      reporter.tree_start();
      self.instance.iterate(&checker, reporter);
      reporter.tree_end();
    }

    reporter.end();
  }

  /// Writes the raw hit map of all three trees.
  pub fn write_hit_map(&self, out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "Found exclusions:")?;

    writeln!(out, "\n\tSrc exclusions:")?;
    if self.file.is_empty() {
      writeln!(out, "\nNo src exclusions!")?;
    } else {
      self.file.write_hit_map(out)?;
    }

    writeln!(out, "\n\tDU exclusions:")?;
    if self.du.is_empty() {
      writeln!(out, "\nNo DU exclusions!")?;
    } else {
      self.du.write_hit_map(out)?;
    }

    writeln!(out, "\n\tScope exclusions:")?;
    if self.instance.is_empty() {
      writeln!(out, "\nNo scope exclusions!")?;
    } else {
      self.instance.write_hit_map(out)?;
    }
    Ok(())
  }
}
