use std::fmt;

/// The kind of design item a leaf describes, as shown in reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ItemKind {
  Statement,
  #[default]
  Block,
  Branch,
  Condition,
  Expression,
  State,
  Transition,
  Fsm,
  Coverbin,
  Assertbin,
}

impl fmt::Display for ItemKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      ItemKind::Statement => "Statement",
      ItemKind::Block => "Block",
      ItemKind::Branch => "Branch",
      ItemKind::Condition => "Condition",
      ItemKind::Expression => "Expression",
      ItemKind::State => "State",
      ItemKind::Transition => "Transition",
      ItemKind::Fsm => "FSM",
      ItemKind::Coverbin => "Coverbin",
      ItemKind::Assertbin => "Assertbin",
    };
    f.write_str(name)
  }
}

/// Everything stored for one check leaf.
///
/// The assemblers create it from a directive; on a match the walker folds the
/// database-side `line`, `name`, `kind` and hit count into the stored value.
/// `generator`/`generator_line` point back at the directive that created the
/// leaf so reports can show provenance.
#[derive(Debug, Clone, Default)]
pub struct NodeInfo {
  pub kind: ItemKind,
  /// Name reported by the database, or the directive's item name.
  pub name: String,
  /// Hierarchical location the directive targeted.
  pub location: String,
  pub line: u32,
  pub hit_count: i64,
  /// Set once the item was seen in a database.
  pub found: bool,
  /// Set when the leaf came out of a range expansion.
  pub expanded: bool,
  /// Inverts the pass/fail sense when classifying.
  pub negated: bool,
  /// Directive file that created the leaf.
  pub generator: String,
  pub generator_line: u32,
  pub comment: String,
}

impl PartialEq for NodeInfo {
  // equality covers the reporting-relevant subset only
  fn eq(&self, other: &Self) -> bool {
    self.location == other.location
      && self.name == other.name
      && self.kind == other.kind
      && self.hit_count == other.hit_count
      && self.found == other.found
      && self.expanded == other.expanded
  }
}
