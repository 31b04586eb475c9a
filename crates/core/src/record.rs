/// Bin kinds as delivered by a coverage database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverKind {
  Statement,
  Block,
  Branch,
  Expr,
  Cond,
  Fsm,
  CvgBin,
  AssertBin,
  Toggle,
}

impl CoverKind {
  /// Code coverage kinds the audit consumes. Toggle bins are code coverage
  /// in the database's taxonomy but are always skipped.
  pub fn is_code_cov(self) -> bool {
    matches!(
      self,
      CoverKind::Statement
        | CoverKind::Block
        | CoverKind::Branch
        | CoverKind::Expr
        | CoverKind::Cond
        | CoverKind::Fsm
    )
  }

  /// Kinds subject to the per-scope re-ordering buffer.
  pub fn is_block_shaped(self) -> bool {
    matches!(self, CoverKind::Statement | CoverKind::Block | CoverKind::Branch)
  }
}

/// One coverage bin streamed out of a database.
#[derive(Debug, Clone)]
pub struct CoverRecord {
  pub kind: CoverKind,
  /// Bin name as stored in the database.
  pub name: String,
  /// Hierarchical name of the owning scope.
  pub hier: String,
  /// Design-unit name of the owning scope, library-qualified.
  pub du: String,
  /// Source file of the bin.
  pub file: String,
  /// Source line of the bin.
  pub line: u32,
  pub hits: i64,
}

/// The callback stream the walker consumes. The vendor traversal library
/// (or a test fixture) produces these in document order.
#[derive(Debug, Clone)]
pub enum DbEvent {
  InitDb,
  /// A design-unit scope opens.
  Du,
  /// Any other scope opens.
  Scope,
  EndScope,
  Item(CoverRecord),
  EndDb,
}

/// Key shape produced by a database vendor: one key per scope tree, or a
/// single key searched under a select mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbVendor {
  Triple,
  Single,
}
