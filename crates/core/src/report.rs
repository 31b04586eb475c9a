use crate::node_info::NodeInfo;

pub const CLASS_DEFAULT: &str = "default";
pub const CLASS_FAIL: &str = "fail";
pub const CLASS_MISSING: &str = "missing";

/// Which of the three scope trees is currently being reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TreeKind {
  #[default]
  File,
  Du,
  Instance,
}

impl TreeKind {
  pub fn as_str(self) -> &'static str {
    match self {
      TreeKind::File => "file",
      TreeKind::Du => "unit",
      TreeKind::Instance => "instance",
    }
  }
}

/// Sink for classified report rows.
///
/// [`TopTree::gen_report`](crate::TopTree::gen_report) drives the sink:
/// `start`/`title` once, then per non-empty tree `set_kind`, `tree_title`,
/// `tree_start`, one `format` call per leaf, `tree_end`, and finally `end`.
/// The `class` passed to `format` is whatever the checker returned, after
/// negation swapping.
pub trait Reporter {
  fn set_kind(&mut self, kind: TreeKind);
  fn start(&mut self) {}
  fn title(&mut self) {}
  fn tree_title(&mut self, title: &str);
  fn tree_start(&mut self) {}
  fn format(&mut self, info: &NodeInfo, class: &str);
  fn tree_end(&mut self) {}
  fn end(&mut self) {}
}

/// The stock classification: a leaf never seen in a database is `missing`,
/// a leaf seen with zero hits is `fail`, anything else passes.
pub fn default_checker(info: &NodeInfo) -> String {
  if !info.found {
    return CLASS_MISSING.to_string();
  }
  if info.hit_count == 0 {
    return CLASS_FAIL.to_string();
  }
  CLASS_DEFAULT.to_string()
}
