use super::{hier_line, split_transition};
use crate::node_info::{ItemKind, NodeInfo};
use crate::record::{CoverKind, CoverRecord};

/// Builds a single lookup key from a record whose hierarchical name packs
/// everything into one `#`-delimited string. The key is searched under a
/// select mask instead of once per tree.
///
/// `top_expr_index` counts expression tables within the current scope and
/// `minterm_index` counts rows within the current table; refinement-mode
/// keys are built from those counters instead of source lines.
pub struct SingleBuilder {
  top_expr_index: u32,
  minterm_index: u32,
  last_scope: String,
  last_name: String,
}

impl Default for SingleBuilder {
  fn default() -> Self {
    Self {
      top_expr_index: 0,
      minterm_index: 1,
      last_scope: String::new(),
      last_name: String::new(),
    }
  }
}

impl SingleBuilder {
  /// Translates a non-block record into its lookup key and leaf
  /// descriptor. Block-shaped records go through [`Self::block_key`] after
  /// the walker's re-ordering pass.
  pub fn build(&mut self, record: &CoverRecord, refinement: bool) -> Option<(String, NodeInfo)> {
    let mut info = NodeInfo {
      line: hier_line(&record.hier),
      name: record.name.clone(),
      ..Default::default()
    };

    match record.kind {
      CoverKind::CvgBin | CoverKind::AssertBin => {
        info.line = 0;
        info.kind = if record.kind == CoverKind::CvgBin {
          ItemKind::Coverbin
        } else {
          ItemKind::Assertbin
        };
        let (scope, bin) = record.hier.split_once("::")?;
        let scope = scope.strip_prefix('/').unwrap_or(scope);
        let mut bin = bin;
        if record.kind == CoverKind::AssertBin {
          // drop the method prefix of the assertion path
          if let Some((_, rest)) = bin.split_once('.') {
            bin = rest;
          }
        }
        let class = if record.kind == CoverKind::CvgBin { 'v' } else { 'a' };
        info.location = format!("{scope}/{bin}");
        return Some((format!("{scope}/{bin}/{class}/"), info));
      }
      CoverKind::Expr => info.kind = ItemKind::Expression,
      CoverKind::Cond => info.kind = ItemKind::Condition,
      CoverKind::Fsm => {
        info.kind = if record.name.contains("->") {
          ItemKind::Transition
        } else {
          ItemKind::State
        };
      }
      _ => return None,
    }

    let (scope, fsm_name) = split_scope(&record.hier);
    info.location = format!("{scope}{fsm_name}");

    if scope != self.last_scope {
      self.top_expr_index = 0;
      self.minterm_index = 1;
      self.last_scope = scope.clone();
      self.last_name = record.hier.clone();
    } else if record.kind == CoverKind::Expr && record.hier != self.last_name {
      self.last_name = record.hier.clone();
      self.top_expr_index += 1;
      self.minterm_index = 1;
    }

    let key = match record.kind {
      CoverKind::Fsm => {
        if let Some((from, to)) = split_transition(&record.name) {
          format!("{scope}{fsm_name}/trans/{from}/{to}/t/")
        } else {
          format!("{scope}{fsm_name}/states/{}/s/", record.name)
        }
      }
      _ => {
        let index = self.minterm_index;
        self.minterm_index += 1;
        if refinement {
          format!("{scope}{}/1/{index}/m/", self.top_expr_index)
        } else {
          format!("{scope}{}/{index}/m/", info.line)
        }
      }
    };
    Some((key, info))
  }

  /// Key and descriptor for one buffered block, with the line token chosen
  /// by the re-ordering pass.
  pub fn block_key(record: &CoverRecord, line_token: u32) -> (String, NodeInfo) {
    let mut parts = record.hier.split('#');
    let scope = parts.next().unwrap_or("").to_string();
    let marker = parts.next().unwrap_or("");
    let name = if marker.is_empty() || marker.starts_with('b') {
      "-".to_string()
    } else {
      format!("{marker}_branch")
    };
    let kind = match record.kind {
      CoverKind::Branch => ItemKind::Branch,
      CoverKind::Block => ItemKind::Block,
      _ => ItemKind::Statement,
    };
    let key = if marker.starts_with("all_false") {
      format!("{scope}{line_token}/all_false_branch/b/")
    } else {
      format!("{scope}{line_token}/b/")
    };
    let info = NodeInfo {
      kind,
      name,
      location: scope,
      line: hier_line(&record.hier),
      ..Default::default()
    };
    (key, info)
  }
}

/// Splits the hierarchical name into the scope prefix (separator kept) and
/// the FSM name when the scope carries one.
fn split_scope(hier: &str) -> (String, String) {
  if let Some(i) = hier.find('#') {
    return (hier[..i].to_string(), String::new());
  }
  if let Some(u) = hier.find("UCIS:") {
    let head = &hier[..u.saturating_sub(2)];
    if let Some(s) = head.rfind('/') {
      let fsm = hier[s + 1..].split('/').next().unwrap_or("").to_string();
      return (hier[..s + 1].to_string(), fsm);
    }
  }
  (hier.to_string(), String::new())
}
