use tracing::debug;

use covcheck_core::{ItemKind, NodeInfo, ScopeKind, TopTree};

use crate::filter::CommentFilter;
use crate::ranges::expand_ranges;
use crate::scanner::{braced_reader, quoted_reader, Command, ScanConfig, Scanner};
use crate::{DirectiveError, ParseError};

/// Parses an exclusion (refinement) file and stores every admitted
/// directive in `tree`.
///
/// A directive names its tree with exactly one of `-scope`, `-du`, `-src`,
/// and its items with `-code`/`-line` or the typed FSM and expression-row
/// selectors. Directives whose `-comment` fails a configured filter are
/// dropped, as are functional-coverage selectors, which this frontend does
/// not index.
pub fn parse_exclusions(
  source: &str,
  file_name: &str,
  tree: &mut TopTree,
  filters: &[CommentFilter],
  negate: bool,
) -> Result<(), ParseError> {
  let mut scanner = Scanner::new(source, ScanConfig::new("coverage exclude"));
  scanner.add_reader('{', braced_reader);
  scanner.add_reader('"', quoted_reader);
  let commands = scanner.scan()?;

  for (index, cmd) in commands.iter().enumerate() {
    if !admitted(cmd, filters) {
      debug!(line = cmd.line, "dropped by comment filter");
      continue;
    }
    if cmd.has("assertpath") || cmd.has("cvgpath") {
      debug!(line = cmd.line, "functional selector skipped");
      continue;
    }
    assemble(cmd, index as u32, file_name, tree, negate)?;
  }
  Ok(())
}

/// Every configured filter must pass the directive's comment; with filters
/// configured, a directive without a comment is dropped.
fn admitted(cmd: &Command, filters: &[CommentFilter]) -> bool {
  match cmd.args("comment").first() {
    Some(comment) => filters.iter().all(|f| f.check(comment)),
    None => filters.is_empty(),
  }
}

fn assemble(
  cmd: &Command,
  index: u32,
  file: &str,
  tree: &mut TopTree,
  negate: bool,
) -> Result<(), DirectiveError> {
  let (selector, scope_kind) = if let Some(scope) = cmd.args("scope").first() {
    // strip a library prefix like work:
    let scope = match scope.rfind(':') {
      Some(i) => &scope[i + 1..],
      None => scope.as_str(),
    };
    (scope, ScopeKind::Instance)
  } else if let Some(du) = cmd.args("du").first() {
    let du = match du.rfind('.') {
      Some(i) => &du[i + 1..],
      None => du.as_str(),
    };
    (du, ScopeKind::Du)
  } else if let Some(src) = cmd.args("src").first() {
    (src.as_str(), ScopeKind::File)
  } else {
    return Err(DirectiveError::MissingSelector {
      file: file.to_string(),
      line: cmd.line,
    });
  };

  let mut query = selector.strip_prefix('/').unwrap_or(selector).to_string();
  query.push('/');

  let (lines, expanded) = expand_ranges(cmd.args("line")).map_err(|e| DirectiveError::BadRange {
    file: file.to_string(),
    line: cmd.line,
    value: e.0,
  })?;

  let base = NodeInfo {
    location: query.clone(),
    line: index,
    negated: negate ^ cmd.has("n"),
    comment: cmd.args("comment").first().cloned().unwrap_or_default(),
    generator: file.to_string(),
    generator_line: cmd.line,
    ..Default::default()
  };

  let code = cmd.args("code").first().map(|s| s.as_str()).unwrap_or("");

  // one directive may exclude several code kinds in one go
  if code.len() > 1 {
    for c in code.chars() {
      let (wildcard, kind) = match c {
        's' => ('L', ItemKind::Statement),
        'b' => ('L', ItemKind::Branch),
        'c' => ('X', ItemKind::Condition),
        'e' => ('X', ItemKind::Expression),
        other => {
          return Err(DirectiveError::BadValue {
            file: file.to_string(),
            line: cmd.line,
            flag: "code",
            value: other.to_string(),
          })
        }
      };
      let mut info = base.clone();
      info.kind = kind;
      if lines.is_empty() {
        insert(tree, &format!("{query}{wildcard}/"), scope_kind, info, false);
      } else {
        for line in &lines {
          let tail = if wildcard == 'L' { "b" } else { "X" };
          insert(
            tree,
            &format!("{query}{line}/{tail}/"),
            scope_kind,
            info.clone(),
            expanded,
          );
        }
      }
    }
    return Ok(());
  }

  let code_char = code.chars().next();

  let fsm_selected = cmd.has("ftrans")
    || cmd.has("fstate")
    || cmd.has("ft")
    || cmd.has("fs")
    || matches!(code_char, Some('f') | Some('t'));
  if fsm_selected {
    return assemble_fsm(cmd, &query, scope_kind, tree, base);
  }

  let rows_selected = cmd.has("feccondrow")
    || cmd.has("fecexprrow")
    || cmd.has("udpcondrow")
    || cmd.has("udpexprrow")
    || matches!(code_char, Some('c') | Some('e'));
  if rows_selected {
    return assemble_rows(cmd, &query, scope_kind, tree, base, file);
  }

  assemble_blocks(cmd, &query, scope_kind, tree, base, &lines, expanded);
  Ok(())
}

/// Statements and branches: `<location>/<line>/b/`, the `all_false_branch`
/// token for `-allfalse`, or the block wildcard `<location>/L/` without
/// lines.
fn assemble_blocks(
  cmd: &Command,
  query: &str,
  scope_kind: ScopeKind,
  tree: &mut TopTree,
  mut info: NodeInfo,
  lines: &[u32],
  expanded: bool,
) {
  info.kind = ItemKind::Block;
  if lines.is_empty() {
    insert(tree, &format!("{query}L/"), scope_kind, info, false);
    return;
  }
  for line in lines {
    let mut path = format!("{query}{line}/");
    if cmd.has("allfalse") {
      path.push_str("all_false_branch/");
    }
    path.push_str("b/");
    insert(tree, &path, scope_kind, info.clone(), expanded);
  }
}

/// Expression and condition rows: `<location>/<line>/<row>/m/` per row,
/// `<location>/<line>/X/` for a whole table, `<location>/X/` for all of
/// them.
fn assemble_rows(
  cmd: &Command,
  query: &str,
  scope_kind: ScopeKind,
  tree: &mut TopTree,
  mut info: NodeInfo,
  file: &str,
) -> Result<(), DirectiveError> {
  info.kind = ItemKind::Expression;

  let mut rows = cmd.args("feccondrow");
  if rows.is_empty() {
    rows = cmd.args("fecexprrow");
  }
  if rows.is_empty() {
    rows = cmd.args("udpexprrow");
  }
  if rows.is_empty() {
    rows = cmd.args("udpcondrow");
  }

  let mut whole_tables = false;
  if rows.is_empty() {
    rows = cmd.args("line");
    whole_tables = true;
  }

  if rows.is_empty() {
    insert(tree, &format!("{query}X/"), scope_kind, info, false);
    return Ok(());
  }

  if whole_tables {
    let (lines, expanded) = expand_ranges(rows).map_err(|e| DirectiveError::BadRange {
      file: file.to_string(),
      line: cmd.line,
      value: e.0,
    })?;
    for line in lines {
      insert(tree, &format!("{query}{line}/X/"), scope_kind, info.clone(), expanded);
    }
    return Ok(());
  }

  // first value is the expression's line, the rest are table rows
  let at_line = format!("{query}{}/", rows[0]);
  for row in &rows[1..] {
    insert(tree, &format!("{at_line}{row}/m/"), scope_kind, info.clone(), false);
  }
  if rows.len() <= 1 {
    insert(tree, &format!("{at_line}X/"), scope_kind, info, false);
  }
  Ok(())
}

/// FSM states and transitions: `<location>/<fsm>/states/<state>/s/`,
/// `<location>/<fsm>/trans/<from>/<to>/t/`, or the `F` wildcard for a
/// whole FSM.
fn assemble_fsm(
  cmd: &Command,
  query: &str,
  scope_kind: ScopeKind,
  tree: &mut TopTree,
  mut info: NodeInfo,
) -> Result<(), DirectiveError> {
  let mut trans = cmd.args("ftrans");
  if trans.is_empty() {
    trans = cmd.args("ft");
  }
  let mut states = cmd.args("fstate");
  if states.is_empty() {
    states = cmd.args("fs");
  }

  let fsm_name = trans.first().or_else(|| states.first()).cloned().unwrap_or_default();
  info.kind = ItemKind::Fsm;
  info.name = fsm_name.clone();

  // only the FSM name given: the whole machine is one wildcard leaf
  if trans.len() == 1 || states.len() == 1 {
    insert(tree, &format!("{query}{fsm_name}/F/"), scope_kind, info, false);
    return Ok(());
  }
  if trans.is_empty() && states.is_empty() {
    insert(tree, &format!("{query}F/"), scope_kind, info, false);
    return Ok(());
  }

  let at_fsm = format!("{query}{fsm_name}/");

  info.kind = ItemKind::Transition;
  for tr in trans.iter().skip(1) {
    let Some((from, to)) = tr.split_once("->") else {
      continue;
    };
    info.name = tr.clone();
    insert(
      tree,
      &format!("{at_fsm}trans/{}/{}/t/", from.trim(), to.trim()),
      scope_kind,
      info.clone(),
      false,
    );
  }

  info.kind = ItemKind::State;
  for state in states.iter().skip(1) {
    info.name = state.clone();
    insert(
      tree,
      &format!("{at_fsm}states/{state}/s/"),
      scope_kind,
      info.clone(),
      false,
    );
  }
  Ok(())
}

fn insert(tree: &mut TopTree, path: &str, kind: ScopeKind, info: NodeInfo, expanded: bool) {
  debug!(path, "exclusion");
  tree.insert(path, kind, info, expanded);
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::filter::FilterOp;

  fn parse(source: &str) -> TopTree {
    let mut tree = TopTree::new();
    parse_exclusions(source, "waivers.do", &mut tree, &[], false).expect("should parse");
    tree
  }

  #[test]
  fn test_du_code_sb_with_range() {
    let tree = parse("coverage exclude -du alu -code sb -line 30-32");
    // statement and branch keys coincide, so six insertions land on three
    // distinct leaves
    assert_eq!(tree.excl_count(), 6);
    for line in 30..=32 {
      let leaf = tree
        .tree(ScopeKind::Du)
        .find(&format!("alu/{line}/b/"))
        .expect("expanded leaf");
      assert!(leaf.expanded);
    }
    assert!(tree.tree(ScopeKind::Du).find("alu/29/b/").is_none());
  }

  #[test]
  fn test_scope_without_code_is_a_block_wildcard() {
    let tree = parse("coverage exclude -scope work:top/dut/u0");
    assert!(tree.tree(ScopeKind::Instance).find("top/dut/u0/L/").is_some());
    assert!(tree.tree(ScopeKind::Instance).find("top/dut/u0/77/b/").is_some());
  }

  #[test]
  fn test_src_selects_file_tree() {
    let tree = parse("coverage exclude -src /rtl/alu.sv -line 12");
    assert!(tree.tree(ScopeKind::File).find("rtl/alu.sv/12/b/").is_some());
  }

  #[test]
  fn test_allfalse_token_is_preserved() {
    let tree = parse("coverage exclude -scope top/u0 -line 17 -allfalse");
    assert!(tree
      .tree(ScopeKind::Instance)
      .find("top/u0/17/all_false_branch/b/")
      .is_some());
  }

  #[test]
  fn test_fec_rows() {
    let tree = parse("coverage exclude -scope top/u0 -feccondrow 30 2 4");
    assert!(tree.tree(ScopeKind::Instance).find("top/u0/30/2/m/").is_some());
    assert!(tree.tree(ScopeKind::Instance).find("top/u0/30/4/m/").is_some());
    assert!(tree.tree(ScopeKind::Instance).find("top/u0/30/3/m/").is_none());
  }

  #[test]
  fn test_fec_row_without_rows_excludes_the_table() {
    let tree = parse("coverage exclude -scope top/u0 -fecexprrow 30");
    assert!(tree.tree(ScopeKind::Instance).find("top/u0/30/X/").is_some());
    assert!(tree.tree(ScopeKind::Instance).find("top/u0/30/7/m/").is_some());
  }

  #[test]
  fn test_code_e_with_lines() {
    let tree = parse("coverage exclude -du alu -code e -line 5-6");
    assert!(tree.tree(ScopeKind::Du).find("alu/5/X/").is_some());
    assert!(tree.tree(ScopeKind::Du).find("alu/6/X/").is_some());
  }

  #[test]
  fn test_fsm_wildcard_and_items() {
    let tree = parse("coverage exclude -scope top/c -fstate fsm0");
    assert!(tree.tree(ScopeKind::Instance).find("top/c/fsm0/F/").is_some());

    let tree = parse("coverage exclude -scope top/c -fstate fsm0 IDLE -ftrans fsm0 {IDLE -> RUN}");
    assert!(tree.tree(ScopeKind::Instance).find("top/c/fsm0/states/IDLE/s/").is_some());
    assert!(tree.tree(ScopeKind::Instance).find("top/c/fsm0/trans/IDLE/RUN/t/").is_some());
  }

  #[test]
  fn test_functional_selectors_are_skipped() {
    let tree = parse("coverage exclude -scope top/env -cvgpath cg/cp");
    assert_eq!(tree.excl_count(), 0);
  }

  #[test]
  fn test_comment_filters_gate_admission() {
    let filters = vec![CommentFilter::new("comment", "waiver", FilterOp::Contains)];
    let mut tree = TopTree::new();
    let src = "\
coverage exclude -scope top/a -line 1 -comment \"known waiver\"
coverage exclude -scope top/b -line 1 -comment \"just because\"
coverage exclude -scope top/c -line 1
";
    parse_exclusions(src, "w.do", &mut tree, &filters, false).expect("should parse");
    assert!(tree.tree(ScopeKind::Instance).find("top/a/1/b/").is_some());
    assert!(tree.tree(ScopeKind::Instance).find("top/b/1/b/").is_none());
    assert!(tree.tree(ScopeKind::Instance).find("top/c/1/b/").is_none());
  }

  #[test]
  fn test_all_filters_must_pass() {
    let filters = vec![
      CommentFilter::new("comment", "waiver", FilterOp::Contains),
      CommentFilter::new("comment", "reset", FilterOp::Contains),
    ];
    let mut tree = TopTree::new();
    let src = "coverage exclude -scope top/a -line 1 -comment \"waiver for reset\"\n\
               coverage exclude -scope top/b -line 1 -comment \"waiver only\"\n";
    parse_exclusions(src, "w.do", &mut tree, &filters, false).expect("should parse");
    assert!(tree.tree(ScopeKind::Instance).find("top/a/1/b/").is_some());
    assert!(tree.tree(ScopeKind::Instance).find("top/b/1/b/").is_none());
  }

  #[test]
  fn test_comment_is_stored_on_the_leaf() {
    let tree = parse("coverage exclude -scope top/a -line 3 -comment {multi word note}");
    let leaf = tree.tree(ScopeKind::Instance).find("top/a/3/b/").expect("inserted");
    assert_eq!(leaf.info.as_ref().expect("info").comment, "multi word note");
  }

  #[test]
  fn test_missing_selector_is_fatal() {
    let mut tree = TopTree::new();
    let err = parse_exclusions("coverage exclude -code s -line 2", "w.do", &mut tree, &[], false)
      .expect_err("no selector");
    assert!(matches!(
      err,
      ParseError::Directive(DirectiveError::MissingSelector { .. })
    ));
  }

  #[test]
  fn test_negate_sense() {
    let mut tree = TopTree::new();
    parse_exclusions(
      "coverage exclude -scope top/a -line 1",
      "w.do",
      &mut tree,
      &[],
      true,
    )
    .expect("should parse");
    let leaf = tree.tree(ScopeKind::Instance).find("top/a/1/b/").expect("inserted");
    assert!(leaf.info.as_ref().expect("info").negated);
  }
}
