use tracing::debug;

use covcheck_core::{ItemKind, NodeInfo, ScopeKind, TopTree};

use crate::ranges::expand_ranges;
use crate::scanner::{Command, ScanConfig, Scanner};
use crate::{DirectiveError, ParseError};

/// Parses a check file and stores every check in `tree`.
///
/// Grammar: `check -p <hier-path> -k (type|inst) -t <type-spec>
/// [-l <range-list>] [-n]`. `negate` is the pipeline-wide switch; each
/// directive's `-n` XORs with it.
pub fn parse_checks(
  source: &str,
  file_name: &str,
  tree: &mut TopTree,
  negate: bool,
) -> Result<(), ParseError> {
  let commands = Scanner::new(source, ScanConfig::new("check")).scan()?;
  for (index, cmd) in commands.iter().enumerate() {
    assemble(cmd, index as u32, file_name, tree, negate)?;
  }
  Ok(())
}

fn unique<'c>(
  cmd: &'c Command,
  file: &str,
  flag: &'static str,
) -> Result<&'c str, DirectiveError> {
  match cmd.flags.get(flag) {
    Some(args) if args.len() == 1 => Ok(&args[0]),
    Some(_) => Err(DirectiveError::NotUnique {
      file: file.to_string(),
      line: cmd.line,
      flag,
    }),
    None => Err(DirectiveError::MissingFlag {
      file: file.to_string(),
      line: cmd.line,
      flag,
    }),
  }
}

fn bad_value(cmd: &Command, file: &str, flag: &'static str, value: &str) -> DirectiveError {
  DirectiveError::BadValue {
    file: file.to_string(),
    line: cmd.line,
    flag,
    value: value.to_string(),
  }
}

fn item_arg<'c>(
  cmd: &'c Command,
  file: &str,
  spec: &'c [String],
) -> Result<&'c str, DirectiveError> {
  spec
    .get(1)
    .map(|s| s.as_str())
    .ok_or_else(|| bad_value(cmd, file, "t", &spec.join(" ")))
}

fn assemble(
  cmd: &Command,
  index: u32,
  file: &str,
  tree: &mut TopTree,
  negate: bool,
) -> Result<(), DirectiveError> {
  let spec = cmd.args("t");
  if spec.is_empty() {
    return Err(DirectiveError::MissingFlag {
      file: file.to_string(),
      line: cmd.line,
      flag: "t",
    });
  }
  let path = unique(cmd, file, "p")?;
  let kind_arg = unique(cmd, file, "k")?;

  let scope_kind = match kind_arg {
    "type" => ScopeKind::Du,
    "inst" => ScopeKind::Instance,
    other => return Err(bad_value(cmd, file, "k", other)),
  };

  let mut query = path.strip_prefix('/').unwrap_or(path).to_string();
  query.push('/');

  let (lines, expanded) = expand_ranges(cmd.args("l")).map_err(|e| DirectiveError::BadRange {
    file: file.to_string(),
    line: cmd.line,
    value: e.0,
  })?;

  let mut info = NodeInfo {
    location: query.clone(),
    line: index,
    negated: negate ^ cmd.has("n"),
    generator: file.to_string(),
    generator_line: cmd.line,
    ..Default::default()
  };

  match spec[0].as_str() {
    "stmt" | "branch" => {
      info.kind = if spec[0] == "stmt" {
        ItemKind::Statement
      } else {
        ItemKind::Branch
      };
      if lines.is_empty() {
        insert(tree, &format!("{query}L/"), scope_kind, info, false);
      } else {
        for line in &lines {
          insert(tree, &format!("{query}{line}/b/"), scope_kind, info.clone(), expanded);
        }
      }
    }
    "cond" | "expr" => {
      info.kind = if spec[0] == "cond" {
        ItemKind::Condition
      } else {
        ItemKind::Expression
      };
      let (minterms, _) =
        expand_ranges(&spec[1..]).map_err(|e| DirectiveError::BadRange {
          file: file.to_string(),
          line: cmd.line,
          value: e.0,
        })?;
      if lines.is_empty() {
        insert(tree, &format!("{query}X/"), scope_kind, info, expanded);
      } else {
        for line in &lines {
          let at_line = format!("{query}{line}/");
          if minterms.is_empty() {
            insert(tree, &format!("{at_line}X/"), scope_kind, info.clone(), expanded);
          } else {
            for minterm in &minterms {
              insert(
                tree,
                &format!("{at_line}{minterm}/m/"),
                scope_kind,
                info.clone(),
                expanded,
              );
            }
          }
        }
      }
    }
    "state" => {
      let fsm = item_arg(cmd, file, spec)?;
      info.kind = ItemKind::State;
      let query = format!("{query}{fsm}/states/");
      info.location = query.clone();
      for state in &spec[2..] {
        info.name = state.clone();
        insert(tree, &format!("{query}{state}/s/"), scope_kind, info.clone(), false);
      }
    }
    "trans" => {
      let fsm = item_arg(cmd, file, spec)?;
      info.kind = ItemKind::Transition;
      let query = format!("{query}{fsm}/trans/");
      info.location = query.clone();
      for trans in &spec[2..] {
        let (from, to) = split_check_transition(trans)
          .ok_or_else(|| bad_value(cmd, file, "t", trans))?;
        info.name = trans.clone();
        insert(
          tree,
          &format!("{query}{from}/{to}/t/"),
          scope_kind,
          info.clone(),
          false,
        );
      }
    }
    "fsm" => {
      info.kind = ItemKind::Fsm;
      if spec.len() < 2 {
        insert(tree, &format!("{query}F/"), scope_kind, info, false);
      } else {
        for fsm in &spec[1..] {
          info.name = fsm.clone();
          insert(tree, &format!("{query}{fsm}/F/"), scope_kind, info.clone(), false);
        }
      }
    }
    "cov" => {
      info.kind = ItemKind::Coverbin;
      let raw = item_arg(cmd, file, spec)?;
      let bin_index = spec.get(2).map(|s| s.as_str()).unwrap_or("0");
      let mut bin_path = raw.strip_prefix('/').unwrap_or(raw).to_string();
      // two segments name an auto bin
      if bin_path.split('/').filter(|s| !s.is_empty()).count() == 2 {
        bin_path.push_str("/auto");
      }
      info.name = bin_path.clone();
      insert(
        tree,
        &format!("{query}{bin_path}/{bin_index}/v/"),
        scope_kind,
        info,
        expanded,
      );
    }
    "assert" => {
      info.kind = ItemKind::Assertbin;
      let raw = item_arg(cmd, file, spec)?;
      let bin_path = raw.strip_prefix('/').unwrap_or(raw);
      info.name = bin_path.to_string();
      insert(tree, &format!("{query}{bin_path}/a/"), scope_kind, info, expanded);
    }
    other => return Err(bad_value(cmd, file, "t", other)),
  }
  Ok(())
}

/// Accepts both the `from>to` and the `from->to` spelling.
fn split_check_transition(trans: &str) -> Option<(&str, &str)> {
  let (from, to) = trans.split_once('>')?;
  let from = from.strip_suffix('-').unwrap_or(from);
  Some((from.trim(), to.trim()))
}

fn insert(tree: &mut TopTree, path: &str, kind: ScopeKind, info: NodeInfo, expanded: bool) {
  debug!(path, "check");
  tree.insert(path, kind, info, expanded);
}
