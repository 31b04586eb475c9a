use super::{split_transition, with_tail};
use crate::node_info::{ItemKind, NodeInfo};
use crate::record::{CoverKind, CoverRecord};

enum Tail {
  Minterm(u32),
  State(String),
  Trans(String),
  /// The scope string already ends in its class character.
  Done,
}

/// Builds one lookup key per scope tree from a record whose attributes
/// carry the scope, design-unit and file names separately.
///
/// The minterm counter is reset whenever the record name starts with the
/// vendor's unknown marker, the scope class changes, or the source line
/// changes, so successive rows of one expression table index from 1.
pub struct TripleBuilder {
  minterm_index: u32,
  last_scope_class: char,
  last_line: u32,
}

impl Default for TripleBuilder {
  fn default() -> Self {
    Self {
      minterm_index: 1,
      last_scope_class: '\0',
      last_line: u32::MAX,
    }
  }
}

fn short_du(du: &str) -> &str {
  match du.rfind('.') {
    Some(i) => &du[i + 1..],
    None => du,
  }
}

impl TripleBuilder {
  /// Translates a record into keys for the instance, du and file trees
  /// plus the leaf descriptor to fold in on a match. Returns `None` when
  /// the record cannot name a scope.
  pub fn build(&mut self, record: &CoverRecord) -> Option<([String; 3], NodeInfo)> {
    if record.kind.is_block_shaped() {
      return Some(self.build_block(record, record.line));
    }

    let (scope, tail) = match record.kind {
      CoverKind::CvgBin => {
        let mut scope = record.hier.clone();
        if scope.contains("::") {
          // cross bins are emitted with an escaped prefix
          if let Some(i) = scope.find('\\') {
            scope = scope[i + 1..].to_string();
          }
          scope = scope.replace("::", "/");
        }
        scope.push('/');
        let bin = match record.name.find('[') {
          Some(i) => &record.name[..i],
          None => record.name.as_str(),
        };
        scope.push_str(bin);
        scope.push_str("/v");
        (scope.replace(' ', ""), Tail::Done)
      }
      CoverKind::AssertBin => {
        // the scope names the assertion through its method; drop the
        // method segment
        let mut scope = record.hier.trim_start_matches('/').to_string();
        if let Some(idx) = scope.rfind('/') {
          let head = &scope[..idx];
          let head = match head.rfind('/') {
            Some(j) => &head[..j],
            None => head,
          };
          scope = format!("{head}{}", &scope[idx..]);
        }
        scope.push_str("/a");
        (scope, Tail::Done)
      }
      CoverKind::Expr | CoverKind::Cond => {
        let last_seg = record.hier.rsplit('/').next().unwrap_or("");
        let class = last_seg.chars().next().unwrap_or('\0');
        if record.name.starts_with('u')
          || class != self.last_scope_class
          || record.line != self.last_line
        {
          self.minterm_index = 1;
          self.last_scope_class = class;
          self.last_line = record.line;
        }
        let index = self.minterm_index;
        self.minterm_index += 1;
        let mut scope = record.hier.clone();
        for _ in 0..2 {
          if let Some(i) = scope.rfind('/') {
            scope.truncate(i);
          }
        }
        (scope, Tail::Minterm(index))
      }
      CoverKind::Fsm => {
        let hier = &record.hier;
        let end = hier.rfind('/')?;
        let start = hier[..end].rfind('/')?;
        let fsm = hier[start + 1..end].to_string();
        let marker = hier[end + 1..].chars().next().unwrap_or('s');
        let tail = if marker == 't' {
          Tail::Trans(fsm)
        } else {
          Tail::State(fsm)
        };
        (hier[..start].to_string(), tail)
      }
      _ => return None,
    };

    if scope.is_empty() {
      return None;
    }

    let mut info = NodeInfo {
      name: record.name.clone(),
      line: record.line,
      location: record.file.clone(),
      ..Default::default()
    };
    match record.kind {
      CoverKind::Expr => info.kind = ItemKind::Expression,
      CoverKind::Cond => info.kind = ItemKind::Condition,
      CoverKind::Fsm => {
        info.line = 0;
        info.kind = match tail {
          Tail::Trans(_) => ItemKind::Transition,
          _ => ItemKind::State,
        };
      }
      CoverKind::CvgBin => {
        info.line = 0;
        info.kind = ItemKind::Coverbin;
        if let Some(i) = info.name.find('[') {
          info.name.truncate(i);
        }
      }
      CoverKind::AssertBin => {
        info.line = 0;
        info.kind = ItemKind::Assertbin;
      }
      _ => {}
    }

    let tail = match tail {
      Tail::Minterm(i) => format!("{}/{i}/m/", record.line),
      Tail::State(fsm) => format!("{fsm}/states/{}/s/", record.name),
      Tail::Trans(fsm) => {
        let (from, to) = split_transition(&record.name)?;
        format!("{fsm}/trans/{from}/{to}/t/")
      }
      Tail::Done => String::new(),
    };

    Some(([
      with_tail(&scope, &tail),
      with_tail(short_du(&record.du), &tail),
      with_tail(&record.file, &tail),
    ], info))
  }

  /// Block keys take the line token from the caller so the walker's
  /// re-ordering pass can substitute an arrival index in refinement mode.
  pub fn build_block(&self, record: &CoverRecord, line_token: u32) -> ([String; 3], NodeInfo) {
    let mut scope = record.hier.clone();
    if record.kind == CoverKind::Branch {
      // branch scopes name the branch itself; the key wants its parent
      if let Some(i) = scope.rfind('/') {
        scope.truncate(i);
      }
    }
    let tail = block_tail(record, line_token);
    let (kind, name) = match record.kind {
      CoverKind::Branch => (ItemKind::Branch, record.name.clone()),
      CoverKind::Block => (ItemKind::Block, "-".to_string()),
      _ => (ItemKind::Statement, "-".to_string()),
    };
    let info = NodeInfo {
      kind,
      name,
      line: record.line,
      location: record.file.clone(),
      ..Default::default()
    };
    ([
      with_tail(&scope, &tail),
      with_tail(short_du(&record.du), &tail),
      with_tail(&record.file, &tail),
    ], info)
  }
}

fn block_tail(record: &CoverRecord, line_token: u32) -> String {
  if record.name.contains("all_false_branch") {
    format!("{line_token}/all_false_branch/b/")
  } else {
    format!("{line_token}/b/")
  }
}
