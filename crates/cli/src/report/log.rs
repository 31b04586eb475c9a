use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::Path;

use covcheck_core::{NodeInfo, Reporter, TreeKind, CLASS_FAIL, CLASS_MISSING};

/// Renders only the violations, one `*CL_…` line each, the form other
/// tooling greps out of regression logs.
pub struct LogReporter {
  out: String,
  testname: Option<String>,
  kind: TreeKind,
  err_count: u32,
}

impl LogReporter {
  pub fn new(testname: Option<String>) -> Self {
    Self {
      out: String::new(),
      testname,
      kind: TreeKind::File,
      err_count: 0,
    }
  }

  pub fn err_count(&self) -> u32 {
    self.err_count
  }

  pub fn save(&self, path: &Path) -> io::Result<()> {
    fs::write(path, &self.out)
  }

  fn assemble_info(&self, info: &NodeInfo, class: &str) -> String {
    let mut line = format!("{} {}", self.kind.as_str(), info.location);
    if info.line != 0 {
      let _ = write!(line, ",line {}", info.line);
    }
    let _ = write!(line, ": {} {}", info.kind, info.name);
    if class == CLASS_FAIL {
      let _ = write!(line, " was hit {} times!", info.hit_count);
    } else {
      line.push_str(" was not found");
    }
    line
  }
}

impl Reporter for LogReporter {
  fn set_kind(&mut self, kind: TreeKind) {
    self.kind = kind;
  }

  fn start(&mut self) {
    if let Some(testname) = &self.testname {
      let _ = writeln!(self.out, "Test: {testname}");
    }
  }

  fn tree_title(&mut self, _title: &str) {}

  fn format(&mut self, info: &NodeInfo, class: &str) {
    if class != CLASS_FAIL && class != CLASS_MISSING {
      return;
    }
    self.err_count += 1;
    let tag = if class == CLASS_FAIL {
      "*CL_ITEM_NOT_COVERED_ERR in "
    } else {
      "*CL_ITEM_NOT_FOUND_ERR in "
    };
    self.out.push_str(tag);
    let line = self.assemble_info(info, class);
    self.out.push_str(&line);
    self.out.push('\n');
  }

  fn end(&mut self) {
    if self.err_count > 0 {
      let _ = writeln!(self.out, "*CL_ERR Total error count: {}!", self.err_count);
    }
    self.out.push('\n');
  }
}
