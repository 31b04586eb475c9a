use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::Path;

use covcheck_core::{NodeInfo, Reporter, TreeKind, CLASS_FAIL};

const STYLE: &str = include_str!("style.css");
const HEADERS: [&str; 5] = ["Type", "Line", "Name", "Location", "Hit count"];

fn tag(content: &str, tag: &str, attr: &str) -> String {
  format!("<{tag} {attr}>{content}</{tag}>")
}

fn tooltip(text: &str) -> String {
  format!("<span class=tooltip>{text}</span>")
}

/// Renders the report as a standalone HTML page, one table per tree, one
/// row per leaf with its class as the row's CSS class.
pub struct HtmlReporter {
  out: String,
  testname: Option<String>,
  err_count: u32,
}

impl HtmlReporter {
  pub fn new(testname: Option<String>) -> Self {
    Self {
      out: String::new(),
      testname,
      err_count: 0,
    }
  }

  pub fn save(&self, path: &Path) -> io::Result<()> {
    fs::write(path, &self.out)
  }

  fn add_row(&mut self, info: &NodeInfo) {
    let _ = write!(
      self.out,
      "<td>{}</td><td>{}</td>\n<td>{}</td>\n<td>{}</td>\n",
      info.kind, info.line, info.name, info.location
    );
    let _ = write!(self.out, "<td style=\"text-align:right;\">{}", info.hit_count);
    if !info.generator.is_empty() {
      let from = format!(
        "From file ./{}, line {}",
        info.generator, info.generator_line
      );
      self.out.push_str(&tooltip(&from));
    } else if !info.comment.is_empty() {
      self.out.push_str(&tooltip(&info.comment));
    }
    self.out.push_str("</td>\n");
  }
}

impl Reporter for HtmlReporter {
  fn set_kind(&mut self, _kind: TreeKind) {}

  fn start(&mut self) {
    self.out.push_str("<!DOCTYPE html>\n<html>\n");
    let _ = write!(self.out, "<style>\n{STYLE}</style>\n");
  }

  fn title(&mut self) {
    let mut title = "Coverage check report".to_string();
    if let Some(testname) = &self.testname {
      let _ = write!(title, " for test: \"{testname}\"");
    }
    let title = format!("<head>{title}</head>");
    let title = tag(&title, "p", "style=\"font-size:25px\"");
    let _ = writeln!(self.out, "<b>{title}</b>");
  }

  fn tree_title(&mut self, title: &str) {
    let header = tag(title, "p", "style=\"font-size:20px\"");
    let _ = writeln!(self.out, "<b>{header}</b><br>");
  }

  fn tree_start(&mut self) {
    self.out.push_str("<table>\n<tr>\n");
    for header in HEADERS {
      let _ = writeln!(self.out, "<th>{header}</th>");
    }
    self.out.push_str("</tr>\n");
  }

  fn format(&mut self, info: &NodeInfo, class: &str) {
    if class == CLASS_FAIL {
      self.err_count += 1;
    }
    if class.is_empty() {
      self.out.push_str("<tr>\n");
    } else {
      let _ = writeln!(self.out, "<tr class=\"{class}\">");
    }
    self.add_row(info);
    self.out.push_str("</tr>\n");
  }

  fn tree_end(&mut self) {
    self.out.push_str("</table>");
  }

  fn end(&mut self) {
    self.out.push_str("<br>\n");
    let _ = writeln!(
      self.out,
      "<div class=\"topcorner\"> Failed checks: {}</div>",
      self.err_count
    );
    self.out.push_str("</html>\n");
  }
}
