use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

use covcheck_core::{CoverKind, CoverRecord, DbEvent, DbVendor};

/// One line of the event-stream database format.
///
/// The stream is JSON lines; the first record must be `init_db` and names
/// the vendor's key shape. This adapter is the only place that knows the
/// on-disk form; the walker consumes plain [`DbEvent`]s.
#[derive(Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum RawEvent {
  InitDb {
    #[serde(default)]
    vendor: RawVendor,
  },
  Du,
  Scope,
  EndScope,
  Item {
    kind: RawKind,
    name: String,
    #[serde(default)]
    hier: String,
    #[serde(default)]
    du: String,
    #[serde(default)]
    file: String,
    #[serde(default)]
    line: u32,
    #[serde(default)]
    hits: i64,
  },
  EndDb,
}

#[derive(Deserialize, Clone, Copy, Default)]
#[serde(rename_all = "snake_case")]
enum RawVendor {
  Triple,
  #[default]
  Single,
}

#[derive(Deserialize, Clone, Copy)]
#[serde(rename_all = "snake_case")]
enum RawKind {
  Statement,
  Block,
  Branch,
  Expression,
  Condition,
  Fsm,
  Covergroup,
  Assertion,
  Toggle,
}

impl From<RawKind> for CoverKind {
  fn from(kind: RawKind) -> CoverKind {
    match kind {
      RawKind::Statement => CoverKind::Statement,
      RawKind::Block => CoverKind::Block,
      RawKind::Branch => CoverKind::Branch,
      RawKind::Expression => CoverKind::Expr,
      RawKind::Condition => CoverKind::Cond,
      RawKind::Fsm => CoverKind::Fsm,
      RawKind::Covergroup => CoverKind::CvgBin,
      RawKind::Assertion => CoverKind::AssertBin,
      RawKind::Toggle => CoverKind::Toggle,
    }
  }
}

fn convert(raw: RawEvent) -> DbEvent {
  match raw {
    RawEvent::InitDb { .. } => DbEvent::InitDb,
    RawEvent::Du => DbEvent::Du,
    RawEvent::Scope => DbEvent::Scope,
    RawEvent::EndScope => DbEvent::EndScope,
    RawEvent::EndDb => DbEvent::EndDb,
    RawEvent::Item {
      kind,
      name,
      hier,
      du,
      file,
      line,
      hits,
    } => DbEvent::Item(CoverRecord {
      kind: kind.into(),
      name,
      hier,
      du,
      file,
      line,
      hits,
    }),
  }
}

/// Streams [`DbEvent`]s out of an event-stream database file.
pub struct DbReader {
  lines: Lines<BufReader<File>>,
  vendor: DbVendor,
}

impl DbReader {
  pub fn open(path: &Path) -> Result<Self> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut lines = BufReader::new(file).lines();
    let header = loop {
      match lines.next() {
        None => return Err(anyhow!("database is empty")),
        Some(line) => {
          let line = line?;
          if !line.trim().is_empty() {
            break line;
          }
        }
      }
    };
    let raw: RawEvent =
      serde_json::from_str(&header).with_context(|| format!("decoding {}", path.display()))?;
    let RawEvent::InitDb { vendor } = raw else {
      return Err(anyhow!("database does not start with an init_db record"));
    };
    let vendor = match vendor {
      RawVendor::Triple => DbVendor::Triple,
      RawVendor::Single => DbVendor::Single,
    };
    Ok(Self { lines, vendor })
  }

  pub fn vendor(&self) -> DbVendor {
    self.vendor
  }
}

impl Iterator for DbReader {
  type Item = Result<DbEvent>;

  fn next(&mut self) -> Option<Self::Item> {
    loop {
      let line = match self.lines.next()? {
        Ok(line) => line,
        Err(e) => return Some(Err(e.into())),
      };
      if line.trim().is_empty() {
        continue;
      }
      return Some(
        serde_json::from_str::<RawEvent>(&line)
          .map(convert)
          .map_err(|e| anyhow!("bad database record: {e}")),
      );
    }
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use std::io::Write;

  fn db_file(content: &str) -> tempfile::NamedTempFile {
    let mut f = tempfile::NamedTempFile::new().expect("temp file");
    f.write_all(content.as_bytes()).expect("write");
    f
  }

  #[test]
  fn test_reads_header_and_events() {
    let f = db_file(
      r#"{"event":"init_db","vendor":"triple"}
{"event":"scope"}
{"event":"item","kind":"statement","name":"s0","hier":"/top/u1","file":"/a.sv","line":10,"hits":3}
{"event":"end_db"}
"#,
    );
    let reader = DbReader::open(f.path()).expect("open");
    assert_eq!(reader.vendor(), DbVendor::Triple);
    let events: Vec<DbEvent> = reader.map(|e| e.expect("event")).collect();
    assert_eq!(events.len(), 3);
    match &events[1] {
      DbEvent::Item(record) => {
        assert_eq!(record.kind, CoverKind::Statement);
        assert_eq!(record.hits, 3);
      }
      other => panic!("unexpected event {other:?}"),
    }
  }

  #[test]
  fn test_missing_header_is_an_error() {
    let f = db_file("{\"event\":\"scope\"}\n");
    assert!(DbReader::open(f.path()).is_err());
  }

  #[test]
  fn test_bad_record_is_an_error() {
    let f = db_file("{\"event\":\"init_db\"}\nnot json\n");
    let mut reader = DbReader::open(f.path()).expect("open");
    assert!(reader.next().expect("one item").is_err());
  }
}
