//! Directive-file frontends for covcheck.
//!
//! Check files and exclusion files share one generic tokenizer: a file is a
//! sequence of `<verb> -flag arg… -flag arg…` commands with hash and
//! C-style block comments. The two assemblers differ only in flag
//! vocabulary; both compile commands into insertions on a
//! [`TopTree`](covcheck_core::TopTree) using the same canonical key space
//! the path builders emit.

mod check;
mod exclusion;
mod filter;
mod ranges;
mod scanner;

pub use check::parse_checks;
pub use exclusion::parse_exclusions;
pub use filter::{CommentFilter, FilterOp};
pub use ranges::{expand_ranges, InvalidRange};
pub use scanner::{
  braced_reader, quoted_reader, ArgReader, Command, ScanConfig, ScanError, Scanner,
};

use thiserror::Error;

/// A command that parsed but cannot be compiled into an insertion.
#[derive(Debug, Error)]
pub enum DirectiveError {
  #[error("{file}:{line}: flag -{flag} is required")]
  MissingFlag {
    file: String,
    line: u32,
    flag: &'static str,
  },
  #[error("{file}:{line}: flag -{flag} takes exactly one value")]
  NotUnique {
    file: String,
    line: u32,
    flag: &'static str,
  },
  #[error("{file}:{line}: invalid value `{value}` for -{flag}")]
  BadValue {
    file: String,
    line: u32,
    flag: &'static str,
    value: String,
  },
  #[error("{file}:{line}: invalid line range `{value}`")]
  BadRange {
    file: String,
    line: u32,
    value: String,
  },
  #[error("{file}:{line}: one of -scope, -du or -src is required")]
  MissingSelector { file: String, line: u32 },
}

/// Any failure while turning a directive file into tree insertions.
#[derive(Debug, Error)]
pub enum ParseError {
  #[error(transparent)]
  Scan(#[from] ScanError),
  #[error(transparent)]
  Directive(#[from] DirectiveError),
}
