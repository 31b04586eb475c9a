use ansi_term::Color;
use anyhow::{Error, Result};

use std::fmt;

/// Failure taxon of the command line run. It carries the exit code and the
/// headline message; the underlying cause chain is printed below it.
#[derive(Debug, Clone)]
pub enum ErrorContext {
  /// An input (directive file or database) cannot be opened or decoded.
  ReadInput(String),
  /// A directive file has a syntax or directive-level error.
  ParseDirectives(String),
  /// A report file cannot be written.
  WriteReport(String),
  /// No coverage database was given.
  NoDatabase,
  /// Check files and exclusion files cannot be mixed in one run.
  ConflictingInputs,
  /// Weak and strict comment filters cannot be mixed in one run.
  ConflictingFilters,
}

impl ErrorContext {
  fn exit_code(&self) -> i32 {
    use ErrorContext::*;
    match self {
      ReadInput(_) | WriteReport(_) => 1,
      ParseDirectives(_) => 2,
      NoDatabase | ConflictingInputs | ConflictingFilters => 3,
    }
  }

  fn headline(&self) -> String {
    use ErrorContext::*;
    match self {
      ReadInput(input) => format!("*CL_ERR: Execution error! Cannot read {input}"),
      ParseDirectives(file) => format!("*CL_ERR: Syntax error! In {file}"),
      WriteReport(file) => format!("*CL_ERR: Execution error! Cannot write {file}"),
      NoDatabase => "*CL_ERR: No coverage database was given".to_string(),
      ConflictingInputs => {
        "*CL_ERR: Check files and exclusion files cannot be combined".to_string()
      }
      ConflictingFilters => {
        "*CL_ERR: Strict and weak comment filters cannot be combined".to_string()
      }
    }
  }
}

impl fmt::Display for ErrorContext {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.headline())
  }
}

impl std::error::Error for ErrorContext {}

/// Prints the located failure and terminates with its exit code; anything
/// without an [`ErrorContext`] bubbles up to anyhow's default report.
pub fn exit_with_error(error: Error) -> Result<()> {
  if let Some(e) = error.downcast_ref::<clap::Error>() {
    e.exit()
  }
  if let Some(context) = error.downcast_ref::<ErrorContext>() {
    eprintln!("{}", Color::Red.bold().paint(context.headline()));
    for cause in error.chain().skip(1) {
      eprintln!("  ===> {cause}");
    }
    std::process::exit(context.exit_code())
  }
  Err(error)
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn test_exit_codes_match_taxa() {
    assert_eq!(ErrorContext::ReadInput("x".into()).exit_code(), 1);
    assert_eq!(ErrorContext::WriteReport("x".into()).exit_code(), 1);
    assert_eq!(ErrorContext::ParseDirectives("x".into()).exit_code(), 2);
    assert_eq!(ErrorContext::NoDatabase.exit_code(), 3);
    assert_eq!(ErrorContext::ConflictingInputs.exit_code(), 3);
    assert_eq!(ErrorContext::ConflictingFilters.exit_code(), 3);
  }

  #[test]
  fn test_headline_tags() {
    assert!(ErrorContext::ParseDirectives("f.chk".into())
      .headline()
      .starts_with("*CL_ERR: Syntax error!"));
    assert!(ErrorContext::ReadInput("db".into())
      .headline()
      .starts_with("*CL_ERR: Execution error!"));
  }
}
