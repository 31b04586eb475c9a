use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use tracing::debug;

use covcheck_config::{parse_checks, parse_exclusions, CommentFilter, FilterOp};
use covcheck_core::{default_checker, TopTree, Walker};

use crate::db::DbReader;
use crate::error::ErrorContext as EC;
use crate::report::{HtmlReporter, LogReporter};

#[derive(Args)]
pub struct AuditArg {
  /// Coverage databases to audit, processed in order against one index
  #[clap(short = 'd', long = "db", value_name = "FILE")]
  databases: Vec<PathBuf>,

  /// Check files asserting which items must have been exercised
  #[clap(short = 'c', long = "check", value_name = "FILE")]
  checks: Vec<PathBuf>,

  /// Exclusion/refinement files asserting which items must stay unhit
  #[clap(short = 'r', long = "refinement", value_name = "FILE")]
  refinements: Vec<PathBuf>,

  /// Invert the pass/fail sense of every directive
  #[clap(short = 'n', long)]
  negate: bool,

  /// Skip the HTML report and progress messages
  #[clap(short = 'q', long)]
  quiet: bool,

  /// Debug logging plus a raw hit map in results.log
  #[clap(short = 'v', long)]
  verbose: bool,

  /// Prefix for the generated report files
  #[clap(short = 'o', long, value_name = "PREFIX", default_value = "cl_report")]
  output: String,

  /// Test name shown in the report titles
  #[clap(short = 't', long, value_name = "NAME")]
  testname: Option<String>,

  /// Admit only directives whose comment contains TEXT (repeatable)
  #[clap(short = 'w', long = "weak-filter", value_name = "TEXT")]
  weak_filters: Vec<String>,

  /// Admit only directives whose comment equals TEXT
  #[clap(short = 's', long = "strict-filter", value_name = "TEXT")]
  strict_filter: Option<String>,
}

pub fn run_audit(arg: AuditArg) -> Result<()> {
  init_tracing(arg.verbose);

  if arg.databases.is_empty() {
    return Err(EC::NoDatabase.into());
  }
  if !arg.checks.is_empty() && !arg.refinements.is_empty() {
    return Err(EC::ConflictingInputs.into());
  }
  if !arg.weak_filters.is_empty() && arg.strict_filter.is_some() {
    return Err(EC::ConflictingFilters.into());
  }

  let mut filters: Vec<CommentFilter> = arg
    .weak_filters
    .iter()
    .map(|text| CommentFilter::new("comment", text, FilterOp::Contains))
    .collect();
  if let Some(text) = &arg.strict_filter {
    filters.push(CommentFilter::new("comment", text, FilterOp::Equals));
  }

  // refinement files assert "stays unhit", which inverts the check sense
  let refinement_mode = !arg.refinements.is_empty();
  let negate = arg.negate ^ refinement_mode;

  let mut tree = TopTree::new();

  for path in &arg.checks {
    let name = path.display().to_string();
    let source = fs::read_to_string(path).with_context(|| EC::ReadInput(name.clone()))?;
    parse_checks(&source, &name, &mut tree, negate)
      .with_context(|| EC::ParseDirectives(name.clone()))?;
    if !arg.quiet {
      println!("Check parser finished successfully");
    }
  }

  for path in &arg.refinements {
    let name = path.display().to_string();
    let source = fs::read_to_string(path).with_context(|| EC::ReadInput(name.clone()))?;
    parse_exclusions(&source, &name, &mut tree, &filters, negate)
      .with_context(|| EC::ParseDirectives(name.clone()))?;
    if !arg.quiet {
      println!("Exclusion parser finished successfully");
    }
  }

  debug!(checks = tree.excl_count(), "index populated");

  for path in &arg.databases {
    let name = path.display().to_string();
    let reader = DbReader::open(path).with_context(|| EC::ReadInput(name.clone()))?;
    let mut walker = Walker::new(&mut tree, reader.vendor(), refinement_mode);
    for event in reader {
      let event = event.with_context(|| EC::ReadInput(name.clone()))?;
      walker.on_event(event);
    }
  }

  if arg.verbose {
    let mut out =
      File::create("results.log").with_context(|| EC::WriteReport("results.log".into()))?;
    tree
      .write_hit_map(&mut out)
      .with_context(|| EC::WriteReport("results.log".into()))?;
  }

  if !arg.quiet {
    let mut html = HtmlReporter::new(arg.testname.clone());
    tree.gen_report(&mut html, default_checker);
    let html_path = PathBuf::from(format!("{}.html", arg.output));
    html
      .save(&html_path)
      .with_context(|| EC::WriteReport(html_path.display().to_string()))?;
  }

  let mut log = LogReporter::new(arg.testname.clone());
  tree.gen_report(&mut log, default_checker);
  log
    .save(Path::new(&arg.output))
    .with_context(|| EC::WriteReport(arg.output.clone()))?;

  if !arg.quiet {
    println!("Audit finished successfully");
  }
  Ok(())
}

fn init_tracing(verbose: bool) {
  let default = if verbose { "debug" } else { "warn" };
  let filter = tracing_subscriber::EnvFilter::try_from_default_env()
    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
  let _ = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .try_init();
}
