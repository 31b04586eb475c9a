mod common;

use std::fs::read_to_string;

use anyhow::Result;
use assert_cmd::Command;
use common::create_test_files;
use predicates::prelude::*;
use predicates::str::contains;

const CHECK_LINE_10: &str = "check -p top/u1 -k inst -t stmt -l 10\n";

const DB_HIT: &str = r#"{"event":"init_db","vendor":"single"}
{"event":"item","kind":"statement","name":"s1","hier":"top/u1/#b#0#10#","hits":3}
{"event":"end_db"}
"#;

const DB_EMPTY: &str = r#"{"event":"init_db","vendor":"single"}
{"event":"end_db"}
"#;

fn covcheck() -> Command {
  Command::cargo_bin("covcheck").expect("binary exists")
}

#[test]
fn test_matched_check_reports_default() -> Result<()> {
  let dir = create_test_files([("c.chk", CHECK_LINE_10), ("db.json", DB_HIT)])?;
  covcheck()
    .current_dir(dir.path())
    .args(["-d", "db.json", "-c", "c.chk", "-o", "report"])
    .assert()
    .success()
    .stdout(contains("Audit finished successfully"));

  let html = read_to_string(dir.path().join("report.html"))?;
  assert!(html.contains("<tr class=\"default\">"));
  assert!(html.contains("<td>Statement</td><td>10</td>"));
  assert!(html.contains("<td>top/u1/</td>"));
  assert!(html.contains("text-align:right;\">3"));

  let log = read_to_string(dir.path().join("report"))?;
  assert!(!log.contains("*CL_"));
  Ok(())
}

#[test]
fn test_unmatched_check_reports_missing() -> Result<()> {
  let dir = create_test_files([("c.chk", CHECK_LINE_10), ("db.json", DB_EMPTY)])?;
  covcheck()
    .current_dir(dir.path())
    .args(["-d", "db.json", "-c", "c.chk", "-o", "report"])
    .assert()
    .success();

  let log = read_to_string(dir.path().join("report"))?;
  assert!(log.contains("*CL_ITEM_NOT_FOUND_ERR in instance top/u1/"));
  assert!(log.contains("*CL_ERR Total error count: 1!"));
  Ok(())
}

#[test]
fn test_wildcard_check_accumulates_hits() -> Result<()> {
  let db = r#"{"event":"init_db","vendor":"single"}
{"event":"item","kind":"statement","name":"s1","hier":"top/u1/#b#0#10#","hits":1}
{"event":"item","kind":"statement","name":"s2","hier":"top/u1/#b#0#11#","hits":0}
{"event":"item","kind":"statement","name":"s3","hier":"top/u1/#b#0#12#","hits":2}
{"event":"end_db"}
"#;
  let dir = create_test_files([
    ("c.chk", "check -p top/u1 -k inst -t stmt\n"),
    ("db.json", db),
  ])?;
  covcheck()
    .current_dir(dir.path())
    .args(["-d", "db.json", "-c", "c.chk", "-o", "report"])
    .assert()
    .success();

  let html = read_to_string(dir.path().join("report.html"))?;
  assert!(html.contains("<tr class=\"default\">"));
  assert!(html.contains("text-align:right;\">3"));
  let log = read_to_string(dir.path().join("report"))?;
  assert!(!log.contains("*CL_"));
  Ok(())
}

#[test]
fn test_negated_check_passes_on_zero_hits() -> Result<()> {
  let db = r#"{"event":"init_db","vendor":"single"}
{"event":"item","kind":"statement","name":"s1","hier":"top/u1/#b#0#10#","hits":0}
{"event":"end_db"}
"#;
  let dir = create_test_files([
    ("c.chk", "check -p top/u1 -k inst -t stmt -l 10 -n\n"),
    ("db.json", db),
  ])?;
  covcheck()
    .current_dir(dir.path())
    .args(["-d", "db.json", "-c", "c.chk", "-o", "report"])
    .assert()
    .success();

  let html = read_to_string(dir.path().join("report.html"))?;
  assert!(html.contains("<tr class=\"default\">"));
  let log = read_to_string(dir.path().join("report"))?;
  assert!(!log.contains("*CL_ITEM_NOT_COVERED_ERR"));
  Ok(())
}

#[test]
fn test_two_databases_accumulate() -> Result<()> {
  let db2 = r#"{"event":"init_db","vendor":"single"}
{"event":"item","kind":"statement","name":"s1","hier":"top/u1/#b#0#10#","hits":7}
{"event":"end_db"}
"#;
  let db1 = DB_HIT.replace("\"hits\":3", "\"hits\":5");
  let dir = create_test_files([
    ("c.chk", CHECK_LINE_10),
    ("db1.json", db1.as_str()),
    ("db2.json", db2),
  ])?;
  covcheck()
    .current_dir(dir.path())
    .args(["-d", "db1.json", "-d", "db2.json", "-c", "c.chk", "-o", "report"])
    .assert()
    .success();

  let html = read_to_string(dir.path().join("report.html"))?;
  assert!(html.contains("text-align:right;\">12"));
  Ok(())
}

#[test]
fn test_triple_vendor_matches_du_tree() -> Result<()> {
  let db = r#"{"event":"init_db","vendor":"triple"}
{"event":"item","kind":"statement","name":"s0","hier":"/top/alu_i","du":"work.alu","file":"/rtl/alu.sv","line":42,"hits":2}
{"event":"end_db"}
"#;
  let dir = create_test_files([
    ("c.chk", "check -p alu -k type -t stmt -l 42\n"),
    ("db.json", db),
  ])?;
  covcheck()
    .current_dir(dir.path())
    .args(["-d", "db.json", "-c", "c.chk", "-o", "report"])
    .assert()
    .success();

  let log = read_to_string(dir.path().join("report"))?;
  assert!(!log.contains("*CL_"));
  let html = read_to_string(dir.path().join("report.html"))?;
  assert!(html.contains("Tests based on instance types:"));
  assert!(html.contains("<tr class=\"default\">"));
  Ok(())
}

#[test]
fn test_exclusion_run_flags_hit_items() -> Result<()> {
  let db = r#"{"event":"init_db","vendor":"single"}
{"event":"item","kind":"statement","name":"s1","hier":"top/u1/#b#0#10#","hits":5}
{"event":"end_db"}
"#;
  let dir = create_test_files([
    ("w.do", "coverage exclude -scope top/u1 -line 10\n"),
    ("db.json", db),
  ])?;
  covcheck()
    .current_dir(dir.path())
    .args(["-d", "db.json", "-r", "w.do", "-o", "report"])
    .assert()
    .success();

  // an excluded item that was hit violates the waiver
  let log = read_to_string(dir.path().join("report"))?;
  assert!(log.contains("*CL_ITEM_NOT_COVERED_ERR in instance top/u1/"));
  Ok(())
}

#[test]
fn test_quiet_skips_html() -> Result<()> {
  let dir = create_test_files([("c.chk", CHECK_LINE_10), ("db.json", DB_HIT)])?;
  covcheck()
    .current_dir(dir.path())
    .args(["-d", "db.json", "-c", "c.chk", "-o", "report", "-q"])
    .assert()
    .success()
    .stdout(contains("Audit finished").not());
  assert!(!dir.path().join("report.html").exists());
  assert!(dir.path().join("report").exists());
  Ok(())
}

#[test]
fn test_verbose_writes_hit_map() -> Result<()> {
  let dir = create_test_files([("c.chk", CHECK_LINE_10), ("db.json", DB_HIT)])?;
  covcheck()
    .current_dir(dir.path())
    .args(["-d", "db.json", "-c", "c.chk", "-o", "report", "-v"])
    .assert()
    .success();
  let hit_map = read_to_string(dir.path().join("results.log"))?;
  assert!(hit_map.contains("/top/u1/10/b was hit:3"));
  Ok(())
}

#[test]
fn test_missing_database_exits_1() -> Result<()> {
  let dir = create_test_files([("c.chk", CHECK_LINE_10)])?;
  covcheck()
    .current_dir(dir.path())
    .args(["-d", "nope.json", "-c", "c.chk"])
    .assert()
    .failure()
    .code(1)
    .stderr(contains("*CL_ERR: Execution error!"));
  Ok(())
}

#[test]
fn test_directive_syntax_error_exits_2() -> Result<()> {
  let dir = create_test_files([("c.chk", "chek -p top/u1\n"), ("db.json", DB_EMPTY)])?;
  covcheck()
    .current_dir(dir.path())
    .args(["-d", "db.json", "-c", "c.chk"])
    .assert()
    .failure()
    .code(2)
    .stderr(contains("*CL_ERR: Syntax error!"));
  Ok(())
}

#[test]
fn test_missing_required_flag_exits_2() -> Result<()> {
  let dir = create_test_files([("c.chk", "check -p top/u1 -k inst\n"), ("db.json", DB_EMPTY)])?;
  covcheck()
    .current_dir(dir.path())
    .args(["-d", "db.json", "-c", "c.chk"])
    .assert()
    .failure()
    .code(2)
    .stderr(contains("flag -t is required"));
  Ok(())
}

#[test]
fn test_no_database_exits_3() -> Result<()> {
  let dir = create_test_files([("c.chk", CHECK_LINE_10)])?;
  covcheck()
    .current_dir(dir.path())
    .args(["-c", "c.chk"])
    .assert()
    .failure()
    .code(3)
    .stderr(contains("No coverage database"));
  Ok(())
}

#[test]
fn test_conflicting_inputs_exit_3() -> Result<()> {
  let dir = create_test_files([
    ("c.chk", CHECK_LINE_10),
    ("w.do", "coverage exclude -scope top -line 1\n"),
    ("db.json", DB_EMPTY),
  ])?;
  covcheck()
    .current_dir(dir.path())
    .args(["-d", "db.json", "-c", "c.chk", "-r", "w.do"])
    .assert()
    .failure()
    .code(3)
    .stderr(contains("cannot be combined"));
  Ok(())
}

#[test]
fn test_conflicting_filters_exit_3() -> Result<()> {
  let dir = create_test_files([("w.do", "coverage exclude -scope top -line 1\n"), ("db.json", DB_EMPTY)])?;
  covcheck()
    .current_dir(dir.path())
    .args(["-d", "db.json", "-r", "w.do", "-w", "waiver", "-s", "exact"])
    .assert()
    .failure()
    .code(3)
    .stderr(contains("filters cannot be combined"));
  Ok(())
}

#[test]
fn test_comment_filter_admits_directives() -> Result<()> {
  let db = r#"{"event":"init_db","vendor":"single"}
{"event":"item","kind":"statement","name":"s1","hier":"top/a/#b#0#1#","hits":1}
{"event":"item","kind":"statement","name":"s2","hier":"top/b/#b#0#1#","hits":1}
{"event":"end_db"}
"#;
  let waivers = "coverage exclude -scope top/a -line 1 -comment \"known waiver\"\n\
                 coverage exclude -scope top/b -line 1 -comment \"other\"\n";
  let dir = create_test_files([("w.do", waivers), ("db.json", db)])?;
  covcheck()
    .current_dir(dir.path())
    .args(["-d", "db.json", "-r", "w.do", "-w", "waiver", "-o", "report"])
    .assert()
    .success();

  let log = read_to_string(dir.path().join("report"))?;
  // only the admitted waiver is in the index, and it was hit
  assert!(log.contains("top/a/"));
  assert!(!log.contains("top/b/"));
  Ok(())
}

#[test]
fn test_completions_subcommand() -> Result<()> {
  covcheck()
    .args(["completions", "bash"])
    .assert()
    .success()
    .stdout(contains("covcheck"));
  Ok(())
}
