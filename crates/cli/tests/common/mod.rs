use std::fs::File;
use std::io::Write;

use anyhow::Result;
use tempfile::TempDir;

pub fn create_test_files<'a>(
  files: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> Result<TempDir> {
  let dir = tempfile::tempdir()?;
  for (name, content) in files {
    let mut file = File::create(dir.path().join(name))?;
    file.write_all(content.as_bytes())?;
  }
  Ok(dir)
}
