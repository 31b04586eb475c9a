use std::fmt;

/// A range item that is not `N` or `N-M`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidRange(pub String);

impl fmt::Display for InvalidRange {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "invalid line range `{}`", self.0)
  }
}

/// Expands a list of line-range arguments to concrete lines.
///
/// Each argument is a comma- or space-separated sequence of `N` singletons
/// and `N-M` inclusive intervals; intervals set the `expanded` marker so
/// reports can show the generated leaves collapsed.
///
/// `["39", "40", "42-45"]` becomes `[39, 40, 42, 43, 44, 45]`.
pub fn expand_ranges(args: &[String]) -> Result<(Vec<u32>, bool), InvalidRange> {
  let mut lines = Vec::new();
  let mut expanded = false;
  for arg in args {
    for item in arg.split(',').filter(|s| !s.trim().is_empty()) {
      let item = item.trim();
      if let Some((lo, hi)) = item.split_once('-') {
        let lo: u32 = lo.trim().parse().map_err(|_| InvalidRange(item.to_string()))?;
        let hi: u32 = hi.trim().parse().map_err(|_| InvalidRange(item.to_string()))?;
        expanded = true;
        lines.extend(lo..=hi);
      } else {
        lines.push(item.parse().map_err(|_| InvalidRange(item.to_string()))?);
      }
    }
  }
  Ok((lines, expanded))
}
