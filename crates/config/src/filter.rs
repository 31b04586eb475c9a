/// Comparison applied by a [`CommentFilter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
  /// Numerically-shaped string compare: shorter or lexicographically lower.
  Smaller,
  Bigger,
  Equals,
  Contains,
  Different,
}

/// Admission filter run against a directive's comment before the directive
/// enters the index. All configured filters must pass.
#[derive(Debug, Clone)]
pub struct CommentFilter {
  field: String,
  reference: String,
  op: FilterOp,
  negated: bool,
}

impl CommentFilter {
  pub fn new(field: impl Into<String>, reference: impl Into<String>, op: FilterOp) -> Self {
    Self {
      field: field.into(),
      reference: reference.into(),
      op,
      negated: false,
    }
  }

  pub fn negated(mut self) -> Self {
    self.negated = true;
    self
  }

  pub fn field(&self) -> &str {
    &self.field
  }

  /// Applies the stored operation to `value` against the reference.
  pub fn check(&self, value: &str) -> bool {
    let hit = match self.op {
      FilterOp::Smaller => value.len() <= self.reference.len() && value < self.reference.as_str(),
      FilterOp::Bigger => value.len() >= self.reference.len() && value > self.reference.as_str(),
      FilterOp::Equals => value == self.reference,
      FilterOp::Contains => value.contains(&self.reference),
      FilterOp::Different => value != self.reference,
    };
    if self.negated {
      !hit
    } else {
      hit
    }
  }
}
