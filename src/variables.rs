//! Free-variable detection on raw expression text.
//!
//! Detection is a purely lexical scan: maximal runs of ASCII letters are
//! candidate identifiers, so `x1` is reported as `x`.

use std::collections::HashSet;

use serde::Serialize;

use crate::functions::math::RESERVED_FUNCTIONS;

/// Ordered, duplicate-free list of variable names referenced by an
/// expression.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct VariableSet(Vec<String>);

impl VariableSet {
  /// Build from names, keeping the first occurrence of each.
  pub fn new<I, S>(names: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    let mut seen = HashSet::new();
    let mut ordered = Vec::new();
    for name in names {
      let name = name.into();
      if seen.insert(name.clone()) {
        ordered.push(name);
      }
    }
    VariableSet(ordered)
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn contains(&self, name: &str) -> bool {
    self.0.iter().any(|n| n == name)
  }

  pub fn position(&self, name: &str) -> Option<usize> {
    self.0.iter().position(|n| n == name)
  }

  pub fn iter(&self) -> std::slice::Iter<'_, String> {
    self.0.iter()
  }

  pub fn as_slice(&self) -> &[String] {
    &self.0
  }
}

impl<'a> IntoIterator for &'a VariableSet {
  type Item = &'a String;
  type IntoIter = std::slice::Iter<'a, String>;

  fn into_iter(self) -> Self::IntoIter {
    self.0.iter()
  }
}

/// Scans expressions for identifiers, skipping a fixed set of reserved
/// function names captured at construction.
#[derive(Debug, Clone)]
pub struct VariableDetector {
  reserved: HashSet<String>,
}

impl Default for VariableDetector {
  fn default() -> Self {
    Self::with_reserved(RESERVED_FUNCTIONS)
  }
}

impl VariableDetector {
  pub fn with_reserved<I, S>(reserved: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    VariableDetector {
      reserved: reserved.into_iter().map(Into::into).collect(),
    }
  }

  pub fn is_reserved(&self, name: &str) -> bool {
    self.reserved.contains(name)
  }

  pub fn detect(&self, expression: &str) -> VariableSet {
    VariableSet::new(
      alphabetic_runs(expression).filter(|run| !self.is_reserved(run)),
    )
  }
}

/// Detect variables using the default reserved function names.
pub fn detect_variables(expression: &str) -> VariableSet {
  VariableDetector::default().detect(expression)
}

fn alphabetic_runs(text: &str) -> impl Iterator<Item = &str> {
  text
    .split(|c: char| !c.is_ascii_alphabetic())
    .filter(|run| !run.is_empty())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn runs_split_on_digits_and_underscores() {
    let runs: Vec<_> = alphabetic_runs("x1 + foo_bar*2y").collect();
    assert_eq!(runs, vec!["x", "foo", "bar", "y"]);
  }

  #[test]
  fn duplicates_keep_first_position() {
    let set = VariableSet::new(["b", "a", "b"]);
    assert_eq!(set.as_slice(), ["b", "a"]);
  }
}
