use std::fmt;

use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};

use crate::GradvizError;
use crate::variables::VariableSet;

/// Assignment of a real number to each name of a `VariableSet`, in the
/// set's order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Point {
  coords: Vec<(String, f64)>,
}

impl Point {
  /// Key `bindings` against `variables`: missing names default to `0.0`,
  /// names outside the set are dropped.
  pub fn from_bindings<'a, I>(variables: &VariableSet, bindings: I) -> Self
  where
    I: IntoIterator<Item = (&'a str, f64)>,
  {
    let mut values = vec![0.0; variables.len()];
    for (name, value) in bindings {
      match variables.position(name) {
        Some(index) => values[index] = value,
        None => tracing::debug!(name, "dropping binding outside variable set"),
      }
    }
    Self::from_values(variables, &values)
  }

  /// Values by position; missing trailing values default to `0.0`.
  pub fn from_values(variables: &VariableSet, values: &[f64]) -> Self {
    Point {
      coords: variables
        .iter()
        .enumerate()
        .map(|(i, name)| (name.clone(), values.get(i).copied().unwrap_or(0.0)))
        .collect(),
    }
  }

  pub fn zeros(variables: &VariableSet) -> Self {
    Self::from_values(variables, &[])
  }

  /// Pull every number out of free-form text such as `(-2, -1)` and assign
  /// them to `variables` in order.
  pub fn parse_coordinates(variables: &VariableSet, text: &str) -> Self {
    Self::from_values(variables, &scan_numbers(text))
  }

  /// Parse `name=value` pairs separated by commas, e.g. `x=1, y=-2.5`.
  pub fn parse_assignments(text: &str) -> Result<Self, GradvizError> {
    let mut coords = Vec::new();
    for part in text.split(',').map(str::trim).filter(|p| !p.is_empty()) {
      let (name, value) = part.split_once('=').ok_or_else(|| {
        GradvizError::InvalidPoint(format!("expected name=value, got {part}"))
      })?;
      let name = name.trim();
      let value = value.trim().parse::<f64>().map_err(|e| {
        GradvizError::InvalidPoint(format!("{name}: {e}"))
      })?;
      if coords.iter().any(|(n, _): &(String, f64)| n == name) {
        return Err(GradvizError::InvalidPoint(format!(
          "{name} assigned twice"
        )));
      }
      coords.push((name.to_string(), value));
    }
    Ok(Point { coords })
  }

  /// The same point keyed against another variable set.
  pub fn rekeyed(&self, variables: &VariableSet) -> Self {
    Self::from_bindings(variables, self.iter())
  }

  pub fn get(&self, name: &str) -> Option<f64> {
    self
      .coords
      .iter()
      .find(|(n, _)| n == name)
      .map(|(_, value)| *value)
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
    self.coords.iter().map(|(name, value)| (name.as_str(), *value))
  }

  pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
    self.coords.iter().map(|(name, _)| name.as_str())
  }

  pub fn values(&self) -> Vec<f64> {
    self.coords.iter().map(|(_, value)| *value).collect()
  }

  pub fn len(&self) -> usize {
    self.coords.len()
  }

  pub fn is_empty(&self) -> bool {
    self.coords.is_empty()
  }

  /// New point with every coordinate passed through `f`.
  pub fn map<F>(&self, mut f: F) -> Self
  where
    F: FnMut(&str, f64) -> f64,
  {
    Point {
      coords: self
        .coords
        .iter()
        .map(|(name, value)| (name.clone(), f(name, *value)))
        .collect(),
    }
  }
}

fn scan_numbers(text: &str) -> Vec<f64> {
  let mut numbers = Vec::new();
  let mut current = String::new();
  let flush = |current: &mut String, numbers: &mut Vec<f64>| {
    let token = current.trim_end_matches('.');
    if let Ok(n) = token.parse::<f64>() {
      numbers.push(n);
    }
    current.clear();
  };

  for c in text.chars() {
    let starts_number = c == '-' && current.is_empty();
    let continues_number =
      c.is_ascii_digit() || (c == '.' && !current.contains('.'));
    if starts_number || continues_number {
      current.push(c);
    } else {
      flush(&mut current, &mut numbers);
      if c == '-' {
        current.push(c);
      }
    }
  }
  flush(&mut current, &mut numbers);
  numbers
}

/// Formats as `(x, y)` with four decimals unless a precision is given.
impl fmt::Display for Point {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let precision = f.precision().unwrap_or(4);
    let shown = self
      .coords
      .iter()
      .map(|(_, value)| format!("{value:.precision$}"))
      .collect::<Vec<_>>()
      .join(", ");
    write!(f, "({shown})")
  }
}

impl Serialize for Point {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(self.coords.len()))?;
    for (name, value) in &self.coords {
      map.serialize_entry(name, value)?;
    }
    map.end()
  }
}

/// Outcome of one numeric evaluation.
///
/// `Failed` carries the reason; its degraded value is `0.0`, so a zero in a
/// gradient or a surface can always be traced back to either a real zero or
/// a failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Evaluation {
  Value(f64),
  Failed(String),
}

impl Evaluation {
  /// Non-finite results count as failures.
  pub fn from_result(result: Result<f64, GradvizError>) -> Self {
    match result {
      Ok(value) if value.is_finite() => Evaluation::Value(value),
      Ok(value) => Evaluation::Failed(format!("non-finite result {value}")),
      Err(e) => Evaluation::Failed(e.to_string()),
    }
  }

  pub fn value_or_zero(&self) -> f64 {
    match self {
      Evaluation::Value(value) => *value,
      Evaluation::Failed(_) => 0.0,
    }
  }

  pub fn is_failed(&self) -> bool {
    matches!(self, Evaluation::Failed(_))
  }
}
