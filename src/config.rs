use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::GradvizError;
use crate::point::Point;
use crate::surface::DEFAULT_RESOLUTION;
use crate::variables::VariableSet;

/// Starting state for a session. Every field is optional in JSON and falls
/// back to its default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
  pub expression: String,
  pub initial_point: BTreeMap<String, f64>,
  pub alpha: f64,
  pub iterations: usize,
  pub resolution: usize,
}

impl Default for Config {
  fn default() -> Self {
    Config {
      expression: "sin(sqrt(x*y))".to_string(),
      initial_point: BTreeMap::from([
        ("x".to_string(), -2.0),
        ("y".to_string(), -1.0),
      ]),
      alpha: 0.1,
      iterations: 1,
      resolution: DEFAULT_RESOLUTION,
    }
  }
}

impl Config {
  pub fn from_json_str(text: &str) -> Result<Self, GradvizError> {
    Ok(serde_json::from_str(text)?)
  }

  pub fn from_path(path: impl AsRef<Path>) -> Result<Self, GradvizError> {
    let text = std::fs::read_to_string(path)?;
    Self::from_json_str(&text)
  }

  /// The configured starting coordinates keyed against `variables`.
  pub fn initial_point_for(&self, variables: &VariableSet) -> Point {
    Point::from_bindings(
      variables,
      self
        .initial_point
        .iter()
        .map(|(name, value)| (name.as_str(), *value)),
    )
  }
}
