use pest::Parser;
use pest_derive::Parser;
use thiserror::Error;

pub mod config;
pub mod descent;
pub mod evaluator;
pub mod functions;
pub mod point;
pub mod render;
pub mod service;
pub mod session;
pub mod surface;
pub mod syntax;
pub mod variables;
#[cfg(target_arch = "wasm32")]
pub mod wasm;

pub use config::Config;
pub use descent::{Gradient, Step, Trajectory, run_descent};
pub use point::{Evaluation, Point};
pub use service::{Differentiate, Evaluate, SymbolicEngine};
pub use session::Session;
pub use surface::{Marker, SurfaceMesh, SurfaceSample, sample_surface};
pub use variables::{VariableDetector, VariableSet, detect_variables};

#[derive(Parser)]
#[grammar = "expression.pest"]
pub struct ExpressionParser;

#[derive(Error, Debug)]
pub enum GradvizError {
  #[error("Parse error: {0}")]
  ParseError(#[from] Box<pest::error::Error<Rule>>),
  #[error("Empty input")]
  EmptyInput,
  #[error("Cannot differentiate: {0}")]
  DifferentiationError(String),
  #[error("Cannot evaluate: {0}")]
  EvaluationError(String),
  #[error("Surface resolution must be at least 2, got {0}")]
  InvalidResolution(usize),
  #[error("Invalid point: {0}")]
  InvalidPoint(String),
  #[error("Render error: {0}")]
  RenderError(String),
  #[error("Invalid configuration: {0}")]
  ConfigError(#[from] serde_json::Error),
  #[error("I/O error: {0}")]
  IoError(#[from] std::io::Error),
}

impl ExpressionParser {
  pub fn parse_expression(
    input: &str,
  ) -> Result<pest::iterators::Pairs<'_, Rule>, Box<pest::error::Error<Rule>>>
  {
    Self::parse(Rule::Program, input).map_err(Box::new)
  }
}

pub fn parse(
  input: &str,
) -> Result<pest::iterators::Pairs<'_, Rule>, Box<pest::error::Error<Rule>>> {
  ExpressionParser::parse_expression(input)
}

/// Symbolic partial derivative of `expression` with respect to `variable`,
/// simplified and printed back in input syntax.
pub fn differentiate(
  expression: &str,
  variable: &str,
) -> Result<String, GradvizError> {
  SymbolicEngine.differentiate(expression, variable)
}

/// Numeric value of `expression` with the variables bound by `bindings`.
pub fn evaluate(
  expression: &str,
  bindings: &Point,
) -> Result<f64, GradvizError> {
  SymbolicEngine.evaluate(expression, bindings)
}
