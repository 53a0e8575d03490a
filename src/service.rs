//! The differentiation and evaluation seams the descent engine and the
//! surface sampler are written against.

use crate::GradvizError;
use crate::evaluator::evaluate_expr;
use crate::functions::calculus;
use crate::point::Point;
use crate::syntax::{expr_to_string, string_to_expr};

pub trait Differentiate {
  /// Partial derivative of `expression` with respect to `variable`, as an
  /// expression string.
  fn differentiate(
    &self,
    expression: &str,
    variable: &str,
  ) -> Result<String, GradvizError>;
}

pub trait Evaluate {
  fn evaluate(
    &self,
    expression: &str,
    bindings: &Point,
  ) -> Result<f64, GradvizError>;
}

impl<T: Differentiate + ?Sized> Differentiate for &T {
  fn differentiate(
    &self,
    expression: &str,
    variable: &str,
  ) -> Result<String, GradvizError> {
    (**self).differentiate(expression, variable)
  }
}

impl<T: Evaluate + ?Sized> Evaluate for &T {
  fn evaluate(
    &self,
    expression: &str,
    bindings: &Point,
  ) -> Result<f64, GradvizError> {
    (**self).evaluate(expression, bindings)
  }
}

/// The built-in engine: pest parser, rule-based derivatives, `f64`
/// evaluation.
#[derive(Debug, Clone, Copy, Default)]
pub struct SymbolicEngine;

impl Differentiate for SymbolicEngine {
  fn differentiate(
    &self,
    expression: &str,
    variable: &str,
  ) -> Result<String, GradvizError> {
    let expr = string_to_expr(expression)?;
    let derivative = calculus::differentiate(&expr, variable)?;
    Ok(expr_to_string(&derivative))
  }
}

impl Evaluate for SymbolicEngine {
  fn evaluate(
    &self,
    expression: &str,
    bindings: &Point,
  ) -> Result<f64, GradvizError> {
    evaluate_expr(&string_to_expr(expression)?, bindings)
  }
}
