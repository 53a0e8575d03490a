use crate::GradvizError;
use crate::functions::math::{
  apply_function, check_domain, constant_value, power,
};
use crate::point::Point;
use crate::syntax::{BinaryOperator, Expr, UnaryOperator};

/// Evaluate an expression to a number with variables bound by `bindings`.
///
/// Bound names shadow the named constants, so a variable called `e` works.
pub fn evaluate_expr(
  expr: &Expr,
  bindings: &Point,
) -> Result<f64, GradvizError> {
  match expr {
    Expr::Integer(n) => Ok(*n as f64),
    Expr::Real(f) => Ok(*f),
    Expr::Identifier(name) => bindings
      .get(name)
      .or_else(|| constant_value(name))
      .ok_or_else(|| {
        GradvizError::EvaluationError(format!("Undefined symbol {name}"))
      }),
    Expr::UnaryOp {
      op: UnaryOperator::Minus,
      operand,
    } => Ok(-evaluate_expr(operand, bindings)?),
    Expr::BinaryOp { op, left, right } => {
      let l = evaluate_expr(left, bindings)?;
      let r = evaluate_expr(right, bindings)?;
      let value = match op {
        BinaryOperator::Plus => l + r,
        BinaryOperator::Minus => l - r,
        BinaryOperator::Times => l * r,
        BinaryOperator::Divide => l / r,
        BinaryOperator::Power => power(l, r),
      };
      check_domain(op_name(*op), &[l, r], value)
    }
    Expr::FunctionCall { name, args } => {
      let values = args
        .iter()
        .map(|arg| evaluate_expr(arg, bindings))
        .collect::<Result<Vec<_>, _>>()?;
      apply_function(name, &values)
    }
  }
}

fn op_name(op: BinaryOperator) -> &'static str {
  match op {
    BinaryOperator::Plus => "add",
    BinaryOperator::Minus => "subtract",
    BinaryOperator::Times => "multiply",
    BinaryOperator::Divide => "divide",
    BinaryOperator::Power => "pow",
  }
}
