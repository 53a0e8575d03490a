//! Symbolic differentiation and simplification.
//!
//! These functions work directly with `Expr` AST nodes. Every rule builds
//! the textbook derivative and then runs it through `simplify`, so the
//! printed result stays readable (`2 * x` rather than `2 * x^(2 - 1) * 1`).

use crate::GradvizError;
use crate::syntax::{BinaryOperator, Expr, UnaryOperator};

/// Check if expression is constant with respect to a variable
pub fn is_constant_wrt(expr: &Expr, var: &str) -> bool {
  match expr {
    Expr::Integer(_) | Expr::Real(_) => true,
    Expr::Identifier(name) => name != var,
    Expr::UnaryOp { operand, .. } => is_constant_wrt(operand, var),
    Expr::BinaryOp { left, right, .. } => {
      is_constant_wrt(left, var) && is_constant_wrt(right, var)
    }
    Expr::FunctionCall { args, .. } => {
      args.iter().all(|e| is_constant_wrt(e, var))
    }
  }
}

/// Differentiate an expression with respect to a variable and simplify the
/// result.
pub fn differentiate(expr: &Expr, var: &str) -> Result<Expr, GradvizError> {
  if is_constant_wrt(expr, var) {
    return Ok(Expr::Integer(0));
  }

  match expr {
    Expr::Integer(_) | Expr::Real(_) => Ok(Expr::Integer(0)),

    Expr::Identifier(name) => Ok(Expr::Integer(i64::from(name == var))),

    Expr::UnaryOp {
      op: UnaryOperator::Minus,
      operand,
    } => Ok(simplify(differentiate(operand, var)?.negated())),

    Expr::BinaryOp { op, left, right } => {
      use BinaryOperator::*;
      match op {
        // d/dx[a ± b] = a' ± b'
        Plus | Minus => {
          let da = differentiate(left, var)?;
          let db = differentiate(right, var)?;
          Ok(simplify(Expr::binary(*op, da, db)))
        }
        // Product rule: d/dx[a * b] = a' * b + a * b'
        Times => {
          let da = differentiate(left, var)?;
          let db = differentiate(right, var)?;
          Ok(simplify(Expr::binary(
            Plus,
            Expr::binary(Times, da, *right.clone()),
            Expr::binary(Times, *left.clone(), db),
          )))
        }
        Divide => {
          let da = differentiate(left, var)?;
          if is_constant_wrt(right, var) {
            // d/dx[a / c] = a' / c
            return Ok(simplify(Expr::binary(Divide, da, *right.clone())));
          }
          // Quotient rule: d/dx[a / b] = (a' * b - a * b') / b^2
          let db = differentiate(right, var)?;
          Ok(simplify(Expr::binary(
            Divide,
            Expr::binary(
              Minus,
              Expr::binary(Times, da, *right.clone()),
              Expr::binary(Times, *left.clone(), db),
            ),
            Expr::binary(Power, *right.clone(), Expr::Integer(2)),
          )))
        }
        Power => differentiate_power(expr, left, right, var),
      }
    }

    Expr::FunctionCall { name, args } => {
      differentiate_call(name, args, var)
    }
  }
}

fn differentiate_power(
  expr: &Expr,
  base: &Expr,
  exponent: &Expr,
  var: &str,
) -> Result<Expr, GradvizError> {
  use BinaryOperator::*;

  if is_constant_wrt(exponent, var) {
    // Power rule: d/dx[f^n] = n * f^(n-1) * f'
    let df = differentiate(base, var)?;
    let lowered = match exponent {
      Expr::Integer(n) => n
        .checked_sub(1)
        .map_or(Expr::Real(*n as f64 - 1.0), Expr::Integer),
      Expr::Real(f) => Expr::Real(f - 1.0),
      other => Expr::binary(Minus, other.clone(), Expr::Integer(1)),
    };
    return Ok(simplify(Expr::binary(
      Times,
      Expr::binary(
        Times,
        exponent.clone(),
        Expr::binary(Power, base.clone(), lowered),
      ),
      df,
    )));
  }

  let dg = differentiate(exponent, var)?;

  if matches!(base, Expr::Identifier(name) if name == "e") {
    // d/dx[e^g] = e^g * g'
    return Ok(simplify(Expr::binary(Times, expr.clone(), dg)));
  }

  if is_constant_wrt(base, var) {
    // d/dx[a^g] = a^g * log(a) * g'
    return Ok(simplify(Expr::binary(
      Times,
      Expr::binary(
        Times,
        expr.clone(),
        Expr::call("log", vec![base.clone()]),
      ),
      dg,
    )));
  }

  // General case: d/dx[f^g] = f^g * (g' * log(f) + g * f' / f)
  let df = differentiate(base, var)?;
  Ok(simplify(Expr::binary(
    Times,
    expr.clone(),
    Expr::binary(
      Plus,
      Expr::binary(Times, dg, Expr::call("log", vec![base.clone()])),
      Expr::binary(
        Divide,
        Expr::binary(Times, exponent.clone(), df),
        base.clone(),
      ),
    ),
  )))
}

fn differentiate_call(
  name: &str,
  args: &[Expr],
  var: &str,
) -> Result<Expr, GradvizError> {
  use BinaryOperator::*;

  // Two-argument forms are rewritten onto their one-argument counterparts.
  match (name, args) {
    ("pow", [base, exponent]) => {
      return differentiate(
        &Expr::binary(Power, base.clone(), exponent.clone()),
        var,
      );
    }
    ("log", [value, base]) => {
      let rewritten = Expr::binary(
        Divide,
        Expr::call("log", vec![value.clone()]),
        Expr::call("log", vec![base.clone()]),
      );
      return differentiate(&rewritten, var);
    }
    _ => {}
  }

  let [u] = args else {
    return Err(GradvizError::DifferentiationError(format!(
      "{name} with {} arguments has no derivative rule",
      args.len()
    )));
  };
  let du = differentiate(u, var)?;
  let call = |f: &str| Expr::call(f, vec![u.clone()]);
  let squared = |e: Expr| Expr::binary(Power, e, Expr::Integer(2));

  // outer'(u), multiplied by u' below
  let outer = match name {
    "sin" => call("cos"),
    "cos" => call("sin").negated(),
    "tan" => squared(call("sec")),
    "sec" => Expr::binary(Times, call("sec"), call("tan")),
    "csc" => Expr::binary(Times, call("csc"), call("cot")).negated(),
    "cot" => squared(call("csc")).negated(),
    "sinh" => call("cosh"),
    "cosh" => call("sinh"),
    "tanh" => Expr::binary(Minus, Expr::Integer(1), squared(call("tanh"))),
    "exp" => call("exp"),
    "log" => {
      return Ok(simplify(Expr::binary(Divide, du, u.clone())));
    }
    "log2" | "log10" => {
      let base = if name == "log2" { 2 } else { 10 };
      return Ok(simplify(Expr::binary(
        Divide,
        du,
        Expr::binary(
          Times,
          u.clone(),
          Expr::call("log", vec![Expr::Integer(base)]),
        ),
      )));
    }
    "sqrt" => {
      return Ok(simplify(Expr::binary(
        Divide,
        du,
        Expr::binary(Times, Expr::Integer(2), call("sqrt")),
      )));
    }
    "cbrt" => {
      return Ok(simplify(Expr::binary(
        Divide,
        du,
        Expr::binary(Times, Expr::Integer(3), squared(call("cbrt"))),
      )));
    }
    "abs" => call("sign"),
    "asin" => reciprocal(sqrt_of(one_minus_square(u))),
    "acos" => reciprocal(sqrt_of(one_minus_square(u))).negated(),
    "atan" => {
      reciprocal(Expr::binary(Plus, Expr::Integer(1), squared(u.clone())))
    }
    "asinh" => reciprocal(sqrt_of(Expr::binary(
      Plus,
      squared(u.clone()),
      Expr::Integer(1),
    ))),
    "acosh" => reciprocal(sqrt_of(Expr::binary(
      Minus,
      squared(u.clone()),
      Expr::Integer(1),
    ))),
    "atanh" => reciprocal(one_minus_square(u)),
    // Piecewise constant: the derivative is zero wherever it exists.
    "ceil" | "floor" | "round" | "sign" => Expr::Integer(0),
    "max" | "min" => {
      return Err(GradvizError::DifferentiationError(format!(
        "{name} is not differentiable"
      )));
    }
    _ => {
      return Err(GradvizError::DifferentiationError(format!(
        "Unknown function {name}"
      )));
    }
  };

  Ok(simplify(Expr::binary(Times, outer, du)))
}

fn reciprocal(expr: Expr) -> Expr {
  Expr::binary(BinaryOperator::Divide, Expr::Integer(1), expr)
}

fn sqrt_of(expr: Expr) -> Expr {
  Expr::call("sqrt", vec![expr])
}

fn one_minus_square(u: &Expr) -> Expr {
  Expr::binary(
    BinaryOperator::Minus,
    Expr::Integer(1),
    Expr::binary(BinaryOperator::Power, u.clone(), Expr::Integer(2)),
  )
}

/// Simplify an expression
pub fn simplify(expr: Expr) -> Expr {
  match expr {
    Expr::BinaryOp { op, left, right } => {
      simplify_binary(op, simplify(*left), simplify(*right))
    }
    Expr::UnaryOp {
      op: UnaryOperator::Minus,
      operand,
    } => match simplify(*operand) {
      // -(-x) = x
      Expr::UnaryOp {
        op: UnaryOperator::Minus,
        operand,
      } => *operand,
      other => other.negated(),
    },
    Expr::FunctionCall { name, args } => Expr::FunctionCall {
      name,
      args: args.into_iter().map(simplify).collect(),
    },
    _ => expr,
  }
}

fn simplify_binary(op: BinaryOperator, left: Expr, right: Expr) -> Expr {
  use BinaryOperator::*;

  if let Some(folded) = fold_numbers(op, &left, &right) {
    return folded;
  }

  match (op, left, right) {
    // 0 + x = x, x + 0 = x
    (Plus, Expr::Integer(0), x) | (Plus, x, Expr::Integer(0)) => x,
    // x + (-y) = x - y
    (Plus, x, Expr::UnaryOp { operand, .. }) => {
      simplify_binary(Minus, x, *operand)
    }
    (Plus, x, Expr::Integer(n)) if n < 0 && n != i64::MIN => {
      simplify_binary(Minus, x, Expr::Integer(-n))
    }
    // x - 0 = x
    (Minus, x, Expr::Integer(0)) => x,
    // 0 - x = -x
    (Minus, Expr::Integer(0), x) => simplify(x.negated()),
    // x - (-y) = x + y
    (Minus, x, Expr::UnaryOp { operand, .. }) => {
      simplify_binary(Plus, x, *operand)
    }
    // 0 * x = 0
    (Times, Expr::Integer(0), _) | (Times, _, Expr::Integer(0)) => {
      Expr::Integer(0)
    }
    // 1 * x = x, x * 1 = x
    (Times, Expr::Integer(1), x) | (Times, x, Expr::Integer(1)) => x,
    // -1 * x = -x
    (Times, Expr::Integer(-1), x) | (Times, x, Expr::Integer(-1)) => {
      simplify(x.negated())
    }
    // Pull negation out of products and quotients.
    (
      op @ (Times | Divide),
      Expr::UnaryOp {
        op: UnaryOperator::Minus,
        operand,
      },
      x,
    ) => simplify(simplify_binary(op, *operand, x).negated()),
    (
      op @ (Times | Divide),
      x,
      Expr::UnaryOp {
        op: UnaryOperator::Minus,
        operand,
      },
    ) => simplify(simplify_binary(op, x, *operand).negated()),
    // Numeric coefficients go first: x * 2 = 2 * x
    (Times, x, n @ (Expr::Integer(_) | Expr::Real(_)))
      if x.as_number().is_none() =>
    {
      simplify_binary(Times, n, x)
    }
    // a * (b * x) = (a * b) * x for numeric a, b
    (Times, a @ (Expr::Integer(_) | Expr::Real(_)), Expr::BinaryOp {
      op: Times,
      left,
      right,
    }) if left.as_number().is_some() => {
      let coefficient = simplify_binary(Times, a, *left);
      simplify_binary(Times, coefficient, *right)
    }
    // 0 / x = 0
    (Divide, Expr::Integer(0), _) => Expr::Integer(0),
    // x / 1 = x
    (Divide, x, Expr::Integer(1)) => x,
    // x^0 = 1
    (Power, _, Expr::Integer(0)) => Expr::Integer(1),
    // x^1 = x
    (Power, x, Expr::Integer(1)) => x,
    // 1^x = 1
    (Power, Expr::Integer(1), _) => Expr::Integer(1),
    (op, left, right) => Expr::binary(op, left, right),
  }
}

/// Constant-fold two numeric operands. Integer arithmetic stays exact;
/// integer division only folds when it divides evenly.
fn fold_numbers(op: BinaryOperator, left: &Expr, right: &Expr) -> Option<Expr> {
  use BinaryOperator::*;

  if let (Expr::Integer(a), Expr::Integer(b)) = (left, right) {
    let (a, b) = (*a, *b);
    let exact = match op {
      Plus => a.checked_add(b),
      Minus => a.checked_sub(b),
      Times => a.checked_mul(b),
      Divide if a.checked_rem(b) == Some(0) => a.checked_div(b),
      Power if (0..=62).contains(&b) => {
        u32::try_from(b).ok().and_then(|e| a.checked_pow(e))
      }
      _ => None,
    };
    return exact.map(Expr::Integer);
  }

  if !matches!(left, Expr::Real(_)) && !matches!(right, Expr::Real(_)) {
    return None;
  }
  let (a, b) = (left.as_number()?, right.as_number()?);
  let value = match op {
    Plus => a + b,
    Minus => a - b,
    Times => a * b,
    Divide => a / b,
    Power => crate::functions::math::power(a, b),
  };
  value.is_finite().then_some(Expr::Real(value))
}
