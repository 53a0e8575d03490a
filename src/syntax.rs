use std::fmt;
use std::sync::LazyLock;

use pest::iterators::{Pair, Pairs};
use pest::pratt_parser::{Assoc, Op, PrattParser};

use crate::{GradvizError, Rule, parse};

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
  Integer(i64),
  Real(f64),
  Identifier(String),
  UnaryOp {
    op: UnaryOperator,
    operand: Box<Expr>,
  },
  BinaryOp {
    op: BinaryOperator,
    left: Box<Expr>,
    right: Box<Expr>,
  },
  FunctionCall {
    name: String,
    args: Vec<Expr>,
  },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
  Minus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
  Plus,
  Minus,
  Times,
  Divide,
  Power,
}

impl BinaryOperator {
  fn symbol(self) -> &'static str {
    match self {
      BinaryOperator::Plus => "+",
      BinaryOperator::Minus => "-",
      BinaryOperator::Times => "*",
      BinaryOperator::Divide => "/",
      BinaryOperator::Power => "^",
    }
  }

  fn precedence(self) -> u8 {
    match self {
      BinaryOperator::Plus | BinaryOperator::Minus => 1,
      BinaryOperator::Times | BinaryOperator::Divide => 2,
      BinaryOperator::Power => 4,
    }
  }
}

// Unary minus binds looser than `^` and tighter than `*`, so `-x^2` is
// `-(x^2)` and `-a*b` is `(-a)*b`.
const UNARY_PRECEDENCE: u8 = 3;
const ATOM_PRECEDENCE: u8 = 5;

static PRATT_PARSER: LazyLock<PrattParser<Rule>> = LazyLock::new(|| {
  PrattParser::new()
    .op(
      Op::infix(Rule::Add, Assoc::Left)
        | Op::infix(Rule::Subtract, Assoc::Left),
    )
    .op(
      Op::infix(Rule::Multiply, Assoc::Left)
        | Op::infix(Rule::Divide, Assoc::Left)
        | Op::infix(Rule::ImplicitMultiply, Assoc::Left),
    )
    .op(Op::prefix(Rule::Negate) | Op::prefix(Rule::Identity))
    .op(Op::infix(Rule::Power, Assoc::Right))
});

impl Expr {
  pub fn identifier(name: &str) -> Self {
    Expr::Identifier(name.to_string())
  }

  pub fn binary(op: BinaryOperator, left: Expr, right: Expr) -> Self {
    Expr::BinaryOp {
      op,
      left: Box::new(left),
      right: Box::new(right),
    }
  }

  pub fn call(name: &str, args: Vec<Expr>) -> Self {
    Expr::FunctionCall {
      name: name.to_string(),
      args,
    }
  }

  /// Negation that folds numeric literals instead of wrapping them.
  pub fn negated(self) -> Self {
    match self {
      Expr::Integer(n) => match n.checked_neg() {
        Some(m) => Expr::Integer(m),
        None => Expr::Real(-(n as f64)),
      },
      Expr::Real(f) => Expr::Real(-f),
      other => Expr::UnaryOp {
        op: UnaryOperator::Minus,
        operand: Box::new(other),
      },
    }
  }

  pub fn as_number(&self) -> Option<f64> {
    match self {
      Expr::Integer(n) => Some(*n as f64),
      Expr::Real(f) => Some(*f),
      _ => None,
    }
  }

  fn precedence(&self) -> u8 {
    match self {
      Expr::Integer(n) if *n < 0 => UNARY_PRECEDENCE,
      Expr::Real(f) if f.is_sign_negative() => UNARY_PRECEDENCE,
      Expr::UnaryOp { .. } => UNARY_PRECEDENCE,
      Expr::BinaryOp { op, .. } => op.precedence(),
      _ => ATOM_PRECEDENCE,
    }
  }
}

/// Parse a full expression string into an `Expr`.
pub fn string_to_expr(input: &str) -> Result<Expr, GradvizError> {
  if input.trim().is_empty() {
    return Err(GradvizError::EmptyInput);
  }
  let mut pairs = parse(input)?;
  let program = pairs.next().ok_or(GradvizError::EmptyInput)?;
  let expression = program
    .into_inner()
    .find(|pair| pair.as_rule() == Rule::Expression)
    .ok_or(GradvizError::EmptyInput)?;
  pair_to_expr(expression)
}

pub fn pair_to_expr(pair: Pair<Rule>) -> Result<Expr, GradvizError> {
  match pair.as_rule() {
    Rule::Expression => parse_operators(pair.into_inner()),
    _ => primary_to_expr(pair),
  }
}

fn parse_operators(pairs: Pairs<Rule>) -> Result<Expr, GradvizError> {
  PRATT_PARSER
    .map_primary(primary_to_expr)
    .map_prefix(|op, operand| match op.as_rule() {
      Rule::Negate => Ok(operand?.negated()),
      _ => operand,
    })
    .map_infix(|left, op, right| {
      let op = match op.as_rule() {
        Rule::Add => BinaryOperator::Plus,
        Rule::Subtract => BinaryOperator::Minus,
        Rule::Multiply | Rule::ImplicitMultiply => BinaryOperator::Times,
        Rule::Divide => BinaryOperator::Divide,
        Rule::Power => BinaryOperator::Power,
        rule => unreachable!("grammar produced non-infix rule {rule:?}"),
      };
      Ok(Expr::binary(op, left?, right?))
    })
    .parse(pairs)
}

fn primary_to_expr(pair: Pair<Rule>) -> Result<Expr, GradvizError> {
  match pair.as_rule() {
    Rule::Number => number_to_expr(pair.as_str()),
    Rule::Identifier => Ok(Expr::identifier(pair.as_str())),
    Rule::FunctionCall => {
      let mut inner = pair.into_inner();
      let name = inner
        .next()
        .map(|p| p.as_str().to_string())
        .ok_or(GradvizError::EmptyInput)?;
      let args = inner.map(pair_to_expr).collect::<Result<Vec<_>, _>>()?;
      Ok(Expr::FunctionCall { name, args })
    }
    Rule::Expression => parse_operators(pair.into_inner()),
    rule => unreachable!("grammar produced non-primary rule {rule:?}"),
  }
}

fn number_to_expr(text: &str) -> Result<Expr, GradvizError> {
  let is_real = text.contains(['.', 'e', 'E']);
  if !is_real {
    if let Ok(n) = text.parse::<i64>() {
      return Ok(Expr::Integer(n));
    }
  }
  text.parse::<f64>().map(Expr::Real).map_err(|e| {
    GradvizError::EvaluationError(format!("invalid number {text}: {e}"))
  })
}

/// Render an expression back into the input syntax with the minimal set of
/// parentheses needed to parse to the same tree.
pub fn expr_to_string(expr: &Expr) -> String {
  match expr {
    Expr::Integer(n) => n.to_string(),
    Expr::Real(f) => format_real(*f),
    Expr::Identifier(name) => name.clone(),
    Expr::UnaryOp {
      op: UnaryOperator::Minus,
      operand,
    } => format!("-{}", wrap(operand, operand.precedence() < UNARY_PRECEDENCE)),
    Expr::BinaryOp { op, left, right } => {
      let prec = op.precedence();
      let left_parens = match op {
        BinaryOperator::Power => left.precedence() <= prec,
        _ => left.precedence() < prec,
      };
      let right_parens = match op {
        BinaryOperator::Power => right.precedence() < prec,
        BinaryOperator::Minus | BinaryOperator::Divide => {
          right.precedence() <= prec
        }
        _ => right.precedence() < prec,
      };
      let left = wrap(left, left_parens);
      let right = wrap(right, right_parens);
      match op {
        BinaryOperator::Power => format!("{left}^{right}"),
        _ => format!("{left} {} {right}", op.symbol()),
      }
    }
    Expr::FunctionCall { name, args } => format!(
      "{name}({})",
      args.iter().map(expr_to_string).collect::<Vec<_>>().join(", ")
    ),
  }
}

fn wrap(expr: &Expr, parens: bool) -> String {
  if parens {
    format!("({})", expr_to_string(expr))
  } else {
    expr_to_string(expr)
  }
}

fn format_real(f: f64) -> String {
  if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 {
    format!("{f:.1}")
  } else {
    f.to_string()
  }
}

impl fmt::Display for Expr {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&expr_to_string(self))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn roundtrip(input: &str) -> String {
    expr_to_string(&string_to_expr(input).unwrap())
  }

  #[test]
  fn power_is_right_associative() {
    assert_eq!(roundtrip("2^3^2"), "2^3^2");
    assert_eq!(roundtrip("(2^3)^2"), "(2^3)^2");
  }

  #[test]
  fn negation_binds_looser_than_power() {
    let expr = string_to_expr("-x^2").unwrap();
    assert!(matches!(
      expr,
      Expr::UnaryOp {
        op: UnaryOperator::Minus,
        ..
      }
    ));
    assert_eq!(roundtrip("(-x)^2"), "(-x)^2");
  }

  #[test]
  fn negative_literals_fold() {
    assert_eq!(string_to_expr("-2").unwrap(), Expr::Integer(-2));
    assert_eq!(string_to_expr("-0.5").unwrap(), Expr::Real(-0.5));
  }

  #[test]
  fn minus_keeps_grouping_on_the_right() {
    assert_eq!(roundtrip("a - (b - c)"), "a - (b - c)");
    assert_eq!(roundtrip("a - b - c"), "a - b - c");
    assert_eq!(roundtrip("a / (b * c)"), "a / (b * c)");
  }

  #[test]
  fn whole_reals_keep_a_decimal_point() {
    assert_eq!(format_real(2.0), "2.0");
    assert_eq!(format_real(0.25), "0.25");
  }
}
