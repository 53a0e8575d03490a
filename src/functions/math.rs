//! Numeric implementations of the built-in functions an expression may call.

use crate::GradvizError;

/// Function names that are never treated as free variables.
pub const RESERVED_FUNCTIONS: [&str; 20] = [
  "sin", "cos", "tan", "log", "sqrt", "abs", "exp", "ceil", "floor", "round",
  "sign", "max", "min", "pow", "atan", "acos", "asin", "acosh", "asinh",
  "atanh",
];

/// Named constants available when a symbol is not bound by the caller.
pub fn constant_value(name: &str) -> Option<f64> {
  match name {
    "pi" | "PI" => Some(std::f64::consts::PI),
    "e" | "E" => Some(std::f64::consts::E),
    "tau" => Some(std::f64::consts::TAU),
    "phi" => Some(1.618_033_988_749_895),
    _ => None,
  }
}

/// Apply a built-in function to already evaluated arguments.
///
/// A NaN produced from non-NaN arguments is reported as a domain error
/// (`log(-1)`, `sqrt(-4)`, `acos(2)`), so callers never see a silent NaN.
pub fn apply_function(name: &str, args: &[f64]) -> Result<f64, GradvizError> {
  let value = match (name, args) {
    ("sin", [a]) => a.sin(),
    ("cos", [a]) => a.cos(),
    ("tan", [a]) => a.tan(),
    ("sec", [a]) => 1.0 / a.cos(),
    ("csc", [a]) => 1.0 / a.sin(),
    ("cot", [a]) => 1.0 / a.tan(),
    ("asin", [a]) => a.asin(),
    ("acos", [a]) => a.acos(),
    ("atan", [a]) => a.atan(),
    ("atan2", [y, x]) => y.atan2(*x),
    ("sinh", [a]) => a.sinh(),
    ("cosh", [a]) => a.cosh(),
    ("tanh", [a]) => a.tanh(),
    ("asinh", [a]) => a.asinh(),
    ("acosh", [a]) => a.acosh(),
    ("atanh", [a]) => a.atanh(),
    ("exp", [a]) => a.exp(),
    ("log", [a]) => a.ln(),
    ("log", [a, base]) => a.ln() / base.ln(),
    ("log2", [a]) => a.log2(),
    ("log10", [a]) => a.log10(),
    ("sqrt", [a]) => a.sqrt(),
    ("cbrt", [a]) => a.cbrt(),
    ("abs", [a]) => a.abs(),
    ("ceil", [a]) => a.ceil(),
    ("floor", [a]) => a.floor(),
    ("round", [a]) => a.round(),
    ("sign", [a]) => sign(*a),
    ("pow", [a, b]) => power(*a, *b),
    ("max", values) if !values.is_empty() => {
      values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }
    ("min", values) if !values.is_empty() => {
      values.iter().copied().fold(f64::INFINITY, f64::min)
    }
    _ if is_builtin(name) => {
      return Err(GradvizError::EvaluationError(format!(
        "{name} called with {} argument(s)",
        args.len()
      )));
    }
    _ => {
      return Err(GradvizError::EvaluationError(format!(
        "Undefined function {name}"
      )));
    }
  };

  check_domain(name, args, value)
}

pub fn power(base: f64, exponent: f64) -> f64 {
  if exponent.fract() == 0.0 && exponent.abs() <= i32::MAX as f64 {
    base.powi(exponent as i32)
  } else {
    base.powf(exponent)
  }
}

fn sign(a: f64) -> f64 {
  if a > 0.0 {
    1.0
  } else if a < 0.0 {
    -1.0
  } else {
    // keeps NaN as NaN
    a * 0.0
  }
}

pub(crate) fn check_domain(
  name: &str,
  args: &[f64],
  value: f64,
) -> Result<f64, GradvizError> {
  if value.is_nan() && args.iter().all(|a| !a.is_nan()) {
    let shown = args
      .iter()
      .map(|a| a.to_string())
      .collect::<Vec<_>>()
      .join(", ");
    return Err(GradvizError::EvaluationError(format!(
      "{name}({shown}) is outside the function's domain"
    )));
  }
  Ok(value)
}

/// Every function name `apply_function` knows, reserved or not.
pub fn is_builtin(name: &str) -> bool {
  RESERVED_FUNCTIONS.contains(&name)
    || matches!(
      name,
      "sec"
        | "csc"
        | "cot"
        | "atan2"
        | "sinh"
        | "cosh"
        | "tanh"
        | "log2"
        | "log10"
        | "cbrt"
    )
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn log_of_negative_is_a_domain_error() {
    let err = apply_function("log", &[-1.0]).unwrap_err();
    assert!(err.to_string().contains("outside the function's domain"));
  }

  #[test]
  fn log_of_zero_is_negative_infinity() {
    assert_eq!(apply_function("log", &[0.0]).unwrap(), f64::NEG_INFINITY);
  }

  #[test]
  fn sign_of_zero_is_zero() {
    assert_eq!(apply_function("sign", &[0.0]).unwrap(), 0.0);
    assert_eq!(apply_function("sign", &[-3.0]).unwrap(), -1.0);
  }

  #[test]
  fn wrong_arity_is_reported() {
    let err = apply_function("sin", &[1.0, 2.0]).unwrap_err();
    assert_eq!(
      err.to_string(),
      "Cannot evaluate: sin called with 2 argument(s)"
    );
  }

  #[test]
  fn integer_powers_of_negative_bases() {
    assert_eq!(power(-2.0, 2.0), 4.0);
    assert_eq!(power(-2.0, 3.0), -8.0);
    assert!(power(-8.0, 1.0 / 3.0).is_nan());
  }
}
