use wasm_bindgen::prelude::*;

use crate::surface::trajectory_markers;
use crate::{Point, SymbolicEngine, VariableSet};

/// Variables of `expression` as a JSON array of names.
#[wasm_bindgen]
pub fn detect_variables(expression: &str) -> String {
  match serde_json::to_string(&crate::detect_variables(expression)) {
    Ok(json) => json,
    Err(e) => format!("Error: {e}"),
  }
}

/// Run descent from the point given as a JSON array of numbers, one per
/// detected variable, and return the trajectory as JSON.
#[wasm_bindgen]
pub fn run_descent(
  expression: &str,
  point: &str,
  alpha: f64,
  iterations: usize,
) -> String {
  let run = || -> Result<String, crate::GradvizError> {
    let variables = crate::detect_variables(expression);
    let values: Vec<f64> = serde_json::from_str(point)?;
    let initial = Point::from_values(&variables, &values);
    let trajectory = crate::run_descent(
      &SymbolicEngine,
      expression,
      &variables,
      &initial,
      alpha,
      iterations,
    );
    Ok(serde_json::to_string(&trajectory)?)
  };
  run().unwrap_or_else(|e| format!("Error: {e}"))
}

/// Sample the surface and return its mesh as JSON, with markers for a
/// descent run when `iterations` is non-zero.
#[wasm_bindgen]
pub fn sample_surface(
  expression: &str,
  resolution: usize,
  point: &str,
  alpha: f64,
  iterations: usize,
) -> String {
  let run = || -> Result<String, crate::GradvizError> {
    let sample =
      crate::sample_surface(&SymbolicEngine, expression, resolution)?;
    let markers = if iterations > 0 {
      let variables: VariableSet = crate::detect_variables(expression);
      let values: Vec<f64> = serde_json::from_str(point)?;
      let trajectory = crate::run_descent(
        &SymbolicEngine,
        expression,
        &variables,
        &Point::from_values(&variables, &values),
        alpha,
        iterations,
      );
      trajectory_markers(&SymbolicEngine, expression, &trajectory)
    } else {
      Vec::new()
    };
    Ok(
      serde_json::json!({
        "min_z": sample.min_z(),
        "max_z": sample.max_z(),
        "mesh": sample.mesh(),
        "markers": markers,
      })
      .to_string(),
    )
  };
  run().unwrap_or_else(|e| format!("Error: {e}"))
}
