use std::cell::Cell;

use approx::assert_abs_diff_eq;
use gradviz::{
  Differentiate, Evaluate, Evaluation, GradvizError, Point, SymbolicEngine,
  VariableSet, run_descent,
};

/// Delegates to the real engine and counts `differentiate` calls.
#[derive(Default)]
struct CountingEngine {
  differentiations: Cell<usize>,
  evaluations: Cell<usize>,
}

impl Differentiate for CountingEngine {
  fn differentiate(
    &self,
    expression: &str,
    variable: &str,
  ) -> Result<String, GradvizError> {
    self.differentiations.set(self.differentiations.get() + 1);
    SymbolicEngine.differentiate(expression, variable)
  }
}

impl Evaluate for CountingEngine {
  fn evaluate(
    &self,
    expression: &str,
    bindings: &Point,
  ) -> Result<f64, GradvizError> {
    self.evaluations.set(self.evaluations.get() + 1);
    SymbolicEngine.evaluate(expression, bindings)
  }
}

/// Differentiates normally but refuses to evaluate anything.
struct BrokenEvaluator;

impl Differentiate for BrokenEvaluator {
  fn differentiate(
    &self,
    expression: &str,
    variable: &str,
  ) -> Result<String, GradvizError> {
    SymbolicEngine.differentiate(expression, variable)
  }
}

impl Evaluate for BrokenEvaluator {
  fn evaluate(&self, _: &str, _: &Point) -> Result<f64, GradvizError> {
    Err(GradvizError::EvaluationError("offline".to_string()))
  }
}

fn xy() -> VariableSet {
  VariableSet::new(["x", "y"])
}

fn start() -> Point {
  Point::from_values(&xy(), &[-2.0, -1.0])
}

mod descent_tests {
  use super::*;

  mod trajectory_shape {
    use super::*;

    #[test]
    fn test_paraboloid_two_steps() {
      let trajectory =
        run_descent(&SymbolicEngine, "x^2 + y^2", &xy(), &start(), 0.1, 2);
      let points: Vec<Vec<f64>> =
        trajectory.points().map(Point::values).collect();
      assert_eq!(points.len(), 2);
      assert_abs_diff_eq!(points[0][0], -1.6, epsilon = 1e-9);
      assert_abs_diff_eq!(points[0][1], -0.8, epsilon = 1e-9);
      assert_abs_diff_eq!(points[1][0], -1.28, epsilon = 1e-9);
      assert_abs_diff_eq!(points[1][1], -0.64, epsilon = 1e-9);
    }

    #[test]
    fn test_report_lines() {
      let trajectory =
        run_descent(&SymbolicEngine, "x^2 + y^2", &xy(), &start(), 0.1, 2);
      insta::assert_snapshot!(trajectory.report(), @r"
      iteration 1: (-1.6000, -0.8000)
      iteration 2: (-1.2800, -0.6400)
      ");
    }

    #[test]
    fn test_zero_iterations() {
      let trajectory =
        run_descent(&SymbolicEngine, "x^2 + y^2", &xy(), &start(), 0.1, 0);
      assert!(trajectory.is_empty());
      assert_eq!(trajectory.final_point(), &start());
      assert_eq!(trajectory.points_with_initial().count(), 1);
    }

    #[test]
    fn test_zero_alpha_stays_put() {
      let trajectory =
        run_descent(&SymbolicEngine, "x^2 + y^2", &xy(), &start(), 0.0, 5);
      assert_eq!(trajectory.len(), 5);
      assert!(trajectory.points().all(|p| p == &start()));
    }

    #[test]
    fn test_negative_alpha_ascends() {
      let trajectory =
        run_descent(&SymbolicEngine, "x^2 + y^2", &xy(), &start(), -0.1, 1);
      let last = trajectory.final_point();
      assert_abs_diff_eq!(last.get("x").unwrap(), -2.4, epsilon = 1e-9);
      assert_abs_diff_eq!(last.get("y").unwrap(), -1.2, epsilon = 1e-9);
    }

    #[test]
    fn test_identical_inputs_identical_trajectories() {
      let run = || {
        run_descent(&SymbolicEngine, "sin(sqrt(x*y))", &xy(), &start(), 0.1, 10)
      };
      assert_eq!(run(), run());
    }

    #[test]
    fn test_empty_variable_set() {
      let trajectory = run_descent(
        &SymbolicEngine,
        "1 + 2",
        &VariableSet::default(),
        &Point::default(),
        0.1,
        3,
      );
      assert_eq!(trajectory.len(), 3);
      assert!(trajectory.points().all(Point::is_empty));
    }

    #[test]
    fn test_initial_point_is_not_mutated() {
      let initial = start();
      let snapshot = initial.clone();
      let trajectory =
        run_descent(&SymbolicEngine, "x^2 + y^2", &xy(), &initial, 0.1, 3);
      assert_eq!(initial, snapshot);
      assert_eq!(trajectory.initial(), &snapshot);
    }

    #[test]
    fn test_missing_coordinates_start_at_zero() {
      let partial = Point::from_values(&VariableSet::new(["x"]), &[1.0]);
      let trajectory =
        run_descent(&SymbolicEngine, "x^2 + y^2", &xy(), &partial, 0.5, 1);
      assert_eq!(trajectory.initial().values(), vec![1.0, 0.0]);
      assert_eq!(trajectory.final_point().values(), vec![0.0, 0.0]);
    }
  }

  mod degraded_evaluation {
    use super::*;

    #[test]
    fn test_domain_error_contributes_zero() {
      // d/dx sqrt(x) = 1 / (2 * sqrt(x)) cannot be evaluated at x = -1
      let variables = VariableSet::new(["x"]);
      let initial = Point::from_values(&variables, &[-1.0]);
      let trajectory =
        run_descent(&SymbolicEngine, "sqrt(x)", &variables, &initial, 0.1, 3);
      assert_eq!(trajectory.len(), 3);
      assert!(trajectory.points().all(|p| p.get("x") == Some(-1.0)));
      assert_eq!(trajectory.failed_evaluations(), 3);

      let gradient = &trajectory.steps()[0].gradient;
      assert_eq!(gradient.value("x"), 0.0);
      assert!(gradient.get("x").is_some_and(Evaluation::is_failed));
    }

    #[test]
    fn test_failing_service_completes_every_iteration() {
      let variables = VariableSet::new(["x"]);
      let initial = Point::from_values(&variables, &[-1.0]);
      let trajectory =
        run_descent(&BrokenEvaluator, "log(x)", &variables, &initial, 0.1, 4);
      assert_eq!(trajectory.len(), 4);
      assert_eq!(trajectory.final_point().get("x"), Some(-1.0));
      let (name, reason) =
        trajectory.steps()[0].gradient.failures().next().unwrap();
      assert_eq!(name, "x");
      assert_eq!(reason, "Cannot evaluate: offline");
    }

    #[test]
    fn test_undifferentiable_variable_is_held() {
      let trajectory =
        run_descent(&SymbolicEngine, "max(x, y)", &xy(), &start(), 0.1, 2);
      assert!(trajectory.partials().iter().all(|p| p.expression.is_none()));
      assert_eq!(trajectory.final_point(), &start());
      assert_eq!(trajectory.failed_evaluations(), 4);
    }

    #[test]
    fn test_infinite_partial_counts_as_failure() {
      // d/dx log(x) = 1 / x is infinite at x = 0
      let variables = VariableSet::new(["x"]);
      let initial = Point::from_values(&variables, &[0.0]);
      let trajectory =
        run_descent(&SymbolicEngine, "log(x)", &variables, &initial, 0.1, 2);
      assert_eq!(
        trajectory.partials()[0].expression.as_deref(),
        Some("1 / x")
      );
      assert!(trajectory.points().all(|p| p.get("x") == Some(0.0)));
      assert_eq!(trajectory.failed_evaluations(), 2);

      let gradient = &trajectory.steps()[0].gradient;
      assert_eq!(gradient.value("x"), 0.0);
      assert!(gradient.get("x").is_some_and(Evaluation::is_failed));
      let (_, reason) = gradient.failures().next().unwrap();
      assert!(reason.starts_with("non-finite"), "{reason}");
    }
  }

  mod integer_limits {
    use super::*;

    #[test]
    fn test_overflowing_integer_literals_complete_the_run() {
      let variables = VariableSet::new(["x"]);
      let initial = Point::from_values(&variables, &[1.0]);
      for expression in [
        "x * ((-9223372036854775807 - 1) / -1)",
        "x^2 + x * (-9223372036854775807 - 1)",
      ] {
        let trajectory =
          run_descent(&SymbolicEngine, expression, &variables, &initial, 0.1, 1);
        assert_eq!(trajectory.len(), 1, "{expression}");
        assert!(trajectory.partials()[0].expression.is_some(), "{expression}");
        assert_eq!(trajectory.failed_evaluations(), 0, "{expression}");
        assert!(trajectory.final_point().get("x").is_some_and(f64::is_finite));
      }
    }
  }

  mod service_calls {
    use super::*;

    #[test]
    fn test_derivatives_taken_once_per_variable() {
      for iterations in [0, 1, 7] {
        let engine = CountingEngine::default();
        run_descent(&engine, "x^2 + y^2", &xy(), &start(), 0.1, iterations);
        assert_eq!(engine.differentiations.get(), 2);
        assert_eq!(engine.evaluations.get(), 2 * iterations);
      }
    }
  }

  mod serialization {
    use super::*;

    #[test]
    fn test_trajectory_json_keeps_variable_order() {
      let variables = VariableSet::new(["y", "x"]);
      let initial = Point::from_values(&variables, &[1.0, 2.0]);
      let trajectory =
        run_descent(&SymbolicEngine, "x + y", &variables, &initial, 0.5, 1);
      let json = serde_json::to_value(&trajectory).unwrap();
      assert_eq!(json["variables"], serde_json::json!(["y", "x"]));
      assert_eq!(
        serde_json::to_string(trajectory.initial()).unwrap(),
        r#"{"y":1.0,"x":2.0}"#
      );
      assert_eq!(
        json["steps"][0]["gradient"]["entries"][0],
        serde_json::json!(["y", { "value": 1.0 }])
      );
    }
  }
}
