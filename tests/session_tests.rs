use approx::assert_abs_diff_eq;
use gradviz::{Config, GradvizError, Point, Session, SymbolicEngine};

mod session_tests {
  use super::*;

  mod config_tests {
    use super::*;

    #[test]
    fn test_defaults() {
      let config = Config::default();
      assert_eq!(config.expression, "sin(sqrt(x*y))");
      assert_eq!(config.initial_point.get("x"), Some(&-2.0));
      assert_eq!(config.initial_point.get("y"), Some(&-1.0));
      assert_eq!(config.alpha, 0.1);
      assert_eq!(config.iterations, 1);
      assert_eq!(config.resolution, 50);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
      let config =
        Config::from_json_str(r#"{ "alpha": 0.5, "iterations": 3 }"#).unwrap();
      assert_eq!(config.alpha, 0.5);
      assert_eq!(config.iterations, 3);
      assert_eq!(config.expression, Config::default().expression);
    }

    #[test]
    fn test_invalid_json() {
      let err = Config::from_json_str(r#"{ "alpha": "fast" }"#).unwrap_err();
      assert!(matches!(err, GradvizError::ConfigError(_)));
    }

    #[test]
    fn test_missing_file() {
      let err = Config::from_path("/nonexistent/gradviz.json").unwrap_err();
      assert!(matches!(err, GradvizError::IoError(_)));
    }

    #[test]
    fn test_initial_point_follows_variable_order() {
      let config = Config::from_json_str(
        r#"{ "expression": "b + a", "initial_point": { "a": 1, "c": 9 } }"#,
      )
      .unwrap();
      let session = Session::new(SymbolicEngine, &config);
      assert_eq!(session.initial_point().to_string(), "(0.0000, 1.0000)");
    }
  }

  mod execute_tests {
    use super::*;

    #[test]
    fn test_default_session() {
      let mut session = Session::default();
      assert_eq!(session.variables().as_slice(), ["x", "y"]);
      assert!(session.trajectory().is_none());
      assert_eq!(session.report(), "");

      let trajectory = session.execute();
      assert_eq!(trajectory.len(), 1);
      assert!(session.trajectory().is_some());
      assert_eq!(session.markers().len(), 2);
    }

    #[test]
    fn test_changing_expression_keeps_shared_coordinates() {
      let mut session = Session::default();
      session.set_expression("x^2 + z");
      assert_eq!(session.variables().as_slice(), ["x", "z"]);
      assert_eq!(session.initial_point().values(), vec![-2.0, 0.0]);

      session.execute();
      let last = session.trajectory().unwrap().final_point();
      assert_abs_diff_eq!(last.get("x").unwrap(), -1.6, epsilon = 1e-9);
      assert_abs_diff_eq!(last.get("z").unwrap(), -0.1, epsilon = 1e-9);
    }

    #[test]
    fn test_parameter_change_discards_trajectory() {
      let mut session = Session::default();
      session.execute();
      session.set_alpha(0.2);
      assert!(session.trajectory().is_none());
    }

    #[test]
    fn test_last_run_wins() {
      let mut session = Session::default();
      session.set_expression("x^2 + y^2");
      session.set_initial_from_text("(-2, -1)");
      session.set_iterations(1);
      session.execute();
      session.set_iterations(2);
      session.execute();
      insta::assert_snapshot!(session.report(), @r"
      iteration 1: (-1.6000, -0.8000)
      iteration 2: (-1.2800, -0.6400)
      ");
    }

    #[test]
    fn test_initial_point_text_defaults_missing_values() {
      let mut session = Session::default();
      session.set_initial_from_text("3");
      assert_eq!(session.initial_point().values(), vec![3.0, 0.0]);

      let other = Point::parse_assignments("y=4, x=1").unwrap();
      session.set_initial_point(&other);
      assert_eq!(session.initial_point().values(), vec![1.0, 4.0]);
    }
  }

  mod surface_tests {
    use super::*;

    #[test]
    fn test_surface_is_cached_until_invalidated() {
      let mut session = Session::default();
      session.set_resolution(3);
      assert_eq!(session.surface().unwrap().points().len(), 9);

      session.set_expression("x + y");
      let sample = session.surface().unwrap();
      assert_eq!(sample.max_z(), 10.0);
    }

    #[test]
    fn test_bad_resolution_surfaces_as_error() {
      let mut session = Session::default();
      session.set_resolution(1);
      assert!(matches!(
        session.refresh_surface(),
        Err(GradvizError::InvalidResolution(1))
      ));
    }
  }
}
