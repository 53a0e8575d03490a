use gradviz::{VariableDetector, VariableSet, detect_variables};

mod variable_tests {
  use super::*;

  fn names(set: &VariableSet) -> Vec<&str> {
    set.iter().map(String::as_str).collect()
  }

  mod detect_variables_tests {
    use super::*;

    #[test]
    fn test_reserved_functions_are_skipped() {
      assert_eq!(names(&detect_variables("sin(sqrt(x*y))")), ["x", "y"]);
      assert_eq!(names(&detect_variables("sin(x)")), ["x"]);
    }

    #[test]
    fn test_first_seen_order() {
      assert_eq!(names(&detect_variables("cos(a) + b*c")), ["a", "b", "c"]);
      assert_eq!(names(&detect_variables("y + x + y*x")), ["y", "x"]);
    }

    #[test]
    fn test_no_identifiers() {
      assert!(detect_variables("1 + 2 * 3").is_empty());
      assert!(detect_variables("").is_empty());
    }

    #[test]
    fn test_digits_end_an_identifier() {
      assert_eq!(names(&detect_variables("x1 + x2")), ["x"]);
    }

    #[test]
    fn test_implicit_products() {
      assert_eq!(names(&detect_variables("2x + 3sin(y)")), ["x", "y"]);
    }

    #[test]
    fn test_every_reserved_name() {
      let expression = "sin cos tan log sqrt abs exp ceil floor round sign \
                        max min pow atan acos asin acosh asinh atanh";
      assert!(detect_variables(expression).is_empty());
    }

    #[test]
    fn test_unreserved_function_names_are_reported() {
      assert_eq!(names(&detect_variables("sinh(t)")), ["sinh", "t"]);
    }
  }

  mod detector_tests {
    use super::*;

    #[test]
    fn test_custom_reserved_set() {
      let detector = VariableDetector::with_reserved(["f"]);
      assert_eq!(names(&detector.detect("f(x) + sin(y)")), ["x", "sin", "y"]);
      assert!(detector.is_reserved("f"));
      assert!(!detector.is_reserved("sin"));
    }

    #[test]
    fn test_detection_is_repeatable() {
      let detector = VariableDetector::default();
      assert_eq!(detector.detect("a*b"), detector.detect("a*b"));
    }
  }

  mod variable_set_tests {
    use super::*;

    #[test]
    fn test_position_and_contains() {
      let set = VariableSet::new(["x", "y"]);
      assert_eq!(set.position("y"), Some(1));
      assert!(set.contains("x"));
      assert!(!set.contains("z"));
      assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_serializes_as_array() {
      let set = VariableSet::new(["x", "y"]);
      assert_eq!(serde_json::to_string(&set).unwrap(), r#"["x","y"]"#);
    }
  }
}
