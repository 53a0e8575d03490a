//! Interactive state: the current expression and parameters, plus the most
//! recent trajectory and surface computed from them.
//!
//! Each recomputation replaces the previous result wholesale.

use tracing::{debug, info};

use crate::GradvizError;
use crate::config::Config;
use crate::descent::{Trajectory, run_descent};
use crate::point::Point;
use crate::service::{Differentiate, Evaluate, SymbolicEngine};
use crate::surface::{Marker, SurfaceSample, sample_surface, trajectory_markers};
use crate::variables::{VariableDetector, VariableSet};

#[derive(Debug, Clone)]
pub struct Session<S = SymbolicEngine> {
  service: S,
  detector: VariableDetector,
  expression: String,
  variables: VariableSet,
  initial_point: Point,
  alpha: f64,
  iterations: usize,
  resolution: usize,
  trajectory: Option<Trajectory>,
  surface: Option<SurfaceSample>,
}

impl Default for Session {
  fn default() -> Self {
    Session::new(SymbolicEngine, &Config::default())
  }
}

impl<S> Session<S>
where
  S: Differentiate + Evaluate,
{
  pub fn new(service: S, config: &Config) -> Self {
    let detector = VariableDetector::default();
    let variables = detector.detect(&config.expression);
    let initial_point = config.initial_point_for(&variables);
    Session {
      service,
      detector,
      expression: config.expression.clone(),
      variables,
      initial_point,
      alpha: config.alpha,
      iterations: config.iterations,
      resolution: config.resolution,
      trajectory: None,
      surface: None,
    }
  }

  pub fn expression(&self) -> &str {
    &self.expression
  }

  pub fn variables(&self) -> &VariableSet {
    &self.variables
  }

  pub fn initial_point(&self) -> &Point {
    &self.initial_point
  }

  pub fn alpha(&self) -> f64 {
    self.alpha
  }

  pub fn iterations(&self) -> usize {
    self.iterations
  }

  pub fn resolution(&self) -> usize {
    self.resolution
  }

  pub fn service(&self) -> &S {
    &self.service
  }

  /// Replace the expression. Variables are re-detected and the initial
  /// point is re-keyed: coordinates of surviving variables are kept, new
  /// ones start at `0.0`. Previous results are discarded.
  pub fn set_expression(&mut self, expression: impl Into<String>) {
    self.expression = expression.into();
    self.variables = self.detector.detect(&self.expression);
    self.initial_point = self.initial_point.rekeyed(&self.variables);
    self.trajectory = None;
    self.surface = None;
    debug!(
      expression = %self.expression,
      variables = ?self.variables.as_slice(),
      "expression changed"
    );
  }

  pub fn set_initial_point(&mut self, point: &Point) {
    self.initial_point = point.rekeyed(&self.variables);
    self.trajectory = None;
  }

  /// Free-form entry such as `(-2, -1)`: numbers are taken in order and
  /// missing ones default to `0.0`.
  pub fn set_initial_from_text(&mut self, text: &str) {
    self.initial_point = Point::parse_coordinates(&self.variables, text);
    self.trajectory = None;
  }

  pub fn set_alpha(&mut self, alpha: f64) {
    self.alpha = alpha;
    self.trajectory = None;
  }

  pub fn set_iterations(&mut self, iterations: usize) {
    self.iterations = iterations;
    self.trajectory = None;
  }

  pub fn set_resolution(&mut self, resolution: usize) {
    self.resolution = resolution;
    self.surface = None;
  }

  /// Run descent with the current parameters, replacing any previous run.
  pub fn execute(&mut self) -> &Trajectory {
    info!(
      expression = %self.expression,
      alpha = self.alpha,
      iterations = self.iterations,
      "running descent"
    );
    self.trajectory.insert(run_descent(
      &self.service,
      &self.expression,
      &self.variables,
      &self.initial_point,
      self.alpha,
      self.iterations,
    ))
  }

  pub fn trajectory(&self) -> Option<&Trajectory> {
    self.trajectory.as_ref()
  }

  /// The surface for the current expression, sampled on first use.
  pub fn surface(&mut self) -> Result<&SurfaceSample, GradvizError> {
    let sample = match self.surface.take() {
      Some(sample) => sample,
      None => self.sample()?,
    };
    Ok(&*self.surface.insert(sample))
  }

  /// Resample unconditionally, replacing any cached surface.
  pub fn refresh_surface(&mut self) -> Result<&SurfaceSample, GradvizError> {
    let sample = self.sample()?;
    Ok(&*self.surface.insert(sample))
  }

  fn sample(&self) -> Result<SurfaceSample, GradvizError> {
    debug!(resolution = self.resolution, "sampling surface");
    sample_surface(&self.service, &self.expression, self.resolution)
  }

  /// Markers for the last trajectory; empty before the first `execute`.
  pub fn markers(&self) -> Vec<Marker> {
    self
      .trajectory
      .as_ref()
      .map(|trajectory| {
        trajectory_markers(&self.service, &self.expression, trajectory)
      })
      .unwrap_or_default()
  }

  /// Formatted steps of the last run, empty before the first `execute`.
  pub fn report(&self) -> String {
    self
      .trajectory
      .as_ref()
      .map(Trajectory::report)
      .unwrap_or_default()
  }
}
