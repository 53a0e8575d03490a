//! Fixed-step steepest descent over the variables of an expression.

use serde::Serialize;
use tracing::{debug, warn};

use crate::point::{Evaluation, Point};
use crate::service::{Differentiate, Evaluate};
use crate::variables::VariableSet;

/// Symbolic partial derivative of the objective with respect to one
/// variable. `expression` is `None` when differentiation failed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Partial {
  pub variable: String,
  pub expression: Option<String>,
}

/// One partial-derivative outcome per variable, at a single point.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Gradient {
  entries: Vec<(String, Evaluation)>,
}

impl Gradient {
  /// Degraded value: failed entries read as `0.0`.
  pub fn value(&self, variable: &str) -> f64 {
    self
      .get(variable)
      .map(Evaluation::value_or_zero)
      .unwrap_or(0.0)
  }

  pub fn get(&self, variable: &str) -> Option<&Evaluation> {
    self
      .entries
      .iter()
      .find(|(name, _)| name == variable)
      .map(|(_, evaluation)| evaluation)
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &Evaluation)> + '_ {
    self.entries.iter().map(|(name, e)| (name.as_str(), e))
  }

  pub fn failures(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
    self.entries.iter().filter_map(|(name, e)| match e {
      Evaluation::Failed(reason) => Some((name.as_str(), reason.as_str())),
      Evaluation::Value(_) => None,
    })
  }
}

/// State after one completed step, with the gradient it was taken along.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Step {
  /// 1-based
  pub iteration: usize,
  pub gradient: Gradient,
  pub point: Point,
}

/// The points visited by one descent run.
///
/// `steps` holds exactly one entry per iteration and does not include the
/// starting point, which is kept separately in `initial`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trajectory {
  variables: VariableSet,
  alpha: f64,
  partials: Vec<Partial>,
  initial: Point,
  steps: Vec<Step>,
}

impl Trajectory {
  pub fn variables(&self) -> &VariableSet {
    &self.variables
  }

  pub fn alpha(&self) -> f64 {
    self.alpha
  }

  pub fn partials(&self) -> &[Partial] {
    &self.partials
  }

  pub fn initial(&self) -> &Point {
    &self.initial
  }

  pub fn steps(&self) -> &[Step] {
    &self.steps
  }

  pub fn len(&self) -> usize {
    self.steps.len()
  }

  pub fn is_empty(&self) -> bool {
    self.steps.is_empty()
  }

  /// Points after each step, initial point excluded.
  pub fn points(&self) -> impl Iterator<Item = &Point> + '_ {
    self.steps.iter().map(|step| &step.point)
  }

  /// Initial point followed by every step: `len() + 1` points.
  pub fn points_with_initial(&self) -> impl Iterator<Item = &Point> + '_ {
    std::iter::once(&self.initial).chain(self.points())
  }

  /// Where the run ended; the initial point when no step was taken.
  pub fn final_point(&self) -> &Point {
    self.steps.last().map_or(&self.initial, |step| &step.point)
  }

  /// Number of gradient entries that degraded to zero.
  pub fn failed_evaluations(&self) -> usize {
    self
      .steps
      .iter()
      .map(|step| step.gradient.failures().count())
      .sum()
  }

  /// One line per step, `iteration k: (x, y)`.
  pub fn report(&self) -> String {
    self
      .steps
      .iter()
      .map(|step| format!("iteration {}: {}", step.iteration, step.point))
      .collect::<Vec<_>>()
      .join("\n")
  }
}

/// Run `iterations` steps of `next[v] = current[v] - alpha * df/dv(current)`.
///
/// Partial derivatives are taken once from `expression` before the loop and
/// then only evaluated. Any differentiation or evaluation failure, including
/// a non-finite value, contributes `0.0` for that variable on that step and
/// is logged; the run always completes every iteration. `alpha` is not
/// validated, so zero gives a constant trajectory and a negative value
/// ascends.
pub fn run_descent<S>(
  service: &S,
  expression: &str,
  variables: &VariableSet,
  initial: &Point,
  alpha: f64,
  iterations: usize,
) -> Trajectory
where
  S: Differentiate + Evaluate + ?Sized,
{
  let partials: Vec<Partial> = variables
    .iter()
    .map(|variable| {
      let derivative = match service.differentiate(expression, variable) {
        Ok(derivative) => {
          debug!(%variable, %derivative, "partial derivative");
          Some(derivative)
        }
        Err(e) => {
          warn!(%variable, error = %e, "cannot differentiate, using zero");
          None
        }
      };
      Partial {
        variable: variable.clone(),
        expression: derivative,
      }
    })
    .collect();

  let initial = initial.rekeyed(variables);
  let mut current = initial.clone();
  let mut steps = Vec::with_capacity(iterations);

  for iteration in 1..=iterations {
    let gradient = gradient_at(service, &partials, &current);
    let next = current.map(|name, value| value - alpha * gradient.value(name));
    debug!(iteration, point = %next, "descent step");
    steps.push(Step {
      iteration,
      gradient,
      point: next.clone(),
    });
    current = next;
  }

  Trajectory {
    variables: variables.clone(),
    alpha,
    partials,
    initial,
    steps,
  }
}

fn gradient_at<S>(service: &S, partials: &[Partial], point: &Point) -> Gradient
where
  S: Evaluate + ?Sized,
{
  let entries = partials
    .iter()
    .map(|partial| {
      let evaluation = match &partial.expression {
        Some(derivative) => {
          Evaluation::from_result(service.evaluate(derivative, point))
        }
        None => Evaluation::Failed(format!(
          "no derivative with respect to {}",
          partial.variable
        )),
      };
      if let Evaluation::Failed(reason) = &evaluation {
        warn!(
          variable = %partial.variable,
          %point,
          %reason,
          "gradient entry degraded to zero"
        );
      }
      (partial.variable.clone(), evaluation)
    })
    .collect();
  Gradient { entries }
}
