//! Height-field sampling of an expression over a fixed square domain.

use serde::Serialize;
use tracing::warn;

use crate::GradvizError;
use crate::descent::Trajectory;
use crate::point::{Evaluation, Point};
use crate::service::Evaluate;
use crate::variables::VariableSet;

/// Both axes span `[DOMAIN_MIN, DOMAIN_MAX]`.
pub const DOMAIN_MIN: f64 = -5.0;
pub const DOMAIN_MAX: f64 = 5.0;
pub const DEFAULT_RESOLUTION: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SurfacePoint {
  pub x: f64,
  pub y: f64,
  pub z: f64,
  /// `z` is a substituted `0.0` because evaluation failed here.
  pub degraded: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SurfaceSample {
  resolution: usize,
  points: Vec<SurfacePoint>,
  min_z: f64,
  max_z: f64,
}

/// Flat vertex buffers for a triangle mesh renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SurfaceMesh {
  pub positions: Vec<[f32; 3]>,
  pub colors: Vec<[f32; 3]>,
  pub indices: Vec<u32>,
}

/// A visited point lifted onto the surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Marker {
  pub x: f64,
  pub y: f64,
  pub z: f64,
  pub degraded: bool,
  pub is_final: bool,
}

fn axis_variables() -> VariableSet {
  VariableSet::new(["x", "y"])
}

fn grid_coordinate(index: usize, resolution: usize) -> f64 {
  (index as f64 / (resolution - 1) as f64) * (DOMAIN_MAX - DOMAIN_MIN)
    + DOMAIN_MIN
}

/// Sample `expression` on a `resolution × resolution` grid with `x` bound
/// to the row coordinate and `y` to the column coordinate.
///
/// Points that fail to evaluate, or evaluate to a non-finite value, are
/// recorded as `z = 0.0` and flagged as degraded.
pub fn sample_surface<S>(
  service: &S,
  expression: &str,
  resolution: usize,
) -> Result<SurfaceSample, GradvizError>
where
  S: Evaluate + ?Sized,
{
  if resolution < 2 {
    return Err(GradvizError::InvalidResolution(resolution));
  }

  let variables = axis_variables();
  let mut points = Vec::with_capacity(resolution * resolution);
  let mut min_z = f64::INFINITY;
  let mut max_z = f64::NEG_INFINITY;
  let mut failures = 0usize;

  for i in 0..resolution {
    let x = grid_coordinate(i, resolution);
    for j in 0..resolution {
      let y = grid_coordinate(j, resolution);
      let bindings = Point::from_values(&variables, &[x, y]);
      let evaluation =
        Evaluation::from_result(service.evaluate(expression, &bindings));
      let degraded = evaluation.is_failed();
      if degraded {
        failures += 1;
      }
      let z = evaluation.value_or_zero();
      min_z = min_z.min(z);
      max_z = max_z.max(z);
      points.push(SurfacePoint { x, y, z, degraded });
    }
  }

  if failures > 0 {
    warn!(
      expression,
      failures,
      total = points.len(),
      "surface samples degraded to zero"
    );
  }

  Ok(SurfaceSample {
    resolution,
    points,
    min_z,
    max_z,
  })
}

impl SurfaceSample {
  pub fn resolution(&self) -> usize {
    self.resolution
  }

  /// Row-major: index `i * resolution + j` holds grid cell `(i, j)`.
  pub fn points(&self) -> &[SurfacePoint] {
    &self.points
  }

  pub fn min_z(&self) -> f64 {
    self.min_z
  }

  pub fn max_z(&self) -> f64 {
    self.max_z
  }

  pub fn degraded_count(&self) -> usize {
    self.points.iter().filter(|p| p.degraded).count()
  }

  /// Height mapped to `[0, 1]` against the sampled range; `0.0` on a flat
  /// surface.
  pub fn normalized(&self, z: f64) -> f64 {
    let range = self.max_z - self.min_z;
    if range == 0.0 || !range.is_finite() {
      0.0
    } else {
      (z - self.min_z) / range
    }
  }

  /// Vertex colour `(t, 0.5, 1 - t)`: blue at the bottom, red at the top.
  pub fn color(&self, z: f64) -> [f32; 3] {
    let t = self.normalized(z).clamp(0.0, 1.0) as f32;
    [t, 0.5, 1.0 - t]
  }

  /// Two triangles per grid cell, `(a, b, d)` and `(a, d, c)`, where `a` is
  /// the cell's own vertex, `b` the next column, `c` the next row and `d`
  /// the diagonal.
  pub fn triangles(&self) -> Vec<[u32; 3]> {
    let n = self.resolution;
    let mut triangles = Vec::with_capacity(2 * (n - 1) * (n - 1));
    for i in 0..n - 1 {
      for j in 0..n - 1 {
        let a = (i * n + j) as u32;
        let b = a + 1;
        let c = ((i + 1) * n + j) as u32;
        let d = c + 1;
        triangles.push([a, b, d]);
        triangles.push([a, d, c]);
      }
    }
    triangles
  }

  pub fn mesh(&self) -> SurfaceMesh {
    SurfaceMesh {
      positions: self
        .points
        .iter()
        .map(|p| [p.x as f32, p.y as f32, p.z as f32])
        .collect(),
      colors: self.points.iter().map(|p| self.color(p.z)).collect(),
      indices: self.triangles().into_iter().flatten().collect(),
    }
  }
}

/// Lift every visited point of `trajectory`, initial point included, onto
/// the surface of `expression`. The last marker is flagged as final.
pub fn trajectory_markers<S>(
  service: &S,
  expression: &str,
  trajectory: &Trajectory,
) -> Vec<Marker>
where
  S: Evaluate + ?Sized,
{
  let total = trajectory.len() + 1;
  trajectory
    .points_with_initial()
    .enumerate()
    .map(|(index, point)| {
      let evaluation =
        Evaluation::from_result(service.evaluate(expression, point));
      if let Evaluation::Failed(reason) = &evaluation {
        warn!(%point, %reason, "marker height degraded to zero");
      }
      Marker {
        x: point.get("x").unwrap_or(0.0),
        y: point.get("y").unwrap_or(0.0),
        z: evaluation.value_or_zero(),
        degraded: evaluation.is_failed(),
        is_final: index + 1 == total,
      }
    })
    .collect()
}
