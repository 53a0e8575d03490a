//! Static SVG rendering of a sampled surface and its descent markers.
//!
//! Orthographic camera, flat-shaded triangles drawn back to front, markers
//! on top.

use std::fmt::Write;

use crate::GradvizError;
use crate::surface::{DOMAIN_MAX, DOMAIN_MIN, Marker, SurfaceSample};

/// Height of the normalized box relative to its unit half-width.
const Z_SCALE: f64 = 0.4;
const MARGIN: f64 = 40.0;
const AXIS_COLOR: &str = "#666666";
const MARKER_COLOR: &str = "#ffd700";
const FINAL_MARKER_COLOR: &str = "#ff0000";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SvgOptions {
  pub width: u32,
  pub height: u32,
  /// Stroke triangle edges.
  pub show_mesh: bool,
  pub marker_radius: f64,
}

impl Default for SvgOptions {
  fn default() -> Self {
    SvgOptions {
      width: 480,
      height: 400,
      show_mesh: false,
      marker_radius: 4.0,
    }
  }
}

#[derive(Clone, Copy)]
struct Vertex {
  x: f64,
  y: f64,
  z: f64,
}

struct Camera {
  azimuth: f64,
  elevation: f64,
}

impl Default for Camera {
  fn default() -> Self {
    Camera {
      azimuth: -1.07,
      elevation: 0.63,
    }
  }
}

impl Camera {
  fn project(&self, v: Vertex) -> (f64, f64) {
    let (sa, ca) = self.azimuth.sin_cos();
    let (se, ce) = self.elevation.sin_cos();
    let screen_x = -v.x * sa + v.y * ca;
    let screen_y = -v.x * ca * se - v.y * sa * se + v.z * ce;
    (screen_x, screen_y)
  }

  /// Larger is further from the viewer.
  fn depth(&self, v: Vertex) -> f64 {
    let (sa, ca) = self.azimuth.sin_cos();
    let (se, ce) = self.elevation.sin_cos();
    -(v.x * ce * ca + v.y * ce * sa + v.z * se)
  }
}

struct Face {
  projected: [(f64, f64); 3],
  depth: f64,
  color: (u8, u8, u8),
}

fn normalize_xy(value: f64) -> f64 {
  (value - DOMAIN_MIN) / (DOMAIN_MAX - DOMAIN_MIN) * 2.0 - 1.0
}

fn vertex(sample: &SurfaceSample, x: f64, y: f64, z: f64) -> Vertex {
  Vertex {
    x: normalize_xy(x),
    y: normalize_xy(y),
    z: (sample.normalized(z) * 2.0 - 1.0) * Z_SCALE,
  }
}

fn triangle_normal(v0: Vertex, v1: Vertex, v2: Vertex) -> [f64; 3] {
  let (ux, uy, uz) = (v1.x - v0.x, v1.y - v0.y, v1.z - v0.z);
  let (vx, vy, vz) = (v2.x - v0.x, v2.y - v0.y, v2.z - v0.z);
  let n = [uy * vz - uz * vy, uz * vx - ux * vz, ux * vy - uy * vx];
  let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
  if len < 1e-15 {
    [0.0, 0.0, 1.0]
  } else {
    [n[0] / len, n[1] / len, n[2] / len]
  }
}

/// Ambient plus two-sided diffuse from a fixed upper-left light.
fn shade(color: [f32; 3], normal: [f64; 3]) -> (u8, u8, u8) {
  let light = {
    let (lx, ly, lz) = (0.4_f64, -0.5_f64, 0.76_f64);
    let len = (lx * lx + ly * ly + lz * lz).sqrt();
    [lx / len, ly / len, lz / len]
  };
  let diffuse =
    (normal[0] * light[0] + normal[1] * light[1] + normal[2] * light[2]).abs();
  let ambient = 0.35;
  let intensity = (ambient + (1.0 - ambient) * diffuse).clamp(0.0, 1.0);
  let channel = |c: f32| (c as f64 * intensity * 255.0).round() as u8;
  (channel(color[0]), channel(color[1]), channel(color[2]))
}

fn box_corners() -> impl Iterator<Item = Vertex> {
  [-1.0, 1.0].into_iter().flat_map(|x| {
    [-1.0, 1.0].into_iter().flat_map(move |y| {
      [-Z_SCALE, Z_SCALE].into_iter().map(move |z| Vertex { x, y, z })
    })
  })
}

/// Render `sample` as an SVG document with `markers` drawn over it, the
/// last marker in red and the rest in yellow.
pub fn render_svg(
  sample: &SurfaceSample,
  markers: &[Marker],
  options: &SvgOptions,
) -> Result<String, GradvizError> {
  let camera = Camera::default();
  let points = sample.points();

  let mut faces: Vec<Face> = sample
    .triangles()
    .into_iter()
    .map(|[a, b, c]| {
      let corners = [a, b, c].map(|index| {
        let p = points[index as usize];
        (vertex(sample, p.x, p.y, p.z), p.z)
      });
      let [v0, v1, v2] = corners.map(|(v, _)| v);
      let mean_z = corners.iter().map(|(_, z)| z).sum::<f64>() / 3.0;
      let center = Vertex {
        x: (v0.x + v1.x + v2.x) / 3.0,
        y: (v0.y + v1.y + v2.y) / 3.0,
        z: (v0.z + v1.z + v2.z) / 3.0,
      };
      Face {
        projected: [v0, v1, v2].map(|v| camera.project(v)),
        depth: camera.depth(center),
        color: shade(sample.color(mean_z), triangle_normal(v0, v1, v2)),
      }
    })
    .collect();

  faces.sort_by(|a, b| {
    b.depth
      .partial_cmp(&a.depth)
      .unwrap_or(std::cmp::Ordering::Equal)
  });

  let (mut px_min, mut px_max) = (f64::INFINITY, f64::NEG_INFINITY);
  let (mut py_min, mut py_max) = (f64::INFINITY, f64::NEG_INFINITY);
  let projected = faces
    .iter()
    .flat_map(|face| face.projected)
    .chain(box_corners().map(|v| camera.project(v)));
  for (px, py) in projected {
    px_min = px_min.min(px);
    px_max = px_max.max(px);
    py_min = py_min.min(py);
    py_max = py_max.max(py);
  }

  let p_width = px_max - px_min;
  let p_height = py_max - py_min;
  if !(p_width > 1e-15 && p_height > 1e-15) {
    return Err(GradvizError::RenderError("degenerate projection".into()));
  }

  let width = options.width as f64;
  let height = options.height as f64;
  let draw_w = width - 2.0 * MARGIN;
  let draw_h = height - 2.0 * MARGIN;
  if draw_w <= 0.0 || draw_h <= 0.0 {
    return Err(GradvizError::RenderError(format!(
      "{}x{} leaves no room to draw",
      options.width, options.height
    )));
  }
  let scale = (draw_w / p_width).min(draw_h / p_height);
  let (cx, cy) = (MARGIN + draw_w / 2.0, MARGIN + draw_h / 2.0);
  let (p_cx, p_cy) = ((px_min + px_max) / 2.0, (py_min + py_max) / 2.0);
  let to_svg = |(px, py): (f64, f64)| -> (f64, f64) {
    (cx + (px - p_cx) * scale, cy - (py - p_cy) * scale)
  };

  let mut svg = String::with_capacity(faces.len() * 110 + 1024);
  let stroke = if options.show_mesh {
    "stroke=\"#00000018\" stroke-width=\"0.5\""
  } else {
    "stroke=\"none\""
  };

  // Writing into a String cannot fail.
  let _ = writeln!(
    svg,
    "<svg width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\" \
     xmlns=\"http://www.w3.org/2000/svg\">",
    w = options.width,
    h = options.height
  );
  let _ = writeln!(
    svg,
    "<rect width=\"{}\" height=\"{}\" fill=\"white\"/>",
    options.width, options.height
  );

  for face in &faces {
    let [(x0, y0), (x1, y1), (x2, y2)] = face.projected.map(to_svg);
    let (r, g, b) = face.color;
    let _ = writeln!(
      svg,
      "<polygon points=\"{x0:.1},{y0:.1} {x1:.1},{y1:.1} {x2:.1},{y2:.1}\" \
       fill=\"rgb({r},{g},{b})\" {stroke}/>"
    );
  }

  draw_axes(&mut svg, &camera, &to_svg);

  for marker in markers {
    let (sx, sy) =
      to_svg(camera.project(vertex(sample, marker.x, marker.y, marker.z)));
    let fill = if marker.is_final {
      FINAL_MARKER_COLOR
    } else {
      MARKER_COLOR
    };
    let _ = writeln!(
      svg,
      "<circle cx=\"{sx:.1}\" cy=\"{sy:.1}\" r=\"{:.1}\" fill=\"{fill}\" \
       stroke=\"#333333\" stroke-width=\"0.5\"/>",
      options.marker_radius
    );
  }

  svg.push_str("</svg>");
  Ok(svg)
}

/// The three box edges meeting at the bottom corner nearest the viewer.
fn draw_axes(
  svg: &mut String,
  camera: &Camera,
  to_svg: &dyn Fn((f64, f64)) -> (f64, f64),
) {
  let origin = box_corners()
    .filter(|corner| corner.z < 0.0)
    .min_by(|a, b| {
      camera
        .depth(*a)
        .partial_cmp(&camera.depth(*b))
        .unwrap_or(std::cmp::Ordering::Equal)
    })
    .unwrap_or(Vertex {
      x: -1.0,
      y: -1.0,
      z: -Z_SCALE,
    });

  let ends = [
    ("x", Vertex { x: -origin.x, ..origin }),
    ("y", Vertex { y: -origin.y, ..origin }),
    ("z", Vertex { z: Z_SCALE, ..origin }),
  ];
  let (sx0, sy0) = to_svg(camera.project(origin));
  for (label, end) in ends {
    let (sx1, sy1) = to_svg(camera.project(end));
    let _ = writeln!(
      svg,
      "<line x1=\"{sx0:.1}\" y1=\"{sy0:.1}\" x2=\"{sx1:.1}\" y2=\"{sy1:.1}\" \
       stroke=\"{AXIS_COLOR}\" stroke-width=\"1\"/>"
    );
    let _ = writeln!(
      svg,
      "<text x=\"{sx1:.1}\" y=\"{sy1:.1}\" font-size=\"10\" \
       fill=\"{AXIS_COLOR}\" text-anchor=\"middle\">{label}</text>"
    );
  }
}
