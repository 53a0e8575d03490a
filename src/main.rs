use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use gradviz::render::{SvgOptions, render_svg};
use gradviz::surface::trajectory_markers;
use gradviz::{
  Config, Point, SymbolicEngine, Trajectory, VariableSet, detect_variables,
  run_descent, sample_surface,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// JSON file with default expression, point, alpha, iterations and
  /// resolution
  #[arg(long, global = true)]
  config: Option<PathBuf>,

  /// Log every derivative and descent step
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Print the variables an expression depends on
  Variables { expression: String },
  /// Print the partial derivative with respect to one variable
  Diff { expression: String, variable: String },
  /// Evaluate an expression at a point
  Eval {
    expression: String,
    /// Bindings such as `x=1,y=2`
    #[arg(long)]
    at: Option<String>,
  },
  /// Run gradient descent and print each visited point
  Descend {
    expression: Option<String>,
    #[command(flatten)]
    descent: DescentArgs,
    /// Print the full trajectory as JSON
    #[arg(long)]
    json: bool,
  },
  /// Sample the surface, optionally with a descent run drawn on top
  Surface {
    expression: Option<String>,
    #[arg(long)]
    resolution: Option<usize>,
    /// Write an SVG rendering to this file
    #[arg(long)]
    svg: Option<PathBuf>,
    /// Print the triangle mesh as JSON
    #[arg(long)]
    json: bool,
    #[command(flatten)]
    descent: DescentArgs,
  },
}

#[derive(Args)]
struct DescentArgs {
  /// Starting point such as `(-2, -1)`, one number per variable
  #[arg(long, allow_hyphen_values = true)]
  point: Option<String>,
  #[arg(long, allow_hyphen_values = true)]
  alpha: Option<f64>,
  #[arg(long)]
  iterations: Option<usize>,
}

impl DescentArgs {
  fn is_set(&self) -> bool {
    self.point.is_some() || self.alpha.is_some() || self.iterations.is_some()
  }

  fn run(&self, config: &Config, expression: &str) -> Trajectory {
    let variables = detect_variables(expression);
    let initial = self.initial_point(config, &variables);
    run_descent(
      &SymbolicEngine,
      expression,
      &variables,
      &initial,
      self.alpha.unwrap_or(config.alpha),
      self.iterations.unwrap_or(config.iterations),
    )
  }

  fn initial_point(&self, config: &Config, variables: &VariableSet) -> Point {
    match &self.point {
      Some(text) => Point::parse_coordinates(variables, text),
      None => config.initial_point_for(variables),
    }
  }
}

fn init_logging(verbose: bool) {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
    EnvFilter::new(if verbose { "gradviz=debug" } else { "warn" })
  });
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .init();
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
  match path {
    Some(path) => Config::from_path(path)
      .with_context(|| format!("reading config {}", path.display())),
    None => Ok(Config::default()),
  }
}

fn main() -> Result<()> {
  let cli = Cli::parse();
  init_logging(cli.verbose);
  let config = load_config(cli.config.as_ref())?;

  match cli.command {
    Commands::Variables { expression } => {
      let variables = detect_variables(&expression);
      println!("{}", variables.as_slice().join(", "));
    }
    Commands::Diff {
      expression,
      variable,
    } => {
      let derivative = gradviz::differentiate(&expression, &variable)
        .with_context(|| format!("differentiating {expression}"))?;
      println!("{derivative}");
    }
    Commands::Eval { expression, at } => {
      let bindings = match at {
        Some(text) => Point::parse_assignments(&text)?,
        None => Point::default(),
      };
      let value = gradviz::evaluate(&expression, &bindings)
        .with_context(|| format!("evaluating {expression}"))?;
      println!("{value}");
    }
    Commands::Descend {
      expression,
      descent,
      json,
    } => {
      let expression = expression.unwrap_or_else(|| config.expression.clone());
      let trajectory = descent.run(&config, &expression);
      if json {
        println!("{}", serde_json::to_string_pretty(&trajectory)?);
      } else if !trajectory.is_empty() {
        println!("{}", trajectory.report());
      }
    }
    Commands::Surface {
      expression,
      resolution,
      svg,
      json,
      descent,
    } => {
      let expression = expression.unwrap_or_else(|| config.expression.clone());
      let resolution = resolution.unwrap_or(config.resolution);
      let sample = sample_surface(&SymbolicEngine, &expression, resolution)?;

      let markers = if descent.is_set() || svg.is_some() {
        let trajectory = descent.run(&config, &expression);
        trajectory_markers(&SymbolicEngine, &expression, &trajectory)
      } else {
        Vec::new()
      };

      if let Some(path) = &svg {
        let document = render_svg(&sample, &markers, &SvgOptions::default())?;
        std::fs::write(path, document)
          .with_context(|| format!("writing {}", path.display()))?;
      }
      if json {
        let output = serde_json::json!({
          "resolution": sample.resolution(),
          "min_z": sample.min_z(),
          "max_z": sample.max_z(),
          "mesh": sample.mesh(),
          "markers": markers,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
      } else if svg.is_none() {
        println!(
          "{} points, z in [{}, {}], {} degraded",
          sample.points().len(),
          sample.min_z(),
          sample.max_z(),
          sample.degraded_count()
        );
      }
    }
  }

  Ok(())
}
