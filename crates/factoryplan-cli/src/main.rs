mod config;
mod logging;
mod report;

use clap::{Parser, Subcommand, ValueEnum};
use factoryplan_model::{
    build_and_solve_with, compare_scenarios, sweep_labor, Capacities, FeasibleRegion, ModelError, Point,
    ProfitCoefficients, RegionSamples, CHAIRS, TABLES,
};
use serde::Serialize;
use std::path::PathBuf;
use tracing::debug;

use crate::config::{Config, SolverSettings};

#[derive(Parser)]
#[command(name = "factoryplan")]
#[command(about = "Chair and table production optimizer with sensitivity analysis", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Pretty,
    Json,
}

#[derive(clap::Args)]
struct ModelArgs {
    /// Labor hours available
    #[arg(long, default_value_t = 40.0)]
    labor: f64,
    /// Wood units available
    #[arg(long, default_value_t = 30.0)]
    wood: f64,
    /// Profit per chair
    #[arg(long, default_value_t = 20.0)]
    chair_profit: f64,
    /// Profit per table
    #[arg(long, default_value_t = 50.0)]
    table_profit: f64,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve the production model for one set of capacities
    Solve {
        #[command(flatten)]
        model: ModelArgs,
        /// Show binding constraints and resource usage
        #[arg(short, long)]
        analysis: bool,
        #[arg(short, long, value_enum, default_value = "pretty")]
        format: Format,
    },
    /// Compare the baseline against stress-test scenarios
    Sensitivity {
        /// JSON file with baseline, profit, scenarios and solver settings
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(short, long, value_enum, default_value = "pretty")]
        format: Format,
    },
    /// Re-solve over a range of labor capacities at fixed wood
    Sweep {
        #[arg(long, default_value_t = 30.0)]
        wood: f64,
        #[arg(long, default_value_t = 0.0)]
        from: f64,
        #[arg(long, default_value_t = 40.0)]
        to: f64,
        #[arg(long, default_value_t = 5.0)]
        step: f64,
        #[arg(short, long, value_enum, default_value = "pretty")]
        format: Format,
    },
    /// Emit feasible-region geometry and the optimal point as JSON for plotting
    Region {
        #[command(flatten)]
        model: ModelArgs,
        /// Largest chair count to sample
        #[arg(long, default_value_t = 20.0)]
        max_chairs: f64,
        /// Number of samples along each line
        #[arg(long, default_value_t = 400)]
        samples: usize,
    },
}

#[derive(Serialize)]
struct PlotData {
    region: FeasibleRegion,
    area: f64,
    samples: RegionSamples,
    optimal: Option<Point>,
}

fn plot_data(model: &ModelArgs, max_chairs: f64, samples: usize) -> Result<PlotData, ModelError> {
    let capacities = Capacities::new(model.labor, model.wood);
    let region = FeasibleRegion::new(capacities)?;

    let backend = SolverSettings::default().backend();
    let profit = ProfitCoefficients::new(model.chair_profit, model.table_profit);
    let solution = build_and_solve_with(&backend, capacities.labor, capacities.wood, profit)?;
    let optimal = solution.is_optimal().then(|| {
        Point::new(
            solution.value(CHAIRS).unwrap_or(0) as f64,
            solution.value(TABLES).unwrap_or(0) as f64,
        )
    });

    Ok(PlotData {
        area: region.area(),
        samples: region.sample(max_chairs, samples),
        region,
        optimal,
    })
}

/// Largest number of labor values a single sweep may solve
const MAX_SWEEP_POINTS: usize = 10_000;

/// Evenly spaced labor values from `from` to `to`, endpoint included
fn sweep_range(from: f64, to: f64, step: f64) -> Result<Vec<f64>, String> {
    if step.is_nan() || step <= 0.0 || !from.is_finite() || !to.is_finite() || to < from {
        return Err("sweep needs finite --from <= --to and a positive --step".to_string());
    }
    // Absorb rounding such as 0.3 / 0.1 = 2.9999999999999996
    let intervals = ((to - from) / step + 1e-9).floor();
    if intervals >= MAX_SWEEP_POINTS as f64 {
        return Err(format!("sweep would solve more than {} models; use a larger --step", MAX_SWEEP_POINTS));
    }
    let count = intervals as usize + 1;
    Ok((0..count).map(|i| (from + step * i as f64).min(to)).collect())
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("Error: {}", message);
    std::process::exit(1);
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => fail(e),
    }
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match cli.command {
        Commands::Solve { model, analysis, format } => {
            let backend = SolverSettings::default().backend();
            let profit = ProfitCoefficients::new(model.chair_profit, model.table_profit);

            let solution = match build_and_solve_with(&backend, model.labor, model.wood, profit) {
                Ok(s) => s,
                Err(e) => fail(e),
            };

            match format {
                Format::Json => print_json(&solution),
                Format::Pretty => print!("{}", report::render_solution(&solution, analysis)),
            }
            if !solution.is_optimal() {
                std::process::exit(1);
            }
        }
        Commands::Sensitivity { config, format } => {
            let config = match config {
                Some(path) => match Config::load(&path) {
                    Ok(c) => c,
                    Err(e) => fail(e),
                },
                None => Config::default(),
            };

            debug!(scenarios = config.scenarios.len(), "running sensitivity analysis");
            let backend = config.solver.backend();
            let sensitivity =
                compare_scenarios(&backend, &config.baseline_scenario(), &config.scenarios, config.profit);

            match format {
                Format::Json => print_json(&sensitivity),
                Format::Pretty => print!("{}", report::render_sensitivity(&sensitivity)),
            }
        }
        Commands::Sweep {
            wood,
            from,
            to,
            step,
            format,
        } => {
            let labor = match sweep_range(from, to, step) {
                Ok(values) => values,
                Err(e) => fail(e),
            };

            let backend = SolverSettings::default().backend();
            let points = sweep_labor(&backend, wood, &labor, ProfitCoefficients::default());

            match format {
                Format::Json => print_json(&points),
                Format::Pretty => print!("{}", report::render_sweep(&points)),
            }
        }
        Commands::Region {
            model,
            max_chairs,
            samples,
        } => {
            let data = match plot_data(&model, max_chairs, samples) {
                Ok(d) => d,
                Err(e) => fail(e),
            };
            print_json(&data);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sweep_range_includes_endpoint() {
        assert_eq!(sweep_range(0.0, 40.0, 5.0).unwrap().len(), 9);

        let values = sweep_range(0.0, 0.3, 0.1).unwrap();
        assert_eq!(values.len(), 4);
        assert_eq!(values[3], 0.3);
    }

    #[test]
    fn test_sweep_range_single_point() {
        assert_eq!(sweep_range(12.0, 12.0, 1.0).unwrap(), vec![12.0]);
    }

    #[test]
    fn test_sweep_range_rejects_tiny_steps() {
        assert!(sweep_range(0.0, 40.0, 1e-9).is_err());
        assert!(sweep_range(0.0, 40.0, 1e-300).is_err());
        assert!(sweep_range(0.0, 40.0, f64::MIN_POSITIVE).is_err());
    }

    #[test]
    fn test_plot_data_for_original_capacities() {
        let model = ModelArgs {
            labor: 40.0,
            wood: 30.0,
            chair_profit: 20.0,
            table_profit: 50.0,
        };

        let data = plot_data(&model, 20.0, 5).unwrap();

        assert!((data.area - 80.0).abs() < 1e-9);
        assert_eq!(data.samples.chairs.len(), 5);
        assert_eq!(data.optimal, Some(Point::new(0.0, 8.0)));
    }

    #[test]
    fn test_sweep_range_rejects_bad_bounds() {
        assert!(sweep_range(10.0, 5.0, 1.0).is_err());
        assert!(sweep_range(0.0, f64::INFINITY, 1.0).is_err());
        assert!(sweep_range(0.0, 5.0, 0.0).is_err());
        assert!(sweep_range(0.0, 5.0, f64::NAN).is_err());
    }
}
