//! Re-solving the production model under perturbed capacities.

use factoryplan_solver::SolverBackend;
use rayon::prelude::*;
use tracing::{info, warn};

use crate::production::{build_and_solve_with, Capacities, ProfitCoefficients, CHAIRS, TABLES};

/// A named set of capacities to evaluate
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    pub name: String,
    pub labor: f64,
    pub wood: f64,
}

/// What solving one scenario produced
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "status", rename_all = "snake_case"))]
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    Optimal { profit: f64, chairs: u64, tables: u64 },
    /// The scenario has no usable optimum; `reason` says why
    Unavailable { reason: String },
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioResult {
    pub scenario: Scenario,
    pub evaluation: Evaluation,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub result: ScenarioResult,
    /// Baseline profit minus scenario profit. `None` unless both were solved.
    pub loss: Option<f64>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct SensitivityReport {
    pub profit: ProfitCoefficients,
    pub baseline: ScenarioResult,
    pub comparisons: Vec<Comparison>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct SweepPoint {
    pub labor: f64,
    pub wood: f64,
    pub evaluation: Evaluation,
}

impl Scenario {
    pub fn new(name: impl Into<String>, labor: f64, wood: f64) -> Self {
        Self {
            name: name.into(),
            labor,
            wood,
        }
    }

    pub fn baseline() -> Self {
        let c = Capacities::default();
        Self::new("Original", c.labor, c.wood)
    }

    /// Losing 10 labor hours, then losing 10 wood units
    pub fn stress_tests() -> Vec<Self> {
        vec![
            Self::new("Labor drops to 30 hrs", 30.0, 30.0),
            Self::new("Wood drops to 20 units", 40.0, 20.0),
        ]
    }
}

impl Evaluation {
    pub fn profit(&self) -> Option<f64> {
        match self {
            Evaluation::Optimal { profit, .. } => Some(*profit),
            Evaluation::Unavailable { .. } => None,
        }
    }
}

impl SensitivityReport {
    /// Comparisons that could not be evaluated
    pub fn failures(&self) -> impl Iterator<Item = &Comparison> {
        self.comparisons.iter().filter(|c| c.loss.is_none())
    }
}

/// Solve one scenario on a freshly built model
pub fn evaluate(backend: &dyn SolverBackend, labor: f64, wood: f64, profit: ProfitCoefficients) -> Evaluation {
    let solution = build_and_solve_with(backend, labor, wood, profit);
    match solution.and_then(|s| s.objective().map(|p| (p, s))) {
        Ok((profit, solution)) => Evaluation::Optimal {
            profit,
            chairs: solution.value(CHAIRS).unwrap_or(0),
            tables: solution.value(TABLES).unwrap_or(0),
        },
        Err(err) => {
            warn!(labor, wood, error = %err, "scenario could not be evaluated");
            Evaluation::Unavailable { reason: err.to_string() }
        }
    }
}

fn run(backend: &dyn SolverBackend, scenario: &Scenario, profit: ProfitCoefficients) -> ScenarioResult {
    let evaluation = evaluate(backend, scenario.labor, scenario.wood, profit);
    if let Some(p) = evaluation.profit() {
        info!(scenario = %scenario.name, profit = p, "scenario evaluated");
    }
    ScenarioResult {
        scenario: scenario.clone(),
        evaluation,
    }
}

/// Evaluate the baseline and every scenario, each on its own model.
/// Scenarios run in parallel; the report keeps input order.
pub fn compare_scenarios(
    backend: &dyn SolverBackend,
    baseline: &Scenario,
    scenarios: &[Scenario],
    profit: ProfitCoefficients,
) -> SensitivityReport {
    let base = run(backend, baseline, profit);
    let base_profit = base.evaluation.profit();

    let comparisons = scenarios
        .par_iter()
        .map(|scenario| {
            let result = run(backend, scenario, profit);
            let loss = match (base_profit, result.evaluation.profit()) {
                (Some(b), Some(s)) => Some(b - s),
                _ => None,
            };
            Comparison { result, loss }
        })
        .collect();

    SensitivityReport {
        profit,
        baseline: base,
        comparisons,
    }
}

/// Optimal profit for each labor capacity at a fixed wood capacity
pub fn sweep_labor(
    backend: &dyn SolverBackend,
    wood: f64,
    labor_values: &[f64],
    profit: ProfitCoefficients,
) -> Vec<SweepPoint> {
    labor_values
        .par_iter()
        .map(|&labor| SweepPoint {
            labor,
            wood,
            evaluation: evaluate(backend, labor, wood, profit),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use factoryplan_solver::{BranchAndBound, LpProblem, Solution as RawSolution, SolverError};

    struct Unbounded;

    impl SolverBackend for Unbounded {
        fn name(&self) -> &str {
            "unbounded"
        }

        fn solve(&self, problem: &LpProblem) -> Result<RawSolution, SolverError> {
            Ok(RawSolution::unbounded(problem.objective.minimize))
        }
    }

    #[test]
    fn test_default_report() {
        let report = compare_scenarios(
            &BranchAndBound::new(),
            &Scenario::baseline(),
            &Scenario::stress_tests(),
            ProfitCoefficients::default(),
        );

        assert_eq!(report.baseline.evaluation.profit(), Some(400.0));
        assert_eq!(report.comparisons.len(), 2);
        assert_eq!(report.comparisons[0].result.scenario.name, "Labor drops to 30 hrs");
        assert_eq!(report.comparisons[0].result.evaluation.profit(), Some(300.0));
        assert_eq!(report.comparisons[0].loss, Some(100.0));
        assert_eq!(report.comparisons[1].result.evaluation.profit(), Some(400.0));
        assert_eq!(report.comparisons[1].loss, Some(0.0));
        assert_eq!(report.failures().count(), 0);
    }

    #[test]
    fn test_invalid_scenario_reports_no_loss() {
        let scenarios = vec![Scenario::new("Negative labor", -5.0, 30.0), Scenario::new("Half labor", 20.0, 30.0)];
        let report = compare_scenarios(
            &BranchAndBound::new(),
            &Scenario::baseline(),
            &scenarios,
            ProfitCoefficients::default(),
        );

        assert_eq!(report.comparisons[0].loss, None);
        assert!(matches!(report.comparisons[0].result.evaluation, Evaluation::Unavailable { .. }));
        assert_eq!(report.comparisons[1].loss, Some(200.0));
        assert_eq!(report.failures().count(), 1);
    }

    #[test]
    fn test_unbounded_backend_is_surfaced() {
        let report = compare_scenarios(
            &Unbounded,
            &Scenario::baseline(),
            &Scenario::stress_tests(),
            ProfitCoefficients::default(),
        );

        match &report.baseline.evaluation {
            Evaluation::Unavailable { reason } => assert!(reason.contains("unbounded"), "{}", reason),
            other => panic!("expected unavailable, got {:?}", other),
        }
        assert!(report.comparisons.iter().all(|c| c.loss.is_none()));
    }

    #[test]
    fn test_sweep_is_monotone_and_ordered() {
        let labor: Vec<f64> = (0..=20).map(|h| h as f64 * 2.5).collect();
        let points = sweep_labor(&BranchAndBound::new(), 30.0, &labor, ProfitCoefficients::default());

        assert_eq!(points.len(), labor.len());
        for (point, &expected_labor) in points.iter().zip(&labor) {
            assert_eq!(point.labor, expected_labor);
        }
        let profits: Vec<f64> = points.iter().map(|p| p.evaluation.profit().unwrap()).collect();
        assert!(profits.windows(2).all(|w| w[0] <= w[1]), "{:?}", profits);
        assert_eq!(profits[0], 0.0);
        assert_eq!(profits[16], 400.0);
    }
}
