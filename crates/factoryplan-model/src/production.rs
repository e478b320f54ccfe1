//! The chair and table production model.
//!
//! Two integer products compete for labor hours and wood units:
//!
//! ```text
//! maximize   profit.chairs * Chairs + profit.tables * Tables
//! subject to 2 * Chairs + 5 * Tables <= labor
//!            1 * Chairs + 3 * Tables <= wood
//! ```

use factoryplan_solver::{BranchAndBound, SolverBackend};
use tracing::debug;

use crate::error::ModelError;
use crate::model::{Model, ModelBuilder, Solution};

pub const CHAIRS: &str = "Chairs";
pub const TABLES: &str = "Tables";
pub const LABOR_CONSTRAINT: &str = "Labor_Constraint";
pub const WOOD_CONSTRAINT: &str = "Wood_Constraint";

/// Resource use per unit built
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Recipe {
    pub labor_per_chair: f64,
    pub labor_per_table: f64,
    pub wood_per_chair: f64,
    pub wood_per_table: f64,
}

pub const RECIPE: Recipe = Recipe {
    labor_per_chair: 2.0,
    labor_per_table: 5.0,
    wood_per_chair: 1.0,
    wood_per_table: 3.0,
};

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Capacities {
    /// Labor hours available
    pub labor: f64,
    /// Wood units available
    pub wood: f64,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfitCoefficients {
    pub chairs: f64,
    pub tables: f64,
}

impl Capacities {
    pub fn new(labor: f64, wood: f64) -> Self {
        Self { labor, wood }
    }

    /// Zero and fractional capacities are accepted; negative or
    /// non-finite ones are not.
    pub fn validate(&self) -> Result<(), ModelError> {
        for (resource, value) in [("labor", self.labor), ("wood", self.wood)] {
            if !value.is_finite() || value < 0.0 {
                return Err(ModelError::InvalidCapacity { resource, value });
            }
        }
        Ok(())
    }
}

impl Default for Capacities {
    fn default() -> Self {
        Self { labor: 40.0, wood: 30.0 }
    }
}

impl ProfitCoefficients {
    pub fn new(chairs: f64, tables: f64) -> Self {
        Self { chairs, tables }
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        for (name, value) in [(CHAIRS, self.chairs), (TABLES, self.tables)] {
            if !value.is_finite() {
                return Err(ModelError::InvalidCoefficient(name.to_string(), value));
            }
        }
        Ok(())
    }
}

impl Default for ProfitCoefficients {
    fn default() -> Self {
        Self { chairs: 20.0, tables: 50.0 }
    }
}

/// Build a fresh production model for one scenario
pub fn build_model(capacities: Capacities, profit: ProfitCoefficients) -> Result<Model, ModelError> {
    capacities.validate()?;
    profit.validate()?;

    let mut builder = ModelBuilder::new("Maximize_Factory_Profit");
    let chairs = builder.integer_var(CHAIRS);
    let tables = builder.integer_var(TABLES);

    builder
        .maximize(profit.chairs * chairs + profit.tables * tables)
        .constraint(
            LABOR_CONSTRAINT,
            RECIPE.labor_per_chair * chairs + RECIPE.labor_per_table * tables,
            capacities.labor,
        )
        .constraint(
            WOOD_CONSTRAINT,
            RECIPE.wood_per_chair * chairs + RECIPE.wood_per_table * tables,
            capacities.wood,
        )
        .build()
}

/// Build and solve with the bundled branch-and-bound backend
pub fn build_and_solve(labor_capacity: f64, wood_capacity: f64, profit: ProfitCoefficients) -> Result<Solution, ModelError> {
    build_and_solve_with(&BranchAndBound::new(), labor_capacity, wood_capacity, profit)
}

pub fn build_and_solve_with(
    backend: &dyn SolverBackend,
    labor_capacity: f64,
    wood_capacity: f64,
    profit: ProfitCoefficients,
) -> Result<Solution, ModelError> {
    let model = build_model(Capacities::new(labor_capacity, wood_capacity), profit)?;
    let solution = model.solve(backend)?;
    debug!(
        labor = labor_capacity,
        wood = wood_capacity,
        status = %solution.status,
        objective = solution.objective_value,
        "production model solved"
    );
    Ok(solution)
}

/// Optimal profit at the default prices (20 per chair, 50 per table)
pub fn evaluate_scenario(labor_capacity: f64, wood_capacity: f64) -> Result<f64, ModelError> {
    evaluate_scenario_with(&BranchAndBound::new(), labor_capacity, wood_capacity)
}

pub fn evaluate_scenario_with(
    backend: &dyn SolverBackend,
    labor_capacity: f64,
    wood_capacity: f64,
) -> Result<f64, ModelError> {
    build_and_solve_with(backend, labor_capacity, wood_capacity, ProfitCoefficients::default())?.objective()
}

#[cfg(test)]
mod tests {
    use super::*;
    use factoryplan_solver::{LpProblem, Solution as RawSolution, SolutionStatus, SolverError};
    use std::time::{Duration, Instant};

    fn solve(labor: f64, wood: f64) -> Solution {
        build_and_solve(labor, wood, ProfitCoefficients::default()).unwrap()
    }

    fn assert_feasible(solution: &Solution, labor: f64, wood: f64) {
        let c = solution.value(CHAIRS).unwrap() as f64;
        let t = solution.value(TABLES).unwrap() as f64;
        assert!(2.0 * c + 5.0 * t <= labor, "labor violated by ({}, {})", c, t);
        assert!(c + 3.0 * t <= wood, "wood violated by ({}, {})", c, t);
    }

    #[test]
    fn test_original_problem() {
        let solution = solve(40.0, 30.0);

        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert_eq!(solution.objective_value, 400.0);
        assert_eq!(solution.value(CHAIRS), Some(0));
        assert_eq!(solution.value(TABLES), Some(8));
        assert!(solution.binding_constraints.contains(&LABOR_CONSTRAINT.to_string()));
    }

    #[test]
    fn test_labor_shortage() {
        assert_eq!(evaluate_scenario(30.0, 30.0), Ok(300.0));
    }

    #[test]
    fn test_wood_shortage_does_not_bind() {
        assert_eq!(evaluate_scenario(40.0, 20.0), Ok(400.0));
    }

    #[test]
    fn test_zero_capacities_are_optimal() {
        let solution = solve(0.0, 0.0);

        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert_eq!(solution.objective_value, 0.0);
        assert_eq!(solution.value(CHAIRS), Some(0));
        assert_eq!(solution.value(TABLES), Some(0));
    }

    #[test]
    fn test_fractional_capacities_are_accepted() {
        // 2.5 hours buys one chair
        let solution = solve(2.5, 30.0);
        assert_eq!(solution.objective_value, 20.0);
        assert_eq!(solution.value(CHAIRS), Some(1));
    }

    #[test]
    fn test_labor_monotonicity() {
        let mut previous = f64::INFINITY;
        for labor in (0..=45).rev() {
            let profit = evaluate_scenario(labor as f64, 30.0).unwrap();
            assert!(profit <= previous, "profit rose from {} to {} at labor {}", previous, profit, labor);
            previous = profit;
        }
    }

    #[test]
    fn test_assignments_are_feasible() {
        for labor in [0.0, 1.0, 4.0, 9.0, 17.0, 23.5, 40.0, 61.0] {
            for wood in [0.0, 2.0, 7.0, 13.0, 30.0] {
                let solution = solve(labor, wood);
                assert!(solution.is_optimal());
                assert_feasible(&solution, labor, wood);
            }
        }
    }

    /// Best default-price profit by enumerating table counts
    fn reference_profit(labor: f64, wood: f64) -> f64 {
        let max_tables = (labor / 5.0).min(wood / 3.0).floor() as u64;
        (0..=max_tables)
            .map(|t| {
                let t = t as f64;
                let c = ((labor - 5.0 * t) / 2.0).min(wood - 3.0 * t).floor();
                20.0 * c + 50.0 * t
            })
            .fold(0.0, f64::max)
    }

    #[test]
    fn test_large_capacities() {
        let start = Instant::now();
        assert_eq!(evaluate_scenario(123456.7, 98765.4), Ok(1234560.0));
        assert!(start.elapsed() < Duration::from_secs(2), "took {:?}", start.elapsed());
    }

    #[test]
    fn test_matches_reference_on_random_capacities() {
        let mut state: u64 = 0x2545_f491_4f6c_dd1d;
        let mut next = |modulus: u64| {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            (state >> 33) % modulus
        };

        let start = Instant::now();
        for _ in 0..40 {
            let labor = next(2_000_000) as f64 / 10.0;
            let wood = next(1_000_000) as f64 / 10.0;

            let solution = solve(labor, wood);
            assert!(solution.is_optimal(), "({}, {}) gave {}", labor, wood, solution.status);
            assert_feasible(&solution, labor, wood);
            assert_eq!(solution.objective_value, reference_profit(labor, wood), "({}, {})", labor, wood);
        }
        assert!(start.elapsed() < Duration::from_secs(10), "took {:?}", start.elapsed());
    }

    #[test]
    fn test_custom_profit_favors_chairs() {
        // Chairs worth 30 each: 20 chairs use all 40 hours
        let solution = build_and_solve(40.0, 30.0, ProfitCoefficients::new(30.0, 50.0)).unwrap();
        assert_eq!(solution.value(CHAIRS), Some(20));
        assert_eq!(solution.value(TABLES), Some(0));
        assert_eq!(solution.objective_value, 600.0);
    }

    #[test]
    fn test_negative_capacity_is_rejected() {
        let err = build_and_solve(-1.0, 30.0, ProfitCoefficients::default()).unwrap_err();
        assert!(matches!(err, ModelError::InvalidCapacity { resource: "labor", .. }));
    }

    #[test]
    fn test_infinite_capacity_is_rejected() {
        let err = evaluate_scenario(40.0, f64::INFINITY).unwrap_err();
        assert!(matches!(err, ModelError::InvalidCapacity { resource: "wood", .. }));
    }

    #[test]
    fn test_nan_profit_is_rejected() {
        let err = build_and_solve(40.0, 30.0, ProfitCoefficients::new(f64::NAN, 50.0)).unwrap_err();
        assert!(matches!(err, ModelError::InvalidCoefficient(..)));
    }

    struct AlwaysInfeasible;

    impl SolverBackend for AlwaysInfeasible {
        fn name(&self) -> &str {
            "always-infeasible"
        }

        fn solve(&self, _problem: &LpProblem) -> Result<RawSolution, SolverError> {
            Ok(RawSolution::infeasible())
        }
    }

    #[test]
    fn test_infeasible_status_is_not_coerced_to_zero() {
        let err = evaluate_scenario_with(&AlwaysInfeasible, 40.0, 30.0).unwrap_err();
        assert_eq!(err, ModelError::InfeasibleModel);
    }

    #[test]
    fn test_model_is_rebuilt_per_scenario() {
        let a = build_model(Capacities::new(40.0, 30.0), ProfitCoefficients::default()).unwrap();
        let b = build_model(Capacities::new(30.0, 30.0), ProfitCoefficients::default()).unwrap();
        assert_eq!(a.constraints()[0].rhs, 40.0);
        assert_eq!(b.constraints()[0].rhs, 30.0);
        assert_eq!(a.constraints()[1].name, WOOD_CONSTRAINT);
    }
}
