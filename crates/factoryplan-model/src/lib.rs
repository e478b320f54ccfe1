pub mod error;
pub mod model;
pub mod production;
pub mod region;
pub mod sensitivity;

pub use error::ModelError;
pub use model::{Constraint, DecisionVariable, LinearExpr, Model, ModelBuilder, Solution, VarId};
pub use production::{
    build_and_solve, build_and_solve_with, build_model, evaluate_scenario, evaluate_scenario_with, Capacities,
    ProfitCoefficients, Recipe, CHAIRS, LABOR_CONSTRAINT, RECIPE, TABLES, WOOD_CONSTRAINT,
};
pub use region::{BoundaryLine, FeasibleRegion, Point, RegionSamples};
pub use sensitivity::{
    compare_scenarios, evaluate, sweep_labor, Comparison, Evaluation, Scenario, ScenarioResult, SensitivityReport,
    SweepPoint,
};

pub use factoryplan_solver::{SolutionStatus, SolverBackend};
