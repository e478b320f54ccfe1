mod backend;
mod branch;
mod error;
mod problem;
mod simplex;
mod solution;

pub use backend::SolverBackend;
pub use branch::BranchAndBound;
pub use error::SolverError;
pub use problem::{Constraint, ConstraintOp, LpProblem, Objective, Variable};
pub use simplex::Solver;
pub use solution::{
    Analysis, ConstraintSlack, ConstraintViolation, ReducedCost, SearchStats, ShadowPrice, Solution, SolutionStatus,
};
