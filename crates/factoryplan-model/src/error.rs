use factoryplan_solver::SolverError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Model is infeasible: no non-negative integer plan satisfies every constraint")]
    InfeasibleModel,
    #[error("Model is unbounded: the objective has no finite maximum")]
    UnboundedModel,
    #[error("Solver stopped before proving optimality")]
    NotSolved,
    #[error("Solver unavailable: {0}")]
    SolverUnavailable(String),
    #[error("Invalid {resource} capacity {value}: capacities must be finite and >= 0")]
    InvalidCapacity { resource: &'static str, value: f64 },
    #[error("Invalid coefficient for {0}: {1}")]
    InvalidCoefficient(String, f64),
    #[error("Invalid model: {0}")]
    InvalidModel(String),
    #[error("Unknown variable in {0}")]
    UnknownVariable(String),
    #[error("Solver returned an invalid assignment: {0}")]
    InvalidSolution(String),
}

impl From<SolverError> for ModelError {
    fn from(err: SolverError) -> Self {
        match err {
            SolverError::Unavailable(msg) => ModelError::SolverUnavailable(msg),
            SolverError::InvalidProblem(msg) => ModelError::InvalidModel(msg),
        }
    }
}
