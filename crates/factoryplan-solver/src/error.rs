use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    #[error("Invalid problem: {0}")]
    InvalidProblem(String),
    #[error("Solver backend unavailable: {0}")]
    Unavailable(String),
}
