use crate::branch::BranchAndBound;
use crate::error::SolverError;
use crate::problem::LpProblem;
use crate::simplex::Solver;
use crate::solution::Solution;

/// Anything that can turn a problem into a [`Solution`].
///
/// `Err` is reserved for the backend failing to run at all. Infeasible and
/// unbounded problems come back as `Ok` with the matching status.
pub trait SolverBackend: Send + Sync {
    fn name(&self) -> &str;

    fn solve(&self, problem: &LpProblem) -> Result<Solution, SolverError>;
}

impl SolverBackend for Solver {
    fn name(&self) -> &str {
        "simplex"
    }

    fn solve(&self, problem: &LpProblem) -> Result<Solution, SolverError> {
        problem.validate()?;
        if problem.has_integers() {
            return Err(SolverError::Unavailable(
                "simplex only solves continuous relaxations; use branch-and-bound for integer variables".to_string(),
            ));
        }
        Ok(Solver::solve(self, problem))
    }
}

impl SolverBackend for BranchAndBound {
    fn name(&self) -> &str {
        "branch-and-bound"
    }

    fn solve(&self, problem: &LpProblem) -> Result<Solution, SolverError> {
        problem.validate()?;
        Ok(BranchAndBound::solve(self, problem))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::{ConstraintOp, Variable};
    use crate::solution::SolutionStatus;

    #[test]
    fn test_backends_are_object_safe() {
        let backends: Vec<Box<dyn SolverBackend>> = vec![Box::new(Solver::new()), Box::new(BranchAndBound::new())];
        let names: Vec<&str> = backends.iter().map(|b| b.name()).collect();
        assert_eq!(names, vec!["simplex", "branch-and-bound"]);
    }

    #[test]
    fn test_simplex_refuses_integer_problem() {
        let mut problem = LpProblem::with_variables(vec![Variable::integer("x")]);
        problem.set_objective(vec![1.0], false);
        problem.add_constraint("cap", vec![1.0], ConstraintOp::Le, 2.5);

        let err = SolverBackend::solve(&Solver::new(), &problem).unwrap_err();
        assert!(matches!(err, SolverError::Unavailable(_)));

        let solution = SolverBackend::solve(&BranchAndBound::new(), &problem).unwrap();
        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert_eq!(solution.values, vec![2.0]);
    }

    #[test]
    fn test_invalid_problem_is_rejected_before_solving() {
        let mut problem = LpProblem::with_variables(vec![Variable::integer("x")]);
        problem.set_objective(vec![1.0, 2.0], false);

        let err = SolverBackend::solve(&BranchAndBound::new(), &problem).unwrap_err();
        assert!(matches!(err, SolverError::InvalidProblem(_)));
    }
}
