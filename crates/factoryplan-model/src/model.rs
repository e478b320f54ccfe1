use std::collections::BTreeMap;
use std::ops::{Add, Mul};

use factoryplan_solver::{ConstraintOp, ConstraintSlack, LpProblem, SolutionStatus, SolverBackend, Variable};
use tracing::debug;

use crate::error::ModelError;

/// Tolerance used when checking solver output against the model
const CHECK_TOLERANCE: f64 = 1e-6;

/// Handle to a decision variable inside one [`ModelBuilder`]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(usize);

/// Non-negative integer decision variable
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionVariable {
    pub name: String,
    pub lower: f64,
}

/// Weighted sum of decision variables
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearExpr {
    terms: Vec<(VarId, f64)>,
}

/// `expr <= rhs`
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub name: String,
    pub expr: LinearExpr,
    pub rhs: f64,
}

/// A maximization model. Built once through [`ModelBuilder`] and never
/// mutated afterwards.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct Model {
    name: String,
    variables: Vec<DecisionVariable>,
    objective: LinearExpr,
    constraints: Vec<Constraint>,
}

#[derive(Debug, Clone)]
pub struct ModelBuilder {
    name: String,
    variables: Vec<DecisionVariable>,
    objective: LinearExpr,
    constraints: Vec<Constraint>,
}

/// Outcome of solving a [`Model`]. Values and objective are only
/// meaningful when `status` is optimal.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct Solution {
    pub status: SolutionStatus,
    pub values: BTreeMap<String, u64>,
    pub objective_value: f64,
    pub binding_constraints: Vec<String>,
    pub slacks: Vec<ConstraintSlack>,
}

impl LinearExpr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn term(mut self, var: VarId, coef: f64) -> Self {
        self.terms.push((var, coef));
        self
    }

    pub fn terms(&self) -> &[(VarId, f64)] {
        &self.terms
    }

    /// Combined coefficient of `var`, summing repeated terms
    pub fn coefficient(&self, var: VarId) -> f64 {
        self.terms.iter().filter(|(v, _)| *v == var).map(|(_, c)| c).sum()
    }

    /// Value under an assignment indexed by `VarId`.
    /// `None` if a term refers to a variable the assignment does not cover.
    pub fn evaluate(&self, values: &[f64]) -> Option<f64> {
        self.terms
            .iter()
            .map(|&(VarId(j), coef)| values.get(j).map(|v| coef * v))
            .sum()
    }

    fn dense(&self, n: usize) -> Vec<f64> {
        let mut row = vec![0.0; n];
        for &(VarId(j), coef) in &self.terms {
            row[j] += coef;
        }
        row
    }

    fn check(&self, n: usize, context: &str) -> Result<(), ModelError> {
        for &(VarId(j), coef) in &self.terms {
            if j >= n {
                return Err(ModelError::UnknownVariable(context.to_string()));
            }
            if !coef.is_finite() {
                return Err(ModelError::InvalidCoefficient(context.to_string(), coef));
            }
        }
        Ok(())
    }
}

impl Mul<VarId> for f64 {
    type Output = LinearExpr;

    fn mul(self, var: VarId) -> LinearExpr {
        LinearExpr::new().term(var, self)
    }
}

impl Add for LinearExpr {
    type Output = LinearExpr;

    fn add(mut self, rhs: LinearExpr) -> LinearExpr {
        self.terms.extend(rhs.terms);
        self
    }
}

impl ModelBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variables: Vec::new(),
            objective: LinearExpr::new(),
            constraints: Vec::new(),
        }
    }

    /// Add a non-negative integer variable
    pub fn integer_var(&mut self, name: impl Into<String>) -> VarId {
        self.variables.push(DecisionVariable {
            name: name.into(),
            lower: 0.0,
        });
        VarId(self.variables.len() - 1)
    }

    pub fn maximize(mut self, objective: LinearExpr) -> Self {
        self.objective = objective;
        self
    }

    pub fn constraint(mut self, name: impl Into<String>, expr: LinearExpr, rhs: f64) -> Self {
        self.constraints.push(Constraint {
            name: name.into(),
            expr,
            rhs,
        });
        self
    }

    pub fn build(self) -> Result<Model, ModelError> {
        let n = self.variables.len();
        self.objective.check(n, "objective")?;
        for c in &self.constraints {
            c.expr.check(n, &c.name)?;
            if !c.rhs.is_finite() {
                return Err(ModelError::InvalidModel(format!("constraint {} has bound {}", c.name, c.rhs)));
            }
        }

        Ok(Model {
            name: self.name,
            variables: self.variables,
            objective: self.objective,
            constraints: self.constraints,
        })
    }
}

impl Model {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn variables(&self) -> &[DecisionVariable] {
        &self.variables
    }

    pub fn objective(&self) -> &LinearExpr {
        &self.objective
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Lower to the solver's dense representation
    pub fn to_lp_problem(&self) -> LpProblem {
        let n = self.variables.len();
        let mut problem = LpProblem::with_variables(
            self.variables
                .iter()
                .map(|v| Variable::integer(v.name.clone()).with_lower(v.lower))
                .collect(),
        );
        problem.set_objective(self.objective.dense(n), false);
        for c in &self.constraints {
            problem.add_constraint(c.name.clone(), c.expr.dense(n), ConstraintOp::Le, c.rhs);
        }
        problem
    }

    /// Submit the model to `backend` exactly once
    pub fn solve(&self, backend: &dyn SolverBackend) -> Result<Solution, ModelError> {
        let problem = self.to_lp_problem();
        let raw = backend.solve(&problem)?;
        debug!(model = %self.name, backend = backend.name(), status = %raw.status, "model solved");

        if raw.status != SolutionStatus::Optimal {
            return Ok(Solution {
                status: raw.status,
                values: BTreeMap::new(),
                objective_value: raw.objective_value,
                binding_constraints: Vec::new(),
                slacks: Vec::new(),
            });
        }

        if raw.values.len() != self.variables.len() {
            return Err(ModelError::InvalidSolution(format!(
                "expected {} values, got {}",
                self.variables.len(),
                raw.values.len()
            )));
        }
        if let Some(violation) = problem.violations(&raw.values, CHECK_TOLERANCE).first() {
            return Err(ModelError::InvalidSolution(violation.description.clone()));
        }

        let values = self
            .variables
            .iter()
            .zip(&raw.values)
            .map(|(var, &v)| (var.name.clone(), v.round().max(0.0) as u64))
            .collect();

        Ok(Solution {
            status: raw.status,
            values,
            objective_value: raw.objective_value,
            binding_constraints: raw.analysis.binding_constraints,
            slacks: raw.analysis.slacks,
        })
    }
}

impl Solution {
    pub fn is_optimal(&self) -> bool {
        self.status == SolutionStatus::Optimal
    }

    pub fn value(&self, name: &str) -> Option<u64> {
        self.values.get(name).copied()
    }

    /// Objective value, or the reason there is none
    pub fn objective(&self) -> Result<f64, ModelError> {
        match self.status {
            SolutionStatus::Optimal => Ok(self.objective_value),
            SolutionStatus::Infeasible => Err(ModelError::InfeasibleModel),
            SolutionStatus::Unbounded => Err(ModelError::UnboundedModel),
            SolutionStatus::NotSolved => Err(ModelError::NotSolved),
        }
    }
}
