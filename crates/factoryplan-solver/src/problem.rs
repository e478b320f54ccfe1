use crate::error::SolverError;
use crate::solution::ConstraintViolation;

/// Represents a linear programming problem, optionally with integer variables
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct LpProblem {
    /// Decision variables
    pub variables: Vec<Variable>,
    /// Objective function coefficients
    pub objective: Objective,
    /// Constraints
    pub constraints: Vec<Constraint>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    /// Lower bound, must be >= 0
    pub lower: f64,
    pub upper: Option<f64>,
    pub integer: bool,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct Objective {
    /// Coefficients for each variable
    pub coefficients: Vec<f64>,
    /// Whether to minimize or maximize
    pub minimize: bool,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct Constraint {
    /// Name/label for the constraint (for diagnostics)
    pub name: String,
    /// Coefficients for each variable
    pub coefficients: Vec<f64>,
    /// Comparison operator
    pub op: ConstraintOp,
    /// Right-hand side value
    pub rhs: f64,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintOp {
    /// Less than or equal (<=)
    Le,
    /// Greater than or equal (>=)
    Ge,
    /// Equal (=)
    Eq,
}

impl Variable {
    /// Non-negative continuous variable
    pub fn continuous(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lower: 0.0,
            upper: None,
            integer: false,
        }
    }

    /// Non-negative integer variable
    pub fn integer(name: impl Into<String>) -> Self {
        Self {
            integer: true,
            ..Self::continuous(name)
        }
    }

    pub fn with_upper(mut self, upper: f64) -> Self {
        self.upper = Some(upper);
        self
    }

    pub fn with_lower(mut self, lower: f64) -> Self {
        self.lower = lower;
        self
    }
}

impl ConstraintOp {
    pub fn symbol(self) -> &'static str {
        match self {
            ConstraintOp::Le => "<=",
            ConstraintOp::Ge => ">=",
            ConstraintOp::Eq => "=",
        }
    }

    /// Operator after multiplying both sides by -1
    pub fn flipped(self) -> Self {
        match self {
            ConstraintOp::Le => ConstraintOp::Ge,
            ConstraintOp::Ge => ConstraintOp::Le,
            ConstraintOp::Eq => ConstraintOp::Eq,
        }
    }
}

impl Constraint {
    /// Left-hand side value for an assignment
    pub fn activity(&self, values: &[f64]) -> f64 {
        self.coefficients
            .iter()
            .zip(values)
            .map(|(coef, value)| coef * value)
            .sum()
    }

    /// Signed distance to the bound: positive when there is room left.
    /// For equality rows this is the negative absolute deviation.
    pub fn slack(&self, values: &[f64]) -> f64 {
        let lhs = self.activity(values);
        match self.op {
            ConstraintOp::Le => self.rhs - lhs,
            ConstraintOp::Ge => lhs - self.rhs,
            ConstraintOp::Eq => -(lhs - self.rhs).abs(),
        }
    }
}

impl LpProblem {
    /// Create a problem over continuous non-negative variables
    pub fn new(variables: Vec<String>) -> Self {
        Self::with_variables(variables.into_iter().map(Variable::continuous).collect())
    }

    pub fn with_variables(variables: Vec<Variable>) -> Self {
        let n = variables.len();
        Self {
            variables,
            objective: Objective {
                coefficients: vec![0.0; n],
                minimize: true,
            },
            constraints: Vec::new(),
        }
    }

    pub fn set_objective(&mut self, coefficients: Vec<f64>, minimize: bool) {
        self.objective = Objective { coefficients, minimize };
    }

    pub fn add_constraint(&mut self, name: impl Into<String>, coefficients: Vec<f64>, op: ConstraintOp, rhs: f64) {
        self.constraints.push(Constraint {
            name: name.into(),
            coefficients,
            op,
            rhs,
        });
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    pub fn variable_names(&self) -> Vec<String> {
        self.variables.iter().map(|v| v.name.clone()).collect()
    }

    pub fn has_integers(&self) -> bool {
        self.variables.iter().any(|v| v.integer)
    }

    pub fn objective_value(&self, values: &[f64]) -> f64 {
        self.objective
            .coefficients
            .iter()
            .zip(values)
            .map(|(coef, value)| coef * value)
            .sum()
    }

    /// Check the problem is well formed before it reaches a solver
    pub fn validate(&self) -> Result<(), SolverError> {
        let n = self.num_variables();

        if self.objective.coefficients.len() != n {
            return Err(SolverError::InvalidProblem(format!(
                "objective has {} coefficients for {} variables",
                self.objective.coefficients.len(),
                n
            )));
        }
        if let Some(coef) = self.objective.coefficients.iter().find(|c| !c.is_finite()) {
            return Err(SolverError::InvalidProblem(format!(
                "objective coefficient {} is not finite",
                coef
            )));
        }

        for var in &self.variables {
            if !var.lower.is_finite() || var.lower < 0.0 {
                return Err(SolverError::InvalidProblem(format!(
                    "variable {} has lower bound {}; bounds must be finite and >= 0",
                    var.name, var.lower
                )));
            }
            if let Some(upper) = var.upper {
                if upper.is_nan() || upper < var.lower {
                    return Err(SolverError::InvalidProblem(format!(
                        "variable {} has upper bound {} below lower bound {}",
                        var.name, upper, var.lower
                    )));
                }
            }
        }

        for c in &self.constraints {
            if c.coefficients.len() != n {
                return Err(SolverError::InvalidProblem(format!(
                    "constraint {} has {} coefficients for {} variables",
                    c.name,
                    c.coefficients.len(),
                    n
                )));
            }
            if !c.rhs.is_finite() || c.coefficients.iter().any(|x| !x.is_finite()) {
                return Err(SolverError::InvalidProblem(format!(
                    "constraint {} contains a non-finite number",
                    c.name
                )));
            }
        }

        Ok(())
    }

    /// Copy of the problem with variable bounds expressed as constraint rows.
    /// The simplex tableau only knows about `x >= 0`.
    pub(crate) fn with_bound_rows(&self) -> LpProblem {
        let n = self.num_variables();
        let mut expanded = self.clone();
        for (j, var) in self.variables.iter().enumerate() {
            let mut unit = vec![0.0; n];
            unit[j] = 1.0;
            if var.lower > 0.0 {
                expanded.add_constraint(format!("{}_lower", var.name), unit.clone(), ConstraintOp::Ge, var.lower);
            }
            if let Some(upper) = var.upper.filter(|u| u.is_finite()) {
                expanded.add_constraint(format!("{}_upper", var.name), unit, ConstraintOp::Le, upper);
            }
        }
        expanded
    }

    /// Find which constraints and variable bounds are violated by an assignment
    pub fn violations(&self, values: &[f64], tolerance: f64) -> Vec<ConstraintViolation> {
        let mut violations = Vec::new();

        for c in &self.constraints {
            let lhs = c.activity(values);

            let violation = match c.op {
                ConstraintOp::Le if lhs > c.rhs + tolerance => {
                    let amt = lhs - c.rhs;
                    Some((amt, format!("{} exceeds maximum of {:.2} by {:.2}", c.name, c.rhs, amt)))
                }
                ConstraintOp::Ge if lhs < c.rhs - tolerance => {
                    let amt = c.rhs - lhs;
                    Some((amt, format!("{} is below minimum of {:.2} by {:.2}", c.name, c.rhs, amt)))
                }
                ConstraintOp::Eq if (lhs - c.rhs).abs() > tolerance => {
                    let amt = (lhs - c.rhs).abs();
                    Some((amt, format!("{} requires exactly {:.2} but got {:.2}", c.name, c.rhs, lhs)))
                }
                _ => None,
            };

            if let Some((violation_amount, description)) = violation {
                violations.push(ConstraintViolation {
                    constraint: c.name.clone(),
                    required: c.rhs,
                    actual: lhs,
                    violation_amount,
                    description,
                });
            }
        }

        for (var, &value) in self.variables.iter().zip(values) {
            if value < var.lower - tolerance {
                violations.push(ConstraintViolation {
                    constraint: var.name.clone(),
                    required: var.lower,
                    actual: value,
                    violation_amount: var.lower - value,
                    description: format!("{} is below its lower bound of {:.2}", var.name, var.lower),
                });
            }
            if let Some(upper) = var.upper {
                if value > upper + tolerance {
                    violations.push(ConstraintViolation {
                        constraint: var.name.clone(),
                        required: upper,
                        actual: value,
                        violation_amount: value - upper,
                        description: format!("{} exceeds its upper bound of {:.2}", var.name, upper),
                    });
                }
            }
            if var.integer && (value - value.round()).abs() > tolerance {
                violations.push(ConstraintViolation {
                    constraint: var.name.clone(),
                    required: value.round(),
                    actual: value,
                    violation_amount: (value - value.round()).abs(),
                    description: format!("{} must be integer but is {:.4}", var.name, value),
                });
            }
        }

        // Sort by violation amount (worst first)
        violations.sort_by(|a, b| b.violation_amount.total_cmp(&a.violation_amount));

        violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_var_problem() -> LpProblem {
        let mut problem = LpProblem::with_variables(vec![Variable::integer("x"), Variable::integer("y")]);
        problem.set_objective(vec![1.0, 1.0], false);
        problem.add_constraint("cap", vec![2.0, 5.0], ConstraintOp::Le, 10.0);
        problem
    }

    #[test]
    fn test_validate_accepts_well_formed_problem() {
        assert!(two_var_problem().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_short_coefficient_row() {
        let mut problem = two_var_problem();
        problem.add_constraint("short", vec![1.0], ConstraintOp::Le, 3.0);
        let err = problem.validate().unwrap_err();
        assert!(err.to_string().contains("short"), "{}", err);
    }

    #[test]
    fn test_validate_rejects_negative_lower_bound() {
        let problem = LpProblem::with_variables(vec![Variable::continuous("x").with_lower(-1.0)]);
        assert!(matches!(problem.validate(), Err(SolverError::InvalidProblem(_))));
    }

    #[test]
    fn test_validate_rejects_nan_rhs() {
        let mut problem = two_var_problem();
        problem.add_constraint("nan", vec![1.0, 1.0], ConstraintOp::Le, f64::NAN);
        assert!(problem.validate().is_err());
    }

    #[test]
    fn test_violations_reports_worst_first() {
        let mut problem = two_var_problem();
        problem.add_constraint("small", vec![1.0, 0.0], ConstraintOp::Le, 4.5);

        let violations = problem.violations(&[5.0, 2.0], 1e-9);
        assert_eq!(violations.len(), 2);
        assert_eq!(violations[0].constraint, "cap");
        assert!((violations[0].violation_amount - 10.0).abs() < 1e-9);
        assert_eq!(violations[1].constraint, "small");
    }

    #[test]
    fn test_violations_flags_fractional_integer() {
        let problem = two_var_problem();
        let violations = problem.violations(&[0.5, 0.0], 1e-9);
        assert_eq!(violations.len(), 1);
        assert!(violations[0].description.contains("integer"));
    }

    #[test]
    fn test_bound_rows_are_appended() {
        let problem = LpProblem::with_variables(vec![Variable::continuous("x").with_lower(1.0).with_upper(3.0)]);
        let expanded = problem.with_bound_rows();
        assert_eq!(expanded.num_constraints(), 2);
        assert_eq!(expanded.constraints[0].op, ConstraintOp::Ge);
        assert_eq!(expanded.constraints[1].op, ConstraintOp::Le);
    }
}
