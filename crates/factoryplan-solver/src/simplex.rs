use tracing::trace;

use crate::problem::{ConstraintOp, LpProblem};
use crate::solution::{Analysis, ConstraintSlack, ReducedCost, ShadowPrice, Solution, SolutionStatus};

/// Consecutive degenerate pivots tolerated before switching to Bland's rule
const DEGENERATE_PIVOT_LIMIT: usize = 50;

/// Simplex solver for the continuous relaxation of a problem.
/// Integrality flags are ignored; see [`crate::BranchAndBound`].
#[derive(Debug, Clone)]
pub struct Solver {
    /// Maximum iterations before giving up
    max_iterations: usize,
    /// Tolerance for floating point comparisons
    tolerance: f64,
}

impl Default for Solver {
    fn default() -> Self {
        Self {
            max_iterations: 10000,
            tolerance: 1e-9,
        }
    }
}

impl Solver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Solve the LP relaxation using the two-phase simplex method
    pub fn solve(&self, problem: &LpProblem) -> Solution {
        let expanded = problem.with_bound_rows();
        let mut tableau = self.build_tableau(&expanded);

        // Phase 1: Find initial basic feasible solution
        if tableau.n_artificial > 0 {
            match self.phase1(&mut tableau) {
                SimplexResult::Optimal => {}
                SimplexResult::Infeasible | SimplexResult::Unbounded => return Solution::infeasible(),
                SimplexResult::IterationLimit => return Solution::not_solved(),
            }
        }

        // Phase 2: Optimize
        match self.phase2(&mut tableau) {
            SimplexResult::Optimal => {}
            SimplexResult::Unbounded => return Solution::unbounded(problem.objective.minimize),
            SimplexResult::Infeasible => return Solution::infeasible(),
            SimplexResult::IterationLimit => return Solution::not_solved(),
        }

        self.extract_solution(&tableau, problem)
    }

    fn build_tableau(&self, problem: &LpProblem) -> Tableau {
        let n_vars = problem.num_variables();
        let n_constraints = problem.num_constraints();

        // Normalize rows to a non-negative RHS, remembering the sign
        let rows: Vec<(f64, ConstraintOp)> = problem
            .constraints
            .iter()
            .map(|c| if c.rhs < 0.0 { (-1.0, c.op.flipped()) } else { (1.0, c.op) })
            .collect();

        // Count slack and artificial variables needed
        let mut n_slack = 0;
        let mut n_artificial = 0;
        for &(_, op) in &rows {
            match op {
                ConstraintOp::Le => n_slack += 1,
                ConstraintOp::Ge => {
                    n_slack += 1; // surplus
                    n_artificial += 1;
                }
                ConstraintOp::Eq => n_artificial += 1,
            }
        }

        let total_cols = n_vars + n_slack + n_artificial + 1; // +1 for RHS
        let total_rows = n_constraints + 1; // +1 for objective

        let mut tableau = Tableau {
            data: vec![vec![0.0; total_cols]; total_rows],
            basic_vars: vec![0; n_constraints],
            rows: Vec::with_capacity(n_constraints),
            n_vars,
            n_slack,
            n_artificial,
        };

        // Fill in constraint rows
        let mut slack_idx = n_vars;
        let mut artificial_idx = n_vars + n_slack;

        for (i, (c, &(sign, op))) in problem.constraints.iter().zip(&rows).enumerate() {
            for (j, &coef) in c.coefficients.iter().enumerate().take(n_vars) {
                tableau.data[i][j] = sign * coef;
            }
            tableau.data[i][total_cols - 1] = sign * c.rhs;

            let mut row = RowInfo { sign, op, slack_col: None, artificial_col: None };
            match op {
                ConstraintOp::Le => {
                    tableau.data[i][slack_idx] = 1.0;
                    tableau.basic_vars[i] = slack_idx;
                    row.slack_col = Some(slack_idx);
                    slack_idx += 1;
                }
                ConstraintOp::Ge => {
                    tableau.data[i][slack_idx] = -1.0; // surplus
                    row.slack_col = Some(slack_idx);
                    slack_idx += 1;
                    tableau.data[i][artificial_idx] = 1.0;
                    tableau.basic_vars[i] = artificial_idx;
                    row.artificial_col = Some(artificial_idx);
                    artificial_idx += 1;
                }
                ConstraintOp::Eq => {
                    tableau.data[i][artificial_idx] = 1.0;
                    tableau.basic_vars[i] = artificial_idx;
                    row.artificial_col = Some(artificial_idx);
                    artificial_idx += 1;
                }
            }
            tableau.rows.push(row);
        }

        // Objective row (last row). The tableau always maximizes, so
        // minimization negates the coefficients.
        let obj_row = n_constraints;
        for (j, &coef) in problem.objective.coefficients.iter().enumerate().take(n_vars) {
            tableau.data[obj_row][j] = if problem.objective.minimize { -coef } else { coef };
        }

        tableau
    }

    fn phase1(&self, tableau: &mut Tableau) -> SimplexResult {
        // Auxiliary objective: maximize -sum(artificials)
        let n_constraints = tableau.data.len() - 1;
        let n_cols = tableau.data[0].len();
        let art_start = tableau.artificial_start();

        let orig_obj = std::mem::replace(&mut tableau.data[n_constraints], vec![0.0; n_cols]);
        for j in art_start..(art_start + tableau.n_artificial) {
            tableau.data[n_constraints][j] = -1.0;
        }

        // Make objective row consistent with basic artificial variables
        for i in 0..n_constraints {
            if tableau.basic_vars[i] >= art_start {
                for j in 0..n_cols {
                    tableau.data[n_constraints][j] += tableau.data[i][j];
                }
            }
        }

        match self.iterate(tableau, n_cols - 1) {
            SimplexResult::Optimal => {}
            // The auxiliary problem is bounded by zero
            SimplexResult::Unbounded => return SimplexResult::Infeasible,
            other => return other,
        }

        // Any artificial still carrying value means the original is infeasible
        let rhs_col = n_cols - 1;
        for i in 0..n_constraints {
            if tableau.basic_vars[i] >= art_start && tableau.data[i][rhs_col].abs() > self.tolerance {
                return SimplexResult::Infeasible;
            }
        }

        // Drive zero-level artificials out of the basis where possible
        for i in 0..n_constraints {
            if tableau.basic_vars[i] >= art_start {
                if let Some(col) = (0..art_start).find(|&j| tableau.data[i][j].abs() > self.tolerance) {
                    self.pivot(tableau, i, col);
                }
            }
        }

        // Restore original objective and price out the basic columns
        tableau.data[n_constraints] = orig_obj;
        for i in 0..n_constraints {
            let basic = tableau.basic_vars[i];
            let ratio = tableau.data[n_constraints][basic];
            if ratio.abs() > self.tolerance {
                for j in 0..n_cols {
                    tableau.data[n_constraints][j] -= ratio * tableau.data[i][j];
                }
            }
        }

        SimplexResult::Optimal
    }

    fn phase2(&self, tableau: &mut Tableau) -> SimplexResult {
        // Artificial columns never re-enter the basis
        let exclude_from = tableau.artificial_start();
        self.iterate(tableau, exclude_from)
    }

    /// Pivot until no column below `n_cols` can improve the objective
    fn iterate(&self, tableau: &mut Tableau, n_cols: usize) -> SimplexResult {
        let mut degenerate_run = 0;

        for iteration in 0..self.max_iterations {
            let bland = degenerate_run > DEGENERATE_PIVOT_LIMIT;
            let Some(pivot_col) = self.find_pivot_column(tableau, n_cols, bland) else {
                trace!(iteration, "simplex reached optimality");
                return SimplexResult::Optimal;
            };
            let Some(pivot_row) = self.find_pivot_row(tableau, pivot_col) else {
                return SimplexResult::Unbounded;
            };

            let rhs_col = tableau.data[0].len() - 1;
            if tableau.data[pivot_row][rhs_col].abs() <= self.tolerance {
                degenerate_run += 1;
            } else {
                degenerate_run = 0;
            }
            self.pivot(tableau, pivot_row, pivot_col);
        }

        SimplexResult::IterationLimit
    }

    fn find_pivot_column(&self, tableau: &Tableau, n_cols: usize, bland: bool) -> Option<usize> {
        let obj_row = tableau.data.len() - 1;
        let reduced = &tableau.data[obj_row][..n_cols];

        if bland {
            // Smallest index with a positive reduced cost
            return reduced.iter().position(|&v| v > self.tolerance);
        }

        // Most positive reduced cost
        let mut max_val = self.tolerance;
        let mut max_col = None;
        for (j, &v) in reduced.iter().enumerate() {
            if v > max_val {
                max_val = v;
                max_col = Some(j);
            }
        }
        max_col
    }

    fn find_pivot_row(&self, tableau: &Tableau, col: usize) -> Option<usize> {
        let n_constraints = tableau.data.len() - 1;
        let rhs_col = tableau.data[0].len() - 1;

        let mut min_ratio = f64::INFINITY;
        let mut min_row: Option<usize> = None;

        for i in 0..n_constraints {
            let val = tableau.data[i][col];
            if val > self.tolerance {
                let ratio = tableau.data[i][rhs_col] / val;
                let better = match min_row {
                    None => true,
                    Some(best) => {
                        ratio < min_ratio - self.tolerance
                            || ((ratio - min_ratio).abs() <= self.tolerance
                                && tableau.basic_vars[i] < tableau.basic_vars[best])
                    }
                };
                if better {
                    min_ratio = ratio;
                    min_row = Some(i);
                }
            }
        }

        min_row
    }

    fn pivot(&self, tableau: &mut Tableau, row: usize, col: usize) {
        let n_rows = tableau.data.len();
        let n_cols = tableau.data[0].len();

        tableau.basic_vars[row] = col;

        // Scale pivot row
        let pivot_val = tableau.data[row][col];
        for j in 0..n_cols {
            tableau.data[row][j] /= pivot_val;
        }

        // Eliminate column in other rows
        let pivot_row = tableau.data[row].clone();
        for i in 0..n_rows {
            if i != row {
                let factor = tableau.data[i][col];
                if factor != 0.0 {
                    for j in 0..n_cols {
                        tableau.data[i][j] -= factor * pivot_row[j];
                    }
                }
            }
        }
    }

    fn extract_solution(&self, tableau: &Tableau, problem: &LpProblem) -> Solution {
        let n_vars = problem.num_variables();
        let rhs_col = tableau.data[0].len() - 1;

        let mut values = vec![0.0; n_vars];
        for (i, &basic) in tableau.basic_vars.iter().enumerate() {
            if basic < n_vars {
                let v = tableau.data[i][rhs_col];
                values[basic] = if v.abs() <= self.tolerance { 0.0 } else { v };
            }
        }

        let objective_value = problem.objective_value(&values);
        let analysis = self.analyze(tableau, problem, &values);

        Solution {
            status: SolutionStatus::Optimal,
            values,
            objective_value,
            analysis,
            search: None,
        }
    }

    fn analyze(&self, tableau: &Tableau, problem: &LpProblem, values: &[f64]) -> Analysis {
        let obj_row = tableau.data.len() - 1;
        let objective_sign = if problem.objective.minimize { -1.0 } else { 1.0 };
        let sense = if problem.objective.minimize { "cost" } else { "profit" };

        // Dual of each original row, read off the slack/artificial columns.
        // Bound rows appended by `with_bound_rows` come after and are skipped.
        let mut shadow_prices = Vec::new();
        for (constraint, row) in problem.constraints.iter().zip(&tableau.rows) {
            let dual = match (row.op, row.slack_col, row.artificial_col) {
                (ConstraintOp::Le, Some(s), _) => -tableau.data[obj_row][s],
                (ConstraintOp::Ge, Some(s), _) => tableau.data[obj_row][s],
                (ConstraintOp::Eq, _, Some(a)) => -tableau.data[obj_row][a],
                _ => 0.0,
            };
            let value = dual * row.sign * objective_sign;
            let value = if value.abs() < self.tolerance { 0.0 } else { value };

            let interpretation = if value == 0.0 {
                "Non-binding constraint".to_string()
            } else if value > 0.0 {
                format!("Increasing RHS by 1 unit would increase {} by {:.4}", sense, value)
            } else {
                format!("Increasing RHS by 1 unit would decrease {} by {:.4}", sense, -value)
            };
            shadow_prices.push(ShadowPrice {
                constraint: constraint.name.clone(),
                value,
                interpretation,
            });
        }

        let reduced_costs = problem
            .variables
            .iter()
            .enumerate()
            .map(|(j, var)| {
                let is_basic = tableau.basic_vars.contains(&j);
                let rc = if is_basic { 0.0 } else { tableau.data[obj_row][j] * objective_sign };
                ReducedCost {
                    variable: var.name.clone(),
                    value: values[j],
                    reduced_cost: rc,
                    is_basic,
                }
            })
            .collect();

        Analysis {
            shadow_prices,
            reduced_costs,
            ..slack_analysis(problem, values, self.tolerance)
        }
    }
}

/// Binding constraints and slacks for any assignment
pub(crate) fn slack_analysis(problem: &LpProblem, values: &[f64], tolerance: f64) -> Analysis {
    let slacks: Vec<ConstraintSlack> = problem
        .constraints
        .iter()
        .map(|c| ConstraintSlack {
            constraint: c.name.clone(),
            activity: c.activity(values),
            rhs: c.rhs,
            slack: c.slack(values),
        })
        .collect();

    let binding_constraints = slacks
        .iter()
        .filter(|s| s.slack.abs() <= tolerance.max(1e-7))
        .map(|s| s.constraint.clone())
        .collect();

    Analysis {
        binding_constraints,
        slacks,
        ..Analysis::default()
    }
}

struct Tableau {
    data: Vec<Vec<f64>>,
    basic_vars: Vec<usize>,
    rows: Vec<RowInfo>,
    n_vars: usize,
    n_slack: usize,
    n_artificial: usize,
}

impl Tableau {
    fn artificial_start(&self) -> usize {
        self.n_vars + self.n_slack
    }
}

/// How a constraint was laid out in the tableau
struct RowInfo {
    /// -1 when the row was negated to make its RHS non-negative
    sign: f64,
    op: ConstraintOp,
    slack_col: Option<usize>,
    artificial_col: Option<usize>,
}

enum SimplexResult {
    Optimal,
    Unbounded,
    Infeasible,
    IterationLimit,
}
