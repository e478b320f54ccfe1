use tracing::{debug, trace};

use crate::problem::LpProblem;
use crate::simplex::{slack_analysis, Solver};
use crate::solution::{SearchStats, Solution, SolutionStatus};

/// Exact integer optimization by depth-first branch-and-bound over
/// simplex relaxations.
#[derive(Debug, Clone)]
pub struct BranchAndBound {
    lp: Solver,
    /// Maximum number of relaxations solved before giving up
    max_nodes: usize,
    /// Distance from an integer still accepted as integral
    int_tolerance: f64,
}

impl Default for BranchAndBound {
    fn default() -> Self {
        Self {
            lp: Solver::default(),
            max_nodes: 10000,
            int_tolerance: 1e-6,
        }
    }
}

/// Variable bounds along one branch, tightened from the root problem's
#[derive(Debug, Clone)]
struct Node {
    lower: Vec<f64>,
    upper: Vec<Option<f64>>,
    depth: usize,
}

impl Node {
    fn root(problem: &LpProblem) -> Self {
        Self {
            lower: problem.variables.iter().map(|v| v.lower).collect(),
            upper: problem.variables.iter().map(|v| v.upper).collect(),
            depth: 0,
        }
    }

    fn child(&self) -> Self {
        Self {
            depth: self.depth + 1,
            ..self.clone()
        }
    }

    fn is_empty(&self) -> bool {
        self.lower
            .iter()
            .zip(&self.upper)
            .any(|(&lo, up)| up.is_some_and(|up| up < lo))
    }
}

impl BranchAndBound {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lp_solver(mut self, lp: Solver) -> Self {
        self.lp = lp;
        self
    }

    pub fn with_max_nodes(mut self, max: usize) -> Self {
        self.max_nodes = max;
        self
    }

    pub fn with_int_tolerance(mut self, tol: f64) -> Self {
        self.int_tolerance = tol;
        self
    }

    pub fn solve(&self, problem: &LpProblem) -> Solution {
        let minimize = problem.objective.minimize;
        // Compare everything in maximization terms
        let sign = if minimize { -1.0 } else { 1.0 };

        let step = objective_step(problem);

        let mut stack = vec![Node::root(problem)];
        let mut incumbent: Option<(Vec<f64>, f64)> = None;
        let mut nodes_explored = 0;
        let mut relaxation_bound = f64::NAN;

        while let Some(node) = stack.pop() {
            if nodes_explored >= self.max_nodes {
                debug!(nodes_explored, "branch-and-bound node limit reached");
                return Solution::not_solved().with_search(SearchStats {
                    nodes_explored,
                    relaxation_bound,
                });
            }
            if node.is_empty() {
                trace!(depth = node.depth, "pruned empty bound box");
                continue;
            }
            nodes_explored += 1;

            let relaxation = self.lp.solve(&Self::node_problem(problem, &node));
            if nodes_explored == 1 {
                relaxation_bound = relaxation.objective_value;
            }

            match relaxation.status {
                SolutionStatus::Optimal => {}
                SolutionStatus::Infeasible => {
                    trace!(depth = node.depth, "pruned infeasible node");
                    continue;
                }
                SolutionStatus::Unbounded if node.depth == 0 => {
                    return Solution::unbounded(minimize).with_search(SearchStats {
                        nodes_explored,
                        relaxation_bound,
                    });
                }
                // A bounded root cannot have unbounded children
                SolutionStatus::Unbounded | SolutionStatus::NotSolved => {
                    return Solution::not_solved().with_search(SearchStats {
                        nodes_explored,
                        relaxation_bound,
                    });
                }
            }

            let mut bound = sign * relaxation.objective_value;
            if let Some(step) = step {
                // No integer point can beat the largest multiple of the step below the bound
                bound = ((bound / step) + 1e-6).floor() * step;
            }
            if let Some((_, best)) = &incumbent {
                if bound <= sign * best + self.lp.tolerance().max(1e-9) {
                    trace!(depth = node.depth, bound, "pruned by incumbent");
                    continue;
                }
            }

            match self.most_fractional(problem, &relaxation.values) {
                None => {
                    let values = self.round_integers(problem, relaxation.values);
                    let objective = problem.objective_value(&values);
                    debug!(depth = node.depth, objective, "new incumbent");
                    incumbent = Some((values, objective));
                }
                Some((j, value)) => {
                    let floor = value.floor();
                    let ceil = value.ceil();
                    trace!(depth = node.depth, variable = %problem.variables[j].name, value, "branching");

                    let mut down = node.child();
                    down.upper[j] = Some(down.upper[j].map_or(floor, |u| u.min(floor)));
                    let mut up = node.child();
                    up.lower[j] = up.lower[j].max(ceil);

                    // Explore the branch nearer the relaxed value first
                    if value - floor > 0.5 {
                        stack.push(down);
                        stack.push(up);
                    } else {
                        stack.push(up);
                        stack.push(down);
                    }
                }
            }
        }

        let stats = SearchStats {
            nodes_explored,
            relaxation_bound,
        };
        debug!(nodes_explored, "branch-and-bound finished");

        match incumbent {
            Some((values, objective_value)) => Solution {
                status: SolutionStatus::Optimal,
                analysis: slack_analysis(problem, &values, self.int_tolerance),
                values,
                objective_value,
                search: Some(stats),
            },
            None => Solution::infeasible().with_search(stats),
        }
    }

    fn node_problem(problem: &LpProblem, node: &Node) -> LpProblem {
        let mut sub = problem.clone();
        for (j, var) in sub.variables.iter_mut().enumerate() {
            var.lower = node.lower[j];
            var.upper = node.upper[j];
        }
        sub
    }

    /// Integer variable furthest from an integer value
    fn most_fractional(&self, problem: &LpProblem, values: &[f64]) -> Option<(usize, f64)> {
        problem
            .variables
            .iter()
            .zip(values)
            .enumerate()
            .filter(|(_, (var, _))| var.integer)
            .map(|(j, (_, &v))| (j, v, (v - v.round()).abs()))
            .filter(|&(_, _, frac)| frac > self.int_tolerance)
            .max_by(|a, b| a.2.total_cmp(&b.2))
            .map(|(j, v, _)| (j, v))
    }

    fn round_integers(&self, problem: &LpProblem, mut values: Vec<f64>) -> Vec<f64> {
        for (var, v) in problem.variables.iter().zip(values.iter_mut()) {
            if var.integer {
                // Avoid -0.0 leaking into reports
                *v = v.round() + 0.0;
            }
        }
        values
    }
}

/// Spacing of the objective values integer solutions can take.
///
/// `Some(g)` when every variable with a nonzero objective coefficient is
/// integer and all those coefficients are integral; `g` is their gcd.
fn objective_step(problem: &LpProblem) -> Option<f64> {
    const MAX_EXACT: f64 = 9.0e15;
    let mut step: u64 = 0;
    for (var, &coef) in problem.variables.iter().zip(&problem.objective.coefficients) {
        if coef == 0.0 {
            continue;
        }
        if !var.integer || coef.fract() != 0.0 || coef.abs() > MAX_EXACT {
            return None;
        }
        step = gcd(step, coef.abs() as u64);
    }
    (step > 0).then_some(step as f64)
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}
