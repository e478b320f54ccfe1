use std::fmt::Write;

use factoryplan_model::{Evaluation, SensitivityReport, Solution, SweepPoint, CHAIRS, TABLES};
use factoryplan_solver::SolutionStatus;

const RULE: &str = "------------------------------";

fn profit_text(evaluation: &Evaluation) -> String {
    match evaluation {
        Evaluation::Optimal { profit, .. } => format!("${:.2}", profit),
        Evaluation::Unavailable { reason } => format!("could not be evaluated ({})", reason),
    }
}

pub fn render_solution(solution: &Solution, analysis: bool) -> String {
    let mut out = String::new();

    match solution.status {
        SolutionStatus::Optimal => {
            let chairs = solution.value(CHAIRS).unwrap_or(0);
            let tables = solution.value(TABLES).unwrap_or(0);
            let _ = writeln!(out, "Status: OPTIMAL");
            let _ = writeln!(out, "Optimal Solution: Build {} Tables and {} Chairs.", tables, chairs);
            let _ = writeln!(out, "Max profit: ${:.2}", solution.objective_value);

            if analysis {
                let _ = writeln!(out);
                let _ = writeln!(out, "Binding constraints (pinch points):");
                if solution.binding_constraints.is_empty() {
                    let _ = writeln!(out, "  (none)");
                }
                for name in &solution.binding_constraints {
                    let _ = writeln!(out, "  - {}", name);
                }
                let _ = writeln!(out);
                let _ = writeln!(out, "Resource usage:");
                for s in &solution.slacks {
                    let _ = writeln!(
                        out,
                        "  {:20} {:8.2} of {:8.2} ({:.2} spare)",
                        s.constraint, s.activity, s.rhs, s.slack
                    );
                }
            }
        }
        SolutionStatus::Infeasible => {
            let _ = writeln!(out, "Status: INFEASIBLE");
            let _ = writeln!(out, "No production plan satisfies all constraints.");
        }
        SolutionStatus::Unbounded => {
            let _ = writeln!(out, "Status: UNBOUNDED");
            let _ = writeln!(out, "The problem has no finite optimal solution.");
        }
        SolutionStatus::NotSolved => {
            let _ = writeln!(out, "Status: NOT SOLVED");
            let _ = writeln!(out, "Solver stopped before proving optimality.");
        }
    }

    out
}

pub fn render_sensitivity(report: &SensitivityReport) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(out, "SENSITIVITY ANALYSIS:-");
    let _ = writeln!(out, "Original Max Profit: {}", profit_text(&report.baseline.evaluation));

    for comparison in &report.comparisons {
        let scenario = &comparison.result.scenario;
        let evaluation = &comparison.result.evaluation;
        match (evaluation, comparison.loss) {
            (Evaluation::Optimal { profit, .. }, Some(loss)) => {
                let _ = writeln!(out, "Profit if {}: ${:.2} (Loss of ${:.2})", scenario.name, profit, loss);
            }
            (Evaluation::Optimal { profit, .. }, None) => {
                let _ = writeln!(
                    out,
                    "Profit if {}: ${:.2} (loss not available: baseline could not be evaluated)",
                    scenario.name, profit
                );
            }
            (Evaluation::Unavailable { .. }, _) => {
                let _ = writeln!(out, "Profit if {}: {}", scenario.name, profit_text(evaluation));
            }
        }
    }

    let _ = writeln!(out, "{}", RULE);
    out
}

pub fn render_sweep(points: &[SweepPoint]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:>10} {:>10} {:>12} {:>8} {:>8}", "labor", "wood", "profit", "chairs", "tables");
    for p in points {
        match &p.evaluation {
            Evaluation::Optimal { profit, chairs, tables } => {
                let _ = writeln!(
                    out,
                    "{:>10.2} {:>10.2} {:>12.2} {:>8} {:>8}",
                    p.labor, p.wood, profit, chairs, tables
                );
            }
            Evaluation::Unavailable { reason } => {
                let _ = writeln!(out, "{:>10.2} {:>10.2}  {}", p.labor, p.wood, reason);
            }
        }
    }
    out
}
