use std::path::{Path, PathBuf};

use factoryplan_model::{Capacities, ModelError, ProfitCoefficients, Scenario};
use factoryplan_solver::{BranchAndBound, Solver};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Error reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid model settings: {0}")]
    Model(#[from] ModelError),
    #[error("Invalid solver settings: {0}")]
    Solver(String),
}

/// Sensitivity run description. Every section may be omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub baseline: Capacities,
    pub profit: ProfitCoefficients,
    pub scenarios: Vec<Scenario>,
    pub solver: SolverSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SolverSettings {
    pub max_nodes: usize,
    pub max_iterations: usize,
    pub tolerance: f64,
    pub int_tolerance: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            baseline: Capacities::default(),
            profit: ProfitCoefficients::default(),
            scenarios: Scenario::stress_tests(),
            solver: SolverSettings::default(),
        }
    }
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            max_nodes: 10000,
            max_iterations: 10000,
            tolerance: 1e-9,
            int_tolerance: 1e-6,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&source)
    }

    pub fn parse(source: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_json::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Scenarios are not checked here; bad ones are reported per scenario.
    fn validate(&self) -> Result<(), ConfigError> {
        self.baseline.validate()?;
        self.profit.validate()?;
        self.solver.validate()
    }

    pub fn baseline_scenario(&self) -> Scenario {
        Scenario::new("Original", self.baseline.labor, self.baseline.wood)
    }
}

impl SolverSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.tolerance > 0.0 && self.tolerance < 1.0) {
            return Err(ConfigError::Solver(format!("tolerance {} must be in (0, 1)", self.tolerance)));
        }
        if !(self.int_tolerance > 0.0 && self.int_tolerance < 0.5) {
            return Err(ConfigError::Solver(format!(
                "int_tolerance {} must be in (0, 0.5)",
                self.int_tolerance
            )));
        }
        if self.max_nodes == 0 || self.max_iterations == 0 {
            return Err(ConfigError::Solver("limits must be positive".to_string()));
        }
        Ok(())
    }

    pub fn backend(&self) -> BranchAndBound {
        let lp = Solver::new()
            .with_max_iterations(self.max_iterations)
            .with_tolerance(self.tolerance);
        BranchAndBound::new()
            .with_lp_solver(lp)
            .with_max_nodes(self.max_nodes)
            .with_int_tolerance(self.int_tolerance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = Config::parse("{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.baseline, Capacities::new(40.0, 30.0));
        assert_eq!(config.scenarios.len(), 2);
    }

    #[test]
    fn test_partial_document() {
        let config = Config::parse(
            r#"{
                "profit": { "chairs": 25, "tables": 50 },
                "scenarios": [ { "name": "Overtime", "labor": 48, "wood": 30 } ],
                "solver": { "max_nodes": 50 }
            }"#,
        )
        .unwrap();

        assert_eq!(config.profit, ProfitCoefficients::new(25.0, 50.0));
        assert_eq!(config.scenarios, vec![Scenario::new("Overtime", 48.0, 30.0)]);
        assert_eq!(config.solver.max_nodes, 50);
        assert_eq!(config.solver.max_iterations, 10000);
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let err = Config::parse(r#"{ "baseline": { "labor": 1, "wood": 1 }, "budget": 3 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_negative_baseline_is_rejected() {
        let err = Config::parse(r#"{ "baseline": { "labor": -1, "wood": 30 } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Model(ModelError::InvalidCapacity { .. })));
    }

    #[test]
    fn test_bad_tolerance_is_rejected() {
        let err = Config::parse(r#"{ "solver": { "int_tolerance": 0.7 } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Solver(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = Config::load(Path::new("/nonexistent/factoryplan.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
