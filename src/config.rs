//! Engine configuration
//!
//! Plain structs with defaults; hosts may read overrides from the environment.

use std::env;

/// Approximate annual debt-balance insurance rate applied to the original principal (0.36%)
pub const DEFAULT_INSURANCE_ANNUAL_RATE: f64 = 0.0036;

/// Residual balance below which a loan is treated as fully repaid
pub const DEFAULT_PAYOFF_TOLERANCE: f64 = 0.01;

/// Configuration for schedule generation and the break-even solver
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Annual insurance rate on the original principal
    pub insurance_annual_rate: f64,

    /// Whether `insurance_coverage_pct` scales the flat premium
    pub apply_insurance_coverage: bool,

    /// Tail correction tolerance for the final repayment
    pub payoff_tolerance: f64,

    /// Break-even solver settings
    pub solver: SolverConfig,
}

/// Bisection settings for the minimum growth rate search (rates in percent)
#[derive(Debug, Clone)]
pub struct SolverConfig {
    pub lower_rate: f64,
    pub upper_rate: f64,

    /// Net worth tolerance in currency units
    pub tolerance: f64,

    pub max_iterations: u32,

    /// How many times the bracket may be widened before giving up
    pub max_widenings: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            insurance_annual_rate: DEFAULT_INSURANCE_ANNUAL_RATE,
            apply_insurance_coverage: true,
            payoff_tolerance: DEFAULT_PAYOFF_TOLERANCE,
            solver: SolverConfig::default(),
        }
    }
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            lower_rate: -50.0,
            upper_rate: 50.0,
            tolerance: 1e-4,
            max_iterations: 100,
            max_widenings: 4,
        }
    }
}

impl EngineConfig {
    /// Build a config from environment variables, falling back to defaults:
    ///   LOAN_INSURANCE_RATE, LOAN_APPLY_COVERAGE, LOAN_PAYOFF_TOLERANCE,
    ///   SOLVER_LOWER_RATE, SOLVER_UPPER_RATE, SOLVER_TOLERANCE, SOLVER_MAX_ITERATIONS
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let insurance_annual_rate = env_or("LOAN_INSURANCE_RATE", defaults.insurance_annual_rate);
        let apply_insurance_coverage = env::var("LOAN_APPLY_COVERAGE")
            .ok()
            .map(|s| !matches!(s.trim(), "0" | "false" | "no"))
            .unwrap_or(defaults.apply_insurance_coverage);
        let payoff_tolerance = env_or("LOAN_PAYOFF_TOLERANCE", defaults.payoff_tolerance);

        let solver = SolverConfig {
            lower_rate: env_or("SOLVER_LOWER_RATE", defaults.solver.lower_rate),
            upper_rate: env_or("SOLVER_UPPER_RATE", defaults.solver.upper_rate),
            tolerance: env_or("SOLVER_TOLERANCE", defaults.solver.tolerance),
            max_iterations: env_or("SOLVER_MAX_ITERATIONS", defaults.solver.max_iterations),
            max_widenings: defaults.solver.max_widenings,
        };

        log::debug!(
            "engine config: insurance_rate={} apply_coverage={} solver=[{}, {}]",
            insurance_annual_rate,
            apply_insurance_coverage,
            solver.lower_rate,
            solver.upper_rate
        );

        Self {
            insurance_annual_rate,
            apply_insurance_coverage,
            payoff_tolerance,
            solver,
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.insurance_annual_rate, 0.0036);
        assert!(config.apply_insurance_coverage);
        assert!(config.solver.lower_rate < 0.0 && config.solver.upper_rate > 0.0);
    }

    #[test]
    fn test_env_or_falls_back_on_garbage() {
        assert_eq!(env_or("LOAN_ENGINE_TEST_UNSET_VARIABLE", 42u32), 42);
    }
}
