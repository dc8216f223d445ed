//! Minimum growth rate search
//!
//! Finds the annual growth rate at which the alternative loan's end-of-term net worth
//! is zero, using bisection on the simulated net worth.

use crate::config::SolverConfig;
use crate::error::{EngineResult, NumericError};
use crate::schedule::MonthlyRecord;
use super::simulator::final_net_worth;

/// Lowest annual growth rate (percent) the bracket may widen to
const LOWEST_RATE: f64 = -99.0;

/// Bisection solver for the break-even growth rate
#[derive(Debug, Clone, Default)]
pub struct BreakEvenSolver {
    config: SolverConfig,
}

impl BreakEvenSolver {
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    /// Annual growth rate in percent that zeroes end-of-term net worth
    pub fn solve(
        &self,
        reference: &[MonthlyRecord],
        alternative: &[MonthlyRecord],
        start_capital: f64,
    ) -> EngineResult<f64> {
        let net_worth = |rate: f64| -> Result<f64, NumericError> {
            let value = final_net_worth(reference, alternative, start_capital, rate).ok_or_else(|| {
                NumericError::NonFinite {
                    context: "net worth of an empty alternative schedule".to_string(),
                }
            })?;
            if value.is_finite() {
                Ok(value)
            } else {
                Err(NumericError::NonFinite {
                    context: format!("net worth at {}% growth", rate),
                })
            }
        };

        let rate = self.bisect(net_worth)?;
        log::debug!("break-even growth rate {:.6}% for start capital {:.2}", rate, start_capital);
        Ok(rate)
    }

    /// Bisection over a widened bracket; `f` must change sign inside it
    fn bisect<F>(&self, f: F) -> Result<f64, NumericError>
    where
        F: Fn(f64) -> Result<f64, NumericError>,
    {
        let tolerance = self.config.tolerance;
        let (mut low, mut high, mut f_low) = self.bracket(&f)?;

        if f_low == 0.0 || low == high {
            return Ok(low);
        }

        let mut f_mid = f_low;
        for _ in 0..self.config.max_iterations {
            let mid = (low + high) / 2.0;
            f_mid = f(mid)?;

            if f_mid.abs() < tolerance || (high - low) / 2.0 < 1e-12 {
                return Ok(mid);
            }

            if f_mid.signum() == f_low.signum() {
                low = mid;
                f_low = f_mid;
            } else {
                high = mid;
            }
        }

        Err(NumericError::NoConvergence {
            iterations: self.config.max_iterations,
            residual: f_mid,
        })
    }

    /// Widen `[lower, upper]` until the net worth changes sign, the lower end stopping at -99%.
    /// Returns the bracket and the value at its lower end.
    fn bracket<F>(&self, f: &F) -> Result<(f64, f64, f64), NumericError>
    where
        F: Fn(f64) -> Result<f64, NumericError>,
    {
        let mut low = self.config.lower_rate.max(LOWEST_RATE);
        let mut high = self.config.upper_rate;

        for _ in 0..=self.config.max_widenings {
            let f_low = f(low)?;
            let f_high = f(high)?;

            // Flat zero net worth: nothing to earn back
            if f_low.abs() < self.config.tolerance && f_high.abs() < self.config.tolerance {
                return Ok((0.0, 0.0, 0.0));
            }
            if f_low == 0.0 {
                return Ok((low, low, 0.0));
            }
            if f_high == 0.0 {
                return Ok((high, high, 0.0));
            }
            if f_low.signum() != f_high.signum() {
                return Ok((low, high, f_low));
            }

            low = (low - low.abs().max(1.0)).max(LOWEST_RATE);
            high += high.abs().max(1.0);
        }

        Err(NumericError::NoBracket { lower: low, upper: high })
    }
}

/// Break-even growth rate with default solver settings
pub fn solve_minimum_growth_rate(
    reference: &[MonthlyRecord],
    alternative: &[MonthlyRecord],
    start_capital: f64,
) -> EngineResult<f64> {
    BreakEvenSolver::default().solve(reference, alternative, start_capital)
}
