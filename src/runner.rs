//! Scenario runner for batches of comparisons
//!
//! Builds the engine once and runs many independent requests in parallel.

use crate::api::{handle_compare, CompareLoansRequest};
use crate::comparison::{ComparisonResult, LoanEngine};
use crate::config::EngineConfig;
use crate::error::EngineResult;
use crate::investment::final_net_worth;
use crate::schedule::{InsuranceResolver, NoInsuranceResolver};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// End-of-term net worth at one growth rate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensitivityPoint {
    pub annual_growth_rate: f64,
    pub net_worth_end_of_term: f64,
}

/// Pre-built engine for batch comparisons
///
/// # Example
/// ```ignore
/// let runner = ScenarioRunner::new();
/// let results = runner.compare_batch(&requests);
/// let curve = runner.growth_sensitivity(&requests[0], &[0.0, 2.0, 4.0, 6.0])?;
/// ```
pub struct ScenarioRunner {
    engine: LoanEngine,
    resolver: Box<dyn InsuranceResolver>,
}

impl ScenarioRunner {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            engine: LoanEngine::new(config),
            resolver: Box::new(NoInsuranceResolver),
        }
    }

    pub fn with_resolver(mut self, resolver: Box<dyn InsuranceResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn engine(&self) -> &LoanEngine {
        &self.engine
    }

    /// Run a single comparison
    pub fn run(&self, request: &CompareLoansRequest) -> EngineResult<ComparisonResult> {
        handle_compare(request, &self.engine, self.resolver.as_ref())
    }

    /// Run independent comparisons in parallel, results in request order
    pub fn compare_batch(&self, requests: &[CompareLoansRequest]) -> Vec<EngineResult<ComparisonResult>> {
        log::info!("running {} comparisons", requests.len());
        requests.par_iter().map(|request| self.run(request)).collect()
    }

    /// Net worth at the end of the alternative loan for each growth rate.
    /// The schedules are generated once. Start capital is the investment capital left after
    /// the alternative side's own contribution, as in a single comparison.
    pub fn growth_sensitivity(
        &self,
        request: &CompareLoansRequest,
        growth_rates: &[f64],
    ) -> EngineResult<Vec<SensitivityPoint>> {
        let mut base = request.clone();
        base.investment_params = None;
        let comparison = self.run(&base)?;

        let own_contribution = request
            .alternative_own_contribution
            .unwrap_or(request.alternative_loan.own_contribution);
        let capital = request
            .investment_params
            .as_ref()
            .map(|p| p.alternative_capital(own_contribution))
            .unwrap_or(0.0);
        let reference = &comparison.reference_loan.monthly_data;
        let alternative = &comparison.alternative_loan.monthly_data;

        let points = growth_rates
            .par_iter()
            .filter(|rate| rate.is_finite() && **rate > -100.0)
            .filter_map(|&rate| {
                final_net_worth(reference, alternative, capital, rate).map(|net_worth| SensitivityPoint {
                    annual_growth_rate: rate,
                    net_worth_end_of_term: net_worth,
                })
            })
            .collect::<Vec<_>>();

        if points.len() < growth_rates.len() {
            log::warn!("skipped {} invalid growth rates", growth_rates.len() - points.len());
        }
        Ok(points)
    }
}

impl Default for ScenarioRunner {
    fn default() -> Self {
        Self::new()
    }
}
