//! Loan calculation and two-loan comparison
//!
//! `LoanEngine` is the public entry point: it generates both schedules, aggregates them,
//! runs the investment simulation and the break-even search, and assembles the result.

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult, LoanSide};
use crate::investment::{simulate_from, BreakEvenSolver, InvestmentParameters, InvestmentRecord, InvestmentStatistics};
use crate::loan::{LoanParameters, ModularSchedule};
use crate::schedule::{AnnualRecord, LoanCalculationResult, PremiumOverride, ScheduleGenerator};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Headline figures of a comparison with an investment simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonStats {
    /// Reference loan costs minus alternative loan costs
    pub total_cost_difference: f64,
    pub net_worth_end_of_term: f64,
}

/// Alternative minus reference for one year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnualDifference {
    pub year: i32,
    pub interest_difference: f64,
    pub principal_difference: f64,
    pub insurance_difference: f64,
    pub total_payment_difference: f64,
    pub remaining_principal_difference: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResult {
    pub reference_loan: LoanCalculationResult,
    pub alternative_loan: LoanCalculationResult,
    pub investment_simulation: Option<Vec<InvestmentRecord>>,
    pub minimum_required_growth_rate: Option<f64>,
    pub comparison_stats: Option<ComparisonStats>,
    pub investment_statistics: Option<InvestmentStatistics>,
    pub annual_comparison: Vec<AnnualDifference>,
}

/// Everything a comparison needs; the modular schedule applies to the alternative loan
#[derive(Clone, Copy)]
pub struct ComparisonInput<'a> {
    pub reference: &'a LoanParameters,
    pub alternative: &'a LoanParameters,
    pub reference_own_contribution: f64,
    pub alternative_own_contribution: f64,
    pub investment: Option<&'a InvestmentParameters>,
    pub modular_schedule: Option<&'a ModularSchedule>,
    pub reference_premiums: Option<PremiumOverride<'a>>,
    pub alternative_premiums: Option<PremiumOverride<'a>>,
}

impl<'a> ComparisonInput<'a> {
    pub fn new(reference: &'a LoanParameters, alternative: &'a LoanParameters) -> Self {
        Self {
            reference,
            alternative,
            reference_own_contribution: reference.own_contribution,
            alternative_own_contribution: alternative.own_contribution,
            investment: None,
            modular_schedule: None,
            reference_premiums: None,
            alternative_premiums: None,
        }
    }

    pub fn with_own_contributions(mut self, reference: f64, alternative: f64) -> Self {
        self.reference_own_contribution = reference;
        self.alternative_own_contribution = alternative;
        self
    }

    pub fn with_investment(mut self, investment: &'a InvestmentParameters) -> Self {
        self.investment = Some(investment);
        self
    }

    pub fn with_schedule(mut self, schedule: &'a ModularSchedule) -> Self {
        self.modular_schedule = Some(schedule);
        self
    }

    pub fn with_premiums(
        mut self,
        reference: Option<PremiumOverride<'a>>,
        alternative: Option<PremiumOverride<'a>>,
    ) -> Self {
        self.reference_premiums = reference;
        self.alternative_premiums = alternative;
        self
    }
}

/// Loan calculation and comparison engine
pub struct LoanEngine {
    generator: ScheduleGenerator,
    solver: BreakEvenSolver,
}

impl LoanEngine {
    pub fn new(config: EngineConfig) -> Self {
        let solver = BreakEvenSolver::new(config.solver.clone());
        Self {
            generator: ScheduleGenerator::new(config),
            solver,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        self.generator.config()
    }

    /// Schedule, annual rollup and statistics for one loan
    pub fn calculate_loan(
        &self,
        params: &LoanParameters,
        schedule: Option<&ModularSchedule>,
    ) -> EngineResult<LoanCalculationResult> {
        self.calculate_loan_with_premiums(params, schedule, None)
    }

    pub fn calculate_loan_with_premiums(
        &self,
        params: &LoanParameters,
        schedule: Option<&ModularSchedule>,
        premiums: Option<PremiumOverride<'_>>,
    ) -> EngineResult<LoanCalculationResult> {
        let monthly = self.generator.generate_with_premiums(params, schedule, premiums)?;
        Ok(LoanCalculationResult::from_monthly(monthly))
    }

    /// Compare two loans, optionally investing the payment difference
    pub fn compare_loans(
        &self,
        reference: &LoanParameters,
        alternative: &LoanParameters,
        reference_own_contribution: f64,
        alternative_own_contribution: f64,
        investment: Option<&InvestmentParameters>,
        schedule: Option<&ModularSchedule>,
    ) -> EngineResult<ComparisonResult> {
        let mut input = ComparisonInput::new(reference, alternative)
            .with_own_contributions(reference_own_contribution, alternative_own_contribution);
        input.investment = investment;
        input.modular_schedule = schedule;
        self.compare(&input)
    }

    pub fn compare(&self, input: &ComparisonInput<'_>) -> EngineResult<ComparisonResult> {
        check_contribution(input.reference_own_contribution, LoanSide::Reference)?;
        check_contribution(input.alternative_own_contribution, LoanSide::Alternative)?;
        let (reference, alternative) = (input.reference, input.alternative);

        let reference_loan = self
            .calculate_loan_with_premiums(reference, None, input.reference_premiums)
            .map_err(|e| e.for_side(LoanSide::Reference))?;
        let alternative_loan = self
            .calculate_loan_with_premiums(alternative, input.modular_schedule, input.alternative_premiums)
            .map_err(|e| e.for_side(LoanSide::Alternative))?;

        let annual_comparison = annual_differences(&reference_loan.annual_data, &alternative_loan.annual_data);

        let mut result = ComparisonResult {
            reference_loan,
            alternative_loan,
            investment_simulation: None,
            minimum_required_growth_rate: None,
            comparison_stats: None,
            investment_statistics: None,
            annual_comparison,
        };

        if let Some(investment) = input.investment {
            let capital = investment.alternative_capital(input.alternative_own_contribution);
            self.add_investment(&mut result, investment, capital)?;
        }

        log::info!(
            "compared {} vs {} loan: cost difference {:.2}",
            reference.loan_type.as_str(),
            alternative.loan_type.as_str(),
            result.reference_loan.statistics.total_loan_costs - result.alternative_loan.statistics.total_loan_costs
        );

        Ok(result)
    }

    fn add_investment(
        &self,
        result: &mut ComparisonResult,
        investment: &InvestmentParameters,
        capital: f64,
    ) -> EngineResult<()> {
        let reference = &result.reference_loan.monthly_data;
        let alternative = &result.alternative_loan.monthly_data;

        let simulation = simulate_from(reference, alternative, investment, capital)?;

        result.minimum_required_growth_rate = match self.solver.solve(reference, alternative, capital) {
            Ok(rate) => Some(rate),
            Err(e) => {
                log::warn!("minimum required growth rate unavailable: {}", e);
                None
            }
        };

        result.investment_statistics =
            InvestmentStatistics::from_simulation(&simulation, capital, &result.alternative_loan.statistics);
        result.comparison_stats = simulation.last().map(|last| ComparisonStats {
            total_cost_difference: result.reference_loan.statistics.total_loan_costs
                - result.alternative_loan.statistics.total_loan_costs,
            net_worth_end_of_term: last.net_worth,
        });
        result.investment_simulation = Some(simulation);
        Ok(())
    }
}

impl Default for LoanEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

/// Own contributions are paid out of the start capital; the loan parameters stay as given
fn check_contribution(own_contribution: f64, side: LoanSide) -> EngineResult<()> {
    if !own_contribution.is_finite() || own_contribution < 0.0 {
        return Err(EngineError::invalid(
            "ownContribution",
            format!("must be zero or positive, got {}", own_contribution),
        )
        .for_side(side));
    }
    Ok(())
}

/// Outer join of two annual rollups on year; a missing year counts as zeros
pub fn annual_differences(reference: &[AnnualRecord], alternative: &[AnnualRecord]) -> Vec<AnnualDifference> {
    let mut years: BTreeMap<i32, (Option<&AnnualRecord>, Option<&AnnualRecord>)> = BTreeMap::new();
    for record in reference {
        years.entry(record.year).or_default().0 = Some(record);
    }
    for record in alternative {
        years.entry(record.year).or_default().1 = Some(record);
    }

    years
        .into_iter()
        .map(|(year, (r, a))| {
            let diff = |field: fn(&AnnualRecord) -> f64| a.map(field).unwrap_or(0.0) - r.map(field).unwrap_or(0.0);
            AnnualDifference {
                year,
                interest_difference: diff(|x| x.annual_interest),
                principal_difference: diff(|x| x.annual_principal),
                insurance_difference: diff(|x| x.annual_insurance),
                total_payment_difference: diff(|x| x.annual_total_payment),
                remaining_principal_difference: diff(|x| x.remaining_principal_year_end),
            }
        })
        .collect()
}

/// Calculate a loan with the default configuration
pub fn calculate_loan(params: &LoanParameters, schedule: Option<&ModularSchedule>) -> EngineResult<LoanCalculationResult> {
    LoanEngine::default().calculate_loan(params, schedule)
}

/// Compare two loans with the default configuration
pub fn compare_loans(
    reference: &LoanParameters,
    alternative: &LoanParameters,
    reference_own_contribution: f64,
    alternative_own_contribution: f64,
    investment: Option<&InvestmentParameters>,
    schedule: Option<&ModularSchedule>,
) -> EngineResult<ComparisonResult> {
    LoanEngine::default().compare_loans(
        reference,
        alternative,
        reference_own_contribution,
        alternative_own_contribution,
        investment,
        schedule,
    )
}
