//! Differential investment simulation across two loan schedules
//!
//! The payment difference between the reference and the alternative loan is invested
//! (or withdrawn) every month. Month m+1's growth applies to month m's post-contribution
//! balance, so the recurrence is strictly sequential.

use crate::error::{EngineError, EngineResult};
use crate::schedule::MonthlyRecord;
use serde::{Deserialize, Serialize};

/// Investment inputs for a comparison
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestmentParameters {
    /// Capital invested before month 1
    #[serde(default)]
    pub start_capital: f64,

    /// Annual growth in percent (8.0 = 8%), may be negative; 0 when absent
    #[serde(default)]
    pub annual_growth_rate: Option<f64>,

    /// Start capital used when following the reference loan
    #[serde(default)]
    pub ref_invest_capital: Option<f64>,

    /// Start capital used when following the alternative loan
    #[serde(default)]
    pub alt_invest_capital: Option<f64>,
}

impl InvestmentParameters {
    pub fn new(start_capital: f64, annual_growth_rate: f64) -> Self {
        Self {
            start_capital,
            annual_growth_rate: Some(annual_growth_rate),
            ..Default::default()
        }
    }

    pub fn growth_rate(&self) -> f64 {
        self.annual_growth_rate.unwrap_or(0.0)
    }

    /// Capital left to invest next to the alternative loan once `own_contribution`
    /// went into the purchase; `altInvestCapital` overrides it
    pub fn alternative_capital(&self, own_contribution: f64) -> f64 {
        self.alt_invest_capital
            .unwrap_or_else(|| (self.start_capital - own_contribution).max(0.0))
    }

    pub fn reference_capital(&self, own_contribution: f64) -> f64 {
        self.ref_invest_capital
            .unwrap_or_else(|| (self.start_capital - own_contribution).max(0.0))
    }

    pub fn validate(&self) -> EngineResult<()> {
        let capitals = [
            ("startCapital", Some(self.start_capital)),
            ("refInvestCapital", self.ref_invest_capital),
            ("altInvestCapital", self.alt_invest_capital),
        ];
        for (field, value) in capitals {
            if let Some(v) = value {
                if !v.is_finite() || v < 0.0 {
                    return Err(EngineError::invalid(field, format!("must be zero or positive, got {}", v)));
                }
            }
        }

        let rate = self.growth_rate();
        if !rate.is_finite() || rate <= -100.0 {
            return Err(EngineError::invalid(
                "annualGrowthRate",
                format!("must be greater than -100%, got {}", rate),
            ));
        }
        Ok(())
    }
}

/// Alternative-loan month extended with the investment position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestmentRecord {
    #[serde(flatten)]
    pub loan: MonthlyRecord,

    pub investment_balance: f64,

    /// Reference payment minus alternative payment (negative = withdrawal)
    pub monthly_contribution: f64,

    pub cumulative_investment_contribution: f64,

    /// Investment balance minus the alternative loan's outstanding principal
    pub net_worth: f64,
}

/// Monthly growth factor equivalent to an annual rate in percent
pub fn monthly_growth_rate(annual_growth_rate: f64) -> f64 {
    (1.0 + annual_growth_rate / 100.0).powf(1.0 / 12.0) - 1.0
}

/// Run the simulation from the full start capital (or `altInvestCapital`)
pub fn simulate(
    reference: &[MonthlyRecord],
    alternative: &[MonthlyRecord],
    params: &InvestmentParameters,
) -> EngineResult<Vec<InvestmentRecord>> {
    simulate_from(reference, alternative, params, params.alternative_capital(0.0))
}

/// Run the simulation from `start_capital` and emit one record per alternative-loan month
pub fn simulate_from(
    reference: &[MonthlyRecord],
    alternative: &[MonthlyRecord],
    params: &InvestmentParameters,
    start_capital: f64,
) -> EngineResult<Vec<InvestmentRecord>> {
    params.validate()?;
    if !start_capital.is_finite() || start_capital < 0.0 {
        return Err(EngineError::invalid(
            "startCapital",
            format!("must be zero or positive, got {}", start_capital),
        ));
    }

    let mut records = Vec::with_capacity(alternative.len());
    run(
        reference,
        alternative,
        start_capital,
        monthly_growth_rate(params.growth_rate()),
        |month, balance, contribution, cumulative| {
            records.push(InvestmentRecord {
                loan: month.clone(),
                investment_balance: balance,
                monthly_contribution: contribution,
                cumulative_investment_contribution: cumulative,
                net_worth: balance - month.remaining_principal,
            });
        },
    );

    log::debug!(
        "simulated {} months at {}% growth from {:.2}",
        records.len(),
        params.growth_rate(),
        start_capital
    );
    Ok(records)
}

/// Net worth at the alternative loan's final month, without materializing records.
/// `None` when the alternative schedule is empty.
pub fn final_net_worth(
    reference: &[MonthlyRecord],
    alternative: &[MonthlyRecord],
    start_capital: f64,
    annual_growth_rate: f64,
) -> Option<f64> {
    let mut last = None;
    run(
        reference,
        alternative,
        start_capital,
        monthly_growth_rate(annual_growth_rate),
        |month, balance, _, _| last = Some(balance - month.remaining_principal),
    );
    last
}

/// Core recurrence; `emit` receives the alternative month, balance, contribution and cumulative contribution
fn run<F>(reference: &[MonthlyRecord], alternative: &[MonthlyRecord], start_capital: f64, monthly_growth: f64, mut emit: F)
where
    F: FnMut(&MonthlyRecord, f64, f64, f64),
{
    let mut balance = start_capital;
    let mut cumulative = start_capital;
    let months = reference.len().max(alternative.len());

    for idx in 0..months {
        balance *= 1.0 + monthly_growth;

        let reference_payment = reference.get(idx).map(|m| m.total_monthly_payment).unwrap_or(0.0);
        let alternative_month = alternative.get(idx);
        let alternative_payment = alternative_month.map(|m| m.total_monthly_payment).unwrap_or(0.0);

        let contribution = reference_payment - alternative_payment;
        balance += contribution;
        cumulative += contribution;

        if let Some(month) = alternative_month {
            emit(month, balance, contribution, cumulative);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loan::{LoanParameters, LoanType};
    use crate::schedule::ScheduleGenerator;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn schedule(loan_type: LoanType, rate: f64, years: i32) -> Vec<MonthlyRecord> {
        let params = LoanParameters::new(loan_type, 500_000.0, rate, years);
        ScheduleGenerator::default().generate(&params, None).unwrap()
    }

    #[test]
    fn test_identical_schedules_only_compound() {
        let loan = schedule(LoanType::Annuity, 3.5, 10);
        let params = InvestmentParameters::new(100_000.0, 6.0);
        let records = simulate(&loan, &loan, &params).unwrap();
        let factor = 1.0 + monthly_growth_rate(6.0);

        assert_eq!(records.len(), 120);
        assert!(records.iter().all(|r| r.monthly_contribution == 0.0));
        assert_relative_eq!(records[0].investment_balance, 100_000.0 * factor, max_relative = 1e-12);
        for pair in records.windows(2) {
            assert_relative_eq!(pair[1].investment_balance, pair[0].investment_balance * factor, max_relative = 1e-12);
        }
        // Twelve months of compounding equal the annual rate
        assert_relative_eq!(records[11].investment_balance, 106_000.0, max_relative = 1e-9);
        assert_eq!(records[119].cumulative_investment_contribution, 100_000.0);
    }

    #[test]
    fn test_contributions_and_net_worth() {
        let reference = schedule(LoanType::Annuity, 3.5, 30);
        let alternative = schedule(LoanType::Bullet, 3.0, 30);
        let records = simulate(&reference, &alternative, &InvestmentParameters::new(0.0, 0.0)).unwrap();

        let first = &records[0];
        assert_abs_diff_eq!(
            first.monthly_contribution,
            reference[0].total_monthly_payment - alternative[0].total_monthly_payment,
            epsilon = 1e-9
        );
        assert_abs_diff_eq!(first.investment_balance, first.monthly_contribution, epsilon = 1e-9);
        assert_abs_diff_eq!(first.net_worth, first.investment_balance - 500_000.0, epsilon = 1e-6);
        assert_eq!(first.loan.month, 1);

        let last = records.last().unwrap();
        assert!(last.monthly_contribution < 0.0);
        assert_abs_diff_eq!(last.net_worth, last.investment_balance, epsilon = 1e-9);
    }

    #[test]
    fn test_longer_reference_contributes_after_alternative_ends() {
        let reference = schedule(LoanType::Annuity, 3.0, 2);
        let alternative = schedule(LoanType::Annuity, 3.0, 1);
        let params = InvestmentParameters::new(1_000.0, 0.0);

        let records = simulate(&reference, &alternative, &params).unwrap();
        assert_eq!(records.len(), 12);

        // Final net worth only sees the alternative's term
        let net_worth = final_net_worth(&reference, &alternative, 1_000.0, 0.0).unwrap();
        assert_abs_diff_eq!(net_worth, records[11].net_worth, epsilon = 1e-9);
    }

    #[test]
    fn test_final_net_worth_matches_simulation() {
        let reference = schedule(LoanType::Annuity, 3.5, 20);
        let alternative = schedule(LoanType::Bullet, 3.0, 20);
        let params = InvestmentParameters::new(120_000.0, 8.0);

        let records = simulate(&reference, &alternative, &params).unwrap();
        let net_worth = final_net_worth(&reference, &alternative, 120_000.0, 8.0).unwrap();
        assert_eq!(net_worth, records.last().unwrap().net_worth);
        assert!(final_net_worth(&reference, &[], 120_000.0, 8.0).is_none());
    }

    #[test]
    fn test_capital_override() {
        let loan = schedule(LoanType::Bullet, 3.0, 1);
        let params = InvestmentParameters {
            start_capital: 100_000.0,
            annual_growth_rate: None,
            ref_invest_capital: None,
            alt_invest_capital: Some(40_000.0),
        };
        let records = simulate(&loan, &loan, &params).unwrap();
        assert_eq!(records[0].investment_balance, 40_000.0);
        assert_eq!(params.alternative_capital(75_000.0), 40_000.0);
        assert_eq!(params.reference_capital(30_000.0), 70_000.0);
    }

    #[test]
    fn test_own_contribution_reduces_capital() {
        let params = InvestmentParameters::new(120_000.0, 0.0);
        assert_eq!(params.alternative_capital(20_000.0), 100_000.0);
        assert_eq!(params.alternative_capital(150_000.0), 0.0);

        let loan = schedule(LoanType::Bullet, 3.0, 1);
        let records = simulate_from(&loan, &loan, &params, params.alternative_capital(20_000.0)).unwrap();
        assert_eq!(records[0].investment_balance, 100_000.0);
        assert!(simulate_from(&loan, &loan, &params, -1.0).is_err());
    }

    #[test]
    fn test_invalid_parameters() {
        let loan = schedule(LoanType::Bullet, 3.0, 1);
        assert!(simulate(&loan, &loan, &InvestmentParameters::new(-1.0, 5.0)).is_err());
        assert!(simulate(&loan, &loan, &InvestmentParameters::new(1.0, -100.0)).is_err());
        assert!(simulate(&loan, &loan, &InvestmentParameters::new(1.0, -20.0)).is_ok());
    }

    #[test]
    fn test_monthly_growth_compounds_to_annual() {
        let factor = (1.0 + monthly_growth_rate(10.0)).powi(24);
        assert_relative_eq!(factor, 1.21, max_relative = 1e-9);
        assert!(monthly_growth_rate(-20.0) < 0.0);
    }

    #[test]
    fn test_record_json_is_flat() {
        let loan = schedule(LoanType::Bullet, 3.0, 1);
        let records = simulate(&loan, &loan, &InvestmentParameters::new(10.0, 1.0)).unwrap();
        let json = serde_json::to_value(&records[0]).unwrap();
        assert!(json.get("remainingPrincipal").is_some());
        assert!(json.get("netWorth").is_some());
        assert!(json.get("loan").is_none());
    }
}
