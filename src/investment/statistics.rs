//! Summary figures of an investment simulation

use crate::schedule::LoanStatistics;
use serde::{Deserialize, Serialize};
use super::simulator::InvestmentRecord;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestmentStatistics {
    pub start_investment: f64,
    pub end_investment_balance: f64,

    /// End balance minus everything contributed, start capital included
    pub net_investment_growth: f64,

    /// Investment growth minus the alternative loan's interest and insurance
    pub net_final_result: f64,

    pub net_worth_end_of_term: f64,
}

impl InvestmentStatistics {
    /// `None` for an empty simulation
    pub fn from_simulation(
        records: &[InvestmentRecord],
        start_capital: f64,
        alternative: &LoanStatistics,
    ) -> Option<Self> {
        let last = records.last()?;
        let net_investment_growth = last.investment_balance - last.cumulative_investment_contribution;

        Some(Self {
            start_investment: start_capital,
            end_investment_balance: last.investment_balance,
            net_investment_growth,
            net_final_result: net_investment_growth - alternative.total_loan_costs,
            net_worth_end_of_term: last.net_worth,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::investment::{simulate, InvestmentParameters};
    use crate::loan::{LoanParameters, LoanType};
    use crate::schedule::ScheduleGenerator;
    use approx::assert_relative_eq;

    #[test]
    fn test_growth_excludes_contributions() {
        let params = LoanParameters::new(LoanType::Bullet, 200_000.0, 2.0, 5);
        let loan = ScheduleGenerator::default().generate(&params, None).unwrap();
        let stats = crate::aggregate::summarize(&loan);

        let records = simulate(&loan, &loan, &InvestmentParameters::new(50_000.0, 10.0)).unwrap();
        let summary = InvestmentStatistics::from_simulation(&records, 50_000.0, &stats).unwrap();

        let end = 50_000.0 * 1.1_f64.powi(5);
        assert_eq!(summary.start_investment, 50_000.0);
        assert_relative_eq!(summary.end_investment_balance, end, max_relative = 1e-9);
        assert_relative_eq!(summary.net_investment_growth, end - 50_000.0, max_relative = 1e-9);
        assert_relative_eq!(
            summary.net_final_result,
            end - 50_000.0 - stats.total_loan_costs,
            max_relative = 1e-9
        );
        assert_relative_eq!(summary.net_worth_end_of_term, end, max_relative = 1e-9);
    }

    #[test]
    fn test_empty_simulation() {
        assert!(InvestmentStatistics::from_simulation(&[], 0.0, &LoanStatistics::default()).is_none());
    }
}
