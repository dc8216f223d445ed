//! Annual rollups and summary statistics over a monthly schedule

use crate::schedule::{AnnualRecord, LoanStatistics, MonthlyRecord};
use std::collections::BTreeMap;

/// Roll monthly records up by their `year` label, ascending by year.
/// Flow fields are summed; balances come from the last month seen for that year.
pub fn aggregate_annual(monthly: &[MonthlyRecord]) -> Vec<AnnualRecord> {
    let mut years: BTreeMap<i32, AnnualRecord> = BTreeMap::new();

    for row in monthly {
        let annual = years.entry(row.year).or_insert_with(|| AnnualRecord {
            year: row.year,
            annual_interest: 0.0,
            annual_principal: 0.0,
            annual_insurance: 0.0,
            annual_total_payment: 0.0,
            remaining_principal_year_end: 0.0,
            cumulative_interest_year_end: 0.0,
            cumulative_insurance_year_end: 0.0,
            cumulative_principal_year_end: 0.0,
        });

        annual.annual_interest += row.interest;
        annual.annual_principal += row.principal_payment;
        annual.annual_insurance += row.insurance_premium;
        annual.annual_total_payment += row.total_monthly_payment;

        annual.remaining_principal_year_end = row.remaining_principal;
        annual.cumulative_interest_year_end = row.cumulative_interest_paid;
        annual.cumulative_insurance_year_end = row.cumulative_insurance_paid;
        annual.cumulative_principal_year_end = row.cumulative_principal_paid;
    }

    years.into_values().collect()
}

/// Terminal totals from the last month plus the highest total monthly payment
pub fn summarize(monthly: &[MonthlyRecord]) -> LoanStatistics {
    let Some(last) = monthly.last() else {
        return LoanStatistics::default();
    };

    let highest_monthly_payment = monthly
        .iter()
        .map(|r| r.total_monthly_payment)
        .fold(f64::NEG_INFINITY, f64::max);

    LoanStatistics {
        total_principal_paid: last.cumulative_principal_paid,
        total_interest_paid: last.cumulative_interest_paid,
        total_insurance_paid: last.cumulative_insurance_paid,
        total_loan_costs: last.cumulative_interest_paid + last.cumulative_insurance_paid,
        highest_monthly_payment,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loan::{LoanParameters, LoanType, ModularSchedule};
    use crate::schedule::ScheduleGenerator;
    use approx::assert_abs_diff_eq;

    fn schedule_for(params: &LoanParameters, schedule: Option<&ModularSchedule>) -> Vec<MonthlyRecord> {
        ScheduleGenerator::default().generate(params, schedule).unwrap()
    }

    #[test]
    fn test_annual_principal_matches_statistics() {
        let modular = ModularSchedule::from_pairs(&[(18, 25_000.0), (60, 40_000.0), (119, 100_000.0)]);
        let cases = vec![
            (LoanParameters::new(LoanType::Annuity, 300_000.0, 3.2, 20).with_start_year(2025), None),
            (LoanParameters::new(LoanType::Bullet, 300_000.0, 3.2, 20), None),
            (LoanParameters::new(LoanType::Modular, 150_000.0, 2.5, 10), Some(&modular)),
        ];

        for (params, schedule) in cases {
            let monthly = schedule_for(&params, schedule);
            let annual = aggregate_annual(&monthly);
            let stats = summarize(&monthly);

            let annual_principal: f64 = annual.iter().map(|a| a.annual_principal).sum();
            assert_abs_diff_eq!(annual_principal, stats.total_principal_paid, epsilon = 1e-6);
            assert_eq!(annual.len(), params.term_years as usize);
        }
    }

    #[test]
    fn test_year_end_snapshot() {
        let params = LoanParameters::new(LoanType::Annuity, 100_000.0, 4.0, 3).with_start_year(2030);
        let monthly = schedule_for(&params, None);
        let annual = aggregate_annual(&monthly);

        assert_eq!(annual.iter().map(|a| a.year).collect::<Vec<_>>(), vec![2030, 2031, 2032]);
        assert_eq!(annual[0].remaining_principal_year_end, monthly[11].remaining_principal);
        assert_eq!(annual[1].cumulative_interest_year_end, monthly[23].cumulative_interest_paid);
        assert_eq!(annual[2].remaining_principal_year_end, 0.0);

        let first_year_interest: f64 = monthly[..12].iter().map(|m| m.interest).sum();
        assert_abs_diff_eq!(annual[0].annual_interest, first_year_interest, epsilon = 1e-9);
    }

    #[test]
    fn test_output_sorted_even_if_input_is_not() {
        let params = LoanParameters::new(LoanType::Bullet, 10_000.0, 1.0, 2);
        let mut monthly = schedule_for(&params, None);
        monthly.reverse();

        let annual = aggregate_annual(&monthly);
        assert_eq!(annual[0].year, 1);
        assert_eq!(annual[1].year, 2);
    }

    #[test]
    fn test_summarize() {
        let params = LoanParameters::new(LoanType::Bullet, 500_000.0, 3.0, 30);
        let monthly = schedule_for(&params, None);
        let stats = summarize(&monthly);

        assert_eq!(stats.total_principal_paid, 500_000.0);
        assert_abs_diff_eq!(stats.total_interest_paid, 1_250.0 * 360.0, epsilon = 1e-6);
        assert_abs_diff_eq!(stats.total_loan_costs, stats.total_interest_paid + stats.total_insurance_paid, epsilon = 1e-9);
        assert_eq!(stats.highest_monthly_payment, monthly[359].total_monthly_payment);
    }

    #[test]
    fn test_summarize_empty() {
        assert_eq!(summarize(&[]), LoanStatistics::default());
        assert!(aggregate_annual(&[]).is_empty());
    }
}
