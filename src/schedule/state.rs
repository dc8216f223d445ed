//! Running state of a loan while its schedule is generated

use crate::loan::LoanParameters;
use super::records::MonthlyRecord;

/// State of a loan at a point in time during schedule generation
#[derive(Debug, Clone)]
pub struct AmortizationState {
    /// Current month (1-indexed, 0 before the first month)
    pub month: u32,

    /// Year label of the current month
    pub year: i32,

    /// Outstanding principal at the start of the current month
    pub balance: f64,

    pub cumulative_principal: f64,
    pub cumulative_interest: f64,
    pub cumulative_insurance: f64,
    pub cumulative_total: f64,
}

impl AmortizationState {
    /// Initialize state before month 1
    pub fn from_params(params: &LoanParameters) -> Self {
        Self {
            month: 0,
            year: params.year_of_month(1),
            balance: params.principal,
            cumulative_principal: 0.0,
            cumulative_interest: 0.0,
            cumulative_insurance: 0.0,
            cumulative_total: 0.0,
        }
    }

    /// Advance to next month
    pub fn advance_month(&mut self, params: &LoanParameters) {
        self.month += 1;
        self.year = params.year_of_month(self.month);
    }

    /// Apply a finished month: reduce the balance and roll the running totals forward.
    /// The balance never goes below zero.
    pub fn apply(&mut self, row: &mut MonthlyRecord) {
        self.balance = (self.balance - row.principal_payment).max(0.0);

        self.cumulative_principal += row.principal_payment;
        self.cumulative_interest += row.interest;
        self.cumulative_insurance += row.insurance_premium;
        self.cumulative_total += row.total_monthly_payment;

        row.remaining_principal = self.balance;
        row.cumulative_principal_paid = self.cumulative_principal;
        row.cumulative_interest_paid = self.cumulative_interest;
        row.cumulative_insurance_paid = self.cumulative_insurance;
        row.cumulative_total_paid = self.cumulative_total;
    }

    pub fn is_repaid(&self) -> bool {
        self.balance <= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loan::LoanType;

    #[test]
    fn test_apply_accumulates() {
        let params = LoanParameters::new(LoanType::Bullet, 1_000.0, 12.0, 1).with_start_year(2030);
        let mut state = AmortizationState::from_params(&params);
        state.advance_month(&params);
        assert_eq!(state.month, 1);
        assert_eq!(state.year, 2030);

        let mut row = MonthlyRecord::new(1, 2030);
        row.interest = 10.0;
        row.principal_payment = 400.0;
        row.insurance_premium = 1.0;
        row.total_monthly_payment = 411.0;
        state.apply(&mut row);

        assert_eq!(state.balance, 600.0);
        assert_eq!(row.remaining_principal, 600.0);
        assert_eq!(row.cumulative_total_paid, 411.0);
        assert!(!state.is_repaid());
    }

    #[test]
    fn test_balance_clamped_at_zero() {
        let params = LoanParameters::new(LoanType::Bullet, 100.0, 0.0, 1);
        let mut state = AmortizationState::from_params(&params);
        state.advance_month(&params);

        let mut row = MonthlyRecord::new(1, 1);
        row.principal_payment = 100.0 + 1e-9;
        state.apply(&mut row);
        assert_eq!(row.remaining_principal, 0.0);
        assert!(state.is_repaid());
    }
}
