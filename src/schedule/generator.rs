//! Month-by-month amortization for annuity, bullet and modular loans

use crate::config::EngineConfig;
use crate::error::EngineResult;
use crate::loan::{LoanParameters, LoanType, ModularSchedule};
use super::insurance::PremiumOverride;
use super::records::MonthlyRecord;
use super::state::AmortizationState;

/// Fixed monthly payment that amortizes `principal` over `months` at `monthly_rate`:
/// PMT = P * r(1+r)^n / ((1+r)^n - 1), or P / n without interest
pub fn annuity_payment(principal: f64, monthly_rate: f64, months: u32) -> f64 {
    if months == 0 {
        return principal;
    }
    if monthly_rate > 0.0 {
        let growth = (1.0 + monthly_rate).powi(months as i32);
        principal * monthly_rate * growth / (growth - 1.0)
    } else {
        principal / months as f64
    }
}

/// Generates amortization schedules
pub struct ScheduleGenerator {
    config: EngineConfig,
}

impl ScheduleGenerator {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Generate the schedule with the flat insurance premium
    pub fn generate(
        &self,
        params: &LoanParameters,
        schedule: Option<&ModularSchedule>,
    ) -> EngineResult<Vec<MonthlyRecord>> {
        self.generate_with_premiums(params, schedule, None)
    }

    /// Generate the schedule, taking insurance premiums from `premiums` where it has figures
    pub fn generate_with_premiums(
        &self,
        params: &LoanParameters,
        schedule: Option<&ModularSchedule>,
        premiums: Option<PremiumOverride<'_>>,
    ) -> EngineResult<Vec<MonthlyRecord>> {
        params.validate()?;
        let total_months = params.total_months();

        match params.loan_type {
            LoanType::Modular => match schedule {
                Some(s) if !s.is_empty() => s.validate(total_months)?,
                _ => log::warn!(
                    "modular loan of {:.2} has no repayment schedule; it will not amortize",
                    params.principal
                ),
            },
            _ => {
                if schedule.is_some() {
                    log::debug!("ignoring repayment schedule for {} loan", params.loan_type.as_str());
                }
            }
        }

        let repayment_months = total_months.saturating_sub(params.delay());
        let fixed_payment = match params.loan_type {
            LoanType::Annuity => annuity_payment(params.principal, params.monthly_rate(), repayment_months),
            _ => 0.0,
        };

        let mut state = AmortizationState::from_params(params);
        let mut rows = Vec::with_capacity(total_months as usize);

        for _month in 1..=total_months {
            state.advance_month(params);
            let row = self.calculate_month(params, &mut state, fixed_payment, schedule, premiums);
            rows.push(row);
        }

        if !state.is_repaid() {
            log::warn!(
                "{} loan ends with {:.2} outstanding after {} months",
                params.loan_type.as_str(),
                state.balance,
                total_months
            );
        }

        log::debug!(
            "generated {} months for {} loan of {:.2} at {}%",
            rows.len(),
            params.loan_type.as_str(),
            params.principal,
            params.interest_rate
        );

        Ok(rows)
    }

    /// Flat monthly premium on the original principal
    pub fn flat_premium(&self, params: &LoanParameters) -> f64 {
        let coverage = if self.config.apply_insurance_coverage {
            params.coverage()
        } else {
            1.0
        };
        params.principal * self.config.insurance_annual_rate / 12.0 * coverage
    }

    /// Calculate a single month and roll the state forward
    fn calculate_month(
        &self,
        params: &LoanParameters,
        state: &mut AmortizationState,
        fixed_payment: f64,
        schedule: Option<&ModularSchedule>,
        premiums: Option<PremiumOverride<'_>>,
    ) -> MonthlyRecord {
        let month = state.month;
        let balance = state.balance;
        let mut row = MonthlyRecord::new(month, state.year);

        row.interest = balance * params.monthly_rate();

        let (principal_paid, payment) = match params.loan_type {
            LoanType::Annuity => {
                if month <= params.delay() {
                    (0.0, row.interest)
                } else {
                    let principal = (fixed_payment - row.interest).clamp(0.0, balance);
                    (principal, fixed_payment)
                }
            }
            LoanType::Bullet => {
                let principal = if month == params.total_months() { balance } else { 0.0 };
                (principal, row.interest + principal)
            }
            LoanType::Modular => {
                let scheduled = schedule.map(|s| s.amount_for(month)).unwrap_or(0.0);
                let principal = scheduled.min(balance);
                (principal, row.interest + principal)
            }
        };

        // Force an exact payoff when only rounding residue would remain
        let (principal_paid, payment) = if balance > 0.0 && (balance - principal_paid).abs() < self.config.payoff_tolerance {
            (balance, balance + row.interest)
        } else {
            (principal_paid, payment)
        };

        row.principal_payment = principal_paid;
        row.payment_excluding_insurance = payment;

        let flat = self.flat_premium(params);
        row.insurance_premium = match premiums {
            Some(injected) => injected.combine(flat, month, row.year),
            None => flat,
        };
        row.total_monthly_payment = row.payment_excluding_insurance + row.insurance_premium;

        state.apply(&mut row);
        row
    }
}

impl Default for ScheduleGenerator {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::schedule::insurance::{MonthlyPremiums, PremiumMode};
    use approx::assert_abs_diff_eq;

    fn generate(params: &LoanParameters, schedule: Option<&ModularSchedule>) -> Vec<MonthlyRecord> {
        ScheduleGenerator::default().generate(params, schedule).expect("valid loan")
    }

    #[test]
    fn test_annuity_example() {
        let params = LoanParameters::new(LoanType::Annuity, 500_000.0, 3.5, 30);
        let rows = generate(&params, None);

        assert_eq!(rows.len(), 360);
        assert_abs_diff_eq!(rows[0].interest, 500_000.0 * 0.035 / 12.0, epsilon = 1e-9);
        assert_abs_diff_eq!(rows[0].interest, 1458.33, epsilon = 0.01);
        assert_eq!(rows[359].remaining_principal, 0.0);

        let total_principal: f64 = rows.iter().map(|r| r.principal_payment).sum();
        assert_abs_diff_eq!(total_principal, 500_000.0, epsilon = 1e-6);
    }

    #[test]
    fn test_annuity_payment_is_level() {
        let params = LoanParameters::new(LoanType::Annuity, 500_000.0, 3.5, 30);
        let rows = generate(&params, None);
        let pmt = annuity_payment(500_000.0, 0.035 / 12.0, 360);

        assert_abs_diff_eq!(pmt, 2245.22, epsilon = 0.01);
        for row in &rows[..359] {
            assert_abs_diff_eq!(row.payment_excluding_insurance, pmt, epsilon = 1e-9);
        }
        assert_abs_diff_eq!(rows[359].payment_excluding_insurance, pmt, epsilon = 1e-4);
        assert!(rows[0].principal_payment < rows[359].principal_payment);
    }

    #[test]
    fn test_zero_rate_annuity() {
        let params = LoanParameters::new(LoanType::Annuity, 120_000.0, 0.0, 10);
        let rows = generate(&params, None);

        assert!(rows.iter().all(|r| r.interest == 0.0));
        assert_abs_diff_eq!(rows[0].principal_payment, 1_000.0, epsilon = 1e-9);
        assert_eq!(rows.last().unwrap().remaining_principal, 0.0);
    }

    #[test]
    fn test_bullet_example() {
        let params = LoanParameters::new(LoanType::Bullet, 500_000.0, 3.0, 30);
        let rows = generate(&params, None);

        assert_eq!(rows.len(), 360);
        assert!(rows[..359].iter().all(|r| r.principal_payment == 0.0));
        assert_eq!(rows[359].principal_payment, 500_000.0);
        assert_eq!(rows[359].principal_payment, rows[358].remaining_principal);
        assert_eq!(rows[359].remaining_principal, 0.0);
        assert_abs_diff_eq!(rows[10].payment_excluding_insurance, 1_250.0, epsilon = 1e-9);
    }

    #[test]
    fn test_modular_caps_at_balance() {
        let params = LoanParameters::new(LoanType::Modular, 100_000.0, 2.0, 5);
        let schedule = ModularSchedule::from_pairs(&[(12, 60_000.0), (24, 60_000.0), (36, 10_000.0)]);
        let rows = generate(&params, Some(&schedule));

        assert_eq!(rows[11].principal_payment, 60_000.0);
        assert_eq!(rows[23].principal_payment, 40_000.0);
        assert_eq!(rows[23].remaining_principal, 0.0);
        assert_eq!(rows[35].principal_payment, 0.0);
        for row in &rows {
            assert!(row.remaining_principal >= 0.0);
        }
        // No interest once repaid
        assert_eq!(rows[30].interest, 0.0);
    }

    #[test]
    fn test_modular_without_schedule_is_interest_only() {
        let params = LoanParameters::new(LoanType::Modular, 200_000.0, 3.0, 10);
        let rows = generate(&params, None);

        assert!(rows.iter().all(|r| r.principal_payment == 0.0));
        assert_eq!(rows.last().unwrap().remaining_principal, 200_000.0);
        assert_abs_diff_eq!(rows[0].interest, 500.0, epsilon = 1e-9);
    }

    #[test]
    fn test_modular_schedule_outside_term_rejected() {
        let params = LoanParameters::new(LoanType::Modular, 200_000.0, 3.0, 10);
        let schedule = ModularSchedule::from_pairs(&[(121, 1_000.0)]);
        let err = ScheduleGenerator::default().generate(&params, Some(&schedule)).unwrap_err();
        assert!(matches!(err, EngineError::Validation { .. }));
    }

    #[test]
    fn test_validation_happens_before_generation() {
        let params = LoanParameters::new(LoanType::Annuity, -5.0, 3.0, 10);
        assert!(ScheduleGenerator::default().generate(&params, None).is_err());

        let params = LoanParameters::new(LoanType::Annuity, 5_000.0, 3.0, 0);
        assert!(ScheduleGenerator::default().generate(&params, None).is_err());
    }

    #[test]
    fn test_delayed_annuity() {
        let params = LoanParameters::new(LoanType::Annuity, 300_000.0, 3.0, 25).with_delay_months(12);
        let rows = generate(&params, None);
        let pmt = annuity_payment(300_000.0, 0.03 / 12.0, 288);

        for row in &rows[..12] {
            assert_eq!(row.principal_payment, 0.0);
            assert_abs_diff_eq!(row.payment_excluding_insurance, 750.0, epsilon = 1e-9);
        }
        assert_abs_diff_eq!(rows[12].payment_excluding_insurance, pmt, epsilon = 1e-9);
        assert_eq!(rows.last().unwrap().remaining_principal, 0.0);
    }

    #[test]
    fn test_flat_insurance_premium() {
        let params = LoanParameters::new(LoanType::Annuity, 500_000.0, 3.5, 30).with_insurance_coverage(0.5);
        let rows = generate(&params, None);

        let expected = 500_000.0 * 0.0036 / 12.0 * 0.5;
        assert_abs_diff_eq!(rows[0].insurance_premium, expected, epsilon = 1e-9);
        assert_abs_diff_eq!(rows[359].insurance_premium, expected, epsilon = 1e-9);
        assert_abs_diff_eq!(
            rows[0].total_monthly_payment,
            rows[0].payment_excluding_insurance + expected,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_coverage_ignored_when_disabled() {
        let config = EngineConfig {
            apply_insurance_coverage: false,
            ..Default::default()
        };
        let params = LoanParameters::new(LoanType::Bullet, 100_000.0, 3.0, 1).with_insurance_coverage(0.25);
        let generator = ScheduleGenerator::new(config);
        assert_abs_diff_eq!(generator.flat_premium(&params), 30.0, epsilon = 1e-9);
    }

    #[test]
    fn test_injected_premiums() {
        let params = LoanParameters::new(LoanType::Bullet, 100_000.0, 3.0, 1);
        let premiums = MonthlyPremiums::new(vec![1.0, 2.0], PremiumMode::Replace);
        let rows = ScheduleGenerator::default()
            .generate_with_premiums(&params, None, Some(premiums.as_override()))
            .unwrap();

        assert_eq!(rows[0].insurance_premium, 1.0);
        assert_eq!(rows[1].insurance_premium, 2.0);
        // Falls back to the flat premium past the supplied figures
        assert_abs_diff_eq!(rows[2].insurance_premium, 30.0, epsilon = 1e-9);
        assert_abs_diff_eq!(rows[11].cumulative_insurance_paid, 3.0 + 10.0 * 30.0, epsilon = 1e-9);
    }

    #[test]
    fn test_years_follow_start_year() {
        let params = LoanParameters::new(LoanType::Annuity, 100_000.0, 3.0, 2).with_start_year(2025);
        let rows = generate(&params, None);
        assert_eq!(rows[0].year, 2025);
        assert_eq!(rows[11].year, 2025);
        assert_eq!(rows[12].year, 2026);
    }
}
