//! Loan input structures matching the calculate-loan / compare-loans wire format

use crate::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Tolerance for the `principal + ownContribution == purchasePrice` check
const PURCHASE_PRICE_TOLERANCE: f64 = 0.01;
const MAX_TERM_YEARS: i32 = 100;

/// Repayment structure of a loan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum LoanType {
    /// Fixed total payment every month
    Annuity,
    /// Interest only, principal repaid in the final month
    Bullet,
    /// Principal repaid according to a caller-supplied schedule
    Modular,
}

impl LoanType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanType::Annuity => "annuity",
            LoanType::Bullet => "bullet",
            LoanType::Modular => "modular",
        }
    }
}

impl FromStr for LoanType {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "annuity" => Ok(LoanType::Annuity),
            "bullet" => Ok(LoanType::Bullet),
            "modular" => Ok(LoanType::Modular),
            other => Err(EngineError::UnsupportedLoanType(other.to_string())),
        }
    }
}

impl TryFrom<String> for LoanType {
    type Error = EngineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Parameters of a single loan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanParameters {
    pub loan_type: LoanType,

    /// Borrowed amount
    pub principal: f64,

    /// Annual interest rate in percent (3.5 = 3.5%)
    pub interest_rate: f64,

    /// Term in whole years
    pub term_years: i32,

    /// Own funds put into the purchase
    #[serde(default)]
    pub own_contribution: f64,

    #[serde(default)]
    pub purchase_price: Option<f64>,

    /// Interest-only months before an annuity starts amortizing
    #[serde(default)]
    pub delay_months: Option<u32>,

    /// Calendar year of month 1; term years are used when absent
    #[serde(default)]
    pub start_year: Option<i32>,

    /// Fraction of the balance covered by debt insurance
    #[serde(default)]
    pub insurance_coverage_pct: Option<f64>,
}

impl LoanParameters {
    pub fn new(loan_type: LoanType, principal: f64, interest_rate: f64, term_years: i32) -> Self {
        Self {
            loan_type,
            principal,
            interest_rate,
            term_years,
            own_contribution: 0.0,
            purchase_price: None,
            delay_months: None,
            start_year: None,
            insurance_coverage_pct: None,
        }
    }

    /// Split a purchase price into principal and own contribution.
    /// The own contribution percentage is clamped to [0, 100].
    pub fn from_purchase_price(
        loan_type: LoanType,
        purchase_price: f64,
        own_contribution_pct: f64,
        interest_rate: f64,
        term_years: i32,
    ) -> Self {
        let pct = own_contribution_pct.clamp(0.0, 100.0);
        let own_contribution = purchase_price * pct / 100.0;

        Self {
            own_contribution,
            purchase_price: Some(purchase_price),
            ..Self::new(loan_type, purchase_price - own_contribution, interest_rate, term_years)
        }
    }

    pub fn with_own_contribution(mut self, own_contribution: f64) -> Self {
        self.own_contribution = own_contribution;
        self
    }

    pub fn with_start_year(mut self, start_year: i32) -> Self {
        self.start_year = Some(start_year);
        self
    }

    pub fn with_delay_months(mut self, delay_months: u32) -> Self {
        self.delay_months = Some(delay_months);
        self
    }

    pub fn with_insurance_coverage(mut self, coverage_pct: f64) -> Self {
        self.insurance_coverage_pct = Some(coverage_pct);
        self
    }

    /// Monthly interest rate as a decimal
    pub fn monthly_rate(&self) -> f64 {
        self.interest_rate / 100.0 / 12.0
    }

    /// Number of months in the term (0 for an invalid term)
    pub fn total_months(&self) -> u32 {
        u32::try_from(self.term_years)
            .ok()
            .and_then(|years| years.checked_mul(12))
            .unwrap_or(0)
    }

    pub fn delay(&self) -> u32 {
        self.delay_months.unwrap_or(0)
    }

    pub fn coverage(&self) -> f64 {
        self.insurance_coverage_pct.unwrap_or(1.0)
    }

    /// Year label for a 1-based month: calendar year when a start year is known
    pub fn year_of_month(&self, month: u32) -> i32 {
        let elapsed_years = ((month.max(1) - 1) / 12) as i32;
        match self.start_year {
            Some(start) => start + elapsed_years,
            None => elapsed_years + 1,
        }
    }

    /// Check all parameters before any schedule is generated
    pub fn validate(&self) -> EngineResult<()> {
        if !self.principal.is_finite() || self.principal <= 0.0 {
            return Err(EngineError::invalid("principal", format!("must be positive, got {}", self.principal)));
        }
        if !self.interest_rate.is_finite() || self.interest_rate < 0.0 {
            return Err(EngineError::invalid(
                "interestRate",
                format!("must be zero or positive, got {}", self.interest_rate),
            ));
        }
        if self.term_years <= 0 {
            return Err(EngineError::invalid("termYears", format!("must be positive, got {}", self.term_years)));
        }
        if self.term_years > MAX_TERM_YEARS {
            return Err(EngineError::invalid(
                "termYears",
                format!("must be at most {}, got {}", MAX_TERM_YEARS, self.term_years),
            ));
        }
        if !self.own_contribution.is_finite() || self.own_contribution < 0.0 {
            return Err(EngineError::invalid(
                "ownContribution",
                format!("must be zero or positive, got {}", self.own_contribution),
            ));
        }
        if let Some(price) = self.purchase_price {
            let implied = self.principal + self.own_contribution;
            if !price.is_finite() || (implied - price).abs() > PURCHASE_PRICE_TOLERANCE {
                return Err(EngineError::invalid(
                    "purchasePrice",
                    format!(
                        "principal + ownContribution = {:.2} does not match purchase price {:.2}",
                        implied, price
                    ),
                ));
            }
        }
        if self.loan_type == LoanType::Annuity && self.delay() >= self.total_months() {
            return Err(EngineError::invalid(
                "delayMonths",
                format!("delay of {} months leaves no repayment months in a {}-month term", self.delay(), self.total_months()),
            ));
        }
        let coverage = self.coverage();
        if !coverage.is_finite() || coverage < 0.0 {
            return Err(EngineError::invalid(
                "insuranceCoveragePct",
                format!("must be zero or positive, got {}", coverage),
            ));
        }
        Ok(())
    }
}

/// One scheduled principal repayment
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScheduleItem {
    /// 1-based month within the term
    pub month: u32,
    pub amount: f64,
}

#[derive(Deserialize)]
struct ScheduleRepr {
    #[serde(default)]
    schedule: Vec<ScheduleItem>,
}

/// Principal repayment plan for modular loans, kept sorted by month
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "ScheduleRepr")]
pub struct ModularSchedule {
    schedule: Vec<ScheduleItem>,
}

impl From<ScheduleRepr> for ModularSchedule {
    fn from(repr: ScheduleRepr) -> Self {
        Self::new(repr.schedule)
    }
}

impl ModularSchedule {
    pub fn new(mut items: Vec<ScheduleItem>) -> Self {
        items.sort_by_key(|item| item.month);
        Self { schedule: items }
    }

    pub fn from_pairs(pairs: &[(u32, f64)]) -> Self {
        Self::new(
            pairs
                .iter()
                .map(|&(month, amount)| ScheduleItem { month, amount })
                .collect(),
        )
    }

    pub fn items(&self) -> &[ScheduleItem] {
        &self.schedule
    }

    pub fn is_empty(&self) -> bool {
        self.schedule.is_empty()
    }

    pub fn total_amount(&self) -> f64 {
        self.schedule.iter().map(|item| item.amount).sum()
    }

    /// Scheduled repayment for a month (0 when the month is not listed)
    pub fn amount_for(&self, month: u32) -> f64 {
        self.schedule
            .binary_search_by_key(&month, |item| item.month)
            .map(|idx| self.schedule[idx].amount)
            .unwrap_or(0.0)
    }

    /// Months must lie within the term, amounts must be non-negative, months may not repeat
    pub fn validate(&self, total_months: u32) -> EngineResult<()> {
        for (idx, item) in self.schedule.iter().enumerate() {
            if item.month == 0 || item.month > total_months {
                return Err(EngineError::invalid(
                    "modularSchedule",
                    format!("month {} outside term of {} months", item.month, total_months),
                ));
            }
            if !item.amount.is_finite() || item.amount < 0.0 {
                return Err(EngineError::invalid(
                    "modularSchedule",
                    format!("amount {} for month {} must be zero or positive", item.amount, item.month),
                ));
            }
            if idx > 0 && self.schedule[idx - 1].month == item.month {
                return Err(EngineError::invalid(
                    "modularSchedule",
                    format!("month {} is listed more than once", item.month),
                ));
            }
        }
        Ok(())
    }
}
