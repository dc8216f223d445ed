//! Output records of a loan calculation

use serde::{Deserialize, Serialize};

/// Snapshot of one month of a loan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyRecord {
    // Timing
    pub month: u32,
    pub year: i32,

    // Flows for the month
    pub payment_excluding_insurance: f64,
    pub interest: f64,
    pub principal_payment: f64,
    pub insurance_premium: f64,
    pub total_monthly_payment: f64,

    // Balances after the payment
    pub remaining_principal: f64,
    pub cumulative_principal_paid: f64,
    pub cumulative_interest_paid: f64,
    pub cumulative_insurance_paid: f64,
    pub cumulative_total_paid: f64,
}

impl MonthlyRecord {
    pub fn new(month: u32, year: i32) -> Self {
        Self {
            month,
            year,
            payment_excluding_insurance: 0.0,
            interest: 0.0,
            principal_payment: 0.0,
            insurance_premium: 0.0,
            total_monthly_payment: 0.0,
            remaining_principal: 0.0,
            cumulative_principal_paid: 0.0,
            cumulative_interest_paid: 0.0,
            cumulative_insurance_paid: 0.0,
            cumulative_total_paid: 0.0,
        }
    }
}

/// Sum of one year's months plus the year-end balances
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnualRecord {
    pub year: i32,
    pub annual_interest: f64,
    pub annual_principal: f64,
    pub annual_insurance: f64,
    pub annual_total_payment: f64,
    pub remaining_principal_year_end: f64,
    pub cumulative_interest_year_end: f64,
    pub cumulative_insurance_year_end: f64,
    pub cumulative_principal_year_end: f64,
}

/// Terminal totals of a loan
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanStatistics {
    pub total_principal_paid: f64,
    pub total_interest_paid: f64,
    pub total_insurance_paid: f64,
    /// Interest plus insurance
    pub total_loan_costs: f64,
    pub highest_monthly_payment: f64,
}

/// Result of `calculate_loan`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanCalculationResult {
    pub monthly_data: Vec<MonthlyRecord>,
    pub annual_data: Vec<AnnualRecord>,
    pub statistics: LoanStatistics,
}

impl LoanCalculationResult {
    /// Build annual rollups and statistics from a generated schedule
    pub fn from_monthly(monthly_data: Vec<MonthlyRecord>) -> Self {
        let annual_data = crate::aggregate::aggregate_annual(&monthly_data);
        let statistics = crate::aggregate::summarize(&monthly_data);
        Self {
            monthly_data,
            annual_data,
            statistics,
        }
    }
}
