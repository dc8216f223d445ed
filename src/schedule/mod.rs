//! Amortization schedule generation for a single loan

mod state;
mod generator;
mod records;
pub mod insurance;

pub use state::AmortizationState;
pub use generator::{ScheduleGenerator, annuity_payment};
pub use records::{MonthlyRecord, AnnualRecord, LoanStatistics, LoanCalculationResult};
pub use insurance::{
    InsurancePremiums, PremiumMode, PremiumOverride, MonthlyPremiums, AnnualPremiumTable, InsuranceResolver,
    NoInsuranceResolver,
};
