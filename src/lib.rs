//! Loan Engine - amortization schedules and comparative investment simulation
//!
//! This library provides:
//! - Monthly schedules for annuity, bullet and modular loans
//! - Annual rollups and loan statistics
//! - Investment of the payment difference between two loans
//! - The minimum growth rate at which the cheaper-monthly loan breaks even
//! - Parallel batch comparisons and growth-rate sensitivity sweeps

pub mod error;
pub mod config;
pub mod loan;
pub mod schedule;
pub mod aggregate;
pub mod investment;
pub mod comparison;
pub mod api;
pub mod runner;

// Re-export commonly used types
pub use error::{EngineError, EngineResult, LoanSide, NumericError};
pub use config::{EngineConfig, SolverConfig};
pub use loan::{LoanParameters, LoanType, ModularSchedule, ScheduleItem};
pub use schedule::{AnnualRecord, LoanCalculationResult, LoanStatistics, MonthlyRecord, ScheduleGenerator};
pub use investment::{BreakEvenSolver, InvestmentParameters, InvestmentRecord, InvestmentStatistics};
pub use comparison::{calculate_loan, compare_loans, ComparisonResult, ComparisonStats, LoanEngine};
pub use runner::ScenarioRunner;
