//! Loan parameters, repayment schedules and schedule loading

mod params;
pub mod loader;

pub use params::{LoanParameters, LoanType, ModularSchedule, ScheduleItem};
pub use loader::{load_schedule, load_schedule_from_reader};
