//! Investment of payment differences and the break-even growth rate

mod simulator;
mod solver;
mod statistics;

pub use simulator::{
    InvestmentParameters, InvestmentRecord, simulate, simulate_from, final_net_worth, monthly_growth_rate,
};
pub use solver::{BreakEvenSolver, solve_minimum_growth_rate};
pub use statistics::InvestmentStatistics;
