//! Loan Engine CLI
//!
//! Command-line interface for loan schedules, loan comparisons and growth sensitivity

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use loan_engine::api::{legacy, CompareLoansRequest};
use loan_engine::investment::InvestmentRecord;
use loan_engine::loan::load_schedule;
use loan_engine::schedule::{AnnualPremiumTable, PremiumMode, PremiumOverride};
use loan_engine::{EngineConfig, LoanParameters, LoanType, MonthlyRecord, ScenarioRunner};
use serde::Serialize;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Loan amortization and comparative investment simulation
#[derive(Parser)]
#[command(name = "loan_engine", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Annual insurance rate on the original principal (overrides LOAN_INSURANCE_RATE)
    #[arg(long, global = true)]
    insurance_rate: Option<f64>,

    /// Output format for results
    #[arg(long, default_value = "table", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the schedule of a single loan
    Calculate(CalculateArgs),
    /// Compare two loans from a compare-loans JSON request
    Compare(CompareArgs),
    /// Run a JSON array of compare-loans requests in parallel
    Batch(BatchArgs),
    /// End-of-term net worth over a range of growth rates
    Sensitivity(SensitivityArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Legacy,
}

#[derive(Args)]
struct CalculateArgs {
    #[arg(long, default_value = "annuity")]
    loan_type: LoanType,
    #[arg(long)]
    principal: f64,
    /// Annual interest rate in percent
    #[arg(long)]
    rate: f64,
    #[arg(long)]
    term_years: i32,
    #[arg(long)]
    start_year: Option<i32>,
    #[arg(long)]
    delay_months: Option<u32>,
    /// Insurance coverage as a fraction
    #[arg(long)]
    coverage: Option<f64>,
    /// Repayment schedule CSV (month,amount) for modular loans
    #[arg(long)]
    schedule: Option<PathBuf>,
    /// Annual premium table CSV (year,premium) replacing the flat premium
    #[arg(long)]
    premium_table: Option<PathBuf>,
    /// Write the full monthly schedule to this CSV file
    #[arg(long)]
    csv: Option<PathBuf>,
}

#[derive(Args)]
struct CompareArgs {
    /// compare-loans request JSON
    input: PathBuf,
    /// Write the investment simulation to this CSV file
    #[arg(long)]
    csv: Option<PathBuf>,
}

#[derive(Args)]
struct BatchArgs {
    /// JSON array of compare-loans requests
    input: PathBuf,
}

#[derive(Args)]
struct SensitivityArgs {
    /// compare-loans request JSON
    input: PathBuf,
    /// Growth rates in percent
    #[arg(long, value_delimiter = ',', default_values_t = vec![0.0, 2.0, 4.0, 6.0, 8.0, 10.0])]
    rates: Vec<f64>,
}

/// Flat CSV row of an investment month
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InvestmentCsvRow {
    month: u32,
    year: i32,
    total_monthly_payment: f64,
    remaining_principal: f64,
    monthly_contribution: f64,
    cumulative_investment_contribution: f64,
    investment_balance: f64,
    net_worth: f64,
}

impl From<&InvestmentRecord> for InvestmentCsvRow {
    fn from(r: &InvestmentRecord) -> Self {
        Self {
            month: r.loan.month,
            year: r.loan.year,
            total_monthly_payment: r.loan.total_monthly_payment,
            remaining_principal: r.loan.remaining_principal,
            monthly_contribution: r.monthly_contribution,
            cumulative_investment_contribution: r.cumulative_investment_contribution,
            investment_balance: r.investment_balance,
            net_worth: r.net_worth,
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = EngineConfig::from_env();
    if let Some(rate) = cli.insurance_rate {
        config.insurance_annual_rate = rate;
    }
    let runner = ScenarioRunner::with_config(config);

    match cli.command {
        Commands::Calculate(args) => run_calculate(&runner, args, cli.output),
        Commands::Compare(args) => run_compare(&runner, args, cli.output),
        Commands::Batch(args) => run_batch(&runner, args),
        Commands::Sensitivity(args) => run_sensitivity(&runner, args, cli.output),
    }
}

fn run_calculate(runner: &ScenarioRunner, args: CalculateArgs, output: OutputFormat) -> Result<()> {
    let mut params = LoanParameters::new(args.loan_type, args.principal, args.rate, args.term_years);
    params.start_year = args.start_year;
    params.delay_months = args.delay_months;
    params.insurance_coverage_pct = args.coverage;

    let schedule = args
        .schedule
        .as_deref()
        .map(load_schedule)
        .transpose()
        .context("Failed to load repayment schedule")?;
    let table = args
        .premium_table
        .as_deref()
        .map(AnnualPremiumTable::from_csv_path)
        .transpose()
        .context("Failed to load premium table")?
        .map(|t| t.with_coverage(params.coverage()));

    let premiums = table.as_ref().map(|t| PremiumOverride::new(t, PremiumMode::Replace));
    let result = runner
        .engine()
        .calculate_loan_with_premiums(&params, schedule.as_ref(), premiums)
        .context("Loan calculation failed")?;

    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Legacy => println!("{}", serde_json::to_string_pretty(&legacy::loan_result(&result))?),
        OutputFormat::Table => {
            println!("Loan Engine v{}", env!("CARGO_PKG_VERSION"));
            println!("======================\n");
            println!("Loan: {} {:.2} at {}% over {} years", params.loan_type.as_str(), params.principal, params.interest_rate, params.term_years);
            println!();
            print_months(&result.monthly_data);

            let stats = &result.statistics;
            println!("\nSummary:");
            println!("  Total Principal Paid: {:.2}", stats.total_principal_paid);
            println!("  Total Interest Paid: {:.2}", stats.total_interest_paid);
            println!("  Total Insurance Paid: {:.2}", stats.total_insurance_paid);
            println!("  Total Loan Costs: {:.2}", stats.total_loan_costs);
            println!("  Highest Monthly Payment: {:.2}", stats.highest_monthly_payment);
        }
    }

    if let Some(path) = args.csv {
        write_csv(&path, &result.monthly_data)?;
        println!("\nFull schedule written to: {}", path.display());
    }
    Ok(())
}

fn run_compare(runner: &ScenarioRunner, args: CompareArgs, output: OutputFormat) -> Result<()> {
    let request: CompareLoansRequest = read_json(&args.input)?;
    let result = runner.run(&request).context("Comparison failed")?;

    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Legacy => println!("{}", serde_json::to_string_pretty(&legacy::comparison(&result))?),
        OutputFormat::Table => {
            println!("Reference loan ({}):", request.reference_loan.loan_type.as_str());
            print_months(&result.reference_loan.monthly_data);
            println!("\nAlternative loan ({}):", request.alternative_loan.loan_type.as_str());
            print_months(&result.alternative_loan.monthly_data);

            println!("\n{:>6} {:>14} {:>14} {:>14} {:>14}", "Year", "dInterest", "dPrincipal", "dPayment", "dRemaining");
            println!("{}", "-".repeat(66));
            for diff in &result.annual_comparison {
                println!(
                    "{:>6} {:>14.2} {:>14.2} {:>14.2} {:>14.2}",
                    diff.year,
                    diff.interest_difference,
                    diff.principal_difference,
                    diff.total_payment_difference,
                    diff.remaining_principal_difference,
                );
            }

            println!("\nSummary:");
            println!("  Reference Loan Costs: {:.2}", result.reference_loan.statistics.total_loan_costs);
            println!("  Alternative Loan Costs: {:.2}", result.alternative_loan.statistics.total_loan_costs);
            if let Some(stats) = &result.comparison_stats {
                println!("  Cost Difference: {:.2}", stats.total_cost_difference);
                println!("  Net Worth End of Term: {:.2}", stats.net_worth_end_of_term);
            }
            match result.minimum_required_growth_rate {
                Some(rate) => println!("  Minimum Required Growth: {:.4}%", rate),
                None if result.investment_simulation.is_some() => println!("  Minimum Required Growth: n/a"),
                None => {}
            }
        }
    }

    if let (Some(path), Some(simulation)) = (args.csv, result.investment_simulation.as_ref()) {
        let rows: Vec<InvestmentCsvRow> = simulation.iter().map(InvestmentCsvRow::from).collect();
        write_csv(&path, &rows)?;
        println!("\nInvestment simulation written to: {}", path.display());
    }
    Ok(())
}

fn run_batch(runner: &ScenarioRunner, args: BatchArgs) -> Result<()> {
    let requests: Vec<CompareLoansRequest> = read_json(&args.input)?;
    let results = runner.compare_batch(&requests);

    let mut failures = 0;
    let summaries: Vec<serde_json::Value> = results
        .iter()
        .enumerate()
        .map(|(idx, result)| match result {
            Ok(r) => serde_json::json!({
                "index": idx,
                "comparisonStats": r.comparison_stats,
                "minimumRequiredGrowthRate": r.minimum_required_growth_rate,
                "referenceLoanCosts": r.reference_loan.statistics.total_loan_costs,
                "alternativeLoanCosts": r.alternative_loan.statistics.total_loan_costs,
            }),
            Err(e) => {
                failures += 1;
                serde_json::json!({ "index": idx, "error": e.to_string() })
            }
        })
        .collect();

    println!("{}", serde_json::to_string_pretty(&summaries)?);
    log::info!("{} of {} comparisons failed", failures, requests.len());
    Ok(())
}

fn run_sensitivity(runner: &ScenarioRunner, args: SensitivityArgs, output: OutputFormat) -> Result<()> {
    let request: CompareLoansRequest = read_json(&args.input)?;
    let points = runner
        .growth_sensitivity(&request, &args.rates)
        .context("Sensitivity run failed")?;

    if output == OutputFormat::Table {
        println!("{:>10} {:>18}", "Growth %", "Net Worth");
        println!("{}", "-".repeat(29));
        for point in &points {
            println!("{:>10.2} {:>18.2}", point.annual_growth_rate, point.net_worth_end_of_term);
        }
    } else {
        println!("{}", serde_json::to_string_pretty(&points)?);
    }
    Ok(())
}

/// Print the first 24 months of a schedule
fn print_months(months: &[MonthlyRecord]) {
    println!(
        "{:>5} {:>6} {:>12} {:>12} {:>12} {:>10} {:>12} {:>14}",
        "Month", "Year", "Payment", "Interest", "Principal", "Insurance", "Total", "Remaining"
    );
    println!("{}", "-".repeat(90));

    for row in months.iter().take(24) {
        println!(
            "{:>5} {:>6} {:>12.2} {:>12.2} {:>12.2} {:>10.2} {:>12.2} {:>14.2}",
            row.month,
            row.year,
            row.payment_excluding_insurance,
            row.interest,
            row.principal_payment,
            row.insurance_premium,
            row.total_monthly_payment,
            row.remaining_principal,
        );
    }

    if months.len() > 24 {
        println!("... ({} more months)", months.len() - 24);
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path).with_context(|| format!("Unable to open {}", path.display()))?;
    serde_json::from_reader(file).with_context(|| format!("Invalid request JSON in {}", path.display()))
}

fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("Unable to create {}", path.display()))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}
