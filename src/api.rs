//! Request types for the calculate-loan and compare-loans endpoints

use crate::comparison::{ComparisonInput, ComparisonResult, LoanEngine};
use crate::error::{EngineResult, LoanSide};
use crate::investment::InvestmentParameters;
use crate::loan::{LoanParameters, ModularSchedule};
use crate::schedule::{InsuranceResolver, LoanCalculationResult, MonthlyPremiums};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculateLoanRequest {
    pub params: LoanParameters,
    #[serde(default)]
    pub modular_schedule: Option<ModularSchedule>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareLoansRequest {
    pub reference_loan: LoanParameters,
    pub alternative_loan: LoanParameters,

    /// Falls back to the loan's own `ownContribution` when absent
    #[serde(default)]
    pub reference_own_contribution: Option<f64>,
    #[serde(default)]
    pub alternative_own_contribution: Option<f64>,

    #[serde(default)]
    pub investment_params: Option<InvestmentParameters>,

    /// Repayment schedule of the alternative loan
    #[serde(default)]
    pub modular_schedule: Option<ModularSchedule>,

    #[serde(default)]
    pub ref_insurance_simulation_ids: Option<Vec<String>>,
    #[serde(default)]
    pub alt_insurance_simulation_ids: Option<Vec<String>>,

    /// Premiums supplied directly; these win over simulation ids
    #[serde(default)]
    pub ref_insurance_premiums: Option<MonthlyPremiums>,
    #[serde(default)]
    pub alt_insurance_premiums: Option<MonthlyPremiums>,
}

pub fn handle_calculate(request: &CalculateLoanRequest, engine: &LoanEngine) -> EngineResult<LoanCalculationResult> {
    engine.calculate_loan(&request.params, request.modular_schedule.as_ref())
}

pub fn handle_compare(
    request: &CompareLoansRequest,
    engine: &LoanEngine,
    resolver: &dyn InsuranceResolver,
) -> EngineResult<ComparisonResult> {
    let reference_premiums = premiums_for(
        request.ref_insurance_premiums.as_ref(),
        request.ref_insurance_simulation_ids.as_deref(),
        &request.reference_loan,
        resolver,
    )
    .map_err(|e| e.for_side(LoanSide::Reference))?;
    let alternative_premiums = premiums_for(
        request.alt_insurance_premiums.as_ref(),
        request.alt_insurance_simulation_ids.as_deref(),
        &request.alternative_loan,
        resolver,
    )
    .map_err(|e| e.for_side(LoanSide::Alternative))?;

    let mut input = ComparisonInput::new(&request.reference_loan, &request.alternative_loan)
        .with_own_contributions(
            request.reference_own_contribution.unwrap_or(request.reference_loan.own_contribution),
            request.alternative_own_contribution.unwrap_or(request.alternative_loan.own_contribution),
        )
        .with_premiums(
            reference_premiums.as_ref().map(MonthlyPremiums::as_override),
            alternative_premiums.as_ref().map(MonthlyPremiums::as_override),
        );
    if let Some(investment) = &request.investment_params {
        input = input.with_investment(investment);
    }
    if let Some(schedule) = &request.modular_schedule {
        input = input.with_schedule(schedule);
    }

    engine.compare(&input)
}

/// Direct premiums first, then whatever the resolver finds for the ids
fn premiums_for(
    direct: Option<&MonthlyPremiums>,
    simulation_ids: Option<&[String]>,
    loan: &LoanParameters,
    resolver: &dyn InsuranceResolver,
) -> EngineResult<Option<MonthlyPremiums>> {
    let premiums = match (direct, simulation_ids) {
        (Some(premiums), _) => Some(premiums.clone()),
        (None, Some(ids)) if !ids.is_empty() => resolver.resolve(ids, loan.total_months()),
        _ => None,
    };
    if let Some(p) = &premiums {
        p.validate()?;
    }
    Ok(premiums)
}

/// Dutch-keyed output for consumers of the older report format
pub mod legacy {
    use crate::comparison::ComparisonResult;
    use crate::schedule::{AnnualRecord, LoanCalculationResult, LoanStatistics, MonthlyRecord};
    use serde_json::{json, Map, Value};

    pub fn monthly(record: &MonthlyRecord) -> Value {
        let mut row = Map::new();
        row.insert("Maand".into(), json!(record.month));
        row.insert("Jaar".into(), json!(record.year));
        row.insert("Betaling Lening (Excl. SSV)".into(), json!(record.payment_excluding_insurance));
        row.insert("Rente".into(), json!(record.interest));
        row.insert("Kapitaal Aflossing".into(), json!(record.principal_payment));
        row.insert("Schuldsaldo Premie (Maand)".into(), json!(record.insurance_premium));
        row.insert("Totale Maandelijkse Uitgave".into(), json!(record.total_monthly_payment));
        row.insert("Resterend Kapitaal".into(), json!(record.remaining_principal));
        row.insert("Cumulatief Kapitaal Betaald".into(), json!(record.cumulative_principal_paid));
        row.insert("Cumulatief Rente Betaald".into(), json!(record.cumulative_interest_paid));
        row.insert("Cumulatief SSV Betaald".into(), json!(record.cumulative_insurance_paid));
        Value::Object(row)
    }

    pub fn annual(record: &AnnualRecord) -> Value {
        json!({
            "Jaar": record.year,
            "Jaarlijkse_Rente": record.annual_interest,
            "Jaarlijks_Kapitaal": record.annual_principal,
            "Jaarlijkse_SSV": record.annual_insurance,
            "Jaarlijkse_Totale_Uitgave": record.annual_total_payment,
            "Resterend_Kapitaal_Einde_Jaar": record.remaining_principal_year_end,
            "Cumulatief_Rente_Einde_Jaar": record.cumulative_interest_year_end,
            "Cumulatief_SSV_Einde_Jaar": record.cumulative_insurance_year_end,
            "Cumulatief_Kapitaal_Einde_Jaar": record.cumulative_principal_year_end,
        })
    }

    pub fn statistics(stats: &LoanStatistics) -> Value {
        json!({
            "Totaal Kapitaal Betaald": stats.total_principal_paid,
            "Totale Rente Betaald": stats.total_interest_paid,
            "Totale SSV Premie Betaald": stats.total_insurance_paid,
            "Totale Kosten Lening (Rente + SSV)": stats.total_loan_costs,
            "Hoogste Maandelijkse Uitgave Lening": stats.highest_monthly_payment,
        })
    }

    pub fn loan_result(result: &LoanCalculationResult) -> Value {
        json!({
            "monthlyData": result.monthly_data.iter().map(monthly).collect::<Vec<_>>(),
            "annualData": result.annual_data.iter().map(annual).collect::<Vec<_>>(),
            "statistics": statistics(&result.statistics),
        })
    }

    /// Both loans in legacy form; investment figures stay camelCase
    pub fn comparison(result: &ComparisonResult) -> Value {
        json!({
            "referenceLoan": loan_result(&result.reference_loan),
            "alternativeLoan": loan_result(&result.alternative_loan),
            "minimumRequiredGrowthRate": result.minimum_required_growth_rate,
            "comparisonStats": result.comparison_stats,
            "investmentStatistics": result.investment_statistics,
        })
    }
}
