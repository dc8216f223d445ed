//! Debt-balance insurance premiums
//!
//! The generator charges a flat premium on the original principal. External premium
//! figures (resolved insurance simulations, tabulated premiums) are injected through
//! [`InsurancePremiums`] and either replace or add to the flat premium.

use crate::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Source of per-month insurance premiums
pub trait InsurancePremiums: Send + Sync {
    /// Premium for a 1-based month with its year label, `None` when the source has no figure
    fn monthly_premium(&self, month: u32, year: i32) -> Option<f64>;
}

/// How injected premiums combine with the flat premium
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PremiumMode {
    #[default]
    Replace,
    Add,
}

/// A premium source together with its combination mode
#[derive(Clone, Copy)]
pub struct PremiumOverride<'a> {
    pub source: &'a dyn InsurancePremiums,
    pub mode: PremiumMode,
}

impl<'a> PremiumOverride<'a> {
    pub fn new(source: &'a dyn InsurancePremiums, mode: PremiumMode) -> Self {
        Self { source, mode }
    }

    /// Combine the flat premium with the injected figure for this month
    pub fn combine(&self, flat: f64, month: u32, year: i32) -> f64 {
        match self.source.monthly_premium(month, year) {
            Some(premium) => match self.mode {
                PremiumMode::Replace => premium,
                PremiumMode::Add => flat + premium,
            },
            None => flat,
        }
    }
}

/// Premiums computed elsewhere, month 1 first
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyPremiums {
    pub premiums: Vec<f64>,
    #[serde(default)]
    pub mode: PremiumMode,
}

impl MonthlyPremiums {
    pub fn new(premiums: Vec<f64>, mode: PremiumMode) -> Self {
        Self { premiums, mode }
    }

    pub fn as_override(&self) -> PremiumOverride<'_> {
        PremiumOverride::new(self, self.mode)
    }

    pub fn validate(&self) -> EngineResult<()> {
        match self.premiums.iter().position(|p| !p.is_finite() || *p < 0.0) {
            Some(idx) => Err(EngineError::invalid(
                "insurancePremiums",
                format!("premium for month {} must be zero or positive", idx + 1),
            )),
            None => Ok(()),
        }
    }
}

impl InsurancePremiums for MonthlyPremiums {
    fn monthly_premium(&self, month: u32, _year: i32) -> Option<f64> {
        let idx = month.checked_sub(1)? as usize;
        self.premiums.get(idx).copied()
    }
}

/// Annual premiums at 100% coverage keyed by year label.
/// Years before the table use the first entry, years after it the last one.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnualPremiumTable {
    start_year: i32,
    annual_premiums: Vec<f64>,
    coverage: f64,
}

/// Raw CSV row of a premium table
#[derive(Debug, Deserialize)]
struct CsvRow {
    year: i32,
    premium: f64,
}

impl AnnualPremiumTable {
    /// Build from (year, annual premium) pairs; gaps repeat the previous year's premium
    pub fn from_pairs(pairs: &[(i32, f64)]) -> EngineResult<Self> {
        let by_year: BTreeMap<i32, f64> = pairs.iter().copied().collect();
        let (&start_year, _) = by_year
            .iter()
            .next()
            .ok_or_else(|| EngineError::invalid("premiumTable", "table has no rows"))?;

        let mut annual_premiums = Vec::new();
        let mut last = 0.0;
        let end_year = by_year.keys().next_back().copied().unwrap_or(start_year);
        for year in start_year..=end_year {
            if let Some(&premium) = by_year.get(&year) {
                if !premium.is_finite() || premium < 0.0 {
                    return Err(EngineError::invalid(
                        "premiumTable",
                        format!("premium for {} must be zero or positive", year),
                    ));
                }
                last = premium;
            }
            annual_premiums.push(last);
        }

        Ok(Self {
            start_year,
            annual_premiums,
            coverage: 1.0,
        })
    }

    /// Premiums starting at `base` and growing by `annual_increase` each year
    pub fn with_growth(start_year: i32, base: f64, annual_increase: f64, years: u32) -> Self {
        let annual_premiums = (0..years.max(1))
            .map(|i| base * (1.0 + annual_increase).powi(i as i32))
            .collect();
        Self {
            start_year,
            annual_premiums,
            coverage: 1.0,
        }
    }

    /// Load `year,premium` rows from a CSV file
    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let mut reader = csv::Reader::from_path(path)?;
        let mut pairs = Vec::new();
        for result in reader.deserialize() {
            let row: CsvRow = result?;
            pairs.push((row.year, row.premium));
        }
        Self::from_pairs(&pairs)
    }

    /// Scale every premium by a coverage fraction
    pub fn with_coverage(mut self, coverage: f64) -> Self {
        self.coverage = coverage;
        self
    }

    pub fn annual_premium(&self, year: i32) -> f64 {
        let offset = (year - self.start_year).max(0) as usize;
        let idx = offset.min(self.annual_premiums.len().saturating_sub(1));
        self.annual_premiums.get(idx).copied().unwrap_or(0.0) * self.coverage
    }
}

impl InsurancePremiums for AnnualPremiumTable {
    fn monthly_premium(&self, _month: u32, year: i32) -> Option<f64> {
        Some(self.annual_premium(year) / 12.0)
    }
}

/// Resolves insurance simulation IDs from a request into per-month premiums
pub trait InsuranceResolver: Send + Sync {
    fn resolve(&self, simulation_ids: &[String], total_months: u32) -> Option<MonthlyPremiums>;
}

/// Resolver without a backing store: every lookup misses
#[derive(Debug, Clone, Copy, Default)]
pub struct NoInsuranceResolver;

impl InsuranceResolver for NoInsuranceResolver {
    fn resolve(&self, simulation_ids: &[String], _total_months: u32) -> Option<MonthlyPremiums> {
        if !simulation_ids.is_empty() {
            log::warn!(
                "no insurance resolver configured; ignoring simulation ids {:?}, flat premium applies",
                simulation_ids
            );
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monthly_premiums_lookup() {
        let premiums = MonthlyPremiums::new(vec![10.0, 20.0], PremiumMode::Replace);
        assert_eq!(premiums.monthly_premium(1, 1), Some(10.0));
        assert_eq!(premiums.monthly_premium(2, 1), Some(20.0));
        assert_eq!(premiums.monthly_premium(3, 1), None);
        assert_eq!(premiums.monthly_premium(0, 1), None);
    }

    #[test]
    fn test_override_modes() {
        let premiums = MonthlyPremiums::new(vec![5.0], PremiumMode::Add);
        let add = premiums.as_override();
        assert_eq!(add.combine(100.0, 1, 1), 105.0);
        assert_eq!(add.combine(100.0, 2, 1), 100.0);

        let replace = PremiumOverride::new(&premiums, PremiumMode::Replace);
        assert_eq!(replace.combine(100.0, 1, 1), 5.0);
    }

    #[test]
    fn test_negative_premium_rejected() {
        let premiums = MonthlyPremiums::new(vec![1.0, -2.0], PremiumMode::Replace);
        assert!(premiums.validate().is_err());
    }

    #[test]
    fn test_table_fills_gaps_and_clamps() {
        let table = AnnualPremiumTable::from_pairs(&[(2025, 539.58), (2027, 600.41), (2026, 563.91), (2030, 656.09)])
            .unwrap();
        assert_eq!(table.annual_premium(2024), 539.58);
        assert_eq!(table.annual_premium(2026), 563.91);
        assert_eq!(table.annual_premium(2028), 600.41);
        assert_eq!(table.annual_premium(2030), 656.09);
        assert_eq!(table.annual_premium(2049), 656.09);
        assert_eq!(table.monthly_premium(1, 2025), Some(539.58 / 12.0));
    }

    #[test]
    fn test_table_coverage_and_growth() {
        let table = AnnualPremiumTable::with_growth(1, 1_000.0, 0.04, 3).with_coverage(0.5);
        assert_eq!(table.annual_premium(1), 500.0);
        assert!((table.annual_premium(3) - 1_000.0 * 1.04 * 1.04 * 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_default_resolver_misses() {
        let ids = vec!["sim-1".to_string()];
        assert!(NoInsuranceResolver.resolve(&ids, 360).is_none());
        assert!(NoInsuranceResolver.resolve(&[], 360).is_none());
    }

    #[test]
    fn test_empty_table_rejected() {
        assert!(AnnualPremiumTable::from_pairs(&[]).is_err());
    }
}
