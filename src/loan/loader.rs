//! Load modular repayment schedules from CSV (`month,amount` columns)

use super::{ModularSchedule, ScheduleItem};
use crate::error::EngineResult;
use csv::Reader;
use std::path::Path;

/// Raw CSV row of a repayment schedule
#[derive(Debug, serde::Deserialize)]
struct CsvRow {
    #[serde(alias = "Month", alias = "Maand")]
    month: u32,
    #[serde(alias = "Amount", alias = "Bedrag")]
    amount: f64,
}

/// Load a schedule from a CSV file
pub fn load_schedule<P: AsRef<Path>>(path: P) -> EngineResult<ModularSchedule> {
    let reader = Reader::from_path(path)?;
    read_rows(reader)
}

/// Load a schedule from any reader (e.g., string buffer, request body)
pub fn load_schedule_from_reader<R: std::io::Read>(reader: R) -> EngineResult<ModularSchedule> {
    read_rows(Reader::from_reader(reader))
}

fn read_rows<R: std::io::Read>(mut reader: Reader<R>) -> EngineResult<ModularSchedule> {
    let mut items = Vec::new();

    for result in reader.deserialize() {
        let row: CsvRow = result?;
        items.push(ScheduleItem {
            month: row.month,
            amount: row.amount,
        });
    }

    log::debug!("loaded {} schedule rows", items.len());
    Ok(ModularSchedule::new(items))
}
