//! Ledger CSV input and output.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::Path;

/// One input transaction record. Identified by its 0-based position in the
/// input file; rows are immutable once read.
#[derive(Debug, Clone, Deserialize)]
pub struct Row {
    #[serde(alias = "Date")]
    pub date: String,
    #[serde(alias = "Amount")]
    pub amount: String,
    #[serde(alias = "Description")]
    pub description: String,
}

impl Row {
    /// Render the row as `name: value; ` pairs for prompt assembly.
    pub fn prompt_text(&self) -> String {
        let mut text = String::new();
        let _ = write!(text, "date: {}; ", self.date);
        let _ = write!(text, "amount: {}; ", self.amount);
        let _ = write!(text, "description: {};", self.description);
        text
    }
}

/// The structured output of successfully enriching one row. Amount is a
/// 2-decimal string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnrichedRow {
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Amount")]
    pub amount: String,
    #[serde(rename = "Payee")]
    pub payee: String,
    #[serde(rename = "Notes")]
    pub notes: String,
    #[serde(rename = "Categories")]
    pub categories: String,
}

/// Load the whole input table before the pipeline starts. Any read or
/// decode error is a run-level failure.
pub fn read_rows(path: &Path) -> Result<Vec<Row>> {
    let mut reader =
        csv::Reader::from_path(path).with_context(|| format!("open {}", path.display()))?;
    let mut rows = Vec::new();
    for record in reader.deserialize() {
        let row: Row = record.with_context(|| format!("decode row in {}", path.display()))?;
        rows.push(row);
    }
    Ok(rows)
}

/// Persist the enriched table with fixed columns
/// `Date, Amount, Payee, Notes, Categories`.
pub fn write_rows(path: &Path, rows: &[EnrichedRow]) -> Result<()> {
    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("create {}", path.display()))?;
    for row in rows {
        writer
            .serialize(row)
            .with_context(|| format!("write row to {}", path.display()))?;
    }
    writer
        .flush()
        .with_context(|| format!("flush {}", path.display()))?;
    Ok(())
}
