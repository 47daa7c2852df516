use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// A single spreadsheet cell.
///
/// Input files mix text, numbers and blanks freely; keeping the tag explicit
/// lets the amount parser and the schema normalizer treat every cell
/// uniformly instead of guessing from context.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    Empty,
}

impl Cell {
    /// Canonical text form of the cell.
    ///
    /// Numbers with no fractional part render without a decimal point so that
    /// a key column read as `1.0` from xlsx still groups with `"1"` from CSV.
    pub fn as_text(&self) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{}", n)
                }
            }
            Cell::Empty => String::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text())
    }
}

/// An in-memory table: unique column labels plus positional rows.
///
/// Invariant: `row.len() == labels.len()` for every row. Row order is the
/// ingestion order until a composer explicitly re-sorts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub labels: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(labels: Vec<String>) -> Self {
        Table { labels, rows: Vec::new() }
    }

    pub fn column_index(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }

    /// Append a row, padding or truncating to the declared label count.
    pub fn push_row(&mut self, mut row: Vec<Cell>) {
        row.resize(self.labels.len(), Cell::Empty);
        self.rows.push(row);
    }
}

/// Which of the two report layouts to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportMode {
    DetailSummary,
    Consolidated,
}

impl ReportMode {
    /// Worksheet name for the generated file.
    pub fn sheet_name(self) -> &'static str {
        match self {
            ReportMode::DetailSummary => "Report",
            ReportMode::Consolidated => "CNSS_Report",
        }
    }

    /// Output file name, derived from the display name.
    pub fn file_name(self, display_name: &str) -> String {
        match self {
            ReportMode::DetailSummary => format!("{}_processed_report.xlsx", display_name),
            ReportMode::Consolidated => format!("{}_cnss.xlsx", display_name),
        }
    }
}

/// One run's configuration, handed to the core as a plain immutable value.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub display_name: String,
    pub carry_through: Vec<String>,
    pub key_column: String,
    pub amount_column: String,
    pub mode: ReportMode,
}

impl RunConfig {
    /// Reject unusable selections before any parsing or aggregation work.
    pub fn validate(&self) -> Result<(), InputError> {
        if self.display_name.trim().is_empty() {
            return Err(InputError::MissingDisplayName);
        }
        if self.carry_through.is_empty() {
            return Err(InputError::NoCarryThrough);
        }
        Ok(())
    }
}

/// Recoverable input problems: the run aborts, the user corrects and retries.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("display name must not be empty")]
    MissingDisplayName,
    #[error("select at least one column to carry through")]
    NoCarryThrough,
    #[error("source table has no header row")]
    EmptySource,
    #[error("column '{0}' not found in the source table")]
    UnknownColumn(String),
}

/// Counters describing one run, written as JSON when requested.
#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub source_rows: usize,
    pub distinct_keys: usize,
    pub renamed_labels: usize,
    pub fallback_cells: usize,
    pub report_rows: usize,
    pub grand_total: f64,
}
