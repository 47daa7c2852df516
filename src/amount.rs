// Monetary column cleaning.
//
// Upstream exports format amounts with locale thousands-grouping spaces
// (often the non-breaking U+00A0) and comma decimals, so punctuation has to
// be normalized before parsing. Cells that still fail to parse degrade to 0
// instead of aborting the run: sums stay stable at the cost of silently
// under-counting malformed rows. That trade-off is intentional.
use crate::types::{Cell, Table};
use once_cell::sync::Lazy;
use regex::Regex;

// `\s` is Unicode-aware here, so U+00A0 is deleted along with ordinary
// spaces and tabs.
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// A cleaned amount column, positionally aligned with the source rows.
#[derive(Debug, Clone)]
pub struct CleanedColumn {
    pub values: Vec<f64>,
    /// How many cells fell back to 0.
    pub fallbacks: usize,
}

/// Parse one cell into a signed decimal number.
///
/// Returns `None` when the cell cannot be read as a finite number; the
/// caller substitutes 0. Never fails.
pub fn clean_cell(cell: &Cell) -> Option<f64> {
    match cell {
        Cell::Number(n) if n.is_finite() => Some(*n),
        Cell::Number(_) | Cell::Empty => None,
        Cell::Text(s) => {
            let stripped = WHITESPACE.replace_all(s, "");
            let normalized = stripped.replace(',', ".");
            if normalized.is_empty() {
                return None;
            }
            normalized.parse::<f64>().ok().filter(|v| v.is_finite())
        }
    }
}

/// Clean a whole column, substituting 0 for every unparsable cell.
pub fn clean_column(table: &Table, column: usize) -> CleanedColumn {
    let mut values = Vec::with_capacity(table.rows.len());
    let mut fallbacks = 0usize;
    for row in &table.rows {
        match clean_cell(&row[column]) {
            Some(v) => values.push(v),
            None => {
                fallbacks += 1;
                values.push(0.0);
            }
        }
    }
    CleanedColumn { values, fallbacks }
}
