// Aggregation, identity resolution and report composition.
//
// Consolidated mode sums only non-negative amounts but keeps every key seen
// in the source: the descriptive rows, built from the unfiltered table, are
// the authoritative key universe and unmatched keys get a total of 0. The
// asymmetry is a business rule, not an oversight; collapsing both sides onto
// the same filter would silently drop valid zero-total entities.
use crate::amount::CleanedColumn;
use crate::types::{Cell, InputError, ReportMode, RunConfig, Table};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

/// Column indices resolved once against the normalized label set.
#[derive(Debug, Clone)]
pub struct ResolvedColumns {
    pub key: usize,
    pub amount: usize,
    pub carry: Vec<usize>,
}

/// Validate the configuration and resolve its labels to positions.
///
/// Short-circuits on an empty display name or carry-through selection before
/// any parsing or aggregation work.
pub fn resolve_columns(table: &Table, cfg: &RunConfig) -> Result<ResolvedColumns, InputError> {
    cfg.validate()?;
    let lookup = |label: &str| {
        table
            .column_index(label)
            .ok_or_else(|| InputError::UnknownColumn(label.to_string()))
    };
    let key = lookup(&cfg.key_column)?;
    let amount = lookup(&cfg.amount_column)?;
    let carry = cfg
        .carry_through
        .iter()
        .map(|label| lookup(label))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ResolvedColumns { key, amount, carry })
}

/// Sum a cleaned amount column per distinct key value.
///
/// Partitioning is stable and keyed on the cell's canonical text. Only
/// partitions with at least one row passing `keep` are emitted; output order
/// is first appearance, callers sort as needed.
pub fn aggregate<F>(table: &Table, key: usize, amounts: &[f64], keep: F) -> Vec<(Cell, f64)>
where
    F: Fn(f64) -> bool,
{
    struct Acc {
        key_cell: Cell,
        sum: f64,
        hit: bool,
    }
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<Acc> = Vec::new();

    for (row, &amount) in table.rows.iter().zip(amounts) {
        let cell = &row[key];
        let slot = *index.entry(cell.as_text()).or_insert_with(|| {
            groups.push(Acc { key_cell: cell.clone(), sum: 0.0, hit: false });
            groups.len() - 1
        });
        if keep(amount) {
            groups[slot].sum += amount;
            groups[slot].hit = true;
        }
    }

    groups
        .into_iter()
        .filter(|g| g.hit)
        .map(|g| (g.key_cell, g.sum))
        .collect()
}

/// One representative row per distinct key: the first row wins for the
/// carry-through values, later rows with the same key are dropped here
/// (their amounts are still captured by the aggregator). Order of first
/// appearance.
pub fn resolve_identities(
    table: &Table,
    key: usize,
    carry: &[usize],
) -> Vec<(Cell, Vec<Cell>)> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Vec::new();
    for row in &table.rows {
        let cell = &row[key];
        if seen.insert(cell.as_text()) {
            let carried = carry.iter().map(|&c| row[c].clone()).collect();
            out.push((cell.clone(), carried));
        }
    }
    out
}

/// A composed report: the logical tables to lay out plus the sheet they
/// belong on. Detail+summary mode carries two tables, consolidated one.
#[derive(Debug, Clone)]
pub struct ComposedReport {
    pub tables: Vec<Table>,
    pub mode: ReportMode,
}

/// Build the report for the configured mode.
pub fn compose(table: &Table, cfg: &RunConfig, cleaned: &CleanedColumn) -> Result<ComposedReport, InputError> {
    let cols = resolve_columns(table, cfg)?;
    let tables = match cfg.mode {
        ReportMode::DetailSummary => {
            let (detail, summary) = compose_detail_summary(table, cfg, &cols, cleaned);
            vec![detail, summary]
        }
        ReportMode::Consolidated => vec![compose_consolidated(table, cfg, &cols, cleaned)],
    };
    Ok(ComposedReport { tables, mode: cfg.mode })
}

fn total_label(cfg: &RunConfig) -> String {
    format!("Total {}", cfg.amount_column)
}

/// Stable descending sort on the trailing total column.
fn sort_by_total_desc(rows: &mut [(f64, Vec<Cell>)]) {
    rows.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
}

fn compose_detail_summary(
    table: &Table,
    cfg: &RunConfig,
    cols: &ResolvedColumns,
    cleaned: &CleanedColumn,
) -> (Table, Table) {
    // Table A: display name prepended to the selected columns, one row per
    // source row, original order.
    let mut labels = vec!["name".to_string()];
    labels.extend(cfg.carry_through.iter().cloned());
    let mut detail = Table::new(labels);
    for row in &table.rows {
        let mut cells = vec![Cell::Text(cfg.display_name.clone())];
        cells.extend(cols.carry.iter().map(|&c| row[c].clone()));
        detail.push_row(cells);
    }

    // Table B: unfiltered totals per key, sorted descending.
    let mut totals: Vec<(f64, Vec<Cell>)> = aggregate(table, cols.key, &cleaned.values, |_| true)
        .into_iter()
        .map(|(key, sum)| (sum, vec![key, Cell::Number(sum)]))
        .collect();
    sort_by_total_desc(&mut totals);

    let mut summary = Table::new(vec![cfg.key_column.clone(), total_label(cfg)]);
    for (_, cells) in totals {
        summary.push_row(cells);
    }
    (detail, summary)
}

fn compose_consolidated(
    table: &Table,
    cfg: &RunConfig,
    cols: &ResolvedColumns,
    cleaned: &CleanedColumn,
) -> Table {
    // Carry-through columns in user order, minus the key column if it was
    // also selected (it gets its own slot).
    let carry: Vec<(String, usize)> = cfg
        .carry_through
        .iter()
        .cloned()
        .zip(cols.carry.iter().copied())
        .filter(|(label, _)| label != &cfg.key_column)
        .collect();
    let carry_idxs: Vec<usize> = carry.iter().map(|(_, i)| *i).collect();

    // Filtered totals, unfiltered key universe.
    let totals: HashMap<String, f64> =
        aggregate(table, cols.key, &cleaned.values, |amount| amount >= 0.0)
            .into_iter()
            .map(|(key, sum)| (key.as_text(), sum))
            .collect();
    let identities = resolve_identities(table, cols.key, &carry_idxs);

    let mut labels = vec!["name".to_string(), cfg.key_column.clone()];
    labels.extend(carry.iter().map(|(label, _)| label.clone()));
    labels.extend(["CIN", "Tel", "Remarque"].map(String::from));
    labels.push(total_label(cfg));

    let mut rows: Vec<(f64, Vec<Cell>)> = identities
        .into_iter()
        .map(|(key, carried)| {
            let total = totals.get(&key.as_text()).copied().unwrap_or(0.0);
            let mut cells = vec![Cell::Text(cfg.display_name.clone()), key];
            cells.extend(carried);
            cells.extend([Cell::Empty, Cell::Empty, Cell::Empty]);
            cells.push(Cell::Number(total));
            (total, cells)
        })
        .collect();
    sort_by_total_desc(&mut rows);

    let mut report = Table::new(labels);
    for (_, cells) in rows {
        report.push_row(cells);
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amount::clean_column;

    fn text(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    fn sample() -> Table {
        let mut t = Table::new(vec!["id".into(), "ville".into(), "amt".into()]);
        t.push_row(vec![Cell::Number(1.0), text("Rabat"), text("1 000,50")]);
        t.push_row(vec![Cell::Number(1.0), text("Casa"), text("-200")]);
        t.push_row(vec![Cell::Number(2.0), text("Fes"), text("50")]);
        t
    }

    fn config(mode: ReportMode) -> RunConfig {
        RunConfig {
            display_name: "ahmed".into(),
            carry_through: vec!["ville".into()],
            key_column: "id".into(),
            amount_column: "amt".into(),
            mode,
        }
    }

    #[test]
    fn aggregate_partitions_by_value_and_applies_filter() {
        let t = sample();
        let amounts = clean_column(&t, 2).values;
        let all = aggregate(&t, 0, &amounts, |_| true);
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].1, 800.50);
        assert_eq!(all[1].1, 50.0);

        let non_negative = aggregate(&t, 0, &amounts, |a| a >= 0.0);
        assert_eq!(non_negative[0].1, 1000.50);
    }

    #[test]
    fn aggregate_drops_partitions_with_no_passing_row() {
        let mut t = Table::new(vec!["id".into(), "amt".into()]);
        t.push_row(vec![text("only-negative"), text("-7")]);
        let amounts = clean_column(&t, 1).values;
        let agg = aggregate(&t, 0, &amounts, |a| a >= 0.0);
        assert!(agg.is_empty());
    }

    #[test]
    fn identities_first_row_wins() {
        let t = sample();
        let ids = resolve_identities(&t, 0, &[1]);
        assert_eq!(ids.len(), 2);
        assert_eq!(ids[0].1, vec![text("Rabat")]);
        assert_eq!(ids[1].1, vec![text("Fes")]);
    }

    #[test]
    fn detail_summary_keeps_every_source_row_and_sorts_totals() {
        let t = sample();
        let cleaned = clean_column(&t, 2);
        let report = compose(&t, &config(ReportMode::DetailSummary), &cleaned).unwrap();
        let [detail, summary] = &report.tables[..] else { panic!("two tables expected") };

        assert_eq!(detail.labels, vec!["name", "ville"]);
        assert_eq!(detail.rows.len(), 3);
        assert_eq!(detail.rows[0][0], text("ahmed"));

        // No filter in this mode: one row per distinct key of the full table.
        assert_eq!(summary.labels, vec!["id", "Total amt"]);
        assert_eq!(summary.rows.len(), 2);
        assert_eq!(summary.rows[0][1], Cell::Number(800.50));
        assert_eq!(summary.rows[1][1], Cell::Number(50.0));
    }

    #[test]
    fn consolidated_keeps_zero_total_keys_and_sorts_descending() {
        let mut t = sample();
        // A key with only negative rows must still appear, total 0.
        t.push_row(vec![Cell::Number(3.0), text("Oujda"), text("-1")]);
        let cleaned = clean_column(&t, 2);
        let report = compose(&t, &config(ReportMode::Consolidated), &cleaned).unwrap();
        let merged = &report.tables[0];

        assert_eq!(
            merged.labels,
            vec!["name", "id", "ville", "CIN", "Tel", "Remarque", "Total amt"]
        );
        assert_eq!(merged.rows.len(), 3);
        assert_eq!(merged.rows[0][1], Cell::Number(1.0));
        assert_eq!(merged.rows[0][6], Cell::Number(1000.50));
        assert_eq!(merged.rows[1][6], Cell::Number(50.0));
        assert_eq!(merged.rows[2][1], Cell::Number(3.0));
        assert_eq!(merged.rows[2][6], Cell::Number(0.0));
        // Annotation columns are blank.
        assert!(merged.rows[0][3].is_empty());
        assert!(merged.rows[0][4].is_empty());
        assert!(merged.rows[0][5].is_empty());
    }

    #[test]
    fn consolidated_drops_key_column_from_carry_through() {
        let t = sample();
        let cleaned = clean_column(&t, 2);
        let mut cfg = config(ReportMode::Consolidated);
        cfg.carry_through = vec!["id".into(), "ville".into()];
        let report = compose(&t, &cfg, &cleaned).unwrap();
        assert_eq!(
            report.tables[0].labels,
            vec!["name", "id", "ville", "CIN", "Tel", "Remarque", "Total amt"]
        );
    }

    #[test]
    fn unknown_column_is_an_input_error() {
        let t = sample();
        let cleaned = clean_column(&t, 2);
        let mut cfg = config(ReportMode::Consolidated);
        cfg.key_column = "nope".into();
        assert_eq!(
            compose(&t, &cfg, &cleaned).unwrap_err(),
            InputError::UnknownColumn("nope".into())
        );
    }
}
