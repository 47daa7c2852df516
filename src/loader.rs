// Input boundary: decode spreadsheet bytes into a typed `Table`.
//
// xlsx/xls files go through calamine (first sheet only, first row is the
// header); anything else is read as CSV where every field is text — the
// amount parser does not care which path a cell came from.
use crate::schema::normalize_labels;
use crate::types::{Cell, InputError, Table};
use anyhow::{Context, Result};
use calamine::{open_workbook_auto, Data, Reader};
use csv::ReaderBuilder;
use std::path::Path;

/// A decoded table plus the header renames the schema normalizer applied.
#[derive(Debug)]
pub struct LoadedTable {
    pub table: Table,
    pub renames: Vec<(usize, String, String)>,
}

pub fn load_table(path: &Path) -> Result<LoadedTable> {
    let is_excel = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| matches!(e.to_ascii_lowercase().as_str(), "xlsx" | "xlsm" | "xls"))
        .unwrap_or(false);
    if is_excel {
        load_excel(path)
    } else {
        load_csv(path)
    }
    .with_context(|| format!("reading {}", path.display()))
}

fn load_excel(path: &Path) -> Result<LoadedTable> {
    let mut workbook = open_workbook_auto(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(InputError::EmptySource)??;

    let mut rows = range.rows();
    let header: Vec<Cell> = rows
        .next()
        .ok_or(InputError::EmptySource)?
        .iter()
        .map(convert_cell)
        .collect();
    from_cells(header, rows.map(|r| r.iter().map(convert_cell).collect()))
}

fn load_csv(path: &Path) -> Result<LoadedTable> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .has_headers(false)
        .from_path(path)?;
    let mut records = rdr.records();
    let header: Vec<Cell> = match records.next() {
        Some(first) => first?.iter().map(text_cell).collect(),
        None => return Err(InputError::EmptySource.into()),
    };
    let mut body = Vec::new();
    for record in records {
        let record = record?;
        body.push(record.iter().map(text_cell).collect::<Vec<_>>());
    }
    from_cells(header, body.into_iter())
}

fn from_cells(header: Vec<Cell>, body: impl Iterator<Item = Vec<Cell>>) -> Result<LoadedTable> {
    if header.is_empty() {
        return Err(InputError::EmptySource.into());
    }
    let schema = normalize_labels(&header);
    let mut table = Table::new(schema.labels);
    for row in body {
        table.push_row(row);
    }
    Ok(LoadedTable { table, renames: schema.renames })
}

fn text_cell(field: &str) -> Cell {
    if field.is_empty() {
        Cell::Empty
    } else {
        Cell::Text(field.to_string())
    }
}

fn convert_cell(data: &Data) -> Cell {
    match data {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Bool(b) => Cell::Text(b.to_string()),
        Data::DateTime(dt) => match dt.as_datetime() {
            // Date-only cells are the common case; keep them readable.
            Some(d) if d.time() == chrono::NaiveTime::MIN => {
                Cell::Text(d.date().format("%Y-%m-%d").to_string())
            }
            Some(d) => Cell::Text(d.format("%Y-%m-%d %H:%M:%S").to_string()),
            None => Cell::Number(dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
    }
}
