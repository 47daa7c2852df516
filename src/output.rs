use crate::grid::{Grid, StyleTag};
use crate::types::{Cell, Table};
use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Workbook, XlsxError};
use serde::Serialize;
use std::error::Error;
use tabled::{builder::Builder, settings::Style};

/// Encode a laid-out grid into xlsx bytes.
///
/// Header cells are bold, centered and shaded; body cells get a thin border,
/// top alignment and wrapped text. `Empty` body cells are written as
/// formatted blanks so the annotation columns keep their borders.
pub fn encode_workbook(grid: &Grid, sheet_name: &str) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet().set_name(sheet_name)?;

    let header_fmt = Format::new()
        .set_bold()
        .set_align(FormatAlign::Center)
        .set_background_color("#D9D9D9");
    let body_fmt = Format::new()
        .set_border(FormatBorder::Thin)
        .set_align(FormatAlign::Top)
        .set_text_wrap();

    for ((row, col), (cell, tag)) in grid.cells() {
        let fmt = match tag {
            StyleTag::Header => &header_fmt,
            StyleTag::Body => &body_fmt,
        };
        match cell {
            Cell::Number(n) => {
                sheet.write_number_with_format(*row, *col, *n, fmt)?;
            }
            Cell::Text(s) => {
                sheet.write_string_with_format(*row, *col, s, fmt)?;
            }
            Cell::Empty => {
                sheet.write_blank(*row, *col, fmt)?;
            }
        }
    }
    for (col, width) in grid.column_widths() {
        sheet.set_column_width(*col, *width)?;
    }

    workbook.save_to_buffer()
}

pub fn write_json<T: Serialize>(path: &std::path::Path, value: &T) -> Result<(), Box<dyn Error>> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

/// Print the first `max_rows` rows of a table as a markdown preview.
pub fn preview_table(table: &Table, max_rows: usize) {
    if table.rows.is_empty() {
        println!("(no rows)\n");
        return;
    }
    let mut builder = Builder::default();
    builder.push_record(table.labels.iter().cloned());
    for row in table.rows.iter().take(max_rows) {
        builder.push_record(row.iter().map(|c| c.as_text()));
    }
    let rendered = builder.build().with(Style::markdown()).to_string();
    println!("{}\n", rendered);
}
