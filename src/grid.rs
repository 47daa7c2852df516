use crate::types::{Cell, Table};
use std::collections::BTreeMap;
use thiserror::Error;

/// Style hint attached to each written cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleTag {
    Header,
    Body,
}

/// Top-left corner of a placed table.
#[derive(Debug, Clone, Copy)]
pub struct Anchor {
    pub row: u32,
    pub col: u16,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("table anchored at row {row}, column {col} overlaps an existing region")]
pub struct OverlapError {
    pub row: u32,
    pub col: u16,
}

#[derive(Debug, Clone, Copy)]
struct Region {
    row: u32,
    col: u16,
    height: u32,
    width: u16,
}

impl Region {
    fn intersects(&self, other: &Region) -> bool {
        self.row < other.row + other.height
            && other.row < self.row + self.height
            && self.col < other.col + other.width
            && other.col < self.col + self.width
    }
}

/// A sparse 2-D output grid holding one or two placed tables.
///
/// Regions are tracked so a misplaced anchor fails instead of silently
/// overwriting cells of an earlier table.
#[derive(Debug, Default)]
pub struct Grid {
    cells: BTreeMap<(u32, u16), (Cell, StyleTag)>,
    widths: BTreeMap<u16, f64>,
    regions: Vec<Region>,
}

impl Grid {
    pub fn new() -> Self {
        Grid::default()
    }

    /// Write `table` with its header at the anchor row and each data row
    /// beneath, column by column. `column_width` is the fixed display width
    /// applied to every column the table occupies.
    pub fn place(
        &mut self,
        table: &Table,
        anchor: Anchor,
        column_width: Option<f64>,
    ) -> Result<(), OverlapError> {
        let region = Region {
            row: anchor.row,
            col: anchor.col,
            height: table.rows.len() as u32 + 1,
            width: table.labels.len() as u16,
        };
        if self.regions.iter().any(|r| r.intersects(&region)) {
            return Err(OverlapError { row: anchor.row, col: anchor.col });
        }

        for (j, label) in table.labels.iter().enumerate() {
            let col = anchor.col + j as u16;
            self.cells
                .insert((anchor.row, col), (Cell::Text(label.clone()), StyleTag::Header));
            if let Some(w) = column_width {
                self.widths.insert(col, w);
            }
        }
        for (i, row) in table.rows.iter().enumerate() {
            for (j, cell) in row.iter().enumerate() {
                self.cells.insert(
                    (anchor.row + 1 + i as u32, anchor.col + j as u16),
                    (cell.clone(), StyleTag::Body),
                );
            }
        }
        self.regions.push(region);
        Ok(())
    }

    pub fn cells(&self) -> impl Iterator<Item = (&(u32, u16), &(Cell, StyleTag))> {
        self.cells.iter()
    }

    pub fn column_widths(&self) -> impl Iterator<Item = (&u16, &f64)> {
        self.widths.iter()
    }
}
