//! Clean a messy monetary column out of a spreadsheet and generate either a
//! side-by-side detail+summary report or a single consolidated per-person
//! report, written back as a styled xlsx file.

pub mod amount;
pub mod grid;
pub mod loader;
pub mod output;
pub mod reports;
pub mod schema;
pub mod types;
pub mod util;
