// Entry point and high-level CLI flow.
//
// One invocation runs the whole pipeline once: load and clean the file,
// preview it, compose the selected report, write the xlsx output. Every
// failure is caught at this boundary and reported once; no partial file is
// ever left behind because the workbook is encoded in memory before the
// first byte hits disk.
use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use xl_report::amount::clean_column;
use xl_report::grid::{Anchor, Grid};
use xl_report::loader::load_table;
use xl_report::output::{encode_workbook, preview_table, write_json};
use xl_report::reports::{compose, resolve_columns};
use xl_report::types::{Cell, ReportMode, RunConfig, RunSummary};
use xl_report::util::{format_int, format_number};

const COLUMN_WIDTH: f64 = 18.0;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    /// Two side-by-side tables: raw selection and per-key totals.
    DetailSummary,
    /// One merged table per person with blank annotation columns.
    Consolidated,
}

impl From<Mode> for ReportMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::DetailSummary => ReportMode::DetailSummary,
            Mode::Consolidated => ReportMode::Consolidated,
        }
    }
}

#[derive(Debug, Parser)]
#[command(about = "Extract, clean and summarize a monetary column from a spreadsheet")]
struct Cli {
    /// Source file (.xlsx, .xls or CSV)
    input: PathBuf,

    /// Display name stamped on every report row
    #[arg(long)]
    name: String,

    /// Columns to carry through into the report (repeatable or comma-separated)
    #[arg(long = "keep", value_delimiter = ',', required = true)]
    keep: Vec<String>,

    /// Column identifying the person across rows
    #[arg(long)]
    key_column: String,

    /// Column holding the monetary amount
    #[arg(long)]
    amount_column: String,

    #[arg(long, value_enum, default_value_t = Mode::DetailSummary)]
    mode: Mode,

    /// Directory for the generated file (defaults to the current directory)
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Also write a JSON run summary to this path
    #[arg(long)]
    summary: Option<PathBuf>,

    /// How many rows to preview on the console
    #[arg(long, default_value_t = 5)]
    preview: usize,
}

fn run(cli: Cli) -> Result<PathBuf> {
    let cfg = RunConfig {
        display_name: cli.name.trim().to_string(),
        carry_through: cli.keep,
        key_column: cli.key_column,
        amount_column: cli.amount_column,
        mode: cli.mode.into(),
    };
    // Selection problems abort before the file is even opened.
    cfg.validate()?;

    let loaded = load_table(&cli.input)?;
    println!(
        "Loaded {} rows, {} columns.",
        format_int(loaded.table.rows.len() as i64),
        format_int(loaded.table.labels.len() as i64)
    );
    for (_, original, renamed) in &loaded.renames {
        eprintln!("Warning: duplicate column '{}' renamed to '{}'.", original, renamed);
    }
    println!("\nSource preview:");
    preview_table(&loaded.table, cli.preview);

    let cols = resolve_columns(&loaded.table, &cfg)?;
    let cleaned = clean_column(&loaded.table, cols.amount);
    if cleaned.fallbacks > 0 {
        eprintln!(
            "Note: {} amount cell(s) could not be parsed and count as 0.",
            format_int(cleaned.fallbacks as i64)
        );
    }

    let report = compose(&loaded.table, &cfg, &cleaned)?;

    let mut grid = Grid::new();
    let mut anchor = Anchor { row: 0, col: 0 };
    for table in &report.tables {
        grid.place(table, anchor, Some(COLUMN_WIDTH))?;
        // Next region starts one blank column to the right.
        anchor.col += table.labels.len() as u16 + 1;
    }
    let bytes = encode_workbook(&grid, report.mode.sheet_name())?;

    let out_dir = cli.out_dir.unwrap_or_else(|| PathBuf::from("."));
    let out_path = out_dir.join(report.mode.file_name(&cfg.display_name));
    std::fs::write(&out_path, bytes)?;

    let final_table = report.tables.last().expect("composer always emits a table");
    println!("Report preview:");
    preview_table(final_table, cli.preview);

    let total_col = final_table.labels.len() - 1;
    let grand_total: f64 = final_table
        .rows
        .iter()
        .map(|row| match &row[total_col] {
            Cell::Number(n) => *n,
            _ => 0.0,
        })
        .sum();
    println!("Sum of totals: {}", format_number(grand_total, 2));

    if let Some(summary_path) = &cli.summary {
        let summary = RunSummary {
            source_rows: loaded.table.rows.len(),
            distinct_keys: final_table.rows.len(),
            renamed_labels: loaded.renames.len(),
            fallback_cells: cleaned.fallbacks,
            report_rows: final_table.rows.len(),
            grand_total,
        };
        write_json(summary_path, &summary)
            .map_err(|e| anyhow::anyhow!("writing summary: {}", e))?;
        println!("Summary written to {}", summary_path.display());
    }

    Ok(out_path)
}

fn main() {
    let cli = Cli::parse();
    match run(cli) {
        Ok(path) => println!("Report written to {}", path.display()),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}
