use calamine::{open_workbook_auto, DataType, Reader};
use clap::Parser;
use std::path::PathBuf;

use water_quality_charts::providers::layout::{MEASUREMENTS_START_ROW, REGISTRY_SHEET};

#[derive(Parser)]
#[command(name = "examine-workbook")]
#[command(about = "Dump sheet names and the first rows of a water quality workbook", long_about = None)]
struct Cli {
    /// Workbook to inspect
    file: PathBuf,

    /// Sheet to dump (default: the point registry)
    sheet: Option<String>,

    /// Number of rows to print
    #[arg(long, default_value = "40")]
    rows: usize,

    /// Number of columns to print per row
    #[arg(long, default_value = "26")]
    columns: usize,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    println!("Opening workbook: {}", cli.file.display());
    let mut workbook = open_workbook_auto(&cli.file)?;

    println!("\nSheet names:");
    for (i, name) in workbook.sheet_names().iter().enumerate() {
        println!("  {i}: {name}");
    }

    let sheet_name = cli.sheet.unwrap_or_else(|| REGISTRY_SHEET.to_string());

    println!("\n\nExamining sheet: {sheet_name}");
    println!("{}", "=".repeat(100));

    let range = workbook.worksheet_range(&sheet_name)?;
    let row_offset = range.start().map(|(r, _)| r as usize).unwrap_or_default();

    println!("Dimensions: {:?}", range.get_size());
    if sheet_name != REGISTRY_SHEET {
        println!("Data rows start at row {}", MEASUREMENTS_START_ROW + 1);
    }
    println!(
        "\nFirst {} rows (showing first {} columns):",
        cli.rows, cli.columns
    );
    println!("{}", "=".repeat(100));

    for (row_idx, row) in range.rows().enumerate().take(cli.rows) {
        let has_data = row.iter().any(|cell| !cell.is_empty());
        if has_data {
            print!("Row {:3}: ", row_offset + row_idx + 1);
            for cell in row.iter().take(cli.columns) {
                if cell.is_empty() {
                    print!("[empty] ");
                } else {
                    print!("[{cell}] ");
                }
            }
            println!();
        }
    }

    Ok(())
}
