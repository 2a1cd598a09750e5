//! Dump the layout of a workbook sheet to pick the CPI column selector and skip-row offset
use calamine::{open_workbook_auto, DataType, Reader};
use clap::Parser;
use cpi_prep::utils::column_letter;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "examine-sheet")]
#[command(about = "List sheets and show the first rows of a worksheet", long_about = None)]
struct Cli {
    /// Workbook to examine
    #[arg(default_value = "data/raw/historical-cpi-u-202508.xlsx")]
    file: PathBuf,

    /// Sheet to dump (defaults to the first sheet)
    sheet: Option<String>,

    /// Number of rows to show
    #[arg(long, default_value = "20")]
    rows: usize,

    /// Number of columns to show
    #[arg(long, default_value = "10")]
    cols: usize,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    println!("Opening workbook: {}", cli.file.display());
    let mut workbook = open_workbook_auto(&cli.file)?;

    let sheet_names = workbook.sheet_names();
    println!("\nSheet names:");
    for (i, name) in sheet_names.iter().enumerate() {
        println!("  {i}: {name}");
    }

    let sheet_name = match cli.sheet {
        Some(name) => name,
        None => sheet_names.first().cloned().ok_or("Workbook has no sheets")?,
    };

    println!("\n\nExamining sheet: {sheet_name}");
    println!("{}", "=".repeat(100));

    let range = workbook.worksheet_range(&sheet_name)?;
    println!("Dimensions: {:?}", range.get_size());
    println!("Used range: {:?} -> {:?}", range.start(), range.end());

    let (start_row, start_col) = range.start().unwrap_or((0, 0));
    print!("\n         ");
    for col in 0..cli.cols {
        print!("{:<12}", column_letter(start_col as usize + col));
    }
    println!();

    // Row numbers are absolute sheet rows, matching --skip-rows counting
    for (row_idx, row) in range.rows().enumerate().take(cli.rows) {
        print!("Row {:3}: ", start_row as usize + row_idx + 1);
        for cell in row.iter().take(cli.cols) {
            if cell.is_empty() {
                print!("{:<12}", "[empty]");
            } else {
                print!("{:<12}", format!("[{cell}]"));
            }
        }
        println!();
    }

    Ok(())
}
