use clap::Parser;
use std::path::PathBuf;
use tracing::{debug, info};

use cpi_prep::config::Config;
use cpi_prep::importers::cpi_importer::{
    DEFAULT_COLUMNS, DEFAULT_INPUT_FILE, DEFAULT_OUTPUT_FILE, DEFAULT_ROW_COUNT, DEFAULT_SHEET_NAME,
    DEFAULT_SKIP_ROWS,
};
use cpi_prep::importers::{CpiExtractOptions, CpiImporter};

/// Rows shown from each end of the extracted table
const PREVIEW_ROWS: usize = 5;

#[derive(Parser)]
#[command(name = "prep-bls-cpi")]
#[command(about = "Convert the BLS historical CPI-U workbook into a year,annual_avg_cpi CSV", long_about = None)]
struct Cli {
    /// Path to the raw BLS Excel file
    #[arg(long, env = "CPI_INPUT_FILE", default_value = DEFAULT_INPUT_FILE)]
    input_file: PathBuf,

    /// Where the cleaned CSV is written (parent directories are created)
    #[arg(long, env = "CPI_OUTPUT_FILE", default_value = DEFAULT_OUTPUT_FILE)]
    output_file: PathBuf,

    /// Worksheet holding the annual averages
    #[arg(long, env = "CPI_SHEET_NAME", default_value = DEFAULT_SHEET_NAME)]
    sheet_name: String,

    /// Year column and annual average column (Excel letters)
    #[arg(long, env = "CPI_COLUMNS", default_value = DEFAULT_COLUMNS)]
    columns: String,

    /// Rows to skip before the column header row
    #[arg(long, env = "CPI_SKIP_ROWS", default_value_t = DEFAULT_SKIP_ROWS)]
    skip_rows: usize,

    /// Number of data rows to read
    #[arg(long, env = "CPI_ROW_COUNT", default_value_t = DEFAULT_ROW_COUNT)]
    row_count: usize,
}

impl From<Cli> for CpiExtractOptions {
    fn from(cli: Cli) -> Self {
        CpiExtractOptions {
            input_file: cli.input_file,
            output_file: cli.output_file,
            sheet_name: cli.sheet_name,
            columns: cli.columns,
            skip_rows: cli.skip_rows,
            row_count: cli.row_count,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Project-root .env first so CPI_* overrides are visible to clap
    let config = Config::from_env();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    debug!("Loaded config: {:?}", config);
    let cli = Cli::parse();

    let importer = CpiImporter::new(cli.into());
    info!(
        "Extracting CPI from {} (sheet {:?}, columns {})",
        importer.options().input_file.display(),
        importer.options().sheet_name,
        importer.options().columns
    );

    let cpi = importer.run()?;

    println!("\nFirst few rows:");
    println!("{}", cpi.head(PREVIEW_ROWS));
    println!("\nLast few rows:");
    println!("{}", cpi.tail(PREVIEW_ROWS));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults_match_extract_options() {
        let cli = Cli::try_parse_from(["prep-bls-cpi"]).unwrap();
        assert_eq!(CpiExtractOptions::from(cli), CpiExtractOptions::default());
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::try_parse_from([
            "prep-bls-cpi",
            "--columns",
            "A,C",
            "--skip-rows",
            "3",
            "--row-count",
            "10",
        ])
        .unwrap();
        let opts = CpiExtractOptions::from(cli);
        assert_eq!(opts.columns, "A,C");
        assert_eq!(opts.skip_rows, 3);
        assert_eq!(opts.row_count, 10);
    }
}
