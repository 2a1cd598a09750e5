use calamine::{open_workbook_auto, Data, Range, Reader};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::utils::{column_letter, parse_column_selector};

/// Canonical output header, independent of the source sheet's labels
pub const CSV_HEADER: [&str; 2] = ["year", "annual_avg_cpi"];

// BLS historical CPI-U workbook layout (August 2025 release, 1913-2024)
pub const DEFAULT_INPUT_FILE: &str = "data/raw/historical-cpi-u-202508.xlsx";
pub const DEFAULT_OUTPUT_FILE: &str = "data/cpi_1913_2024.csv";
pub const DEFAULT_SHEET_NAME: &str = "Index averages";
pub const DEFAULT_COLUMNS: &str = "B,E";
pub const DEFAULT_SKIP_ROWS: usize = 5;
pub const DEFAULT_ROW_COUNT: usize = 112;

#[derive(Error, Debug)]
pub enum CpiImportError {
    #[error("Workbook not found: {}", .0.display())]
    WorkbookNotFound(PathBuf),

    #[error("Failed to open workbook: {0}")]
    WorkbookOpen(String),

    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    #[error("Malformed region in sheet {sheet}: {msg}")]
    MalformedRegion { sheet: String, msg: String },

    #[error("Invalid column selector {selector:?}: {msg}")]
    InvalidColumnSelector { selector: String, msg: String },

    #[error("Invalid data at row {row}, col {col}: {msg}")]
    InvalidData { row: usize, col: String, msg: String },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// One year of the CPI-U annual average index (1982-84=100)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CpiRecord {
    pub year: i64,
    pub annual_avg_cpi: f64,
}

/// Extracted CPI records in source row order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CpiTable {
    records: Vec<CpiRecord>,
}

impl CpiTable {
    pub fn new(records: Vec<CpiRecord>) -> Self {
        Self { records }
    }

    /// Load a table previously written by [`CpiTable::write_csv`]
    pub fn from_csv(path: impl AsRef<Path>) -> Result<Self, CpiImportError> {
        let mut reader = csv::Reader::from_path(path.as_ref())?;
        let records = reader
            .deserialize()
            .collect::<Result<Vec<CpiRecord>, _>>()?;
        Ok(Self { records })
    }

    pub fn records(&self) -> &[CpiRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Smallest and largest year in the table, `None` when empty
    pub fn year_range(&self) -> Option<(i64, i64)> {
        let min = self.records.iter().map(|r| r.year).min()?;
        let max = self.records.iter().map(|r| r.year).max()?;
        Some((min, max))
    }

    pub fn head(&self, n: usize) -> CpiTable {
        Self::new(self.records.iter().take(n).copied().collect())
    }

    pub fn tail(&self, n: usize) -> CpiTable {
        let skip = self.records.len().saturating_sub(n);
        Self::new(self.records[skip..].to_vec())
    }

    /// Write the table as `year,annual_avg_cpi` CSV, creating parent directories
    ///
    /// The header is always written, so an empty table yields a header-only file.
    /// Existing files are overwritten.
    pub fn write_csv(&self, path: impl AsRef<Path>) -> Result<(), CpiImportError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(path)?;
        writer.write_record(CSV_HEADER)?;
        for record in &self.records {
            writer.serialize(record)?;
        }
        writer.flush()?;

        debug!("Wrote {} CPI rows to {}", self.records.len(), path.display());
        Ok(())
    }
}

impl fmt::Display for CpiTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let years: Vec<String> = self.records.iter().map(|r| r.year.to_string()).collect();
        let values: Vec<String> = self
            .records
            .iter()
            .map(|r| format!("{:?}", r.annual_avg_cpi))
            .collect();

        let year_width = years.iter().map(String::len).fold(CSV_HEADER[0].len(), usize::max);
        let value_width = values.iter().map(String::len).fold(CSV_HEADER[1].len(), usize::max);

        write!(
            f,
            "{:>year_width$}  {:>value_width$}",
            CSV_HEADER[0], CSV_HEADER[1]
        )?;
        for (year, value) in years.iter().zip(&values) {
            write!(f, "\n{year:>year_width$}  {value:>value_width$}")?;
        }
        Ok(())
    }
}

/// Where to find the CPI region and where to write the normalized CSV
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CpiExtractOptions {
    pub input_file: PathBuf,
    pub output_file: PathBuf,
    pub sheet_name: String,
    /// Excel column selector resolving to exactly two columns (year, annual average)
    pub columns: String,
    /// Rows skipped before the source header row
    pub skip_rows: usize,
    /// Data rows read after the source header row
    pub row_count: usize,
}

impl Default for CpiExtractOptions {
    fn default() -> Self {
        Self {
            input_file: PathBuf::from(DEFAULT_INPUT_FILE),
            output_file: PathBuf::from(DEFAULT_OUTPUT_FILE),
            sheet_name: DEFAULT_SHEET_NAME.to_string(),
            columns: DEFAULT_COLUMNS.to_string(),
            skip_rows: DEFAULT_SKIP_ROWS,
            row_count: DEFAULT_ROW_COUNT,
        }
    }
}

/// Extracts the year / annual-average columns from the BLS historical CPI-U workbook
pub struct CpiImporter {
    options: CpiExtractOptions,
}

impl CpiImporter {
    pub fn new(options: CpiExtractOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &CpiExtractOptions {
        &self.options
    }

    /// Extract the CPI table, write it to the output CSV and report progress on stdout
    ///
    /// Nothing is written unless the whole region was read and converted.
    pub fn run(&self) -> Result<CpiTable, CpiImportError> {
        self.run_with_progress(&mut io::stdout().lock())
    }

    /// Same as [`CpiImporter::run`], with progress lines going to `progress`
    pub fn run_with_progress<W: Write>(&self, progress: &mut W) -> Result<CpiTable, CpiImportError> {
        let table = self.extract()?;
        table.write_csv(&self.options.output_file)?;

        writeln!(progress, "CPI data processed successfully!")?;
        writeln!(progress, "Rows extracted: {}", table.len())?;
        match table.year_range() {
            Some((first, last)) => writeln!(progress, "Years covered: {first} - {last}")?,
            None => writeln!(progress, "Years covered: none")?,
        }
        writeln!(progress, "Saved to: {}", self.options.output_file.display())?;

        info!(
            "Extracted {} CPI rows to {}",
            table.len(),
            self.options.output_file.display()
        );
        Ok(table)
    }

    /// Read the configured region into memory without writing anything
    ///
    /// # Expected Sheet Structure:
    /// ```text
    /// Rows 1..=skip_rows: Title / notes (ignored)
    /// Row skip_rows+1:    Column labels (replaced by year, annual_avg_cpi)
    /// Next row_count rows: Year | ... | Annual average
    /// ```
    pub fn extract(&self) -> Result<CpiTable, CpiImportError> {
        let opts = &self.options;
        let (year_col, cpi_col) = self.selected_columns()?;

        match fs::metadata(&opts.input_file) {
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(CpiImportError::WorkbookNotFound(opts.input_file.clone()));
            }
            Err(e) => return Err(CpiImportError::Io(e)),
        }

        info!(
            "Reading sheet {:?} from {}",
            opts.sheet_name,
            opts.input_file.display()
        );
        let mut workbook = open_workbook_auto(&opts.input_file)
            .map_err(|e| CpiImportError::WorkbookOpen(e.to_string()))?;

        if !workbook.sheet_names().iter().any(|name| name == &opts.sheet_name) {
            return Err(CpiImportError::SheetNotFound(opts.sheet_name.clone()));
        }
        let range = workbook
            .worksheet_range(&opts.sheet_name)
            .map_err(|e| CpiImportError::WorkbookOpen(e.to_string()))?;

        let last_row = self.check_extent(&range, cpi_col)?;

        let header_row = opts.skip_rows;
        debug!(
            "Source labels {:?} / {:?} renamed to {} / {}",
            cell_label(&range, header_row, year_col),
            cell_label(&range, header_row, cpi_col),
            CSV_HEADER[0],
            CSV_HEADER[1]
        );

        let mut records = Vec::with_capacity(opts.row_count);
        for row in (header_row + 1)..=last_row {
            records.push(CpiRecord {
                year: parse_year(&range, row, year_col)?,
                annual_avg_cpi: parse_index_value(&range, row, cpi_col)?,
            });
        }

        debug!("Read {} CPI rows from sheet {}", records.len(), opts.sheet_name);
        Ok(CpiTable::new(records))
    }

    /// Resolve the selector to (year column, index column)
    fn selected_columns(&self) -> Result<(usize, usize), CpiImportError> {
        let selector = &self.options.columns;
        let invalid = |msg: String| CpiImportError::InvalidColumnSelector {
            selector: selector.clone(),
            msg,
        };

        let columns = parse_column_selector(selector).map_err(|e| invalid(e.to_string()))?;
        match columns.as_slice() {
            [year, cpi] => Ok((*year, *cpi)),
            other => Err(invalid(format!(
                "expected exactly 2 columns, got {}",
                other.len()
            ))),
        }
    }

    /// The header row, every data row and the rightmost column must lie inside the used range
    ///
    /// Returns the 0-based index of the last data row.
    fn check_extent(&self, range: &Range<Data>, last_col: usize) -> Result<usize, CpiImportError> {
        let opts = &self.options;
        let malformed = |msg: String| CpiImportError::MalformedRegion {
            sheet: opts.sheet_name.clone(),
            msg,
        };

        let (end_row, end_col) = range
            .end()
            .ok_or_else(|| malformed("sheet is empty".to_string()))?;
        let (end_row, end_col) = (end_row as usize, end_col as usize);

        let last_row = opts.skip_rows.checked_add(opts.row_count).ok_or_else(|| {
            malformed(format!(
                "skip_rows {} plus row_count {} overflows",
                opts.skip_rows, opts.row_count
            ))
        })?;
        if last_row > end_row {
            return Err(malformed(format!(
                "rows {}-{} requested but sheet ends at row {}",
                opts.skip_rows.saturating_add(1),
                last_row.saturating_add(1),
                end_row + 1
            )));
        }
        if last_col > end_col {
            return Err(malformed(format!(
                "column {} requested but sheet ends at column {}",
                column_letter(last_col),
                column_letter(end_col)
            )));
        }
        Ok(last_row)
    }
}

/// Run the extraction with the given options (see [`CpiExtractOptions::default`])
pub fn prep_bls_cpi(options: CpiExtractOptions) -> Result<CpiTable, CpiImportError> {
    CpiImporter::new(options).run()
}

static EMPTY: Data = Data::Empty;

/// Cell at an absolute sheet position; positions outside the used range read as empty
fn cell(range: &Range<Data>, row: usize, col: usize) -> &Data {
    range
        .get_value((row as u32, col as u32))
        .unwrap_or(&EMPTY)
}

fn cell_label(range: &Range<Data>, row: usize, col: usize) -> String {
    cell(range, row, col).to_string()
}

fn invalid_data(row: usize, col: usize, msg: String) -> CpiImportError {
    CpiImportError::InvalidData {
        row: row + 1,
        col: column_letter(col),
        msg,
    }
}

/// Parse a year, accepting whole-number floats since xlsx stores numbers as doubles
fn parse_year(range: &Range<Data>, row: usize, col: usize) -> Result<i64, CpiImportError> {
    match cell(range, row, col) {
        Data::Int(i) => Ok(*i),
        Data::Float(f) if f.is_finite() && f.fract() == 0.0 => Ok(*f as i64),
        Data::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| invalid_data(row, col, format!("Cannot parse year: {s}"))),
        Data::Empty => Err(invalid_data(row, col, "Missing year".to_string())),
        other => Err(invalid_data(
            row,
            col,
            format!("Expected year, got: {other:?}"),
        )),
    }
}

/// Parse an annual average index value
fn parse_index_value(range: &Range<Data>, row: usize, col: usize) -> Result<f64, CpiImportError> {
    match cell(range, row, col) {
        Data::Float(f) => Ok(*f),
        Data::Int(i) => Ok(*i as f64),
        Data::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| invalid_data(row, col, format!("Cannot parse index value: {s}"))),
        Data::Empty => Err(invalid_data(row, col, "Missing index value".to_string())),
        other => Err(invalid_data(
            row,
            col,
            format!("Expected number, got: {other:?}"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> CpiTable {
        CpiTable::new(vec![
            CpiRecord { year: 1913, annual_avg_cpi: 9.9 },
            CpiRecord { year: 1914, annual_avg_cpi: 10.0 },
            CpiRecord { year: 1915, annual_avg_cpi: 10.1 },
        ])
    }

    #[test]
    fn test_default_options() {
        let opts = CpiExtractOptions::default();
        assert_eq!(opts.sheet_name, "Index averages");
        assert_eq!(opts.columns, "B,E");
        assert_eq!(opts.skip_rows, 5);
        assert_eq!(opts.row_count, 112);
        assert_eq!(opts.output_file, PathBuf::from("data/cpi_1913_2024.csv"));
    }

    #[test]
    fn test_selected_columns_default() {
        let importer = CpiImporter::new(CpiExtractOptions::default());
        assert_eq!(importer.selected_columns().unwrap(), (1, 4));
    }

    #[test]
    fn test_selected_columns_requires_two() {
        let importer = CpiImporter::new(CpiExtractOptions {
            columns: "B:D".to_string(),
            ..Default::default()
        });
        assert!(matches!(
            importer.selected_columns(),
            Err(CpiImportError::InvalidColumnSelector { .. })
        ));
    }

    #[test]
    fn test_year_range() {
        assert_eq!(sample_table().year_range(), Some((1913, 1915)));
        assert_eq!(CpiTable::default().year_range(), None);
    }

    #[test]
    fn test_head_and_tail() {
        let table = sample_table();
        assert_eq!(table.head(2).records()[1].year, 1914);
        assert_eq!(table.tail(1).records(), &[CpiRecord { year: 1915, annual_avg_cpi: 10.1 }]);
        assert_eq!(table.tail(10).len(), 3);
    }

    #[test]
    fn test_display_alignment() {
        let rendered = sample_table().head(1).to_string();
        assert_eq!(rendered, "year  annual_avg_cpi\n1913             9.9");
    }

    #[test]
    fn test_parse_year_whole_float() {
        let mut range = Range::new((0, 0), (0, 2));
        range.set_value((0, 0), Data::Float(1913.0));
        range.set_value((0, 1), Data::Float(1913.5));
        range.set_value((0, 2), Data::String(" 1914 ".to_string()));

        assert_eq!(parse_year(&range, 0, 0).unwrap(), 1913);
        assert!(matches!(
            parse_year(&range, 0, 1),
            Err(CpiImportError::InvalidData { row: 1, .. })
        ));
        assert_eq!(parse_year(&range, 0, 2).unwrap(), 1914);
    }

    #[test]
    fn test_parse_index_value_rejects_text() {
        let mut range = Range::new((0, 0), (0, 1));
        range.set_value((0, 0), Data::Int(100));
        range.set_value((0, 1), Data::String("Annual avg.".to_string()));

        assert_eq!(parse_index_value(&range, 0, 0).unwrap(), 100.0);
        match parse_index_value(&range, 0, 1) {
            Err(CpiImportError::InvalidData { row, col, .. }) => {
                assert_eq!(row, 1);
                assert_eq!(col, "B");
            }
            other => panic!("Expected InvalidData error, got {other:?}"),
        }
    }
}
