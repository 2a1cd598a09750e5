// Fixture workbooks shaped like the BLS historical CPI-U release

use rust_xlsxwriter::Workbook;
use std::path::Path;

pub const SHEET_NAME: &str = "Index averages";

/// Write a workbook with 5 title rows, a label row and `years` data rows
///
/// Data starts at 1913 with an annual average of 9.9 and rises by 0.5 per year.
/// Year is in column B, the annual average in column E, monthly filler in C and D.
pub fn write_cpi_workbook(path: &Path, years: usize) {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME).expect("Failed to name sheet");

    let titles = [
        "Historical Consumer Price Index for All Urban Consumers (CPI-U)",
        "U.S. city average, all items, by month",
        "Index averages",
        "(1982-84=100, unless otherwise noted)",
        "",
    ];
    for (row, title) in titles.iter().enumerate() {
        if !title.is_empty() {
            sheet
                .write_string(row as u32, 0, *title)
                .expect("Failed to write title");
        }
    }

    for (col, label) in ["Year", "Jan.", "Feb.", "Annual avg."].iter().enumerate() {
        sheet
            .write_string(5, col as u16 + 1, *label)
            .expect("Failed to write label");
    }

    for i in 0..years {
        let row = 6 + i as u32;
        sheet
            .write_number(row, 1, 1913.0 + i as f64)
            .expect("Failed to write year");
        sheet
            .write_number(row, 2, 9.8 + i as f64 * 0.5)
            .expect("Failed to write Jan");
        sheet
            .write_number(row, 3, 9.8 + i as f64 * 0.5)
            .expect("Failed to write Feb");
        sheet
            .write_number(row, 4, cpi_value(i))
            .expect("Failed to write annual average");
    }

    workbook.save(path).expect("Failed to save fixture workbook");
}

/// Annual average written for the `i`-th data row
pub fn cpi_value(i: usize) -> f64 {
    9.9 + i as f64 * 0.5
}
