/// Shared utility functions for spreadsheet column handling
use regex::Regex;
use std::collections::BTreeSet;
use thiserror::Error;

/// Excel's last column is XFD (16,384 columns)
const MAX_COLUMNS: usize = 16_384;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ColumnSelectorError {
    #[error("Empty column selector")]
    Empty,

    #[error("Invalid column reference: {0}")]
    InvalidReference(String),

    #[error("Column out of range: {0}")]
    OutOfRange(String),

    #[error("Reversed column range: {0}")]
    ReversedRange(String),
}

/// Convert a column letter reference ("A", "e", "AA") to a 0-based index
///
/// # Examples
///
/// ```
/// use cpi_prep::utils::column_index;
///
/// assert_eq!(column_index("A").unwrap(), 0);
/// assert_eq!(column_index("e").unwrap(), 4);
/// assert_eq!(column_index("AA").unwrap(), 26);
/// ```
pub fn column_index(letters: &str) -> Result<usize, ColumnSelectorError> {
    let trimmed = letters.trim();
    if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(ColumnSelectorError::InvalidReference(letters.to_string()));
    }

    let mut index = 0usize;
    for c in trimmed.chars() {
        let digit = (c.to_ascii_uppercase() as u8 - b'A') as usize + 1;
        index = index * 26 + digit;
        if index > MAX_COLUMNS {
            return Err(ColumnSelectorError::OutOfRange(trimmed.to_string()));
        }
    }

    Ok(index - 1)
}

/// Convert a 0-based column index back to its letter reference (0 -> "A")
pub fn column_letter(index: usize) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push((b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// Parse an Excel-style column selector into sorted, distinct 0-based indices
///
/// Accepts comma-separated letters and `X:Y` ranges, e.g. `"B,E"` or `"A:C,F"`.
/// Columns come back in sheet order regardless of the order they were listed in.
///
/// # Examples
///
/// ```
/// use cpi_prep::utils::parse_column_selector;
///
/// assert_eq!(parse_column_selector("B,E").unwrap(), vec![1, 4]);
/// assert_eq!(parse_column_selector("A:C").unwrap(), vec![0, 1, 2]);
/// ```
pub fn parse_column_selector(selector: &str) -> Result<Vec<usize>, ColumnSelectorError> {
    let re = Regex::new(r"^\s*([A-Za-z]{1,3})\s*(?::\s*([A-Za-z]{1,3})\s*)?$")
        .map_err(|_| ColumnSelectorError::InvalidReference(selector.to_string()))?;

    if selector.trim().is_empty() {
        return Err(ColumnSelectorError::Empty);
    }

    let mut columns = BTreeSet::new();
    for part in selector.split(',') {
        let caps = re
            .captures(part)
            .ok_or_else(|| ColumnSelectorError::InvalidReference(part.trim().to_string()))?;

        let start = column_index(&caps[1])?;
        match caps.get(2) {
            Some(end) => {
                let end = column_index(end.as_str())?;
                if end < start {
                    return Err(ColumnSelectorError::ReversedRange(part.trim().to_string()));
                }
                columns.extend(start..=end);
            }
            None => {
                columns.insert(start);
            }
        }
    }

    Ok(columns.into_iter().collect())
}
