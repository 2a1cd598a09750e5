// ! Importers for published economic data spreadsheets

pub mod cpi_importer;

// Re-export commonly used items
pub use cpi_importer::{prep_bls_cpi, CpiExtractOptions, CpiImporter, CpiRecord, CpiTable};
