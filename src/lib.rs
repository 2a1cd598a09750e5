pub mod config;
pub mod importers;
pub mod utils;
