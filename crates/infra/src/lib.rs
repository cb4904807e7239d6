//! Infrastructure layer: file-backed persistence adapters.

pub mod csv_store;

pub use csv_store::{CsvCatalogRepository, CsvRepositoryError};
