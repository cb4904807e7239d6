//! Catalog domain module (local producers and their products).
//!
//! This crate owns the two record collections, the validation applied at the
//! write boundary, and the derived views the dashboard reads (histograms,
//! seasonal filter, price tertiles, distance aggregates). It performs no IO
//! itself; persistence is reached through [`CatalogRepository`].

pub mod producer;
pub mod product;
pub mod queries;
pub mod sample;
pub mod store;

pub use producer::{Certification, Location, NewProducer, Producer, parse_tags};
pub use product::{NewProduct, Product, Season, Unit};
pub use queries::{CatalogSummary, Histogram, PriceCategory, PriceTertiles};
pub use store::{
    CatalogError, CatalogRepository, CatalogSnapshot, CatalogStore, ReferencePolicy,
    RepositoryError,
};
