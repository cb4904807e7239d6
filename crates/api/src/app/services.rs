//! Service wiring: builds the catalog the routes share.

use std::sync::Arc;

use anyhow::Context;

use foodshed_catalog::{CatalogSnapshot, CatalogStore};
use foodshed_infra::CsvCatalogRepository;

use crate::config::AppConfig;

/// Shared state injected into every route.
#[derive(Debug)]
pub struct AppServices {
    pub catalog: Arc<CatalogStore>,
    pub local_threshold_miles: f64,
}

impl AppServices {
    pub fn new(catalog: Arc<CatalogStore>, local_threshold_miles: f64) -> Self {
        Self {
            catalog,
            local_threshold_miles,
        }
    }
}

/// Open the catalog described by `config`.
///
/// With a data directory the catalog is CSV-backed (seeded with the sample
/// dataset when the files do not exist yet); otherwise it lives in memory.
pub fn build_services(config: &AppConfig) -> anyhow::Result<Arc<AppServices>> {
    let catalog = match &config.data_dir {
        Some(dir) => {
            let repo = CsvCatalogRepository::open(dir)
                .with_context(|| format!("failed to open data directory {}", dir.display()))?;
            tracing::info!(data_dir = %dir.display(), "using csv-backed catalog");
            CatalogStore::open(Arc::new(repo), config.reference_policy)?
        }
        None if config.seed_sample => {
            tracing::info!("using in-memory catalog seeded with sample data");
            CatalogStore::from_snapshot(CatalogSnapshot::sample(), config.reference_policy)?
        }
        None => {
            tracing::info!("using empty in-memory catalog");
            CatalogStore::with_policy(config.reference_policy)
        }
    };

    Ok(Arc::new(AppServices::new(
        Arc::new(catalog),
        config.local_threshold_miles,
    )))
}
