//! The catalog store: two append-only collections behind one lock.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use foodshed_core::{DomainError, entity::find_by_id};

use crate::producer::{NewProducer, Producer};
use crate::product::{NewProduct, Product};
use crate::queries::{self, CatalogSummary, Histogram, PriceTertiles};

/// Error type returned by repository adapters.
pub type RepositoryError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CatalogError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("storage error: {0}")]
    Storage(String),
}

impl CatalogError {
    /// The domain error, if this was a domain-level rejection.
    pub fn as_domain(&self) -> Option<&DomainError> {
        match self {
            CatalogError::Domain(e) => Some(e),
            CatalogError::Storage(_) => None,
        }
    }
}

/// What to do with a product whose producer is not in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferencePolicy {
    /// Refuse the write with `DanglingReference`.
    #[default]
    Reject,
    /// Accept the write and log a warning.
    Warn,
}

impl core::str::FromStr for ReferencePolicy {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(ReferencePolicy::Reject),
            "warn" => Ok(ReferencePolicy::Warn),
            other => Err(DomainError::validation(format!(
                "reference policy must be one of: reject, warn (got {other:?})"
            ))),
        }
    }
}

/// Raw rows of both collections, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    pub producers: Vec<NewProducer>,
    pub products: Vec<NewProduct>,
}

/// Persistence seam for the catalog.
///
/// Appends are write-through: the store calls them before mutating memory, so
/// a failed append leaves the catalog unchanged.
pub trait CatalogRepository: Send + Sync + fmt::Debug {
    /// Load previously persisted rows; `None` when nothing has been persisted yet.
    fn load(&self) -> Result<Option<CatalogSnapshot>, RepositoryError>;

    /// Persist an initial dataset, replacing whatever is there.
    fn seed(&self, snapshot: &CatalogSnapshot) -> Result<(), RepositoryError>;

    fn append_producer(&self, producer: &Producer) -> Result<(), RepositoryError>;

    fn append_product(&self, product: &Product) -> Result<(), RepositoryError>;
}

#[derive(Debug, Default)]
struct CatalogState {
    producers: Vec<Producer>,
    products: Vec<Product>,
}

/// Producer and product collections with their derived queries.
///
/// One exclusive lock guards both collections for the duration of a single
/// add or query call.
#[derive(Debug, Default)]
pub struct CatalogStore {
    state: Mutex<CatalogState>,
    repository: Option<Arc<dyn CatalogRepository>>,
    policy: ReferencePolicy,
}

impl CatalogStore {
    /// Empty in-memory catalog with the default reference policy.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: ReferencePolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    /// In-memory catalog pre-populated from a snapshot.
    pub fn from_snapshot(
        snapshot: CatalogSnapshot,
        policy: ReferencePolicy,
    ) -> Result<Self, CatalogError> {
        let store = Self::with_policy(policy);
        store.restore(snapshot)?;
        Ok(store)
    }

    /// Catalog backed by a repository.
    ///
    /// Loads persisted rows; when the repository is empty it is seeded with
    /// the built-in sample dataset first.
    pub fn open(
        repository: Arc<dyn CatalogRepository>,
        policy: ReferencePolicy,
    ) -> Result<Self, CatalogError> {
        let snapshot = match repository.load().map_err(storage)? {
            Some(snapshot) => snapshot,
            None => {
                let sample = CatalogSnapshot::sample();
                repository.seed(&sample).map_err(storage)?;
                tracing::info!("seeded empty catalog with sample dataset");
                sample
            }
        };

        let mut store = Self::with_policy(policy);
        store.restore(snapshot)?;
        store.repository = Some(repository);
        Ok(store)
    }

    pub fn policy(&self) -> ReferencePolicy {
        self.policy
    }

    fn lock(&self) -> Result<MutexGuard<'_, CatalogState>, CatalogError> {
        self.state
            .lock()
            .map_err(|_| CatalogError::Storage("catalog lock poisoned".to_string()))
    }

    /// Re-apply the live write rules to each row without persisting.
    fn restore(&self, snapshot: CatalogSnapshot) -> Result<(), CatalogError> {
        let mut state = self.lock()?;
        for row in snapshot.producers {
            let name = row.name.clone();
            if let Err(e) = self.insert_producer(&mut state, row, false) {
                tracing::warn!(producer = %name, error = %e, "skipping invalid producer row");
            }
        }
        for row in snapshot.products {
            let name = row.name.clone();
            if let Err(e) = self.insert_product(&mut state, row, false) {
                tracing::warn!(product = %name, error = %e, "skipping invalid product row");
            }
        }
        Ok(())
    }

    fn insert_producer(
        &self,
        state: &mut CatalogState,
        row: NewProducer,
        persist: bool,
    ) -> Result<Producer, CatalogError> {
        let producer = row.validate()?;
        if find_by_id(&state.producers, producer.name()).is_some() {
            return Err(DomainError::conflict(format!(
                "producer {:?} already exists",
                producer.name()
            ))
            .into());
        }
        if persist {
            if let Some(repo) = &self.repository {
                repo.append_producer(&producer).map_err(storage)?;
            }
        }
        state.producers.push(producer.clone());
        Ok(producer)
    }

    fn insert_product(
        &self,
        state: &mut CatalogState,
        row: NewProduct,
        persist: bool,
    ) -> Result<Product, CatalogError> {
        let product = row.validate()?;
        if find_by_id(&state.producers, product.producer_name()).is_none() {
            match self.policy {
                ReferencePolicy::Reject => {
                    return Err(DomainError::dangling(format!(
                        "product {:?} references unknown producer {:?}",
                        product.name(),
                        product.producer_name()
                    ))
                    .into());
                }
                ReferencePolicy::Warn => {
                    tracing::warn!(
                        product = %product.name(),
                        producer = %product.producer_name(),
                        "product references unknown producer"
                    );
                }
            }
        }
        if persist {
            if let Some(repo) = &self.repository {
                repo.append_product(&product).map_err(storage)?;
            }
        }
        state.products.push(product.clone());
        Ok(product)
    }

    /// Validate and append a producer.
    pub fn add_producer(&self, row: NewProducer) -> Result<Producer, CatalogError> {
        let mut state = self.lock()?;
        let producer = self.insert_producer(&mut state, row, true)?;
        tracing::info!(
            producer = %producer.name(),
            certification = %producer.certification(),
            "producer added"
        );
        Ok(producer)
    }

    /// Validate and append a product.
    pub fn add_product(&self, row: NewProduct) -> Result<Product, CatalogError> {
        let mut state = self.lock()?;
        let product = self.insert_product(&mut state, row, true)?;
        tracing::info!(
            product = %product.name(),
            producer = %product.producer_name(),
            "product added"
        );
        Ok(product)
    }

    pub fn list_producers(&self) -> Result<Vec<Producer>, CatalogError> {
        Ok(self.lock()?.producers.clone())
    }

    pub fn list_products(&self) -> Result<Vec<Product>, CatalogError> {
        Ok(self.lock()?.products.clone())
    }

    pub fn producer(&self, name: &str) -> Result<Producer, CatalogError> {
        let state = self.lock()?;
        find_by_id(&state.producers, name)
            .cloned()
            .ok_or_else(|| DomainError::not_found(format!("producer {name:?}")).into())
    }

    pub fn products_by_producer(&self, name: &str) -> Result<Vec<Product>, CatalogError> {
        let state = self.lock()?;
        Ok(state
            .products
            .iter()
            .filter(|p| p.producer_name() == name)
            .cloned()
            .collect())
    }

    pub fn certification_histogram(&self) -> Result<Histogram, CatalogError> {
        Ok(queries::certification_histogram(&self.lock()?.producers))
    }

    pub fn season_histogram(&self) -> Result<Histogram, CatalogError> {
        Ok(queries::season_histogram(&self.lock()?.products))
    }

    pub fn seasonal_products(&self, label: &str) -> Result<Vec<Product>, CatalogError> {
        Ok(queries::seasonal_products(&self.lock()?.products, label))
    }

    pub fn price_categories(&self) -> Result<PriceTertiles, CatalogError> {
        Ok(queries::price_categories(&self.lock()?.products)?)
    }

    pub fn local_producer_count(&self, threshold_miles: f64) -> Result<usize, CatalogError> {
        Ok(queries::local_producer_count(
            &self.lock()?.producers,
            threshold_miles,
        )?)
    }

    pub fn average_distance(&self) -> Result<f64, CatalogError> {
        Ok(queries::average_distance(&self.lock()?.producers)?)
    }

    pub fn summary(&self, local_threshold_miles: f64) -> Result<CatalogSummary, CatalogError> {
        let state = self.lock()?;
        Ok(CatalogSummary {
            producer_count: state.producers.len(),
            product_count: state.products.len(),
            average_distance_miles: queries::average_distance(&state.producers).ok(),
            local_threshold_miles,
            local_producer_count: queries::local_producer_count(
                &state.producers,
                local_threshold_miles,
            )?,
        })
    }
}

fn storage(e: RepositoryError) -> CatalogError {
    CatalogError::Storage(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn farm(name: &str, distance: f64) -> NewProducer {
        NewProducer {
            name: name.to_string(),
            distance_miles: distance,
            product_tags: vec!["Vegetables".to_string()],
            certification: "Organic".to_string(),
            location: None,
        }
    }

    fn item(name: &str, producer: &str) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            price_per_unit: 3.0,
            unit: "lb".to_string(),
            season: "Summer".to_string(),
            producer_name: producer.to_string(),
        }
    }

    /// Records appends; optionally fails them.
    #[derive(Debug, Default)]
    struct RecordingRepository {
        fail: bool,
        persisted: Option<CatalogSnapshot>,
        seeded: Mutex<Option<CatalogSnapshot>>,
        producers: Mutex<Vec<String>>,
        products: Mutex<Vec<String>>,
    }

    impl CatalogRepository for RecordingRepository {
        fn load(&self) -> Result<Option<CatalogSnapshot>, RepositoryError> {
            Ok(self.persisted.clone())
        }

        fn seed(&self, snapshot: &CatalogSnapshot) -> Result<(), RepositoryError> {
            *self.seeded.lock().unwrap() = Some(snapshot.clone());
            Ok(())
        }

        fn append_producer(&self, producer: &Producer) -> Result<(), RepositoryError> {
            if self.fail {
                return Err("disk full".into());
            }
            self.producers.lock().unwrap().push(producer.name().to_string());
            Ok(())
        }

        fn append_product(&self, product: &Product) -> Result<(), RepositoryError> {
            if self.fail {
                return Err("disk full".into());
            }
            self.products.lock().unwrap().push(product.name().to_string());
            Ok(())
        }
    }

    #[test]
    fn list_producers_preserves_insertion_order() {
        let store = CatalogStore::new();
        for name in ["c", "a", "b"] {
            store.add_producer(farm(name, 1.0)).unwrap();
        }
        let names = store
            .list_producers()
            .unwrap()
            .into_iter()
            .map(|p| p.name().to_string())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["c", "a", "b"]);
    }

    #[test]
    fn rejected_producer_leaves_catalog_unchanged() {
        let store = CatalogStore::new();
        store.add_producer(farm("Green Acres Farm", 15.0)).unwrap();
        let before = store.list_producers().unwrap();

        let err = store.add_producer(farm("", -5.0)).unwrap_err();
        assert!(matches!(err, CatalogError::Domain(DomainError::Validation(_))));
        assert_eq!(store.list_producers().unwrap(), before);
    }

    #[test]
    fn duplicate_producer_name_is_a_conflict() {
        let store = CatalogStore::new();
        store.add_producer(farm("Sunny Valley", 25.0)).unwrap();
        let err = store.add_producer(farm("Sunny Valley", 30.0)).unwrap_err();
        assert!(matches!(err, CatalogError::Domain(DomainError::Conflict(_))));
        assert_eq!(store.list_producers().unwrap().len(), 1);
    }

    #[test]
    fn dangling_product_is_rejected_by_default() {
        let store = CatalogStore::new();
        let err = store.add_product(item("Milk", "Nowhere Dairy")).unwrap_err();
        assert!(matches!(
            err,
            CatalogError::Domain(DomainError::DanglingReference(_))
        ));
        assert!(store.list_products().unwrap().is_empty());
    }

    #[test]
    fn dangling_product_is_accepted_under_warn_policy() {
        let store = CatalogStore::with_policy(ReferencePolicy::Warn);
        store.add_product(item("Milk", "Nowhere Dairy")).unwrap();
        assert_eq!(store.list_products().unwrap().len(), 1);
    }

    #[test]
    fn products_by_producer_filters_on_reference() {
        let store = CatalogStore::new();
        store.add_producer(farm("A", 1.0)).unwrap();
        store.add_producer(farm("B", 2.0)).unwrap();
        store.add_product(item("x", "A")).unwrap();
        store.add_product(item("y", "B")).unwrap();
        store.add_product(item("z", "A")).unwrap();
        let names = store
            .products_by_producer("A")
            .unwrap()
            .into_iter()
            .map(|p| p.name().to_string())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["x", "z"]);
    }

    #[test]
    fn producer_lookup_by_name() {
        let store = CatalogStore::from_snapshot(CatalogSnapshot::sample(), ReferencePolicy::Reject).unwrap();
        assert_eq!(store.producer("River Farm").unwrap().distance_miles(), 45.0);
        assert!(matches!(
            store.producer("Nope"),
            Err(CatalogError::Domain(DomainError::NotFound(_)))
        ));
    }

    #[test]
    fn distance_aggregates_match_reference_values() {
        let store = CatalogStore::new();
        for (i, d) in [15.0, 25.0, 45.0, 30.0].into_iter().enumerate() {
            store.add_producer(farm(&format!("farm-{i}"), d)).unwrap();
        }
        assert_eq!(store.average_distance().unwrap(), 28.75);
        assert_eq!(store.local_producer_count(30.0).unwrap(), 3);
    }

    #[test]
    fn average_distance_on_empty_catalog_is_explicit() {
        let store = CatalogStore::new();
        assert!(matches!(
            store.average_distance(),
            Err(CatalogError::Domain(DomainError::InsufficientData { found: 0, .. }))
        ));
        let summary = store.summary(30.0).unwrap();
        assert_eq!(summary.average_distance_miles, None);
        assert_eq!(summary.producer_count, 0);
    }

    #[test]
    fn summary_reports_sample_totals() {
        let store = CatalogStore::from_snapshot(CatalogSnapshot::sample(), ReferencePolicy::Reject).unwrap();
        let summary = store.summary(30.0).unwrap();
        assert_eq!(summary.producer_count, 3);
        assert_eq!(summary.product_count, 3);
        assert_eq!(summary.local_producer_count, 2);
        assert_eq!(summary.average_distance_miles, Some(85.0 / 3.0));
    }

    #[test]
    fn open_seeds_empty_repository_with_sample() {
        let repo = Arc::new(RecordingRepository::default());
        let store = CatalogStore::open(repo.clone(), ReferencePolicy::Reject).unwrap();
        assert_eq!(store.list_producers().unwrap().len(), 3);
        assert_eq!(repo.seeded.lock().unwrap().as_ref(), Some(&CatalogSnapshot::sample()));
    }

    #[test]
    fn open_restores_persisted_rows_and_skips_invalid_ones() {
        let repo = Arc::new(RecordingRepository {
            persisted: Some(CatalogSnapshot {
                producers: vec![farm("A", 1.0), farm("", 2.0), farm("A", 3.0)],
                products: vec![item("x", "A"), item("y", "Ghost")],
            }),
            ..RecordingRepository::default()
        });
        let store = CatalogStore::open(repo.clone(), ReferencePolicy::Reject).unwrap();
        assert_eq!(store.list_producers().unwrap().len(), 1);
        assert_eq!(store.list_products().unwrap().len(), 1);
        assert!(repo.seeded.lock().unwrap().is_none());
        // Restored rows are not written back.
        assert!(repo.producers.lock().unwrap().is_empty());
    }

    #[test]
    fn successful_add_writes_through_to_repository() {
        let repo = Arc::new(RecordingRepository {
            persisted: Some(CatalogSnapshot::default()),
            ..RecordingRepository::default()
        });
        let store = CatalogStore::open(repo.clone(), ReferencePolicy::Reject).unwrap();
        store.add_producer(farm("A", 1.0)).unwrap();
        store.add_product(item("x", "A")).unwrap();
        assert_eq!(*repo.producers.lock().unwrap(), vec!["A".to_string()]);
        assert_eq!(*repo.products.lock().unwrap(), vec!["x".to_string()]);
    }

    #[test]
    fn failed_write_through_does_not_mutate_memory() {
        let repo = Arc::new(RecordingRepository {
            fail: true,
            persisted: Some(CatalogSnapshot::default()),
            ..RecordingRepository::default()
        });
        let store = CatalogStore::open(repo, ReferencePolicy::Reject).unwrap();
        let err = store.add_producer(farm("A", 1.0)).unwrap_err();
        assert!(matches!(err, CatalogError::Storage(_)));
        assert!(store.list_producers().unwrap().is_empty());
    }

    #[test]
    fn restore_surfaces_poisoned_lock() {
        let store = CatalogStore::new();
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = store.state.lock().unwrap();
            panic!("poison the catalog lock");
        }));
        assert!(matches!(
            store.restore(CatalogSnapshot::sample()),
            Err(CatalogError::Storage(_))
        ));
    }

    #[cfg(test)]
    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: valid adds come back in exact insertion order.
            #[test]
            fn list_producers_matches_insertion_order(
                distances in proptest::collection::vec(0.0f64..500.0, 0..40)
            ) {
                let store = CatalogStore::new();
                let mut expected = Vec::new();
                for (i, d) in distances.iter().enumerate() {
                    let name = format!("farm-{i}");
                    store.add_producer(farm(&name, *d)).unwrap();
                    expected.push(name);
                }
                let listed = store
                    .list_producers()
                    .unwrap()
                    .into_iter()
                    .map(|p| p.name().to_string())
                    .collect::<Vec<_>>();
                prop_assert_eq!(listed, expected);
                prop_assert_eq!(
                    store.certification_histogram().unwrap().total(),
                    distances.len()
                );
            }
        }
    }
}
