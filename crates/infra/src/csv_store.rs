//! Flat-file catalog repository: one CSV file per collection.
//!
//! Layout (header row first, standard CSV quoting):
//! - `producers.csv`: `name,distance_miles,product_tags,certification,lat,lon`
//! - `products.csv`: `name,price_per_unit,unit,season,producer_name`
//!
//! `product_tags` is stored comma-joined inside a single quoted field; empty
//! `lat`/`lon` means the producer has no location.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;

use foodshed_catalog::{
    CatalogRepository, CatalogSnapshot, Location, NewProducer, NewProduct, Producer, Product,
    RepositoryError, parse_tags,
};

pub const PRODUCERS_FILE: &str = "producers.csv";
pub const PRODUCTS_FILE: &str = "products.csv";

#[derive(Debug, Error)]
pub enum CsvRepositoryError {
    #[error("io error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("csv error on {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error(
        "incomplete location in {} for producer {name:?} (lat and lon must both be set)",
        .path.display()
    )]
    PartialLocation { path: PathBuf, name: String },
}

/// On-disk shape of a producer row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ProducerRow {
    name: String,
    distance_miles: f64,
    product_tags: String,
    certification: String,
    lat: Option<f64>,
    lon: Option<f64>,
}

impl From<&NewProducer> for ProducerRow {
    fn from(p: &NewProducer) -> Self {
        Self {
            name: p.name.clone(),
            distance_miles: p.distance_miles,
            product_tags: p.product_tags.join(","),
            certification: p.certification.clone(),
            lat: p.location.map(|l| l.lat),
            lon: p.location.map(|l| l.lon),
        }
    }
}

impl ProducerRow {
    fn into_new_producer(self, path: &Path) -> Result<NewProducer, CsvRepositoryError> {
        let location = match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Some(Location { lat, lon }),
            (None, None) => None,
            _ => {
                return Err(CsvRepositoryError::PartialLocation {
                    path: path.to_path_buf(),
                    name: self.name,
                });
            }
        };
        Ok(NewProducer {
            product_tags: parse_tags(&self.product_tags),
            name: self.name,
            distance_miles: self.distance_miles,
            certification: self.certification,
            location,
        })
    }
}

/// Write-through CSV repository rooted at a data directory.
#[derive(Debug, Clone)]
pub struct CsvCatalogRepository {
    producers_path: PathBuf,
    products_path: PathBuf,
}

impl CsvCatalogRepository {
    /// Use `dir` as the data directory, creating it if needed.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, CsvRepositoryError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).map_err(|source| CsvRepositoryError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        Ok(Self {
            producers_path: dir.join(PRODUCERS_FILE),
            products_path: dir.join(PRODUCTS_FILE),
        })
    }

    pub fn producers_path(&self) -> &Path {
        &self.producers_path
    }

    pub fn products_path(&self) -> &Path {
        &self.products_path
    }

    fn read_rows<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, CsvRepositoryError> {
        let csv_err = |source| CsvRepositoryError::Csv {
            path: path.to_path_buf(),
            source,
        };
        let mut rdr = csv::Reader::from_path(path).map_err(csv_err)?;
        rdr.deserialize().collect::<Result<Vec<T>, _>>().map_err(csv_err)
    }

    /// Truncate `path` and write a header plus `rows`.
    fn write_rows<T: Serialize>(
        path: &Path,
        header: &[&str],
        rows: &[T],
    ) -> Result<(), CsvRepositoryError> {
        let file = File::create(path).map_err(|source| CsvRepositoryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        let csv_err = |source| CsvRepositoryError::Csv {
            path: path.to_path_buf(),
            source,
        };
        wtr.write_record(header).map_err(csv_err)?;
        for row in rows {
            wtr.serialize(row).map_err(csv_err)?;
        }
        Self::finish(path, wtr)
    }

    /// Append one row, writing the header first when the file is new or empty.
    fn append_row<T: Serialize>(
        path: &Path,
        header: &[&str],
        row: &T,
    ) -> Result<(), CsvRepositoryError> {
        let io_err = |source| CsvRepositoryError::Io {
            path: path.to_path_buf(),
            source,
        };
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(io_err)?;
        let needs_header = file.metadata().map_err(io_err)?.len() == 0;

        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        let csv_err = |source| CsvRepositoryError::Csv {
            path: path.to_path_buf(),
            source,
        };
        if needs_header {
            wtr.write_record(header).map_err(csv_err)?;
        }
        wtr.serialize(row).map_err(csv_err)?;
        Self::finish(path, wtr)
    }

    /// Flush the writer and sync the file to disk.
    fn finish(path: &Path, wtr: csv::Writer<File>) -> Result<(), CsvRepositoryError> {
        let file = wtr.into_inner().map_err(|e| CsvRepositoryError::Io {
            path: path.to_path_buf(),
            source: io::Error::new(e.error().kind(), e.error().to_string()),
        })?;
        file.sync_data().map_err(|source| CsvRepositoryError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

const PRODUCER_HEADER: [&str; 6] = [
    "name",
    "distance_miles",
    "product_tags",
    "certification",
    "lat",
    "lon",
];
const PRODUCT_HEADER: [&str; 5] = ["name", "price_per_unit", "unit", "season", "producer_name"];

impl CatalogRepository for CsvCatalogRepository {
    fn load(&self) -> Result<Option<CatalogSnapshot>, RepositoryError> {
        let producers_exist = self.producers_path.exists();
        let products_exist = self.products_path.exists();
        if !producers_exist && !products_exist {
            return Ok(None);
        }

        let mut snapshot = CatalogSnapshot::default();
        if producers_exist {
            for row in Self::read_rows::<ProducerRow>(&self.producers_path)? {
                snapshot
                    .producers
                    .push(row.into_new_producer(&self.producers_path)?);
            }
        }
        if products_exist {
            snapshot.products = Self::read_rows::<NewProduct>(&self.products_path)?;
        }

        tracing::info!(
            producers = snapshot.producers.len(),
            products = snapshot.products.len(),
            "loaded catalog from csv"
        );
        Ok(Some(snapshot))
    }

    fn seed(&self, snapshot: &CatalogSnapshot) -> Result<(), RepositoryError> {
        let producer_rows = snapshot
            .producers
            .iter()
            .map(ProducerRow::from)
            .collect::<Vec<_>>();
        Self::write_rows(&self.producers_path, &PRODUCER_HEADER, &producer_rows)?;
        Self::write_rows(&self.products_path, &PRODUCT_HEADER, &snapshot.products)?;
        Ok(())
    }

    fn append_producer(&self, producer: &Producer) -> Result<(), RepositoryError> {
        let row = ProducerRow::from(&NewProducer::from(producer));
        Self::append_row(&self.producers_path, &PRODUCER_HEADER, &row)?;
        Ok(())
    }

    fn append_product(&self, product: &Product) -> Result<(), RepositoryError> {
        let row = NewProduct::from(product);
        Self::append_row(&self.products_path, &PRODUCT_HEADER, &row)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use foodshed_catalog::{CatalogStore, ReferencePolicy};

    use super::*;

    fn open_store(dir: &Path) -> CatalogStore {
        let repo = Arc::new(CsvCatalogRepository::open(dir).unwrap());
        CatalogStore::open(repo, ReferencePolicy::Reject).unwrap()
    }

    fn farm(name: &str) -> NewProducer {
        NewProducer {
            name: name.to_string(),
            distance_miles: 12.5,
            product_tags: vec!["Eggs".to_string(), "Honey".to_string()],
            certification: "Regenerative".to_string(),
            location: Some(Location {
                lat: 44.5,
                lon: -72.9,
            }),
        }
    }

    #[test]
    fn missing_files_are_seeded_with_sample_data() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path());
        assert_eq!(store.list_producers().unwrap().len(), 3);

        let producers = fs::read_to_string(dir.path().join(PRODUCERS_FILE)).unwrap();
        assert!(producers.starts_with("name,distance_miles,product_tags,certification,lat,lon\n"));
        assert!(producers.contains("Green Acres Farm,15.0,Vegetables,Organic,,"));

        let products = fs::read_to_string(dir.path().join(PRODUCTS_FILE)).unwrap();
        assert!(products.starts_with("name,price_per_unit,unit,season,producer_name\n"));
        assert_eq!(products.lines().count(), 4);
    }

    #[test]
    fn appended_records_survive_a_restart() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = open_store(dir.path());
            store.add_producer(farm("Hill & Hollow, LLC")).unwrap();
            store
                .add_product(NewProduct {
                    name: "Squash".to_string(),
                    price_per_unit: 1.25,
                    unit: "lb".to_string(),
                    season: "Spring/Fall".to_string(),
                    producer_name: "Hill & Hollow, LLC".to_string(),
                })
                .unwrap();
        }

        let reopened = open_store(dir.path());
        let producer = reopened.producer("Hill & Hollow, LLC").unwrap();
        assert_eq!(producer.product_tags(), ["Eggs".to_string(), "Honey".to_string()]);
        assert_eq!(producer.location(), Some(Location { lat: 44.5, lon: -72.9 }));

        let products = reopened.list_products().unwrap();
        assert_eq!(products.len(), 4);
        assert_eq!(products[3].season().as_str(), "Spring/Fall");
    }

    #[test]
    fn tags_are_unchanged_by_a_restart() {
        let dir = tempfile::tempdir().unwrap();
        let tags = vec!["Stone fruit".to_string(), "Honey".to_string()];
        {
            let store = open_store(dir.path());
            let mut draft = farm("Orchard Row");
            draft.product_tags = tags.clone();
            store.add_producer(draft).unwrap();

            // A comma inside a tag cannot survive the comma-joined column.
            let mut split = farm("Split Farm");
            split.product_tags = vec!["Fruit, stone".to_string(), "Honey".to_string()];
            assert!(store.add_producer(split).is_err());
        }

        let reopened = open_store(dir.path());
        assert_eq!(
            reopened.producer("Orchard Row").unwrap().product_tags(),
            tags.as_slice()
        );
        assert!(reopened.producer("Split Farm").is_err());
    }

    #[test]
    fn embedded_commas_are_quoted() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path());
        store.add_producer(farm("Hill & Hollow, LLC")).unwrap();

        let producers = fs::read_to_string(dir.path().join(PRODUCERS_FILE)).unwrap();
        assert!(producers.contains("\"Hill & Hollow, LLC\",12.5,\"Eggs,Honey\",Regenerative,44.5,-72.9"));
    }

    #[test]
    fn rejected_write_does_not_touch_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path());
        let before = fs::read_to_string(dir.path().join(PRODUCERS_FILE)).unwrap();

        let mut bad = farm("");
        bad.distance_miles = -5.0;
        assert!(store.add_producer(bad).is_err());

        let after = fs::read_to_string(dir.path().join(PRODUCERS_FILE)).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn partial_location_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(PRODUCERS_FILE),
            "name,distance_miles,product_tags,certification,lat,lon\nA,1,,Organic,10.0,\n",
        )
        .unwrap();
        let repo = CsvCatalogRepository::open(dir.path()).unwrap();
        let err = repo.load().unwrap_err();
        assert!(err.to_string().contains("incomplete location"));
    }

    #[test]
    fn append_to_missing_file_writes_header() {
        let dir = tempfile::tempdir().unwrap();
        let repo = CsvCatalogRepository::open(dir.path()).unwrap();
        let producer = farm("Solo Farm").validate().unwrap();
        repo.append_producer(&producer).unwrap();

        let contents = fs::read_to_string(repo.producers_path()).unwrap();
        let mut lines = contents.lines();
        assert_eq!(lines.next(), Some("name,distance_miles,product_tags,certification,lat,lon"));
        assert!(lines.next().unwrap().starts_with("Solo Farm,12.5,"));
    }
}
