//! Derived views over the catalog collections.
//!
//! Everything here is a pure function of the records passed in; the store
//! calls these while holding its lock.

use serde::Serialize;

use foodshed_core::{DomainError, DomainResult};

use crate::producer::Producer;
use crate::product::Product;

/// Season label every seasonal query includes regardless of the requested label.
pub const YEAR_ROUND: &str = "Year-round";

/// Value-count tally, ordered by first occurrence of each label.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Histogram {
    entries: Vec<(String, usize)>,
}

impl Histogram {
    pub fn tally<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut entries: Vec<(String, usize)> = Vec::new();
        for label in labels {
            let label = label.as_ref();
            match entries.iter_mut().find(|(l, _)| l == label) {
                Some((_, count)) => *count += 1,
                None => entries.push((label.to_string(), 1)),
            }
        }
        Self { entries }
    }

    pub fn entries(&self) -> &[(String, usize)] {
        &self.entries
    }

    pub fn get(&self, label: &str) -> Option<usize> {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, c)| *c)
    }

    pub fn total(&self) -> usize {
        self.entries.iter().map(|(_, c)| c).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub fn certification_histogram(producers: &[Producer]) -> Histogram {
    Histogram::tally(producers.iter().map(|p| p.certification().as_str()))
}

pub fn season_histogram(products: &[Product]) -> Histogram {
    Histogram::tally(products.iter().map(|p| p.season().as_str()))
}

/// Products whose raw season text contains "Year-round" or `label`.
///
/// This is a substring OR over the raw text, not a label membership test:
/// "Spring/Fall" matches both "Fall" and "prin".
pub fn seasonal_products(products: &[Product], label: &str) -> Vec<Product> {
    products
        .iter()
        .filter(|p| p.season().mentions(YEAR_ROUND) || p.season().mentions(label))
        .cloned()
        .collect()
}

pub fn local_producer_count(producers: &[Producer], threshold_miles: f64) -> DomainResult<usize> {
    if !threshold_miles.is_finite() || threshold_miles < 0.0 {
        return Err(DomainError::validation(
            "threshold_miles must be a non-negative number",
        ));
    }
    Ok(producers.iter().filter(|p| p.is_within(threshold_miles)).count())
}

pub fn average_distance(producers: &[Producer]) -> DomainResult<f64> {
    if producers.is_empty() {
        return Err(DomainError::insufficient("average distance", 1, 0));
    }
    let total: f64 = producers.iter().map(Producer::distance_miles).sum();
    Ok(total / producers.len() as f64)
}

/// Price band label, ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum PriceCategory {
    Low,
    Medium,
    High,
}

impl PriceCategory {
    pub const ALL: [PriceCategory; 3] = [
        PriceCategory::Low,
        PriceCategory::Medium,
        PriceCategory::High,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PriceCategory::Low => "Low",
            PriceCategory::Medium => "Medium",
            PriceCategory::High => "High",
        }
    }
}

/// Result of tertile bucketing over the current price column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceTertiles {
    /// Quantile edges at 0, 1/3, 2/3 and 1, strictly ascending.
    edges: [f64; 4],
    /// Each product with its band, in insertion order.
    assignments: Vec<(Product, PriceCategory)>,
}

impl PriceTertiles {
    pub fn edges(&self) -> [f64; 4] {
        self.edges
    }

    pub fn assignments(&self) -> &[(Product, PriceCategory)] {
        &self.assignments
    }

    /// Inclusive-exclusive bounds of a band as `(lower, upper)`.
    ///
    /// The Low band also includes its lower edge.
    pub fn bounds(&self, category: PriceCategory) -> (f64, f64) {
        match category {
            PriceCategory::Low => (self.edges[0], self.edges[1]),
            PriceCategory::Medium => (self.edges[1], self.edges[2]),
            PriceCategory::High => (self.edges[2], self.edges[3]),
        }
    }

    pub fn group(&self, category: PriceCategory) -> Vec<&Product> {
        self.assignments
            .iter()
            .filter(|(_, c)| *c == category)
            .map(|(p, _)| p)
            .collect()
    }
}

/// Quantile with linear interpolation between closest ranks over sorted data.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

pub fn price_categories(products: &[Product]) -> DomainResult<PriceTertiles> {
    if products.len() < 3 {
        return Err(DomainError::insufficient("price categories", 3, products.len()));
    }

    let mut sorted: Vec<f64> = products.iter().map(Product::price_per_unit).collect();
    sorted.sort_by(f64::total_cmp);

    let edges = [
        sorted[0],
        quantile(&sorted, 1.0 / 3.0),
        quantile(&sorted, 2.0 / 3.0),
        sorted[sorted.len() - 1],
    ];

    // Bins must be distinct or the bands collapse.
    if edges.windows(2).any(|w| w[0] >= w[1]) {
        let mut distinct = edges.to_vec();
        distinct.dedup();
        return Err(DomainError::insufficient(
            "distinct price boundaries",
            edges.len(),
            distinct.len(),
        ));
    }

    let assignments = products
        .iter()
        .map(|p| {
            let price = p.price_per_unit();
            let category = if price <= edges[1] {
                PriceCategory::Low
            } else if price <= edges[2] {
                PriceCategory::Medium
            } else {
                PriceCategory::High
            };
            (p.clone(), category)
        })
        .collect();

    Ok(PriceTertiles { edges, assignments })
}

/// Dashboard totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogSummary {
    pub producer_count: usize,
    pub product_count: usize,
    /// `None` when there are no producers.
    pub average_distance_miles: Option<f64>,
    pub local_threshold_miles: f64,
    pub local_producer_count: usize,
}
