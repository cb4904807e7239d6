use serde::Deserialize;

use foodshed_catalog::{
    Histogram, Location, NewProducer, NewProduct, PriceCategory, PriceTertiles, Producer, Product,
    Season, parse_tags,
};
use foodshed_core::DomainResult;

// -------------------------
// Request DTOs
// -------------------------

/// A multi-value form field: either a delimited string or a JSON array.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

#[derive(Debug, Deserialize)]
pub struct CreateProducerRequest {
    pub name: String,
    pub distance_miles: f64,
    /// "Vegetables, Eggs" or ["Vegetables", "Eggs"].
    pub product_tags: Option<OneOrMany>,
    pub certification: String,
    pub location: Option<Location>,
}

impl CreateProducerRequest {
    pub fn into_new_producer(self) -> NewProducer {
        let product_tags = match self.product_tags {
            None => Vec::new(),
            Some(OneOrMany::One(raw)) => parse_tags(&raw),
            Some(OneOrMany::Many(tags)) => tags,
        };
        NewProducer {
            name: self.name,
            distance_miles: self.distance_miles,
            product_tags,
            certification: self.certification,
            location: self.location,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    pub price_per_unit: f64,
    pub unit: String,
    /// "Spring/Fall" or ["Spring", "Fall"].
    pub season: OneOrMany,
    pub producer_name: String,
}

impl CreateProductRequest {
    pub fn into_new_product(self) -> DomainResult<NewProduct> {
        let season = match self.season {
            OneOrMany::One(raw) => raw,
            OneOrMany::Many(labels) => Season::from_labels(&labels)?.as_str().to_string(),
        };
        Ok(NewProduct {
            name: self.name,
            price_per_unit: self.price_per_unit,
            unit: self.unit,
            season,
            producer_name: self.producer_name,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct SeasonalQuery {
    pub label: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LocalQuery {
    pub threshold: Option<f64>,
}

// -------------------------
// JSON mapping helpers
// -------------------------

pub fn producer_to_json(p: &Producer) -> serde_json::Value {
    serde_json::json!({
        "name": p.name(),
        "distance_miles": p.distance_miles(),
        "product_tags": p.product_tags(),
        "certification": p.certification().as_str(),
        "location": p.location().map(|l| serde_json::json!({ "lat": l.lat, "lon": l.lon })),
    })
}

pub fn product_to_json(p: &Product) -> serde_json::Value {
    serde_json::json!({
        "name": p.name(),
        "price_per_unit": p.price_per_unit(),
        "unit": p.unit().as_str(),
        "season": p.season().as_str(),
        "season_labels": p.season().labels(),
        "producer_name": p.producer_name(),
    })
}

pub fn histogram_to_json(h: &Histogram) -> serde_json::Value {
    serde_json::json!({
        "items": h.entries().iter().map(|(label, count)| serde_json::json!({
            "label": label,
            "count": count,
        })).collect::<Vec<_>>(),
        "total": h.total(),
    })
}

pub fn price_tertiles_to_json(t: &PriceTertiles) -> serde_json::Value {
    let groups = PriceCategory::ALL
        .iter()
        .map(|category| {
            let (lower, upper) = t.bounds(*category);
            serde_json::json!({
                "category": category.as_str(),
                "lower": lower,
                "upper": upper,
                "items": t.group(*category).into_iter().map(product_to_json).collect::<Vec<_>>(),
            })
        })
        .collect::<Vec<_>>();

    serde_json::json!({
        "boundaries": t.edges(),
        "groups": groups,
        "assignments": t.assignments().iter().map(|(p, category)| serde_json::json!({
            "name": p.name(),
            "price_per_unit": p.price_per_unit(),
            "category": category.as_str(),
        })).collect::<Vec<_>>(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn producer_tags_accept_comma_joined_string() {
        let req: CreateProducerRequest = serde_json::from_value(serde_json::json!({
            "name": "Green Acres Farm",
            "distance_miles": 15,
            "product_tags": "Vegetables, Eggs",
            "certification": "Organic",
        }))
        .unwrap();
        assert_eq!(req.into_new_producer().product_tags, vec!["Vegetables", "Eggs"]);
    }

    #[test]
    fn producer_tags_accept_array() {
        let req: CreateProducerRequest = serde_json::from_value(serde_json::json!({
            "name": "Green Acres Farm",
            "distance_miles": 15,
            "product_tags": ["Vegetables", "Eggs"],
            "certification": "Organic",
        }))
        .unwrap();
        assert_eq!(req.into_new_producer().product_tags, vec!["Vegetables", "Eggs"]);
    }

    #[test]
    fn product_season_array_is_slash_joined() {
        let req: CreateProductRequest = serde_json::from_value(serde_json::json!({
            "name": "Squash",
            "price_per_unit": 1.5,
            "unit": "lb",
            "season": ["Spring", "Fall"],
            "producer_name": "River Farm",
        }))
        .unwrap();
        assert_eq!(req.into_new_product().unwrap().season, "Spring/Fall");
    }
}
