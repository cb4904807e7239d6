//! Built-in sample dataset used to seed an empty catalog.

use crate::producer::NewProducer;
use crate::product::NewProduct;
use crate::store::CatalogSnapshot;

fn producer(name: &str, distance_miles: f64, tag: &str, certification: &str) -> NewProducer {
    NewProducer {
        name: name.to_string(),
        distance_miles,
        product_tags: vec![tag.to_string()],
        certification: certification.to_string(),
        location: None,
    }
}

fn product(
    name: &str,
    price_per_unit: f64,
    unit: &str,
    season: &str,
    producer_name: &str,
) -> NewProduct {
    NewProduct {
        name: name.to_string(),
        price_per_unit,
        unit: unit.to_string(),
        season: season.to_string(),
        producer_name: producer_name.to_string(),
    }
}

impl CatalogSnapshot {
    /// Three farms and three products.
    pub fn sample() -> Self {
        Self {
            producers: vec![
                producer("Green Acres Farm", 15.0, "Vegetables", "Organic"),
                producer("Sunny Valley", 25.0, "Dairy", "Conventional"),
                producer("River Farm", 45.0, "Meat", "Regenerative"),
            ],
            products: vec![
                product("Tomatoes", 3.99, "lb", "Summer", "Green Acres Farm"),
                product("Lettuce", 2.99, "head", "Spring", "Green Acres Farm"),
                product("Milk", 4.50, "gallon", "Year-round", "Sunny Valley"),
            ],
        }
    }
}
