use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use foodshed_core::{DomainError, DomainResult, Entity};

/// Farming practice a producer declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Certification {
    Organic,
    Conventional,
    Regenerative,
}

impl Certification {
    pub const ALL: [Certification; 3] = [
        Certification::Organic,
        Certification::Conventional,
        Certification::Regenerative,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Certification::Organic => "Organic",
            Certification::Conventional => "Conventional",
            Certification::Regenerative => "Regenerative",
        }
    }
}

impl fmt::Display for Certification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Certification {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| {
                DomainError::validation(format!(
                    "certification must be one of: Organic, Conventional, Regenerative (got {wanted:?})"
                ))
            })
    }
}

/// Geographic position of a farm.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lon: f64,
}

impl Location {
    pub fn new(lat: f64, lon: f64) -> DomainResult<Self> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(DomainError::validation("latitude must be within [-90, 90]"));
        }
        if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
            return Err(DomainError::validation("longitude must be within [-180, 180]"));
        }
        Ok(Self { lat, lon })
    }
}

/// Split a comma-joined tag string ("Vegetables, Eggs") into trimmed tags.
pub fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Unvalidated producer submission, as it arrives from a form or a file row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProducer {
    pub name: String,
    pub distance_miles: f64,
    #[serde(default)]
    pub product_tags: Vec<String>,
    pub certification: String,
    #[serde(default)]
    pub location: Option<Location>,
}

impl NewProducer {
    /// Apply the write-boundary rules and produce a catalog record.
    ///
    /// Uniqueness of the name is a catalog-level rule and is checked by the store.
    pub fn validate(self) -> DomainResult<Producer> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(DomainError::validation("producer name cannot be empty"));
        }
        if !self.distance_miles.is_finite() || self.distance_miles < 0.0 {
            return Err(DomainError::validation(
                "distance_miles must be a non-negative number",
            ));
        }
        let certification = self.certification.parse::<Certification>()?;
        let location = self
            .location
            .map(|l| Location::new(l.lat, l.lon))
            .transpose()?;
        let product_tags: Vec<String> = self
            .product_tags
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();
        // Tags are stored comma-joined, so a comma inside one would split it.
        if let Some(tag) = product_tags.iter().find(|t| t.contains(',')) {
            return Err(DomainError::validation(format!(
                "product tag cannot contain a comma (got {tag:?})"
            )));
        }

        Ok(Producer {
            name,
            distance_miles: self.distance_miles,
            product_tags,
            certification,
            location,
        })
    }
}

/// A validated producer record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Producer {
    name: String,
    distance_miles: f64,
    product_tags: Vec<String>,
    certification: Certification,
    location: Option<Location>,
}

impl Producer {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn distance_miles(&self) -> f64 {
        self.distance_miles
    }

    pub fn product_tags(&self) -> &[String] {
        &self.product_tags
    }

    pub fn certification(&self) -> Certification {
        self.certification
    }

    pub fn location(&self) -> Option<Location> {
        self.location
    }

    pub fn is_within(&self, threshold_miles: f64) -> bool {
        self.distance_miles <= threshold_miles
    }
}

impl Entity for Producer {
    type Id = str;

    fn id(&self) -> &str {
        &self.name
    }
}

impl From<&Producer> for NewProducer {
    fn from(p: &Producer) -> Self {
        Self {
            name: p.name.clone(),
            distance_miles: p.distance_miles,
            product_tags: p.product_tags.clone(),
            certification: p.certification.as_str().to_string(),
            location: p.location,
        }
    }
}
