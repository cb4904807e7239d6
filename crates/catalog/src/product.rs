use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use foodshed_core::{DomainError, DomainResult};

/// Selling unit vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Lb,
    Oz,
    Bunch,
    Head,
    Dozen,
    Gallon,
}

impl Unit {
    pub const ALL: [Unit; 6] = [
        Unit::Lb,
        Unit::Oz,
        Unit::Bunch,
        Unit::Head,
        Unit::Dozen,
        Unit::Gallon,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::Lb => "lb",
            Unit::Oz => "oz",
            Unit::Bunch => "bunch",
            Unit::Head => "head",
            Unit::Dozen => "dozen",
            Unit::Gallon => "gallon",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Unit {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|u| u.as_str() == wanted)
            .ok_or_else(|| {
                DomainError::validation(format!(
                    "unit must be one of: lb, oz, bunch, head, dozen, gallon (got {wanted:?})"
                ))
            })
    }
}

/// Season availability, kept as the raw text it was submitted with.
///
/// Filtering is defined over the raw text (substring match), so the labels
/// are derived on demand rather than stored.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Season(String);

impl Season {
    pub fn new(raw: impl Into<String>) -> DomainResult<Self> {
        let raw = raw.into().trim().to_string();
        if raw.is_empty() {
            return Err(DomainError::validation("season cannot be empty"));
        }
        Ok(Self(raw))
    }

    /// Build a season from individual labels, joined the way the forms join them.
    pub fn from_labels<S: AsRef<str>>(labels: &[S]) -> DomainResult<Self> {
        let joined = labels
            .iter()
            .map(|l| l.as_ref().trim())
            .filter(|l| !l.is_empty())
            .collect::<Vec<_>>()
            .join("/");
        Self::new(joined)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Individual labels ("Spring/Fall" -> ["Spring", "Fall"]).
    pub fn labels(&self) -> Vec<&str> {
        self.0
            .split(['/', ','])
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect()
    }

    /// Case-sensitive substring test against the raw text.
    pub fn mentions(&self, needle: &str) -> bool {
        self.0.contains(needle)
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unvalidated product submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub price_per_unit: f64,
    pub unit: String,
    pub season: String,
    pub producer_name: String,
}

impl NewProduct {
    /// Apply field-level rules. Whether `producer_name` resolves is decided by
    /// the store under its reference policy.
    pub fn validate(self) -> DomainResult<Product> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(DomainError::validation("product name cannot be empty"));
        }
        if !self.price_per_unit.is_finite() || self.price_per_unit < 0.0 {
            return Err(DomainError::validation(
                "price_per_unit must be a non-negative number",
            ));
        }
        let unit = self.unit.parse::<Unit>()?;
        let season = Season::new(self.season)?;
        let producer_name = self.producer_name.trim().to_string();
        if producer_name.is_empty() {
            return Err(DomainError::validation("producer_name cannot be empty"));
        }

        Ok(Product {
            name,
            price_per_unit: self.price_per_unit,
            unit,
            season,
            producer_name,
        })
    }
}

/// A validated product record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Product {
    name: String,
    price_per_unit: f64,
    unit: Unit,
    season: Season,
    producer_name: String,
}

impl Product {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn price_per_unit(&self) -> f64 {
        self.price_per_unit
    }

    pub fn unit(&self) -> Unit {
        self.unit
    }

    pub fn season(&self) -> &Season {
        &self.season
    }

    pub fn producer_name(&self) -> &str {
        &self.producer_name
    }
}

impl From<&Product> for NewProduct {
    fn from(p: &Product) -> Self {
        Self {
            name: p.name.clone(),
            price_per_unit: p.price_per_unit,
            unit: p.unit.as_str().to_string(),
            season: p.season.as_str().to_string(),
            producer_name: p.producer_name.clone(),
        }
    }
}
