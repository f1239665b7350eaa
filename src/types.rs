use crate::error::AdapterError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Raw listing fields as extracted by a site adapter, before any parsing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawOfferFields {
    #[serde(default)]
    pub site: String,
    /// Combined brand and model text, e.g. "Fiat Panda 1.0 Hybrid"
    pub title: String,
    /// Secondary model text some sites render apart from the title (trim, version)
    #[serde(default)]
    pub descriptor: Option<String>,
    pub price_text: String,
    #[serde(default)]
    pub duration_text: Option<String>,
    #[serde(default)]
    pub deposit_text: Option<String>,
    #[serde(default)]
    pub fuel: Option<String>,
    #[serde(default)]
    pub gear: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

/// A canonical lease offer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offer {
    pub site: String,
    pub brand: String,
    pub model: String,
    pub monthly_price: u32,
    pub duration_months: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub down_payment: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fuel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gear: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub extracted_at: DateTime<Utc>,
}

impl Offer {
    pub fn key(&self) -> OfferKey {
        OfferKey {
            brand: self.brand.clone(),
            model: self.model.clone(),
        }
    }

    /// Case and whitespace insensitive key, used to match offers across runs
    pub fn normalized_key(&self) -> OfferKey {
        OfferKey {
            brand: normalize_key_part(&self.brand),
            model: normalize_key_part(&self.model),
        }
    }
}

fn normalize_key_part(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

/// Grouping key for offers of the same car
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OfferKey {
    pub brand: String,
    pub model: String,
}

impl std::fmt::Display for OfferKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.model.is_empty() {
            write!(f, "{}", self.brand)
        } else {
            write!(f, "{} {}", self.brand, self.model)
        }
    }
}

/// Core trait that every offer source must implement.
///
/// Adapters only extract raw fields; parsing, validation and grouping happen
/// in the pipeline. Failures must be returned, not swallowed, so the
/// pipeline can log them and carry on with the other sites.
#[async_trait::async_trait]
pub trait SiteAdapter: Send + Sync {
    /// Unique identifier for this site
    fn site(&self) -> &str;

    /// Fetch all raw offers currently listed by this site
    async fn fetch(&self) -> std::result::Result<Vec<RawOfferFields>, AdapterError>;
}
