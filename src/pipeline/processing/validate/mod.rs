use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::constants::{DEFAULT_MAX_PRICE, DEFAULT_MIN_DURATION_MONTHS, DEFAULT_MIN_PRICE};
use crate::error::{Result, ScoutError};
use crate::types::Offer;

/// Price, duration and brand/model rules an offer must satisfy.
///
/// Brand and model lists are stored upper-cased; every constructor and the
/// deserializer go through [`FilterConfig::normalize_entries`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "FilterConfigFile")]
pub struct FilterConfig {
    pub min_price: u32,
    pub max_price: u32,
    pub min_duration_months: u32,
    pub excluded_brands: BTreeSet<String>,
    pub excluded_models: BTreeSet<String>,
    /// When non-empty, replaces both exclusion lists entirely
    pub included_models: BTreeSet<String>,
}

/// On-disk shape of the filter section; lists may be in any case
#[derive(Debug, Deserialize)]
#[serde(default)]
struct FilterConfigFile {
    min_price: u32,
    max_price: u32,
    min_duration_months: u32,
    excluded_brands: Vec<String>,
    excluded_models: Vec<String>,
    included_models: Vec<String>,
}

impl Default for FilterConfigFile {
    fn default() -> Self {
        Self {
            min_price: DEFAULT_MIN_PRICE,
            max_price: DEFAULT_MAX_PRICE,
            min_duration_months: DEFAULT_MIN_DURATION_MONTHS,
            excluded_brands: Vec::new(),
            excluded_models: Vec::new(),
            included_models: Vec::new(),
        }
    }
}

impl From<FilterConfigFile> for FilterConfig {
    fn from(file: FilterConfigFile) -> Self {
        FilterConfig::new(file.min_price, file.max_price, file.min_duration_months)
            .with_excluded_brands(file.excluded_brands)
            .with_excluded_models(file.excluded_models)
            .with_included_models(file.included_models)
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        FilterConfigFile::default().into()
    }
}

impl FilterConfig {
    pub fn new(min_price: u32, max_price: u32, min_duration_months: u32) -> Self {
        Self {
            min_price,
            max_price,
            min_duration_months,
            excluded_brands: BTreeSet::new(),
            excluded_models: BTreeSet::new(),
            included_models: BTreeSet::new(),
        }
    }

    pub fn with_excluded_brands<I, S>(mut self, brands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.excluded_brands = Self::normalize_entries(brands);
        self
    }

    pub fn with_excluded_models<I, S>(mut self, models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.excluded_models = Self::normalize_entries(models);
        self
    }

    pub fn with_included_models<I, S>(mut self, models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.included_models = Self::normalize_entries(models);
        self
    }

    /// Trim, upper-case and drop empty entries
    pub fn normalize_entries<I, S>(entries: I) -> BTreeSet<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        entries
            .into_iter()
            .map(|e| e.as_ref().trim().to_uppercase())
            .filter(|e| !e.is_empty())
            .collect()
    }

    /// Check the numeric bounds are usable
    pub fn validate(&self) -> Result<()> {
        if self.min_price == 0 {
            return Err(ScoutError::Config("min_price must be positive".to_string()));
        }
        if self.min_price >= self.max_price {
            return Err(ScoutError::Config(format!(
                "min_price ({}) must be lower than max_price ({})",
                self.min_price, self.max_price
            )));
        }
        if self.min_duration_months < 1 {
            return Err(ScoutError::Config(
                "min_duration_months must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Outcome of screening one offer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Accept,
    Reject(RejectReason),
}

impl Verdict {
    pub fn is_accept(&self) -> bool {
        matches!(self, Verdict::Accept)
    }
}

/// First rule an offer failed, in evaluation order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    PriceOutOfRange { price: u32, min: u32, max: u32 },
    DurationTooShort { months: u32, min: u32 },
    NotIncluded,
    BrandExcluded,
    ModelExcluded { prefix: String },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::PriceOutOfRange { price, min, max } => {
                write!(f, "price {} outside [{}, {}]", price, min, max)
            }
            RejectReason::DurationTooShort { months, min } => {
                write!(f, "duration {} months below minimum {}", months, min)
            }
            RejectReason::NotIncluded => write!(f, "model not in included list"),
            RejectReason::BrandExcluded => write!(f, "brand excluded"),
            RejectReason::ModelExcluded { prefix } => write!(f, "model excluded by {:?}", prefix),
        }
    }
}

/// Screen an offer against the filter rules.
///
/// Rules apply in order: price range, minimum duration, then the
/// brand/model screen. A non-empty include list is the only screen used
/// when present; exclusions are consulted only when it is empty.
pub fn assess(offer: &Offer, filter: &FilterConfig) -> Verdict {
    let price = offer.monthly_price;
    if price < filter.min_price || price > filter.max_price {
        return Verdict::Reject(RejectReason::PriceOutOfRange {
            price,
            min: filter.min_price,
            max: filter.max_price,
        });
    }

    if offer.duration_months < filter.min_duration_months {
        return Verdict::Reject(RejectReason::DurationTooShort {
            months: offer.duration_months,
            min: filter.min_duration_months,
        });
    }

    let model = offer.model.to_uppercase();

    if !filter.included_models.is_empty() {
        return if filter
            .included_models
            .iter()
            .any(|prefix| model.starts_with(prefix.as_str()))
        {
            Verdict::Accept
        } else {
            Verdict::Reject(RejectReason::NotIncluded)
        };
    }

    if filter.excluded_brands.contains(&offer.brand.to_uppercase()) {
        return Verdict::Reject(RejectReason::BrandExcluded);
    }

    if let Some(prefix) = filter
        .excluded_models
        .iter()
        .find(|prefix| model.starts_with(prefix.as_str()))
    {
        return Verdict::Reject(RejectReason::ModelExcluded {
            prefix: prefix.clone(),
        });
    }

    Verdict::Accept
}

pub fn is_valid(offer: &Offer, filter: &FilterConfig) -> bool {
    assess(offer, filter).is_accept()
}
