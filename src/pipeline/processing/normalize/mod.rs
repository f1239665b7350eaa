use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::constants::FALLBACK_DURATION_MONTHS;
use crate::pipeline::processing::parser::{parse_duration, parse_price};
use crate::types::{Offer, RawOfferFields};

/// Why a raw record could not become an offer
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejected {
    #[error("listing has no brand")]
    MissingBrand,

    #[error("price text {price_text:?} is not a positive amount")]
    UnparseablePrice { price_text: String },

    #[error("duration text {duration_text:?} has a number that cannot be read")]
    UnparseableDuration { duration_text: String },
}

/// Trim and collapse runs of whitespace into single spaces
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn clean_optional(text: Option<&str>) -> Option<String> {
    text.map(clean_text).filter(|t| !t.is_empty())
}

/// Build a canonical offer from raw adapter fields.
///
/// The brand is the first word of the title, upper-cased; the model is the
/// rest of the title followed by the adapter's descriptor, if any. A record
/// without a duration gets the fallback contract length instead of being
/// rejected; a duration number too large to read is rejected.
pub fn normalize(raw: &RawOfferFields, extracted_at: DateTime<Utc>) -> Result<Offer, Rejected> {
    let title = clean_text(&raw.title);
    let (brand, rest) = match title.split_once(' ') {
        Some((brand, rest)) => (brand, rest),
        None => (title.as_str(), ""),
    };
    if brand.is_empty() {
        return Err(Rejected::MissingBrand);
    }

    let monthly_price = parse_price(&raw.price_text).ok_or_else(|| Rejected::UnparseablePrice {
        price_text: raw.price_text.clone(),
    })?;

    let descriptor = raw.descriptor.as_deref().map(clean_text).unwrap_or_default();
    let model = clean_text(&format!("{} {}", rest, descriptor));

    // Only text without any digits counts as a missing duration
    let duration_months = match raw.duration_text.as_deref() {
        Some(text) => match parse_duration(text) {
            Some(months) => months,
            None if text.chars().any(|c| c.is_ascii_digit()) => {
                return Err(Rejected::UnparseableDuration {
                    duration_text: text.to_string(),
                })
            }
            None => FALLBACK_DURATION_MONTHS,
        },
        None => FALLBACK_DURATION_MONTHS,
    };

    Ok(Offer {
        site: raw.site.clone(),
        brand: brand.to_uppercase(),
        model,
        monthly_price,
        duration_months,
        down_payment: raw.deposit_text.as_deref().and_then(parse_price),
        fuel: clean_optional(raw.fuel.as_deref()),
        gear: clean_optional(raw.gear.as_deref()),
        url: clean_optional(raw.url.as_deref()),
        image: clean_optional(raw.image.as_deref()),
        extracted_at,
    })
}
