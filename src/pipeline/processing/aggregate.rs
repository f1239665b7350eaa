use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::{Offer, OfferKey};

/// Offers for one (brand, model), cheapest first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferGroup {
    pub brand: String,
    pub model: String,
    pub offers: Vec<Offer>,
}

impl OfferGroup {
    pub fn best(&self) -> Option<&Offer> {
        self.offers.first()
    }

    pub fn lowest_price(&self) -> Option<u32> {
        self.best().map(|o| o.monthly_price)
    }

    pub fn cheapest_site(&self) -> Option<&str> {
        self.best().map(|o| o.site.as_str())
    }

    pub fn len(&self) -> usize {
        self.offers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offers.is_empty()
    }
}

/// Group offers by (brand, model), each list sorted by ascending price.
///
/// The sort is stable, so equal prices keep their scan order and the first
/// one seen stays the best offer. No filtering happens here.
pub fn group(offers: &[Offer]) -> BTreeMap<OfferKey, Vec<Offer>> {
    let mut grouped: BTreeMap<OfferKey, Vec<Offer>> = BTreeMap::new();
    for offer in offers {
        grouped.entry(offer.key()).or_default().push(offer.clone());
    }
    for list in grouped.values_mut() {
        list.sort_by_key(|o| o.monthly_price);
    }
    grouped
}

/// Turn a grouping into digest entries, ordered by key
pub fn best_offers(grouped: BTreeMap<OfferKey, Vec<Offer>>) -> Vec<OfferGroup> {
    grouped
        .into_iter()
        .map(|(key, offers)| OfferGroup {
            brand: key.brand,
            model: key.model,
            offers,
        })
        .collect()
}
