use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::types::{Offer, OfferKey};

/// Price movement of an offer relative to the previous snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceChange {
    New,
    Same,
    Increased,
    Decreased,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffResult {
    pub offer: Offer,
    pub change: PriceChange,
    /// Absolute price difference; 0 for new and unchanged offers
    pub delta: u32,
    pub previous_price: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffSummary {
    pub new: usize,
    pub same: usize,
    pub increased: usize,
    pub decreased: usize,
}

/// Classify each current offer against the previous snapshot.
///
/// Offers are matched on their case-normalized (brand, model). When the
/// previous snapshot holds several offers for a key, the last one is the
/// baseline.
pub fn diff(current: &[Offer], previous: &[Offer]) -> Vec<DiffResult> {
    let index: HashMap<OfferKey, u32> = previous
        .iter()
        .map(|o| (o.normalized_key(), o.monthly_price))
        .collect();

    current
        .iter()
        .map(|offer| {
            let price = offer.monthly_price;
            let previous_price = index.get(&offer.normalized_key()).copied();
            let (change, delta) = match previous_price {
                None => (PriceChange::New, 0),
                Some(old) if price == old => (PriceChange::Same, 0),
                Some(old) if price > old => (PriceChange::Increased, price - old),
                Some(old) => (PriceChange::Decreased, old - price),
            };
            DiffResult {
                offer: offer.clone(),
                change,
                delta,
                previous_price,
            }
        })
        .collect()
}

pub fn summarize(results: &[DiffResult]) -> DiffSummary {
    let mut summary = DiffSummary::default();
    for result in results {
        match result.change {
            PriceChange::New => summary.new += 1,
            PriceChange::Same => summary.same += 1,
            PriceChange::Increased => summary.increased += 1,
            PriceChange::Decreased => summary.decreased += 1,
        }
    }
    summary
}
