use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::error::{Result, ScoutError};
use crate::types::Offer;

/// The full set of accepted offers from one completed run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub offers: Vec<Offer>,
    pub count: usize,
    /// Hex SHA-256 of the serialized offer list
    pub checksum: String,
}

impl Snapshot {
    pub fn new(offers: Vec<Offer>, timestamp: DateTime<Utc>) -> Result<Self> {
        let checksum = checksum_offers(&offers)?;
        Ok(Self {
            id: Uuid::new_v4(),
            timestamp,
            count: offers.len(),
            offers,
            checksum,
        })
    }

    /// Reject a snapshot whose content no longer matches its count or checksum
    pub fn verify(&self) -> Result<()> {
        if self.count != self.offers.len() {
            return Err(ScoutError::persistence(format!(
                "snapshot {} declares {} offers but holds {}",
                self.id,
                self.count,
                self.offers.len()
            )));
        }
        let actual = checksum_offers(&self.offers)?;
        if actual != self.checksum {
            return Err(ScoutError::persistence(format!(
                "snapshot {} checksum mismatch",
                self.id
            )));
        }
        Ok(())
    }
}

fn checksum_offers(offers: &[Offer]) -> Result<String> {
    let bytes = serde_json::to_vec(offers)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(hex::encode(hasher.finalize()))
}

/// Count offers per site
pub fn site_breakdown(offers: &[Offer]) -> BTreeMap<String, usize> {
    let mut breakdown = BTreeMap::new();
    for offer in offers {
        *breakdown.entry(offer.site.clone()).or_insert(0) += 1;
    }
    breakdown
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SiteStats {
    pub total_offers: u64,
    pub runs: u64,
    pub average_offers: u64,
}

/// Running totals across all persisted runs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    pub total_runs: u64,
    pub last_run: Option<DateTime<Utc>>,
    pub total_offers_found: u64,
    #[serde(default)]
    pub site_stats: BTreeMap<String, SiteStats>,
}

impl RunStats {
    pub fn record(&mut self, at: DateTime<Utc>, breakdown: &BTreeMap<String, usize>) {
        self.total_runs += 1;
        self.last_run = Some(at);
        self.total_offers_found += breakdown.values().map(|c| *c as u64).sum::<u64>();

        for (site, count) in breakdown {
            let stats = self.site_stats.entry(site.clone()).or_default();
            stats.total_offers += *count as u64;
            stats.runs += 1;
            // Rounded to nearest, halves up
            stats.average_offers = (stats.total_offers * 2 + stats.runs) / (stats.runs * 2);
        }
    }
}

/// One line of run history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub offer_count: usize,
    pub site_breakdown: BTreeMap<String, usize>,
}

/// `now` minus `days`, or `None` when that instant is not representable
pub fn retention_cutoff(now: DateTime<Utc>, days: i64) -> Option<DateTime<Utc>> {
    TimeDelta::try_days(days).and_then(|window| now.checked_sub_signed(window))
}

/// Keep only entries strictly newer than `cutoff`
pub fn prune_history(entries: Vec<HistoryEntry>, cutoff: DateTime<Utc>) -> Vec<HistoryEntry> {
    entries
        .into_iter()
        .filter(|e| e.timestamp > cutoff)
        .collect()
}
