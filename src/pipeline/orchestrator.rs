use chrono::{DateTime, Utc};
use metrics::{counter, histogram};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::constants::{DEFAULT_ADAPTER_TIMEOUT_SECONDS, DEFAULT_HISTORY_RETENTION_DAYS};
use crate::error::{AdapterError, Result, ScoutError};
use crate::pipeline::processing::aggregate::{self, OfferGroup};
use crate::pipeline::processing::diff::{self, DiffResult, DiffSummary};
use crate::pipeline::processing::normalize::normalize;
use crate::pipeline::processing::validate::{assess, FilterConfig, Verdict};
use crate::pipeline::storage::models::{prune_history, retention_cutoff, site_breakdown};
use crate::pipeline::storage::{HistoryEntry, RunStats, Snapshot, SnapshotStore};
use crate::types::{Offer, RawOfferFields, SiteAdapter};

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Upper bound for a single adapter's fetch
    pub adapter_timeout: Duration,
    pub history_retention_days: i64,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            adapter_timeout: Duration::from_secs(DEFAULT_ADAPTER_TIMEOUT_SECONDS),
            history_retention_days: DEFAULT_HISTORY_RETENTION_DAYS,
        }
    }
}

/// What happened to one site's records during a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SiteCounts {
    pub fetched: usize,
    /// Records the normalizer could not turn into offers
    pub rejected: usize,
    /// Offers that failed the filter rules
    pub filtered_out: usize,
    pub accepted: usize,
    pub failed: bool,
}

impl SiteCounts {
    /// Fold in the counts of another pass over the same site
    fn absorb(&mut self, other: &SiteCounts) {
        self.fetched += other.fetched;
        self.rejected += other.rejected;
        self.filtered_out += other.filtered_out;
        self.accepted += other.accepted;
        self.failed |= other.failed;
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AdapterFailure {
    pub site: String,
    pub reason: String,
}

/// Result of a complete pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub grouped_best_offers: Vec<OfferGroup>,
    pub diff_results: Vec<DiffResult>,
    pub diff_summary: DiffSummary,
    pub per_site_counts: BTreeMap<String, SiteCounts>,
    pub total_offers: usize,
    pub adapter_failures: Vec<AdapterFailure>,
    /// Set when this run's offers became the new baseline
    pub snapshot_id: Option<Uuid>,
}

impl RunReport {
    pub fn persisted(&self) -> bool {
        self.snapshot_id.is_some()
    }
}

/// Clears the in-flight flag on every exit path
struct RunGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Runs adapters through normalize, validate, group and diff, then persists
/// the accepted offers as the next baseline. Only one run may be active.
pub struct Pipeline {
    store: Arc<dyn SnapshotStore>,
    options: PipelineOptions,
    running: AtomicBool,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("store", &"<Arc<dyn SnapshotStore>>")
            .field("options", &self.options)
            .field("running", &self.is_running())
            .finish()
    }
}

impl Pipeline {
    pub fn new(store: Arc<dyn SnapshotStore>, options: PipelineOptions) -> Self {
        Self {
            store,
            options,
            running: AtomicBool::new(false),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    fn try_begin(&self) -> Result<RunGuard<'_>> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| ScoutError::RunInProgress)?;
        Ok(RunGuard {
            flag: &self.running,
        })
    }

    /// Run every adapter in order and build the digest.
    ///
    /// Adapter failures are recorded in the report and never abort the run.
    /// Fails with `RunInProgress` if another run is active, and with a
    /// persistence error if the baseline cannot be read or the new snapshot
    /// cannot be written; in that case the previous snapshot stays current.
    #[instrument(skip(self, adapters, filter), fields(sites = adapters.len()))]
    pub async fn run(
        &self,
        adapters: &[Arc<dyn SiteAdapter>],
        filter: &FilterConfig,
    ) -> Result<RunReport> {
        let _guard = match self.try_begin() {
            Ok(guard) => guard,
            Err(e) => {
                warn!("⏭️ Run requested while another is active, rejecting");
                counter!("lease_runs_rejected_total").increment(1);
                return Err(e);
            }
        };
        filter.validate()?;

        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let t_run = Instant::now();
        counter!("lease_runs_total").increment(1);
        info!("🚀 Starting run {} over {} sites", run_id, adapters.len());

        let mut pool: Vec<Offer> = Vec::new();
        let mut per_site_counts: BTreeMap<String, SiteCounts> = BTreeMap::new();
        let mut adapter_failures = Vec::new();

        // Step 1: fetch, normalize and validate site by site
        for adapter in adapters {
            let site = adapter.site().to_string();
            info!("📡 Fetching offers from {}...", site);

            let raws = match self.fetch_site(Arc::clone(adapter)).await {
                Ok(raws) => raws,
                Err(e) => {
                    error!("Adapter {} failed: {}", site, e);
                    counter!("lease_adapter_failures_total", "site" => site.clone()).increment(1);
                    per_site_counts.entry(site.clone()).or_default().failed = true;
                    adapter_failures.push(AdapterFailure {
                        site,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            let mut counts = SiteCounts {
                fetched: raws.len(),
                ..SiteCounts::default()
            };
            for raw in raws {
                Self::process_record(raw, &site, started_at, filter, &mut counts, &mut pool);
            }

            counter!("lease_offers_rejected_total", "site" => site.clone())
                .increment((counts.rejected + counts.filtered_out) as u64);
            counter!("lease_offers_accepted_total", "site" => site.clone())
                .increment(counts.accepted as u64);
            info!(
                "✅ {}: {} fetched, {} accepted ({} rejected, {} filtered out)",
                site, counts.fetched, counts.accepted, counts.rejected, counts.filtered_out
            );
            per_site_counts.entry(site).or_default().absorb(&counts);
        }

        // Step 2: group and pick the best offer per car
        let grouped_best_offers = aggregate::best_offers(aggregate::group(&pool));

        // Step 3: diff against the current baseline
        let previous = self.store.latest_snapshot().await.map_err(|e| {
            error!("Failed to load previous snapshot: {}", e);
            e
        })?;
        let previous_offers = previous.map(|s| s.offers).unwrap_or_default();
        if previous_offers.is_empty() {
            info!("📝 No previous offers, every offer is new");
        }
        let diff_results = diff::diff(&pool, &previous_offers);
        let diff_summary = diff::summarize(&diff_results);
        info!(
            "📊 Compared with previous run: {} new, {} increased, {} decreased, {} same",
            diff_summary.new, diff_summary.increased, diff_summary.decreased, diff_summary.same
        );

        // Step 4: persist the new baseline
        let total_offers = pool.len();
        let snapshot_id = if pool.is_empty() {
            warn!("No offers accepted in this run, keeping the previous snapshot");
            None
        } else {
            let snapshot = Snapshot::new(pool, started_at)?;
            self.store.save_snapshot(&snapshot).await.map_err(|e| {
                error!("Failed to persist snapshot {}: {}", snapshot.id, e);
                e
            })?;
            self.record_run(&snapshot).await;
            Some(snapshot.id)
        };

        let total_secs = t_run.elapsed().as_secs_f64();
        histogram!("lease_run_duration_seconds").record(total_secs);
        info!(
            "🎉 Run {} finished in {:.1}s: {} offers in {} groups, {} adapter failures",
            run_id,
            total_secs,
            total_offers,
            grouped_best_offers.len(),
            adapter_failures.len()
        );

        Ok(RunReport {
            run_id,
            started_at,
            finished_at: Utc::now(),
            grouped_best_offers,
            diff_results,
            diff_summary,
            per_site_counts,
            total_offers,
            adapter_failures,
            snapshot_id,
        })
    }

    fn process_record(
        mut raw: RawOfferFields,
        site: &str,
        extracted_at: DateTime<Utc>,
        filter: &FilterConfig,
        counts: &mut SiteCounts,
        pool: &mut Vec<Offer>,
    ) {
        // Counts and stats are keyed by the adapter's site, whatever the record says
        raw.site = site.to_string();

        let offer = match normalize(&raw, extracted_at) {
            Ok(offer) => offer,
            Err(reason) => {
                debug!("Rejected record {:?} from {}: {}", raw.title, site, reason);
                counts.rejected += 1;
                return;
            }
        };

        match assess(&offer, filter) {
            Verdict::Accept => {
                counts.accepted += 1;
                pool.push(offer);
            }
            Verdict::Reject(reason) => {
                debug!("Filtered {} {} from {}: {}", offer.brand, offer.model, site, reason);
                counts.filtered_out += 1;
            }
        }
    }

    /// Fetch on a separate task so a panicking adapter is contained
    async fn fetch_site(
        &self,
        adapter: Arc<dyn SiteAdapter>,
    ) -> std::result::Result<Vec<RawOfferFields>, AdapterError> {
        let site = adapter.site().to_string();
        let handle = tokio::spawn(async move { adapter.fetch().await });
        let abort = handle.abort_handle();

        match tokio::time::timeout(self.options.adapter_timeout, handle).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) if join_err.is_panic() => Err(AdapterError::Panicked { site }),
            Ok(Err(join_err)) => Err(AdapterError::Fetch {
                site,
                message: join_err.to_string(),
            }),
            Err(_) => {
                abort.abort();
                Err(AdapterError::Timeout {
                    site,
                    seconds: self.options.adapter_timeout.as_secs(),
                })
            }
        }
    }

    /// Update statistics and history; failures here do not fail the run
    async fn record_run(&self, snapshot: &Snapshot) {
        let breakdown = site_breakdown(&snapshot.offers);

        let stats = async {
            let mut stats = self.store.load_stats().await?;
            stats.record(snapshot.timestamp, &breakdown);
            self.store.save_stats(&stats).await
        };
        if let Err(e) = stats.await {
            warn!("Failed to update run statistics: {}", e);
        }

        let history = async {
            let mut history = self.store.load_history().await?;
            history.push(HistoryEntry {
                timestamp: snapshot.timestamp,
                offer_count: snapshot.count,
                site_breakdown: breakdown.clone(),
            });
            let history = match retention_cutoff(Utc::now(), self.options.history_retention_days)
            {
                Some(cutoff) => prune_history(history, cutoff),
                None => history,
            };
            self.store.save_history(&history).await
        };
        if let Err(e) = history.await {
            warn!("Failed to append run history: {}", e);
        }
    }

    pub async fn stats(&self) -> Result<RunStats> {
        self.store.load_stats().await
    }

    /// History entries from the last `days` days; a window reaching past the
    /// representable range returns everything
    pub async fn history(&self, days: i64) -> Result<Vec<HistoryEntry>> {
        let history = self.store.load_history().await?;
        Ok(match retention_cutoff(Utc::now(), days) {
            Some(cutoff) => prune_history(history, cutoff),
            None => history,
        })
    }
}
