use anyhow::Result;
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;
use tokio::sync::Notify;

use lease_scout::apis::AdapterRegistry;
use lease_scout::error::{AdapterError, ScoutError};
use lease_scout::pipeline::processing::diff::PriceChange;
use lease_scout::pipeline::processing::validate::FilterConfig;
use lease_scout::pipeline::storage::{FileStore, SnapshotStore};
use lease_scout::pipeline::{Pipeline, PipelineOptions};
use lease_scout::types::{RawOfferFields, SiteAdapter};

fn options() -> PipelineOptions {
    PipelineOptions {
        adapter_timeout: Duration::from_secs(5),
        history_retention_days: 30,
    }
}

fn write_feed(dir: &Path, site: &str, records: serde_json::Value) -> Result<()> {
    std::fs::create_dir_all(dir)?;
    std::fs::write(dir.join(format!("{}.json", site)), serde_json::to_vec(&records)?)?;
    Ok(())
}

/// Blocks inside fetch until released
struct GatedAdapter {
    started: Arc<Notify>,
    release: Arc<Notify>,
}

#[async_trait::async_trait]
impl SiteAdapter for GatedAdapter {
    fn site(&self) -> &str {
        "gated"
    }

    async fn fetch(&self) -> std::result::Result<Vec<RawOfferFields>, AdapterError> {
        self.started.notify_one();
        self.release.notified().await;
        Ok(vec![RawOfferFields {
            title: "Fiat Panda".to_string(),
            price_text: "€ 189".to_string(),
            ..Default::default()
        }])
    }
}

struct FailingAdapter;

#[async_trait::async_trait]
impl SiteAdapter for FailingAdapter {
    fn site(&self) -> &str {
        "offline"
    }

    async fn fetch(&self) -> std::result::Result<Vec<RawOfferFields>, AdapterError> {
        Err(AdapterError::Fetch {
            site: "offline".to_string(),
            message: "connection refused".to_string(),
        })
    }
}

#[tokio::test]
async fn test_second_run_is_rejected_while_first_is_active() -> Result<()> {
    let dir = tempdir()?;
    let pipeline = Arc::new(Pipeline::new(Arc::new(FileStore::new(dir.path())), options()));
    let started = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let adapters: Vec<Arc<dyn SiteAdapter>> = vec![Arc::new(GatedAdapter {
        started: started.clone(),
        release: release.clone(),
    })];

    let first = {
        let pipeline = pipeline.clone();
        let adapters = adapters.clone();
        tokio::spawn(async move { pipeline.run(&adapters, &FilterConfig::default()).await })
    };
    started.notified().await;
    assert!(pipeline.is_running());

    let second = pipeline.run(&adapters, &FilterConfig::default()).await;
    assert!(matches!(second, Err(ScoutError::RunInProgress)));

    release.notify_one();
    let report = first.await??;
    assert_eq!(report.total_offers, 1);
    assert!(report.persisted());
    assert!(!pipeline.is_running());
    Ok(())
}

#[tokio::test]
async fn test_failed_adapter_does_not_stop_the_others() -> Result<()> {
    let dir = tempdir()?;
    let feeds = dir.path().join("feeds");
    write_feed(
        &feeds,
        "leasys",
        json!([
            {"title": "Jeep Avenger", "descriptor": "1.2 Turbo Altitude", "price_text": "€ 249,00", "duration_text": "48 mesi"},
            {"title": "Tesla Model 3", "price_text": "€ 299", "duration_text": "48 mesi"}
        ]),
    )?;

    let mut registry = AdapterRegistry::from_feeds(&["leasys"], &feeds);
    registry.register(Arc::new(FailingAdapter));
    let filter = FilterConfig::default().with_excluded_brands(["tesla"]);

    let pipeline = Pipeline::new(Arc::new(FileStore::new(dir.path().join("data"))), options());
    let report = pipeline.run(&registry.all(), &filter).await?;

    assert_eq!(report.adapter_failures.len(), 1);
    assert_eq!(report.adapter_failures[0].site, "offline");
    assert!(report.per_site_counts["offline"].failed);
    assert_eq!(report.per_site_counts["leasys"].accepted, 1);
    assert_eq!(report.per_site_counts["leasys"].filtered_out, 1);

    let best = &report.grouped_best_offers[0];
    assert_eq!(best.brand, "JEEP");
    assert_eq!(best.model, "Avenger 1.2 Turbo Altitude");
    assert_eq!(best.lowest_price(), Some(249));
    Ok(())
}

#[tokio::test]
async fn test_snapshot_survives_a_new_store() -> Result<()> {
    let dir = tempdir()?;
    let feeds = dir.path().join("feeds");
    let data = dir.path().join("data");
    write_feed(
        &feeds,
        "ayvens",
        json!([{"title": "Peugeot 208", "price_text": "€ 219", "duration_text": "60 mesi", "deposit_text": "€ 3.000,00", "fuel": "Benzina"}]),
    )?;

    let registry = AdapterRegistry::from_feeds(&["ayvens"], &feeds);
    let pipeline = Pipeline::new(Arc::new(FileStore::new(&data)), options());
    let report = pipeline.run(&registry.all(), &FilterConfig::default()).await?;

    let reopened = FileStore::new(&data);
    let snapshot = reopened
        .latest_snapshot()
        .await?
        .expect("snapshot should exist");
    assert_eq!(Some(snapshot.id), report.snapshot_id);
    assert_eq!(snapshot.count, 1);

    let offer = &snapshot.offers[0];
    assert_eq!(offer.brand, "PEUGEOT");
    assert_eq!(offer.model, "208");
    assert_eq!(offer.monthly_price, 219);
    assert_eq!(offer.duration_months, 60);
    assert_eq!(offer.down_payment, Some(3000));
    assert_eq!(offer.fuel.as_deref(), Some("Benzina"));
    Ok(())
}

#[tokio::test]
async fn test_second_run_reports_price_changes() -> Result<()> {
    let dir = tempdir()?;
    let feeds = dir.path().join("feeds");
    let registry = AdapterRegistry::from_feeds(&["rentago"], &feeds);
    let pipeline = Pipeline::new(Arc::new(FileStore::new(dir.path().join("data"))), options());

    write_feed(
        &feeds,
        "rentago",
        json!([
            {"title": "Fiat 500", "price_text": "€ 199"},
            {"title": "Dacia Sandero", "price_text": "€ 179"}
        ]),
    )?;
    let first = pipeline.run(&registry.all(), &FilterConfig::default()).await?;
    assert_eq!(first.diff_summary.new, 2);

    write_feed(
        &feeds,
        "rentago",
        json!([
            {"title": "Fiat 500", "price_text": "€ 185"},
            {"title": "Dacia Sandero", "price_text": "€ 179"},
            {"title": "Renault Clio", "price_text": "€ 209"}
        ]),
    )?;
    let second = pipeline.run(&registry.all(), &FilterConfig::default()).await?;

    assert_eq!(second.diff_summary.new, 1);
    assert_eq!(second.diff_summary.same, 1);
    assert_eq!(second.diff_summary.decreased, 1);
    let fiat = second
        .diff_results
        .iter()
        .find(|r| r.offer.brand == "FIAT")
        .expect("fiat diffed");
    assert_eq!(fiat.change, PriceChange::Decreased);
    assert_eq!(fiat.delta, 14);
    assert_eq!(fiat.previous_price, Some(199));

    let stats = pipeline.stats().await?;
    assert_eq!(stats.total_runs, 2);
    assert_eq!(stats.total_offers_found, 5);
    assert_eq!(pipeline.history(1).await?.len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_empty_run_keeps_previous_baseline() -> Result<()> {
    let dir = tempdir()?;
    let feeds = dir.path().join("feeds");
    let registry = AdapterRegistry::from_feeds(&["yoyomove"], &feeds);
    let store = Arc::new(FileStore::new(dir.path().join("data")));
    let pipeline = Pipeline::new(store.clone(), options());

    write_feed(&feeds, "yoyomove", json!([{"title": "Toyota Yaris", "price_text": "€ 239"}]))?;
    let first = pipeline.run(&registry.all(), &FilterConfig::default()).await?;

    write_feed(&feeds, "yoyomove", json!([{"title": "Toyota Yaris", "price_text": "€ 999"}]))?;
    let second = pipeline.run(&registry.all(), &FilterConfig::default()).await?;

    assert!(!second.persisted());
    assert_eq!(second.total_offers, 0);
    let snapshot = store.latest_snapshot().await?.expect("baseline kept");
    assert_eq!(Some(snapshot.id), first.snapshot_id);
    assert_eq!(pipeline.stats().await?.total_runs, 1);
    Ok(())
}
