use crate::error::AdapterError;
use crate::types::{RawOfferFields, SiteAdapter};
use std::path::PathBuf;
use tracing::{info, instrument};

/// Reads raw offers that an external extractor dumped as a JSON array.
pub struct JsonFeedAdapter {
    site: String,
    path: PathBuf,
}

impl JsonFeedAdapter {
    pub fn new(site: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            site: site.into(),
            path: path.into(),
        }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

#[async_trait::async_trait]
impl SiteAdapter for JsonFeedAdapter {
    fn site(&self) -> &str {
        &self.site
    }

    #[instrument(skip(self), fields(site = %self.site))]
    async fn fetch(&self) -> Result<Vec<RawOfferFields>, AdapterError> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|e| AdapterError::Fetch {
                site: self.site.clone(),
                message: format!("cannot read feed {}: {}", self.path.display(), e),
            })?;

        let mut records: Vec<RawOfferFields> = serde_json::from_slice(&bytes)?;
        for record in &mut records {
            record.site = self.site.clone();
        }

        info!(
            "Read {} raw offers for {} from {}",
            records.len(),
            self.site,
            self.path.display()
        );
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_fetch_stamps_site() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("leasys.json");
        std::fs::write(
            &path,
            r#"[
                {"site": "other", "title": "Fiat Panda", "price_text": "€ 199"},
                {"title": "Jeep Avenger", "price_text": "€ 249", "duration_text": "36 mesi"}
            ]"#,
        )
        .unwrap();

        let adapter = JsonFeedAdapter::new("leasys", &path);
        let records = adapter.fetch().await.unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.site == "leasys"));
        assert_eq!(records[1].duration_text.as_deref(), Some("36 mesi"));
    }

    #[tokio::test]
    async fn test_missing_feed_is_an_adapter_error() {
        let dir = tempdir().unwrap();
        let adapter = JsonFeedAdapter::new("ayvens", dir.path().join("missing.json"));
        assert!(matches!(
            adapter.fetch().await,
            Err(AdapterError::Fetch { .. })
        ));
    }

    #[tokio::test]
    async fn test_malformed_feed_is_an_adapter_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ayvens.json");
        std::fs::write(&path, "{not json").unwrap();
        let adapter = JsonFeedAdapter::new("ayvens", &path);
        assert!(matches!(adapter.fetch().await, Err(AdapterError::Json(_))));
    }
}
