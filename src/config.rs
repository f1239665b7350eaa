use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

use crate::constants::*;
use crate::error::{Result, ScoutError};
use crate::pipeline::orchestrator::PipelineOptions;
use crate::pipeline::processing::validate::FilterConfig;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub filter: FilterConfig,
    pub storage: StorageConfig,
    pub adapters: AdaptersConfig,
    pub schedule: ScheduleConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub history_retention_days: i64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            history_retention_days: DEFAULT_HISTORY_RETENTION_DAYS,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AdaptersConfig {
    pub feeds_dir: PathBuf,
    pub timeout_seconds: u64,
    pub sites: Vec<String>,
}

impl Default for AdaptersConfig {
    fn default() -> Self {
        Self {
            feeds_dir: PathBuf::from(DEFAULT_FEEDS_DIR),
            timeout_seconds: DEFAULT_ADAPTER_TIMEOUT_SECONDS,
            sites: get_default_sites().into_iter().map(String::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub interval_seconds: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_seconds: DEFAULT_SCHEDULE_INTERVAL_SECONDS,
        }
    }
}

impl Config {
    /// Load `path` if it exists, apply environment overrides and validate.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = fs::read_to_string(path).map_err(|e| {
                ScoutError::Config(format!(
                    "Failed to read config file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
            Self::from_toml(&content)?
        } else {
            Self::default()
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Override values from environment-style variables
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let number = |key: &str, current: u32| -> u32 {
            match lookup(key) {
                Some(raw) if !raw.trim().is_empty() => match raw.trim().parse() {
                    Ok(value) => value,
                    Err(_) => {
                        warn!("Ignoring {}={:?}: not a number", key, raw);
                        current
                    }
                },
                _ => current,
            }
        };
        self.filter.min_price = number("MIN_PRICE", self.filter.min_price);
        self.filter.max_price = number("MAX_PRICE", self.filter.max_price);
        self.filter.min_duration_months =
            number("MIN_DURATION_MONTHS", self.filter.min_duration_months);

        if let Some(list) = lookup("EXCLUDED_BRANDS") {
            self.filter.excluded_brands = FilterConfig::normalize_entries(list.split(','));
        }
        if let Some(list) = lookup("EXCLUDED_MODELS") {
            self.filter.excluded_models = FilterConfig::normalize_entries(list.split(','));
        }
        if let Some(list) = lookup("INCLUDED_MODELS") {
            self.filter.included_models = FilterConfig::normalize_entries(list.split(','));
        }

        if let Some(dir) = lookup("LEASE_DATA_DIR").filter(|d| !d.trim().is_empty()) {
            self.storage.data_dir = PathBuf::from(dir.trim());
        }
        if let Some(dir) = lookup("LEASE_FEEDS_DIR").filter(|d| !d.trim().is_empty()) {
            self.adapters.feeds_dir = PathBuf::from(dir.trim());
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.filter.validate()?;
        if self.adapters.timeout_seconds == 0 {
            return Err(ScoutError::Config(
                "adapters.timeout_seconds must be positive".to_string(),
            ));
        }
        if !(1..=MAX_HISTORY_RETENTION_DAYS).contains(&self.storage.history_retention_days) {
            return Err(ScoutError::Config(format!(
                "storage.history_retention_days must be between 1 and {}",
                MAX_HISTORY_RETENTION_DAYS
            )));
        }
        if self.schedule.interval_seconds == 0 {
            return Err(ScoutError::Config(
                "schedule.interval_seconds must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            adapter_timeout: Duration::from_secs(self.adapters.timeout_seconds),
            history_retention_days: self.storage.history_retention_days,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.filter.min_price, 100);
        assert_eq!(config.filter.max_price, 350);
        assert_eq!(config.filter.min_duration_months, 48);
        assert_eq!(config.adapters.sites.len(), 6);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_toml_partial() {
        let config = Config::from_toml(
            r#"
            [filter]
            max_price = 400
            included_models = ["golf"]

            [adapters]
            sites = ["leasys"]
            timeout_seconds = 30
            "#,
        )
        .unwrap();
        assert_eq!(config.filter.min_price, 100);
        assert_eq!(config.filter.max_price, 400);
        assert!(config.filter.included_models.contains("GOLF"));
        assert_eq!(config.adapters.sites, vec!["leasys".to_string()]);
        assert_eq!(config.pipeline_options().adapter_timeout, Duration::from_secs(30));
        assert_eq!(config.storage.history_retention_days, 30);
    }

    #[test]
    fn test_malformed_toml_is_an_error() {
        assert!(matches!(
            Config::from_toml("[filter\nmin_price = 1"),
            Err(ScoutError::Toml(_))
        ));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.apply_overrides(lookup(&[
            ("MIN_PRICE", "150"),
            ("MAX_PRICE", " 300 "),
            ("EXCLUDED_BRANDS", " tesla, bmw ,,"),
            ("INCLUDED_MODELS", "golf"),
            ("LEASE_DATA_DIR", "/tmp/lease"),
        ]));
        assert_eq!(config.filter.min_price, 150);
        assert_eq!(config.filter.max_price, 300);
        assert_eq!(config.filter.excluded_brands.len(), 2);
        assert!(config.filter.excluded_brands.contains("TESLA"));
        assert!(config.filter.included_models.contains("GOLF"));
        assert_eq!(config.storage.data_dir, PathBuf::from("/tmp/lease"));
    }

    #[test]
    fn test_bad_number_override_is_ignored() {
        let mut config = Config::default();
        config.apply_overrides(lookup(&[("MIN_DURATION_MONTHS", "forever")]));
        assert_eq!(config.filter.min_duration_months, 48);
    }

    #[test]
    fn test_validate_bounds_history_retention() {
        let config =
            Config::from_toml("[storage]\nhistory_retention_days = 100000000000000").unwrap();
        assert!(matches!(config.validate(), Err(ScoutError::Config(_))));

        let config = Config::from_toml("[storage]\nhistory_retention_days = 36500").unwrap();
        assert!(config.validate().is_ok());

        let config = Config::from_toml("[storage]\nhistory_retention_days = 0").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_inverted_prices() {
        let mut config = Config::default();
        config.apply_overrides(lookup(&[("MIN_PRICE", "500")]));
        assert!(matches!(config.validate(), Err(ScoutError::Config(_))));
    }
}
