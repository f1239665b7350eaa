/// Site name constants to ensure consistency across the codebase

pub const AYVENS_SITE: &str = "ayvens";
pub const ALPHABET_SITE: &str = "alphabet";
pub const LEASYS_SITE: &str = "leasys";
pub const RENTAGO_SITE: &str = "rentago";
pub const DRIVEFLEE_SITE: &str = "driveflee";
pub const YOYOMOVE_SITE: &str = "yoyomove";

/// Get all sites enabled when the configuration does not list any
pub fn get_default_sites() -> Vec<&'static str> {
    vec![
        AYVENS_SITE,
        ALPHABET_SITE,
        LEASYS_SITE,
        RENTAGO_SITE,
        DRIVEFLEE_SITE,
        YOYOMOVE_SITE,
    ]
}

// Filter defaults
pub const DEFAULT_MIN_PRICE: u32 = 100;
pub const DEFAULT_MAX_PRICE: u32 = 350;
pub const DEFAULT_MIN_DURATION_MONTHS: u32 = 48;

/// Contract length assumed when a listing carries no duration at all
pub const FALLBACK_DURATION_MONTHS: u32 = 48;

pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_FEEDS_DIR: &str = "feeds";
pub const DEFAULT_LOG_DIR: &str = "logs";
pub const DEFAULT_HISTORY_RETENTION_DAYS: i64 = 30;
pub const MAX_HISTORY_RETENTION_DAYS: i64 = 36_500;
pub const DEFAULT_ADAPTER_TIMEOUT_SECONDS: u64 = 120;
pub const DEFAULT_SCHEDULE_INTERVAL_SECONDS: u64 = 24 * 60 * 60;

// Files written by the file store
pub const SNAPSHOT_FILE: &str = "offers.json";
pub const STATS_FILE: &str = "stats.json";
pub const HISTORY_FILE: &str = "history.json";
