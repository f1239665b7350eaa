use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScoutError {
    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Persistence error: {message}")]
    Persistence { message: String },

    #[error("A run is already in progress")]
    RunInProgress,
}

impl ScoutError {
    pub fn persistence(message: impl Into<String>) -> Self {
        ScoutError::Persistence {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ScoutError>;

/// Failure of a single site adapter. Never fatal to a run.
#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("fetch failed for {site}: {message}")]
    Fetch { site: String, message: String },

    #[error("fetch for {site} timed out after {seconds}s")]
    Timeout { site: String, seconds: u64 },

    #[error("adapter for {site} panicked")]
    Panicked { site: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),
}
