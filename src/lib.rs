pub mod apis;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod types;

pub use error::{AdapterError, Result, ScoutError};
pub use pipeline::{Pipeline, PipelineOptions, RunReport};
pub use types::{Offer, OfferKey, RawOfferFields, SiteAdapter};
