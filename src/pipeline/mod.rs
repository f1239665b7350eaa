// Offer pipeline: processing stages, storage and the run orchestrator

pub mod orchestrator;
pub mod processing;
pub mod storage;

pub use orchestrator::{AdapterFailure, Pipeline, PipelineOptions, RunReport, SiteCounts};
