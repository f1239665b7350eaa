// Site adapters: the raw-offer sources a run draws from

pub mod json_feed;
pub mod registry;

pub use json_feed::JsonFeedAdapter;
pub use registry::AdapterRegistry;
