use crate::apis::json_feed::JsonFeedAdapter;
use crate::types::SiteAdapter;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Adapters available to a run, in configuration order
#[derive(Clone, Default)]
pub struct AdapterRegistry {
    adapters: Vec<Arc<dyn SiteAdapter>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// One feed adapter per site, reading `<feeds_dir>/<site>.json`
    pub fn from_feeds<S: AsRef<str>>(sites: &[S], feeds_dir: &Path) -> Self {
        let mut registry = Self::new();
        for site in sites {
            let site = site.as_ref();
            registry.register(Arc::new(JsonFeedAdapter::new(
                site,
                feeds_dir.join(format!("{}.json", site)),
            )));
        }
        registry
    }

    pub fn register(&mut self, adapter: Arc<dyn SiteAdapter>) {
        self.adapters.push(adapter);
    }

    pub fn sites(&self) -> Vec<&str> {
        self.adapters.iter().map(|a| a.site()).collect()
    }

    pub fn all(&self) -> Vec<Arc<dyn SiteAdapter>> {
        self.adapters.clone()
    }

    /// Resolve requested names to adapters.
    ///
    /// A name matches a site exactly or when either contains the other,
    /// ignoring case, so "leas" selects "leasys". Unknown names are logged and
    /// skipped; the request order is kept and duplicates are dropped.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Vec<Arc<dyn SiteAdapter>> {
        let mut selected: Vec<Arc<dyn SiteAdapter>> = Vec::new();

        for name in names {
            let wanted = name.as_ref().trim().to_lowercase();
            if wanted.is_empty() {
                continue;
            }

            let found = self
                .adapters
                .iter()
                .find(|a| a.site().to_lowercase() == wanted)
                .or_else(|| {
                    self.adapters.iter().find(|a| {
                        let site = a.site().to_lowercase();
                        site.contains(&wanted) || wanted.contains(&site)
                    })
                });

            match found {
                Some(adapter) => {
                    if selected.iter().any(|s| s.site() == adapter.site()) {
                        continue;
                    }
                    info!("Site selected: {}", adapter.site());
                    selected.push(Arc::clone(adapter));
                }
                None => {
                    warn!(
                        "Site not found: {}. Available sites: {}",
                        name.as_ref(),
                        self.sites().join(", ")
                    );
                }
            }
        }

        selected
    }
}
