use std::sync::Arc;

use {
    skillery_catalog::CatalogStore, skillery_enrich::MetadataGenerator,
    skillery_github::GithubClient,
};

/// Shared app state, cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: CatalogStore,
    /// Client carrying the configured default token; per-request tokens
    /// clone and override it.
    pub github: GithubClient,
    pub generator: Arc<dyn MetadataGenerator>,
}

impl AppState {
    pub fn new(
        store: CatalogStore,
        github: GithubClient,
        generator: Arc<dyn MetadataGenerator>,
    ) -> Self {
        Self { store, github, generator }
    }
}
