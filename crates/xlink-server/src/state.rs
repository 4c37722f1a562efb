use std::sync::Arc;

use xlink_core::auth::RedirectTagger;
use xlink_core::{
    LinkConfig, LinkError, MemoryTokenStore, OAuthFlow, OAuthProvider, ProfileFetcher, TokenStore,
    TwitterProvider,
};

/// Application state shared across all handlers
pub struct AppState {
    pub flow: OAuthFlow,
    pub store: Arc<dyn TokenStore>,
    pub profiles: ProfileFetcher,
    /// Tags the success-page redirect parameters
    pub tagger: RedirectTagger,
}

impl AppState {
    /// Wire the real X provider and an in-memory token store
    pub fn new(config: LinkConfig) -> Result<Self, LinkError> {
        let provider: Arc<dyn OAuthProvider> = Arc::new(TwitterProvider::from_config(&config)?);
        Self::with_provider(config, provider, Arc::new(MemoryTokenStore::new()))
    }

    pub fn with_provider(
        config: LinkConfig,
        provider: Arc<dyn OAuthProvider>,
        store: Arc<dyn TokenStore>,
    ) -> Result<Self, LinkError> {
        let tagger = RedirectTagger::new(&config.session_secret)?;
        Ok(Self {
            flow: OAuthFlow::new(config, provider.clone())?,
            store,
            profiles: ProfileFetcher::new(provider),
            tagger,
        })
    }

    pub fn config(&self) -> &LinkConfig {
        self.flow.config()
    }
}
