use std::sync::Arc;

use avatar_chain::{
    strategies::instagram_profile_lookup, AvatarResolver, Chain, FetchError, Fetcher,
    ImageEgress, ReqwestFetcher,
};

use crate::config::Settings;

#[derive(Clone)]
pub struct AppState {
    pub resolver: AvatarResolver,
    pub egress: ImageEgress,
}

impl AppState {
    pub fn new(fetcher: Arc<dyn Fetcher>, config: &Settings) -> Self {
        Self {
            resolver: AvatarResolver::new(fetcher.clone(), config.resolver.clone()),
            egress: ImageEgress::new(fetcher, config.egress.clone()),
        }
    }

    /// State backed by a real HTTP client.
    pub fn from_settings(config: &Settings) -> Result<Self, FetchError> {
        let fetcher = ReqwestFetcher::new(config.resolver.request_timeout())?;
        Ok(Self::new(Arc::new(fetcher), config))
    }

    pub fn instagram_lookup(&self) -> Chain {
        instagram_profile_lookup(self.resolver.fetcher(), self.resolver.settings())
    }
}
