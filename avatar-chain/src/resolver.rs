use std::sync::Arc;

use moka::future::Cache;
use tracing::{debug, instrument};

use crate::{
    settings::ResolverSettings, strategies::chain_for, Fetcher, Platform, ResolveError,
    RetrievalRequest, RetrievalResult,
};

/// Entry point for avatar resolution. Cheap to clone and safe to share
/// between concurrent requests.
#[derive(Clone)]
pub struct AvatarResolver {
    fetcher: Arc<dyn Fetcher>,
    settings: Arc<ResolverSettings>,
    memo: Option<Cache<(Platform, String), RetrievalResult>>,
}

impl AvatarResolver {
    pub fn new(fetcher: Arc<dyn Fetcher>, settings: ResolverSettings) -> Self {
        let memo = settings.memo_ttl().map(|ttl| {
            Cache::builder()
                .max_capacity(settings.memo_capacity)
                .time_to_live(ttl)
                .build()
        });

        Self {
            fetcher,
            settings: Arc::new(settings),
            memo,
        }
    }

    pub fn settings(&self) -> &ResolverSettings {
        &self.settings
    }

    pub fn fetcher(&self) -> Arc<dyn Fetcher> {
        self.fetcher.clone()
    }

    /// Resolves `username` on the platform named by `platform`. Only an
    /// unknown platform is an error; every supported platform yields a URL.
    #[instrument(skip(self))]
    pub async fn resolve(
        &self,
        platform: &str,
        username: &str,
    ) -> Result<RetrievalResult, ResolveError> {
        let platform = Platform::parse(platform)?;
        Ok(self
            .resolve_request(&RetrievalRequest::new(platform, username))
            .await)
    }

    pub async fn resolve_request(&self, request: &RetrievalRequest) -> RetrievalResult {
        let Some(memo) = &self.memo else {
            return self.run_chain(request).await;
        };

        // Concurrent misses on the same key share a single chain run.
        let entry = memo
            .entry((request.platform, request.username.clone()))
            .or_insert_with(self.run_chain(request))
            .await;
        if !entry.is_fresh() {
            debug!(platform = %request.platform, username = %request.username, "memoized");
        }
        entry.into_value()
    }

    async fn run_chain(&self, request: &RetrievalRequest) -> RetrievalResult {
        chain_for(request.platform, self.fetcher.clone(), &self.settings)
            .run(&request.username)
            .await
    }
}
