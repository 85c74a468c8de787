use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    settings::{Mirror, ResolverSettings},
    FetchRequest, Fetcher, Platform, Strategy, StrategyError,
};

use super::encode_segment;

/// Third-party avatar mirror. Verified mirrors are probed with `HEAD` and
/// only count when they answer 2xx; the rest are trusted blindly.
pub struct MirrorStrategy {
    name: String,
    mirror: Mirror,
    fetcher: Arc<dyn Fetcher>,
    user_agent: String,
}

impl MirrorStrategy {
    pub fn new(mirror: Mirror, fetcher: Arc<dyn Fetcher>, user_agent: impl Into<String>) -> Self {
        Self {
            name: format!("mirror:{}", mirror.name),
            mirror,
            fetcher,
            user_agent: user_agent.into(),
        }
    }

    fn url_for(&self, username: &str) -> String {
        self.mirror
            .url_template
            .replace("{username}", &encode_segment(username))
    }
}

#[async_trait]
impl Strategy for MirrorStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    async fn attempt(&self, username: &str) -> Result<Option<String>, StrategyError> {
        let url = self.url_for(username);
        if !self.mirror.verify {
            return Ok(Some(url));
        }

        let request = FetchRequest::head(&url)
            .header("User-Agent", &self.user_agent)
            .header("Cache-Control", "no-cache")
            .header("Pragma", "no-cache");
        self.fetcher.fetch(request).await?.ensure_success()?;

        Ok(Some(url))
    }
}

pub(crate) fn mirrors_for(
    platform: Platform,
    fetcher: &Arc<dyn Fetcher>,
    settings: &ResolverSettings,
) -> Vec<Box<dyn Strategy>> {
    settings
        .mirrors
        .for_platform(platform)
        .iter()
        .map(|mirror| {
            Box::new(MirrorStrategy::new(
                mirror.clone(),
                fetcher.clone(),
                &settings.user_agent,
            )) as Box<dyn Strategy>
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{fetch::stub::StubFetcher, FetchError, Method};

    fn strategy(mirror: Mirror, fetcher: &StubFetcher) -> MirrorStrategy {
        MirrorStrategy::new(mirror, Arc::new(fetcher.clone()), "test-agent")
    }

    #[tokio::test]
    async fn verified_mirror_probes_with_head() {
        let fetcher = StubFetcher::new().respond("https://unavatar.io/twitter/jack", 200, "");
        let mirror = Mirror::verified("unavatar", "https://unavatar.io/twitter/{username}");

        let url = strategy(mirror, &fetcher).attempt("jack").await.unwrap();

        assert_eq!(url.as_deref(), Some("https://unavatar.io/twitter/jack"));
        let requests = fetcher.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, Method::Head);
    }

    #[tokio::test]
    async fn verified_mirror_rejects_error_status() {
        let fetcher = StubFetcher::new().respond("https://unavatar.io/", 404, "");
        let mirror = Mirror::verified("unavatar", "https://unavatar.io/instagram/{username}");

        let result = strategy(mirror, &fetcher).attempt("ghost").await;

        assert!(matches!(result, Err(StrategyError::Status(404))));
    }

    #[tokio::test]
    async fn verified_mirror_surfaces_transport_errors() {
        let fetcher = StubFetcher::new().fail("https://unavatar.io/", || FetchError::Timeout);
        let mirror = Mirror::verified("unavatar", "https://unavatar.io/instagram/{username}");

        let result = strategy(mirror, &fetcher).attempt("ghost").await;

        assert!(matches!(result, Err(StrategyError::Fetch(FetchError::Timeout))));
    }

    #[tokio::test]
    async fn assumed_mirror_makes_no_request() {
        let fetcher = StubFetcher::new();
        let mirror = Mirror::assumed("vercel", "https://avatar.vercel.sh/twitter:{username}");

        let url = strategy(mirror, &fetcher).attempt("jack").await.unwrap();

        assert_eq!(url.as_deref(), Some("https://avatar.vercel.sh/twitter:jack"));
        assert!(fetcher.requests().is_empty());
    }

    #[tokio::test]
    async fn username_is_encoded_into_the_template() {
        let fetcher = StubFetcher::new();
        let mirror = Mirror::assumed("vercel", "https://avatar.vercel.sh/twitter:{username}");

        let url = strategy(mirror, &fetcher).attempt("a b/c").await.unwrap();

        assert_eq!(url.as_deref(), Some("https://avatar.vercel.sh/twitter:a%20b%2Fc"));
    }
}
