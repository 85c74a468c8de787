use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::Regex;

use crate::{
    extract::{first_match, upgrade_twitter_resolution},
    settings::ResolverSettings,
    Fetcher, Platform, Strategy, StrategyError,
};

use super::{encode_segment, html_request, mirror::mirrors_for};

static PROFILE_IMAGE_PATTERN: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![Regex::new(r#"https://pbs\.twimg\.com/profile_images/[^"'\s]+"#).unwrap()]
});

static SYNDICATION_PATTERN: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![Regex::new(r#""profile_image_url_https":"([^"]+)""#).unwrap()]
});

pub(super) fn strategies(
    fetcher: &Arc<dyn Fetcher>,
    settings: &ResolverSettings,
) -> Vec<Box<dyn Strategy>> {
    let mut strategies = mirrors_for(Platform::Twitter, fetcher, settings);
    strategies.push(Box::new(TwitterPage::new(fetcher.clone(), &settings.user_agent)));
    strategies.push(Box::new(Syndication::new(fetcher.clone(), &settings.user_agent)));
    strategies
}

/// Greps the profile page for a `pbs.twimg.com` profile image.
pub struct TwitterPage {
    fetcher: Arc<dyn Fetcher>,
    user_agent: String,
}

impl TwitterPage {
    pub fn new(fetcher: Arc<dyn Fetcher>, user_agent: impl Into<String>) -> Self {
        Self {
            fetcher,
            user_agent: user_agent.into(),
        }
    }
}

#[async_trait]
impl Strategy for TwitterPage {
    fn name(&self) -> &str {
        "profile-page"
    }

    async fn attempt(&self, username: &str) -> Result<Option<String>, StrategyError> {
        let url = format!("https://twitter.com/{}", encode_segment(username));
        let response = self
            .fetcher
            .fetch(html_request(url, &self.user_agent))
            .await?
            .ensure_success()?;

        Ok(first_match(&PROFILE_IMAGE_PATTERN, &response.text(), |_| true)
            .map(|url| upgrade_twitter_resolution(&url)))
    }
}

/// Timeline syndication endpoint, which embeds the user object as JSON.
pub struct Syndication {
    fetcher: Arc<dyn Fetcher>,
    user_agent: String,
}

impl Syndication {
    pub fn new(fetcher: Arc<dyn Fetcher>, user_agent: impl Into<String>) -> Self {
        Self {
            fetcher,
            user_agent: user_agent.into(),
        }
    }
}

#[async_trait]
impl Strategy for Syndication {
    fn name(&self) -> &str {
        "syndication"
    }

    async fn attempt(&self, username: &str) -> Result<Option<String>, StrategyError> {
        let url = format!(
            "https://syndication.twitter.com/srv/timeline-profile/screen-name/{}",
            encode_segment(username)
        );
        let response = self
            .fetcher
            .fetch(html_request(url, &self.user_agent))
            .await?
            .ensure_success()?;

        Ok(first_match(&SYNDICATION_PATTERN, &response.text(), |url| {
            url.starts_with("http")
        })
        .map(|url| upgrade_twitter_resolution(&url)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::stub::StubFetcher;

    #[tokio::test]
    async fn page_upgrades_to_400px() {
        let html = r#"<img src="https://pbs.twimg.com/profile_images/1683325380441128960/yRsRRjGO_normal.jpg" alt="">"#;
        let fetcher = StubFetcher::new().respond("https://twitter.com/jack", 200, html);
        let strategy = TwitterPage::new(Arc::new(fetcher), "ua");

        assert_eq!(
            strategy.attempt("jack").await.unwrap().as_deref(),
            Some("https://pbs.twimg.com/profile_images/1683325380441128960/yRsRRjGO_400x400.jpg")
        );
    }

    #[tokio::test]
    async fn page_without_image_is_a_miss() {
        let fetcher =
            StubFetcher::new().respond("https://twitter.com/jack", 200, "<noscript>JS</noscript>");
        let strategy = TwitterPage::new(Arc::new(fetcher), "ua");

        assert_eq!(strategy.attempt("jack").await.unwrap(), None);
    }

    #[tokio::test]
    async fn syndication_unescapes_and_upgrades() {
        let body = r#"{"user":{"profile_image_url_https":"https://pbs.twimg.com/profile_images/1/abc_normal.png"}}"#;
        let fetcher = StubFetcher::new().respond(
            "https://syndication.twitter.com/srv/timeline-profile/screen-name/jack",
            200,
            body,
        );
        let strategy = Syndication::new(Arc::new(fetcher), "ua");

        assert_eq!(
            strategy.attempt("jack").await.unwrap().as_deref(),
            Some("https://pbs.twimg.com/profile_images/1/abc_400x400.png")
        );
    }

    #[tokio::test]
    async fn syndication_rate_limit_is_an_error() {
        let fetcher = StubFetcher::new().respond("https://syndication.twitter.com/", 429, "");
        let strategy = Syndication::new(Arc::new(fetcher), "ua");

        assert!(matches!(
            strategy.attempt("jack").await,
            Err(StrategyError::Status(429))
        ));
    }

    #[tokio::test]
    async fn screen_name_spaces_are_percent_encoded() {
        let fetcher = StubFetcher::new();
        let shared = Arc::new(fetcher.clone());

        let _ = TwitterPage::new(shared.clone(), "ua").attempt("a b").await;
        let _ = Syndication::new(shared, "ua").attempt("a b").await;

        assert_eq!(
            fetcher.requested_urls(),
            vec![
                "https://twitter.com/a%20b",
                "https://syndication.twitter.com/srv/timeline-profile/screen-name/a%20b",
            ]
        );
    }
}
