//! Generic chain executor shared by every platform.

use std::panic::AssertUnwindSafe;

use async_trait::async_trait;
use futures::FutureExt;
use tracing::{debug, info, warn};

use crate::{placeholder::Placeholder, Platform, RetrievalResult, StrategyError};

/// One way of finding a real avatar URL for a username.
///
/// `Ok(None)` and `Err(_)` both mean "nothing here"; the distinction only
/// matters for logging.
#[async_trait]
pub trait Strategy: Send + Sync {
    fn name(&self) -> &str;

    async fn attempt(&self, username: &str) -> Result<Option<String>, StrategyError>;
}

/// Ordered strategies for one platform, terminated by a generated placeholder.
pub struct Chain {
    platform: Platform,
    strategies: Vec<Box<dyn Strategy>>,
}

impl Chain {
    pub fn new(platform: Platform, strategies: Vec<Box<dyn Strategy>>) -> Self {
        Self {
            platform,
            strategies,
        }
    }

    pub fn strategy_names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Runs strategies in order until one yields a URL. Errors and panics
    /// inside a strategy are contained to that strategy.
    pub async fn find(&self, username: &str) -> Option<String> {
        for strategy in &self.strategies {
            let attempt = AssertUnwindSafe(strategy.attempt(username)).catch_unwind();

            match attempt.await {
                Ok(Ok(Some(url))) if !url.trim().is_empty() => {
                    info!(
                        platform = %self.platform,
                        username,
                        strategy = strategy.name(),
                        "resolved avatar: {url}"
                    );
                    return Some(url);
                }
                Ok(Ok(_)) => {
                    debug!(
                        platform = %self.platform,
                        username,
                        strategy = strategy.name(),
                        "strategy found nothing"
                    );
                }
                Ok(Err(err)) => {
                    debug!(
                        platform = %self.platform,
                        username,
                        strategy = strategy.name(),
                        "strategy failed: {err}"
                    );
                }
                Err(_) => {
                    warn!(
                        platform = %self.platform,
                        username,
                        strategy = strategy.name(),
                        "strategy panicked"
                    );
                }
            }
        }
        None
    }

    /// Like [`Chain::find`], but never comes back empty handed.
    pub async fn run(&self, username: &str) -> RetrievalResult {
        if let Some(url) = self.find(username).await {
            return RetrievalResult::found(url);
        }

        let placeholder = Placeholder::generate(self.platform, username);
        info!(
            platform = %self.platform,
            username,
            "all strategies missed, using generated placeholder"
        );
        RetrievalResult::placeholder(placeholder.url, placeholder.warning)
    }
}


#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::testing::{Script, Scripted};
    use super::*;

    #[tokio::test]
    async fn first_hit_wins_and_stops_the_chain() {
        let (first, first_calls) = Scripted::new("first", Script::Hit("https://a/1.jpg"));
        let (second, second_calls) = Scripted::new("second", Script::Hit("https://a/2.jpg"));
        let chain = Chain::new(Platform::Instagram, vec![first, second]);

        let result = chain.run("nasa").await;

        assert_eq!(result, RetrievalResult::found("https://a/1.jpg"));
        assert_eq!(first_calls.load(Ordering::SeqCst), 1);
        assert_eq!(second_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failing_strategy_does_not_abort_later_ones() {
        let (first, _) = Scripted::new("first", Script::Fail);
        let (second, second_calls) = Scripted::new("second", Script::Hit("https://a/2.jpg"));
        let chain = Chain::new(Platform::Twitter, vec![first, second]);

        let result = chain.run("jack").await;

        assert_eq!(result.avatar_url.as_deref(), Some("https://a/2.jpg"));
        assert!(result.warning.is_none());
        assert_eq!(second_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn panicking_strategy_does_not_abort_later_ones() {
        let (first, first_calls) = Scripted::new("first", Script::Panic);
        let (second, _) = Scripted::new("second", Script::Hit("https://a/2.jpg"));
        let chain = Chain::new(Platform::Facebook, vec![first, second]);

        let result = chain.run("zuck").await;

        assert_eq!(first_calls.load(Ordering::SeqCst), 1);
        assert_eq!(result.avatar_url.as_deref(), Some("https://a/2.jpg"));
    }

    #[tokio::test]
    async fn empty_url_counts_as_a_miss() {
        let (first, _) = Scripted::new("first", Script::Hit("  "));
        let (second, _) = Scripted::new("second", Script::Hit("https://a/2.jpg"));
        let chain = Chain::new(Platform::Facebook, vec![first, second]);

        let result = chain.run("zuck").await;

        assert_eq!(result.avatar_url.as_deref(), Some("https://a/2.jpg"));
    }

    #[tokio::test]
    async fn exhausted_chain_falls_back_to_placeholder() {
        let (first, _) = Scripted::new("first", Script::Miss);
        let (second, _) = Scripted::new("second", Script::Fail);
        let (third, _) = Scripted::new("third", Script::Panic);
        let chain = Chain::new(Platform::Twitter, vec![first, second, third]);

        let result = chain.run("zzz_unknown_999").await;

        let expected = Placeholder::generate(Platform::Twitter, "zzz_unknown_999");
        assert_eq!(result.avatar_url, Some(expected.url));
        assert_eq!(
            result.warning.as_deref(),
            Some("Could not fetch Twitter avatar. Using generated placeholder.")
        );
    }

    #[tokio::test]
    async fn find_reports_exhaustion_as_none() {
        let (first, _) = Scripted::new("first", Script::Miss);
        let (second, _) = Scripted::new("second", Script::Fail);
        let chain = Chain::new(Platform::Instagram, vec![first, second]);

        assert_eq!(chain.find("nasa").await, None);
    }

    #[tokio::test]
    async fn empty_chain_still_produces_a_url() {
        let chain = Chain::new(Platform::Instagram, Vec::new());

        let result = chain.run("anyone").await;

        assert!(result.avatar_url.is_some());
        assert!(result.is_placeholder());
    }
}
