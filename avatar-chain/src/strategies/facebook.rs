use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use tracing::debug;

use crate::{
    extract::{digit_run, first_match},
    settings::ResolverSettings,
    silhouette::{is_silhouette_size, is_silhouette_url},
    FetchRequest, Fetcher, Platform, Strategy, StrategyError,
};

use super::{encode_segment, html_request, mirror::mirrors_for};

const GRAPH_BASE_URL: &str = "https://graph.facebook.com";

static DESKTOP_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r#"(?i)<meta\s+property="og:image"\s+content="([^"]+)""#,
        r#""profilePic\w*"\s*:\s*\{\s*"uri"\s*:\s*"([^"]+)""#,
        r#""profile_picture"\s*:\s*\{\s*"uri"\s*:\s*"([^"]+)""#,
        r#"<image[^>]+xlink:href="([^"]+)""#,
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static MOBILE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    let mut patterns = DESKTOP_PATTERNS.to_vec();
    patterns.push(
        Regex::new(r#"<img[^>]+class="[^"]*profpic[^"]*"[^>]+src="([^"]+)""#).unwrap(),
    );
    patterns
});

pub(super) fn strategies(
    fetcher: &Arc<dyn Fetcher>,
    settings: &ResolverSettings,
) -> Vec<Box<dyn Strategy>> {
    let mut strategies: Vec<Box<dyn Strategy>> = vec![
        Box::new(GraphPicture::by_username(fetcher.clone(), &settings.user_agent)),
        Box::new(FacebookPage::new(
            PageVariant::Desktop,
            fetcher.clone(),
            &settings.user_agent,
        )),
        Box::new(FacebookPage::new(
            PageVariant::Mobile,
            fetcher.clone(),
            &settings.mobile_user_agent,
        )),
        Box::new(GraphPicture::by_numeric_id(fetcher.clone(), &settings.user_agent)),
    ];
    strategies.extend(mirrors_for(Platform::Facebook, fetcher, settings));
    strategies
}

#[derive(Debug, Deserialize)]
struct GraphPictureResponse {
    data: GraphPictureData,
}

#[derive(Debug, Deserialize)]
struct GraphPictureData {
    url: Option<String>,
    #[serde(default)]
    is_silhouette: bool,
}

/// Graph API picture endpoints. Each variant is tried in turn and rejected if
/// it lands on a default silhouette.
pub struct GraphPicture {
    name: &'static str,
    numeric_only: bool,
    fetcher: Arc<dyn Fetcher>,
    user_agent: String,
}

impl GraphPicture {
    pub fn by_username(fetcher: Arc<dyn Fetcher>, user_agent: impl Into<String>) -> Self {
        Self {
            name: "graph-cdn",
            numeric_only: false,
            fetcher,
            user_agent: user_agent.into(),
        }
    }

    /// Retries the endpoints with the first digit run found in the username,
    /// for vanity names that embed a numeric profile id.
    pub fn by_numeric_id(fetcher: Arc<dyn Fetcher>, user_agent: impl Into<String>) -> Self {
        Self {
            name: "numeric-id",
            numeric_only: true,
            ..Self::by_username(fetcher, user_agent)
        }
    }

    async fn json_endpoint(&self, id: &str) -> Result<Option<String>, StrategyError> {
        let url = format!("{GRAPH_BASE_URL}/{id}/picture?type=large&redirect=false");
        let response = self
            .fetcher
            .fetch(FetchRequest::get(url).header("User-Agent", &self.user_agent))
            .await?
            .ensure_success()?;
        let picture: GraphPictureResponse = response.json()?;

        let GraphPictureData { url, is_silhouette } = picture.data;
        Ok(url.filter(|url| !is_silhouette && !is_silhouette_url(url)))
    }

    async fn redirect_endpoint(&self, id: &str, query: &str) -> Result<Option<String>, StrategyError> {
        let url = format!("{GRAPH_BASE_URL}/{id}/picture?{query}");
        let response = self
            .fetcher
            .fetch(FetchRequest::head(url).header("User-Agent", &self.user_agent))
            .await?
            .ensure_success()?;

        if is_silhouette_url(&response.final_url) || is_silhouette_size(response.content_length) {
            return Ok(None);
        }
        Ok(Some(response.final_url))
    }
}

#[async_trait]
impl Strategy for GraphPicture {
    fn name(&self) -> &str {
        self.name
    }

    async fn attempt(&self, username: &str) -> Result<Option<String>, StrategyError> {
        let id = if self.numeric_only {
            match digit_run(username) {
                Some(digits) if digits != username => digits.to_string(),
                _ => return Ok(None),
            }
        } else {
            encode_segment(username)
        };

        let mut last_error = None;
        for endpoint in GraphEndpoint::ORDER {
            let outcome = match endpoint {
                GraphEndpoint::Json => self.json_endpoint(&id).await,
                GraphEndpoint::Redirect(query) => self.redirect_endpoint(&id, query).await,
            };

            match outcome {
                Ok(Some(url)) => return Ok(Some(url)),
                Ok(None) => {}
                Err(err) => {
                    debug!("graph endpoint for {id} failed: {err}");
                    last_error = Some(err);
                }
            }
        }

        match last_error {
            Some(err) => Err(err),
            None => Ok(None),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum GraphEndpoint {
    /// `redirect=false`, answers with JSON carrying an `is_silhouette` flag.
    Json,
    /// Redirects to the CDN image; only the final URL and size are inspected.
    Redirect(&'static str),
}

impl GraphEndpoint {
    const ORDER: [GraphEndpoint; 3] = [
        GraphEndpoint::Json,
        GraphEndpoint::Redirect("type=large"),
        GraphEndpoint::Redirect("width=720&height=720"),
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageVariant {
    Desktop,
    Mobile,
}

impl PageVariant {
    fn base_url(&self) -> &'static str {
        match self {
            PageVariant::Desktop => "https://www.facebook.com",
            PageVariant::Mobile => "https://m.facebook.com",
        }
    }

    fn patterns(&self) -> &'static [Regex] {
        match self {
            PageVariant::Desktop => &DESKTOP_PATTERNS,
            PageVariant::Mobile => &MOBILE_PATTERNS,
        }
    }
}

/// Scrapes the public profile page for the first non-silhouette image URL.
pub struct FacebookPage {
    variant: PageVariant,
    fetcher: Arc<dyn Fetcher>,
    user_agent: String,
}

impl FacebookPage {
    pub fn new(
        variant: PageVariant,
        fetcher: Arc<dyn Fetcher>,
        user_agent: impl Into<String>,
    ) -> Self {
        Self {
            variant,
            fetcher,
            user_agent: user_agent.into(),
        }
    }
}

#[async_trait]
impl Strategy for FacebookPage {
    fn name(&self) -> &str {
        match self.variant {
            PageVariant::Desktop => "profile-page",
            PageVariant::Mobile => "mobile-page",
        }
    }

    async fn attempt(&self, username: &str) -> Result<Option<String>, StrategyError> {
        let url = format!("{}/{}", self.variant.base_url(), encode_segment(username));
        let response = self
            .fetcher
            .fetch(html_request(url, &self.user_agent))
            .await?
            .ensure_success()?;
        let html = response.text();

        Ok(first_match(self.variant.patterns(), &html, |url| {
            url.starts_with("http") && !is_silhouette_url(url)
        }))
    }
}
