//! Server-side download of resolved avatars.
//!
//! Browsers often cannot fetch platform CDN images directly (CORS, hotlink
//! protection), so the bytes are pulled here with browser-like headers and a
//! bounded retry loop.

use std::sync::{Arc, LazyLock};

use bytes::Bytes;
use regex::Regex;
use tracing::{info, instrument, warn};
use url::Url;

use crate::{
    placeholder::placeholder_url, settings::EgressSettings, EgressError, FetchError,
    FetchRequest, Fetcher, Platform, ProxyError,
};

/// Services that generate images on demand and can be linked directly.
const GENERATOR_HOSTS: &[&str] = &["ui-avatars.com", "avatar.vercel.sh"];

pub const GENERIC_FALLBACK_URL: &str =
    "https://ui-avatars.com/api/?name=User&background=random&size=256";

const DEFAULT_IMAGE_TYPE: &str = "image/png";
const DEFAULT_PASSTHROUGH_TYPE: &str = "image/jpeg";

static PATH_USERNAME: LazyLock<Vec<(Platform, Regex)>> = LazyLock::new(|| {
    [
        (Platform::Instagram, r"(?i)instagram\.com/([^/?#]+)"),
        (Platform::Twitter, r"(?i)twitter\.com/([^/?#]+)"),
        (Platform::Facebook, r"(?i)facebook\.com/([^/?#]+)"),
    ]
    .into_iter()
    .map(|(platform, pattern)| (platform, Regex::new(pattern).unwrap()))
    .collect()
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedImage {
    pub bytes: Bytes,
    pub content_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EgressOutcome {
    Image(FetchedImage),
    /// The caller should load this URL itself.
    Redirect(String),
}

#[derive(Clone)]
pub struct ImageEgress {
    fetcher: Arc<dyn Fetcher>,
    settings: EgressSettings,
}

impl ImageEgress {
    pub fn new(fetcher: Arc<dyn Fetcher>, settings: EgressSettings) -> Self {
        Self { fetcher, settings }
    }

    /// Downloads `raw_url`, retrying transient failures. When every attempt
    /// fails, platform images degrade to a branded placeholder redirect and
    /// anything else to [`EgressError::Exhausted`].
    #[instrument(skip(self))]
    pub async fn fetch_image(&self, raw_url: &str) -> Result<EgressOutcome, EgressError> {
        let url = Url::parse(raw_url.trim())
            .map_err(|_| EgressError::InvalidUrl(raw_url.to_string()))?;

        if is_generator_host(&url) {
            info!("redirecting to generator host");
            return Ok(EgressOutcome::Redirect(url.to_string()));
        }

        let attempts = self.settings.attempts.max(1);
        for attempt in 1..=attempts {
            match self.try_fetch(&url).await {
                Ok(image) => {
                    info!(attempt, bytes = image.bytes.len(), "downloaded image");
                    return Ok(EgressOutcome::Image(image));
                }
                Err(err) => warn!(attempt, "image download failed: {err}"),
            }

            if attempt < attempts {
                tokio::time::sleep(self.settings.retry_delay()).await;
            }
        }

        match platform_of(&url) {
            Some(platform) => {
                let fallback = branded_fallback(platform, url.as_str());
                info!(%platform, "all attempts failed, redirecting to {fallback}");
                Ok(EgressOutcome::Redirect(fallback))
            }
            None => Err(EgressError::Exhausted {
                attempts,
                fallback_url: GENERIC_FALLBACK_URL.to_string(),
            }),
        }
    }

    /// Single attempt relay of an arbitrary image, for previews.
    #[instrument(skip(self))]
    pub async fn passthrough(&self, url: &str) -> Result<FetchedImage, ProxyError> {
        let response = self.fetcher.fetch(FetchRequest::get(url)).await?;
        if !response.is_success() {
            return Err(ProxyError::Upstream(response.status));
        }

        Ok(FetchedImage {
            content_type: response
                .content_type
                .unwrap_or_else(|| DEFAULT_PASSTHROUGH_TYPE.to_string()),
            bytes: response.body,
        })
    }

    async fn try_fetch(&self, url: &Url) -> Result<FetchedImage, FetchError> {
        let request = FetchRequest::get(url.as_str())
            .header("User-Agent", &self.settings.user_agent)
            .header("Accept", "image/webp,image/apng,image/*,*/*;q=0.8")
            .header("Accept-Language", "en-US,en;q=0.9")
            .header("Referer", url.origin().ascii_serialization())
            .timeout(self.settings.attempt_timeout());

        let response =
            tokio::time::timeout(self.settings.attempt_timeout(), self.fetcher.fetch(request))
                .await
                .map_err(|_| FetchError::Timeout)??;

        if !response.is_success() {
            return Err(FetchError::Request(format!(
                "upstream answered {}",
                response.status
            )));
        }

        Ok(FetchedImage {
            content_type: response
                .content_type
                .unwrap_or_else(|| DEFAULT_IMAGE_TYPE.to_string()),
            bytes: response.body,
        })
    }
}

fn is_generator_host(url: &Url) -> bool {
    let Some(host) = url.host_str() else {
        return false;
    };
    GENERATOR_HOSTS
        .iter()
        .any(|generator| host == *generator || host.ends_with(&format!(".{generator}")))
}

fn platform_of(url: &Url) -> Option<Platform> {
    let host = url.host_str()?.to_ascii_lowercase();
    if host.contains("instagram") {
        Some(Platform::Instagram)
    } else if host.contains("twitter") || host.contains("twimg") {
        Some(Platform::Twitter)
    } else if host.contains("facebook") || host.contains("fbcdn") {
        Some(Platform::Facebook)
    } else {
        None
    }
}

/// Placeholder in the platform's brand colours, named after the username in
/// `url` or, failing that, the platform's initials.
fn branded_fallback(platform: Platform, url: &str) -> String {
    let name = PATH_USERNAME
        .iter()
        .find(|(candidate, _)| *candidate == platform)
        .and_then(|(_, regex)| regex.captures(url))
        .map(|captures| captures[1].to_string())
        .unwrap_or_else(|| platform.to_string()[..2].to_ascii_uppercase());
    let (background, color) = platform.brand_colors();

    placeholder_url(&[
        ("name", name.as_str()),
        ("background", background),
        ("color", color),
        ("size", "256"),
        ("bold", "true"),
    ])
}
