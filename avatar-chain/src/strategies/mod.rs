//! Per-platform strategy tables.
//!
//! Each platform module only declares *which* strategies run and in what
//! order; execution and failure isolation live in [`crate::Chain`].

mod facebook;
mod instagram;
mod mirror;
mod twitter;

use std::sync::Arc;

use url::{form_urlencoded, Url};

use crate::{settings::ResolverSettings, Chain, FetchRequest, Fetcher, Platform};

pub use facebook::{FacebookPage, GraphPicture, PageVariant};
pub use instagram::{InstagramPage, WebProfileApi};
pub use mirror::MirrorStrategy;
pub use twitter::{Syndication, TwitterPage};

/// Builds the full chain for `platform` from the configured tables.
pub fn chain_for(platform: Platform, fetcher: Arc<dyn Fetcher>, settings: &ResolverSettings) -> Chain {
    let strategies = match platform {
        Platform::Facebook => facebook::strategies(&fetcher, settings),
        Platform::Instagram => instagram::strategies(&fetcher, settings),
        Platform::Twitter => twitter::strategies(&fetcher, settings),
    };
    Chain::new(platform, strategies)
}

/// Instagram page scrape followed by the web profile API, without mirrors or
/// placeholder. Backs the standalone Instagram profile lookup.
pub fn instagram_profile_lookup(fetcher: Arc<dyn Fetcher>, settings: &ResolverSettings) -> Chain {
    Chain::new(
        Platform::Instagram,
        vec![
            Box::new(InstagramPage::new(fetcher.clone(), &settings.mobile_user_agent)),
            Box::new(WebProfileApi::new(fetcher, &settings.mobile_user_agent)),
        ],
    )
}

/// Percent-encodes `username` as a single path segment. A space becomes
/// `%20`, never `+`.
pub(crate) fn encode_segment(username: &str) -> String {
    Url::parse("http://segment/")
        .ok()
        .and_then(|mut url| {
            url.path_segments_mut().ok()?.pop_if_empty().push(username);
            Some(url.path()[1..].to_string())
        })
        .unwrap_or_default()
}

pub(crate) fn encode_query(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

fn html_request(url: impl Into<String>, user_agent: &str) -> FetchRequest {
    FetchRequest::get(url)
        .header("User-Agent", user_agent)
        .header(
            "Accept",
            "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
        )
        .header("Accept-Language", "en-US,en;q=0.9")
        .header("Cache-Control", "no-cache")
}
