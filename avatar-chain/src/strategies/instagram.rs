use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use tracing::debug;

use crate::{
    extract::first_match, settings::ResolverSettings, FetchRequest, Fetcher, Platform, Strategy,
    StrategyError,
};

use super::{encode_query, encode_segment, html_request, mirror::mirrors_for};

/// Public app id of the Instagram web client.
const IG_APP_ID: &str = "936619743392459";

static SHARED_DATA_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)window\._sharedData\s*=\s*(\{.*?\});\s*</script>").unwrap()
});

static PROFILE_PIC_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r#""profile_pic_url_hd":"([^"]+)""#,
        r#""profile_pic_url":"([^"]+)""#,
        r#"profilePicture[^}]+"uri":"([^"]+)""#,
        r#"(?i)<meta property="og:image" content="([^"]+)""#,
        r#"profile_pic_url\\?":\\?"([^"\\]+)"#,
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

pub(super) fn strategies(
    fetcher: &Arc<dyn Fetcher>,
    settings: &ResolverSettings,
) -> Vec<Box<dyn Strategy>> {
    let mut strategies: Vec<Box<dyn Strategy>> = vec![
        Box::new(WebProfileApi::new(fetcher.clone(), &settings.user_agent)),
        Box::new(InstagramPage::new(fetcher.clone(), &settings.user_agent)),
    ];
    strategies.extend(mirrors_for(Platform::Instagram, fetcher, settings));
    strategies
}

#[derive(Debug, Deserialize)]
struct ProfileUser {
    profile_pic_url_hd: Option<String>,
    profile_pic_url: Option<String>,
}

impl ProfileUser {
    fn best_url(self) -> Option<String> {
        self.profile_pic_url_hd
            .filter(|url| !url.is_empty())
            .or(self.profile_pic_url.filter(|url| !url.is_empty()))
    }
}

#[derive(Debug, Deserialize)]
struct WebProfileInfo {
    data: Option<WebProfileData>,
}

#[derive(Debug, Deserialize)]
struct WebProfileData {
    user: Option<ProfileUser>,
}

#[derive(Debug, Deserialize)]
struct SharedData {
    entry_data: SharedEntryData,
}

#[derive(Debug, Deserialize)]
struct SharedEntryData {
    #[serde(rename = "ProfilePage", default)]
    profile_page: Vec<SharedProfilePage>,
}

#[derive(Debug, Deserialize)]
struct SharedProfilePage {
    graphql: SharedGraphql,
}

#[derive(Debug, Deserialize)]
struct SharedGraphql {
    user: ProfileUser,
}

/// The JSON endpoint the Instagram web client uses for profile headers.
pub struct WebProfileApi {
    fetcher: Arc<dyn Fetcher>,
    user_agent: String,
}

impl WebProfileApi {
    pub fn new(fetcher: Arc<dyn Fetcher>, user_agent: impl Into<String>) -> Self {
        Self {
            fetcher,
            user_agent: user_agent.into(),
        }
    }
}

#[async_trait]
impl Strategy for WebProfileApi {
    fn name(&self) -> &str {
        "web-profile-api"
    }

    async fn attempt(&self, username: &str) -> Result<Option<String>, StrategyError> {
        let url = format!(
            "https://i.instagram.com/api/v1/users/web_profile_info/?username={}",
            encode_query(username)
        );
        let request = FetchRequest::get(url)
            .header("User-Agent", &self.user_agent)
            .header("Accept", "application/json")
            .header("X-IG-App-ID", IG_APP_ID)
            .header("X-Requested-With", "XMLHttpRequest")
            .header("Sec-Fetch-Site", "same-site")
            .header("Sec-Fetch-Mode", "cors")
            .header("Referer", "https://www.instagram.com/")
            .header("Origin", "https://www.instagram.com");

        let response = self.fetcher.fetch(request).await?.ensure_success()?;
        let info: WebProfileInfo = response.json()?;

        Ok(info
            .data
            .and_then(|data| data.user)
            .and_then(ProfileUser::best_url))
    }
}

/// Scrapes the profile page: embedded `_sharedData` JSON first, then regexes.
pub struct InstagramPage {
    fetcher: Arc<dyn Fetcher>,
    user_agent: String,
}

impl InstagramPage {
    pub fn new(fetcher: Arc<dyn Fetcher>, user_agent: impl Into<String>) -> Self {
        Self {
            fetcher,
            user_agent: user_agent.into(),
        }
    }
}

#[async_trait]
impl Strategy for InstagramPage {
    fn name(&self) -> &str {
        "profile-page"
    }

    async fn attempt(&self, username: &str) -> Result<Option<String>, StrategyError> {
        let url = format!("https://www.instagram.com/{}/", encode_segment(username));
        let request = html_request(url, &self.user_agent)
            .header("Referer", "https://www.instagram.com/")
            .header("Pragma", "no-cache");
        let response = self.fetcher.fetch(request).await?.ensure_success()?;
        let html = response.text();

        if let Some(url) = from_shared_data(&html) {
            return Ok(Some(url));
        }

        Ok(first_match(&PROFILE_PIC_PATTERNS, &html, |url| {
            url.starts_with("http")
        }))
    }
}

fn from_shared_data(html: &str) -> Option<String> {
    let json = SHARED_DATA_PATTERN.captures(html)?.get(1)?.as_str();

    match serde_json::from_str::<SharedData>(json) {
        Ok(shared) => shared
            .entry_data
            .profile_page
            .into_iter()
            .next()
            .and_then(|page| page.graphql.user.best_url()),
        Err(err) => {
            debug!("ignoring unparsable _sharedData: {err}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::stub::StubFetcher;

    const API_URL: &str = "https://i.instagram.com/api/v1/users/web_profile_info/?username=";

    #[tokio::test]
    async fn api_prefers_hd_picture() {
        let fetcher = StubFetcher::new().respond(
            API_URL,
            200,
            r#"{"data":{"user":{"profile_pic_url":"https://x/sd.jpg","profile_pic_url_hd":"https://x/hd.jpg"}}}"#,
        );
        let strategy = WebProfileApi::new(Arc::new(fetcher.clone()), "ua");

        let url = strategy.attempt("nasa").await.unwrap();

        assert_eq!(url.as_deref(), Some("https://x/hd.jpg"));
        let request = &fetcher.requests()[0];
        assert_eq!(request.url, format!("{API_URL}nasa"));
        assert!(request
            .headers
            .contains(&("X-IG-App-ID".to_string(), IG_APP_ID.to_string())));
    }

    #[tokio::test]
    async fn api_falls_back_to_standard_picture() {
        let fetcher = StubFetcher::new().respond(
            API_URL,
            200,
            r#"{"data":{"user":{"profile_pic_url":"https://x/sd.jpg","profile_pic_url_hd":""}}}"#,
        );
        let strategy = WebProfileApi::new(Arc::new(fetcher), "ua");

        assert_eq!(
            strategy.attempt("nasa").await.unwrap().as_deref(),
            Some("https://x/sd.jpg")
        );
    }

    #[tokio::test]
    async fn api_without_user_is_a_miss() {
        let fetcher = StubFetcher::new().respond(API_URL, 200, r#"{"data":{"user":null}}"#);
        let strategy = WebProfileApi::new(Arc::new(fetcher), "ua");

        assert_eq!(strategy.attempt("ghost").await.unwrap(), None);
    }

    #[tokio::test]
    async fn api_html_login_wall_is_a_payload_error() {
        let fetcher = StubFetcher::new().respond(API_URL, 200, "<html>login</html>");
        let strategy = WebProfileApi::new(Arc::new(fetcher), "ua");

        assert!(matches!(
            strategy.attempt("nasa").await,
            Err(StrategyError::Payload(_))
        ));
    }

    #[tokio::test]
    async fn page_reads_shared_data_first() {
        let html = r#"<script type="text/javascript">window._sharedData = {"entry_data":{"ProfilePage":[{"graphql":{"user":{"profile_pic_url_hd":"https://x/shared.jpg"}}}]}};</script>
            <meta property="og:image" content="https://x/og.jpg">"#;
        let fetcher = StubFetcher::new().respond("https://www.instagram.com/nasa/", 200, html);
        let strategy = InstagramPage::new(Arc::new(fetcher), "ua");

        assert_eq!(
            strategy.attempt("nasa").await.unwrap().as_deref(),
            Some("https://x/shared.jpg")
        );
    }

    #[tokio::test]
    async fn page_falls_back_to_regexes_and_unescapes() {
        let html = r#"<script>{"props":{"profile_pic_url":"https:\/\/scontent.cdninstagram.com\/v\/p.jpg?a=1\u0026b=2"}}</script>"#;
        let fetcher = StubFetcher::new().respond("https://www.instagram.com/nasa/", 200, html);
        let strategy = InstagramPage::new(Arc::new(fetcher), "ua");

        assert_eq!(
            strategy.attempt("nasa").await.unwrap().as_deref(),
            Some("https://scontent.cdninstagram.com/v/p.jpg?a=1&b=2")
        );
    }

    #[tokio::test]
    async fn page_uses_og_image_when_nothing_else_matches() {
        let html = r#"<meta property="og:image" content="https://x/og.jpg?x=1&amp;y=2" />"#;
        let fetcher = StubFetcher::new().respond("https://www.instagram.com/nasa/", 200, html);
        let strategy = InstagramPage::new(Arc::new(fetcher), "ua");

        assert_eq!(
            strategy.attempt("nasa").await.unwrap().as_deref(),
            Some("https://x/og.jpg?x=1&y=2")
        );
    }

    #[tokio::test]
    async fn broken_shared_data_still_tries_regexes() {
        let html = r#"<script type="text/javascript">window._sharedData = {not json};</script>"profile_pic_url_hd":"https://x/hd.jpg""#;
        let fetcher = StubFetcher::new().respond("https://www.instagram.com/nasa/", 200, html);
        let strategy = InstagramPage::new(Arc::new(fetcher), "ua");

        assert_eq!(
            strategy.attempt("nasa").await.unwrap().as_deref(),
            Some("https://x/hd.jpg")
        );
    }

    #[tokio::test]
    async fn spaces_are_percent_encoded_in_paths_only() {
        let fetcher = StubFetcher::new();
        let shared = Arc::new(fetcher.clone());

        let _ = InstagramPage::new(shared.clone(), "ua").attempt("a b").await;
        let _ = WebProfileApi::new(shared, "ua").attempt("a b").await;

        assert_eq!(
            fetcher.requested_urls(),
            vec![
                "https://www.instagram.com/a%20b/",
                "https://i.instagram.com/api/v1/users/web_profile_info/?username=a+b",
            ]
        );
    }
}
