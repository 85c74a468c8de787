use std::time::Duration;

use serde::Deserialize;

use crate::Platform;

pub const DESKTOP_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";
pub const MOBILE_USER_AGENT: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 14_6 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/14.0.3 Mobile/15E148 Safari/604.1";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ResolverSettings {
    pub user_agent: String,
    pub mobile_user_agent: String,
    pub request_timeout_secs: u64,
    /// Maximum number of memoized resolutions.
    pub memo_capacity: u64,
    /// `0` disables memoization.
    pub memo_ttl_secs: u64,
    pub mirrors: MirrorTable,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            user_agent: DESKTOP_USER_AGENT.to_string(),
            mobile_user_agent: MOBILE_USER_AGENT.to_string(),
            request_timeout_secs: 15,
            memo_capacity: 1_000,
            memo_ttl_secs: 300,
            mirrors: MirrorTable::default(),
        }
    }
}

impl ResolverSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn memo_ttl(&self) -> Option<Duration> {
        (self.memo_ttl_secs > 0).then(|| Duration::from_secs(self.memo_ttl_secs))
    }
}

/// Third-party mirror services per platform, tried in list order.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MirrorTable {
    pub facebook: Vec<Mirror>,
    pub instagram: Vec<Mirror>,
    pub twitter: Vec<Mirror>,
}

impl Default for MirrorTable {
    fn default() -> Self {
        Self {
            facebook: vec![Mirror::verified(
                "unavatar",
                "https://unavatar.io/facebook/{username}?fallback=false",
            )],
            instagram: vec![Mirror::verified(
                "unavatar",
                "https://unavatar.io/instagram/{username}?fallback=false",
            )],
            twitter: vec![
                Mirror::verified("unavatar", "https://unavatar.io/twitter/{username}"),
                Mirror::assumed("vercel", "https://avatar.vercel.sh/twitter:{username}"),
            ],
        }
    }
}

impl MirrorTable {
    pub fn for_platform(&self, platform: Platform) -> &[Mirror] {
        match platform {
            Platform::Facebook => &self.facebook,
            Platform::Instagram => &self.instagram,
            Platform::Twitter => &self.twitter,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Mirror {
    pub name: String,
    /// `{username}` is replaced with the encoded username.
    pub url_template: String,
    /// When false the mirror URL is returned without probing it.
    #[serde(default = "verify_by_default")]
    pub verify: bool,
}

fn verify_by_default() -> bool {
    true
}

impl Mirror {
    pub fn verified(name: &str, url_template: &str) -> Self {
        Self {
            name: name.to_string(),
            url_template: url_template.to_string(),
            verify: true,
        }
    }

    pub fn assumed(name: &str, url_template: &str) -> Self {
        Self {
            verify: false,
            ..Self::verified(name, url_template)
        }
    }
}

/// Download behaviour of the image egress proxy.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EgressSettings {
    pub user_agent: String,
    pub attempts: u32,
    pub attempt_timeout_secs: u64,
    pub retry_delay_ms: u64,
}

impl Default for EgressSettings {
    fn default() -> Self {
        Self {
            user_agent: DESKTOP_USER_AGENT.to_string(),
            attempts: 3,
            attempt_timeout_secs: 5,
            retry_delay_ms: 1_000,
        }
    }
}

impl EgressSettings {
    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_secs(self.attempt_timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}
