//! Classifies a pasted profile URL into a platform and a username.

use std::sync::LazyLock;

use regex::Regex;
use url::form_urlencoded;

use crate::{Platform, ProfileUrlError};

static PATTERNS: LazyLock<Vec<(Platform, Regex)>> = LazyLock::new(|| {
    [
        (
            Platform::Facebook,
            r"(?i)^(?:https?://)?(?:www\.|m\.)?(?:facebook\.com|fb\.com)/([^/?#]+)(?:[^?#]*)(?:\?([^#]*))?",
        ),
        (
            Platform::Instagram,
            r"(?i)^(?:https?://)?(?:www\.|m\.)?instagram\.com/([^/?#]+)(?:[^?#]*)(?:\?([^#]*))?",
        ),
        (
            Platform::Twitter,
            r"(?i)^(?:https?://)?(?:www\.|m\.|mobile\.)?(?:twitter\.com|x\.com)/([^/?#]+)(?:[^?#]*)(?:\?([^#]*))?",
        ),
    ]
    .into_iter()
    .map(|(platform, pattern)| (platform, Regex::new(pattern).unwrap()))
    .collect()
});

/// First path segments that never name a profile.
const RESERVED_SEGMENTS: &[&str] = &[
    "p", "reel", "stories", "explore", "home", "i", "intent", "share",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileRef {
    pub platform: Platform,
    pub username: String,
    /// True when `username` is a numeric account id rather than a vanity name.
    pub numeric_id: bool,
}

pub fn parse_profile_url(input: &str) -> Result<ProfileRef, ProfileUrlError> {
    let input = input.trim();

    let (platform, captures) = PATTERNS
        .iter()
        .find_map(|(platform, regex)| regex.captures(input).map(|c| (*platform, c)))
        .ok_or_else(|| ProfileUrlError::UnknownPlatform(input.to_string()))?;

    let segment = percent_decode(&captures[1]);
    let not_a_profile = || ProfileUrlError::NotAProfile(input.to_string());

    if platform == Platform::Facebook && segment.eq_ignore_ascii_case("profile.php") {
        let query = captures.get(2).map_or("", |m| m.as_str());
        let id = form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == "id")
            .map(|(_, value)| value.into_owned())
            .filter(|id| is_numeric(id))
            .ok_or_else(not_a_profile)?;

        return Ok(ProfileRef {
            platform,
            username: id,
            numeric_id: true,
        });
    }

    let username = segment.trim().trim_start_matches('@').to_string();
    if username.is_empty()
        || RESERVED_SEGMENTS
            .iter()
            .any(|reserved| username.eq_ignore_ascii_case(reserved))
    {
        return Err(not_a_profile());
    }

    Ok(ProfileRef {
        platform,
        numeric_id: is_numeric(&username),
        username,
    })
}

fn is_numeric(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|c| c.is_ascii_digit())
}

fn percent_decode(segment: &str) -> String {
    // `+` is literal in a path, so protect it from form decoding.
    let escaped = segment.replace('+', "%2B");
    form_urlencoded::parse(format!("s={escaped}").as_bytes())
        .next()
        .map(|(_, value)| value.into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(url: &str) -> ProfileRef {
        parse_profile_url(url).unwrap()
    }

    #[test]
    fn recognises_each_platform() {
        assert_eq!(
            parsed("https://www.instagram.com/nasa/"),
            ProfileRef {
                platform: Platform::Instagram,
                username: "nasa".to_string(),
                numeric_id: false,
            }
        );
        assert_eq!(parsed("x.com/jack").platform, Platform::Twitter);
        assert_eq!(parsed("https://twitter.com/jack?lang=en").username, "jack");
        assert_eq!(parsed("http://m.facebook.com/zuck").platform, Platform::Facebook);
        assert_eq!(parsed("fb.com/zuck").username, "zuck");
    }

    #[test]
    fn facebook_profile_php_yields_numeric_id() {
        let profile = parsed("https://www.facebook.com/profile.php?id=100004&sk=about");

        assert_eq!(profile.username, "100004");
        assert!(profile.numeric_id);
    }

    #[test]
    fn profile_php_without_id_is_rejected() {
        assert_eq!(
            parse_profile_url("https://facebook.com/profile.php"),
            Err(ProfileUrlError::NotAProfile(
                "https://facebook.com/profile.php".to_string()
            ))
        );
    }

    #[test]
    fn numeric_segment_is_flagged() {
        assert!(parsed("facebook.com/4").numeric_id);
        assert!(!parsed("facebook.com/user4").numeric_id);
    }

    #[test]
    fn reserved_segments_are_not_profiles() {
        for url in [
            "https://www.instagram.com/p/Cx12ab/",
            "https://instagram.com/reel/abc",
            "https://x.com/i/flow/login",
            "https://twitter.com/intent/tweet",
            "https://www.facebook.com/share/abc",
        ] {
            assert!(
                matches!(parse_profile_url(url), Err(ProfileUrlError::NotAProfile(_))),
                "{url} should be rejected"
            );
        }
    }

    #[test]
    fn usernames_are_percent_decoded() {
        assert_eq!(parsed("https://twitter.com/%40jack").username, "jack");
        assert_eq!(parsed("instagram.com/caf%C3%A9").username, "café");
        assert_eq!(parsed("instagram.com/a+b").username, "a+b");
    }

    #[test]
    fn unknown_hosts_are_rejected() {
        assert!(matches!(
            parse_profile_url("https://myspace.com/tom"),
            Err(ProfileUrlError::UnknownPlatform(_))
        ));
        assert!(matches!(
            parse_profile_url("https://notinstagram.com.evil/nasa"),
            Err(ProfileUrlError::UnknownPlatform(_))
        ));
    }

    #[test]
    fn bare_host_is_unknown() {
        assert!(matches!(
            parse_profile_url("https://instagram.com/"),
            Err(ProfileUrlError::UnknownPlatform(_))
        ));
    }
}
