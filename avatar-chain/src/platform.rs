use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::ResolveError;

/// Social platforms an avatar can be resolved for.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    #[strum(ascii_case_insensitive, serialize = "facebook")]
    Facebook,
    #[strum(ascii_case_insensitive, serialize = "instagram")]
    Instagram,
    #[strum(ascii_case_insensitive, serialize = "twitter")]
    Twitter,
}

impl Platform {
    /// Parses a caller supplied identifier, mapping anything unknown to
    /// [`ResolveError::UnsupportedPlatform`].
    pub fn parse(identifier: &str) -> Result<Self, ResolveError> {
        Self::from_str(identifier.trim())
            .map_err(|_| ResolveError::UnsupportedPlatform(identifier.to_string()))
    }

    /// Human readable name, used in warnings and as placeholder text of last resort.
    pub fn display_name(&self) -> &'static str {
        match self {
            Platform::Facebook => "Facebook",
            Platform::Instagram => "Instagram",
            Platform::Twitter => "Twitter",
        }
    }

    /// Brand background and text colour used for egress fallbacks.
    pub(crate) fn brand_colors(&self) -> (&'static str, &'static str) {
        match self {
            Platform::Facebook => ("3b5998", "fff"),
            Platform::Instagram => ("e9f75a", "333"),
            Platform::Twitter => ("1DA1F2", "fff"),
        }
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!(Platform::parse("Instagram").unwrap(), Platform::Instagram);
        assert_eq!(Platform::parse(" TWITTER ").unwrap(), Platform::Twitter);
    }

    #[test]
    fn unknown_identifier_is_unsupported() {
        for identifier in ["tiktok", "", "face book", "x"] {
            let err = Platform::parse(identifier).unwrap_err();
            assert!(matches!(err, ResolveError::UnsupportedPlatform(_)));
            assert_eq!(err.to_string(), "Unsupported platform");
        }
    }

    #[test]
    fn display_round_trips_through_parse() {
        for platform in Platform::iter() {
            assert_eq!(Platform::parse(&platform.to_string()).unwrap(), platform);
        }
    }
}
