use serde::Serialize;

use crate::Platform;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RetrievalRequest {
    pub platform: Platform,
    pub username: String,
}

impl RetrievalRequest {
    pub fn new(platform: Platform, username: impl Into<String>) -> Self {
        Self {
            platform,
            username: username.into(),
        }
    }
}

/// Outcome of a resolution. `warning` is set whenever `avatar_url` is a
/// generated placeholder rather than a real profile photo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievalResult {
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl RetrievalResult {
    pub fn found(avatar_url: impl Into<String>) -> Self {
        Self {
            avatar_url: Some(avatar_url.into()),
            warning: None,
        }
    }

    pub fn placeholder(avatar_url: impl Into<String>, warning: impl Into<String>) -> Self {
        Self {
            avatar_url: Some(avatar_url.into()),
            warning: Some(warning.into()),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.warning.is_some()
    }
}
