//! HTTP seam used by every strategy and by the egress proxy.
//!
//! Strategies only ever talk to a [`Fetcher`], so tests swap the network for a
//! stub and the binaries plug in [`ReqwestFetcher`].

use std::{borrow::Cow, time::Duration};

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue, CONTENT_LENGTH, CONTENT_TYPE},
    Client,
};
use serde::de::DeserializeOwned;

use crate::{FetchError, StrategyError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Head,
}

#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub timeout: Option<Duration>,
}

impl FetchRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            headers: Vec::new(),
            timeout: None,
        }
    }

    pub fn head(url: impl Into<String>) -> Self {
        Self {
            method: Method::Head,
            ..Self::get(url)
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    /// URL after redirects were followed.
    pub final_url: String,
    pub content_type: Option<String>,
    pub content_length: Option<u64>,
    pub body: Bytes,
}

impl FetchResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Turns a non-2xx response into a strategy miss.
    pub fn ensure_success(self) -> Result<Self, StrategyError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(StrategyError::Status(self.status))
        }
    }

    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, StrategyError> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

#[async_trait]
pub trait Fetcher: Send + Sync + 'static {
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, FetchError>;
}

/// [`Fetcher`] backed by a shared `reqwest` client that follows redirects.
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: Client,
}

impl ReqwestFetcher {
    pub fn new(request_timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder().timeout(request_timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for ReqwestFetcher {
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, FetchError> {
        let mut headers = HeaderMap::new();
        for (name, value) in &request.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| FetchError::Request(format!("invalid header name {name}: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| FetchError::Request(format!("invalid header value: {e}")))?;
            headers.insert(name, value);
        }

        let builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Head => self.client.head(&request.url),
        };
        let builder = match request.timeout {
            Some(timeout) => builder.timeout(timeout),
            None => builder,
        };

        let response = builder.headers(headers).send().await?;

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let content_type = header_str(response.headers(), CONTENT_TYPE);
        let content_length =
            header_str(response.headers(), CONTENT_LENGTH).and_then(|v| v.parse::<u64>().ok());
        let body = match request.method {
            Method::Get => response.bytes().await?,
            Method::Head => Bytes::new(),
        };

        Ok(FetchResponse {
            status,
            final_url,
            content_type,
            content_length,
            body,
        })
    }
}

fn header_str(headers: &HeaderMap, name: HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

#[cfg(test)]
pub(crate) mod stub {
    //! Offline [`Fetcher`] for tests.

    use std::sync::{Arc, Mutex};

    use super::*;

    enum Reply {
        Response(FetchResponse),
        Error(fn() -> FetchError),
    }

    /// Answers requests by URL prefix, in registration order. Unmatched URLs
    /// get a 404 so that any unexpected request reads as a miss.
    #[derive(Clone, Default)]
    pub struct StubFetcher {
        routes: Arc<Mutex<Vec<(String, Reply)>>>,
        requests: Arc<Mutex<Vec<FetchRequest>>>,
    }

    impl StubFetcher {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn respond(self, prefix: &str, status: u16, body: &str) -> Self {
            self.respond_with(prefix, response(prefix, status, body))
        }

        pub fn respond_with(self, prefix: &str, response: FetchResponse) -> Self {
            self.routes
                .lock()
                .unwrap()
                .push((prefix.to_string(), Reply::Response(response)));
            self
        }

        pub fn fail(self, prefix: &str, error: fn() -> FetchError) -> Self {
            self.routes
                .lock()
                .unwrap()
                .push((prefix.to_string(), Reply::Error(error)));
            self
        }

        pub fn requests(&self) -> Vec<FetchRequest> {
            self.requests.lock().unwrap().clone()
        }

        pub fn requested_urls(&self) -> Vec<String> {
            self.requests().into_iter().map(|r| r.url).collect()
        }
    }

    pub fn response(url: &str, status: u16, body: &str) -> FetchResponse {
        FetchResponse {
            status,
            final_url: url.to_string(),
            content_type: None,
            content_length: None,
            body: Bytes::from(body.to_string()),
        }
    }

    #[async_trait]
    impl Fetcher for StubFetcher {
        async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, FetchError> {
            self.requests.lock().unwrap().push(request.clone());

            let routes = self.routes.lock().unwrap();
            let reply = routes
                .iter()
                .find(|(prefix, _)| request.url.starts_with(prefix.as_str()));

            match reply {
                Some((_, Reply::Response(response))) => Ok(response.clone()),
                Some((_, Reply::Error(error))) => Err(error()),
                None => Ok(response(&request.url, 404, "")),
            }
        }
    }
}
