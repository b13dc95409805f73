//! URL shortening.
//!
//! Item links are posted in their shortened form when a shortener is
//! configured. The lookup is opaque to the rest of the crate: a long URL goes
//! in, a short string comes out.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use thiserror::Error;

use crate::config::{ShortenerConfig, ShortenerKind};
use crate::{GhFeedError, Result};

/// Short link resolution errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShortenError {
    /// Transport failure.
    #[error("shortener request failed: {0}")]
    Network(String),

    /// The service answered with something other than 200.
    #[error("shortener returned status {0}")]
    BadStatus(u16),

    /// The service answered with an empty body.
    #[error("shortener returned an empty response")]
    Empty,
}

/// Resolves a long URL into a short one.
#[async_trait]
pub trait UrlShortener: Send + Sync {
    /// Shorten `long_url`.
    async fn shorten(&self, long_url: &str) -> std::result::Result<String, ShortenError>;
}

/// Returns every URL unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughShortener;

#[async_trait]
impl UrlShortener for PassthroughShortener {
    async fn shorten(&self, long_url: &str) -> std::result::Result<String, ShortenError> {
        Ok(long_url.to_string())
    }
}

/// Shortener for is.gd compatible services.
///
/// Sends `GET <endpoint>?format=simple&url=<long_url>` and expects the short
/// URL as the plain-text body.
pub struct HttpShortener {
    client: Client,
    endpoint: String,
}

impl HttpShortener {
    /// Create a shortener for the given endpoint.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GhFeedError::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    /// Build the request URL for `long_url`.
    fn request_url(&self, long_url: &str) -> String {
        let separator = if self.endpoint.contains('?') { '&' } else { '?' };
        format!(
            "{}{}format=simple&url={}",
            self.endpoint,
            separator,
            urlencoding::encode(long_url)
        )
    }
}

#[async_trait]
impl UrlShortener for HttpShortener {
    async fn shorten(&self, long_url: &str) -> std::result::Result<String, ShortenError> {
        let response = self
            .client
            .get(self.request_url(long_url))
            .send()
            .await
            .map_err(|e| ShortenError::Network(e.to_string()))?;

        if response.status() != StatusCode::OK {
            return Err(ShortenError::BadStatus(response.status().as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ShortenError::Network(e.to_string()))?;

        let short = body.trim();
        if short.is_empty() {
            return Err(ShortenError::Empty);
        }

        Ok(short.to_string())
    }
}

/// Create the shortener selected by the configuration.
pub fn from_config(config: &ShortenerConfig) -> Result<Arc<dyn UrlShortener>> {
    match config.kind {
        ShortenerKind::None => Ok(Arc::new(PassthroughShortener)),
        ShortenerKind::Http => Ok(Arc::new(HttpShortener::new(
            config.endpoint.clone(),
            Duration::from_secs(config.timeout_secs),
        )?)),
    }
}
