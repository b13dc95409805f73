//! Feed fetcher.
//!
//! This module fetches and decodes Atom/RSS feeds with resource limits and
//! hands their entries out one at a time.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use feed_rs::model::Entry;
use feed_rs::parser;
use futures::stream::{self, BoxStream, StreamExt};
use reqwest::{Client, StatusCode};
use tracing::debug;

use super::types::{FeedError, FeedItem};
use crate::config::FeedConfig;
use crate::{GhFeedError, Result};

/// Lazy, finite stream of feed items. Not restartable.
pub type ItemStream = BoxStream<'static, std::result::Result<FeedItem, FeedError>>;

/// Something that turns a feed URL into a stream of items.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetch the feed at `url`.
    ///
    /// Each call performs a fresh request; nothing is cached between calls.
    async fn fetch_items(&self, url: &str) -> std::result::Result<ItemStream, FeedError>;
}

/// Build the feed URL of `username` below `base_url`.
pub fn feed_url(base_url: &str, username: &str) -> Result<String> {
    let base = validate_base_url(base_url)?;
    Ok(join_feed_url(base, username))
}

/// Check that `base_url` is an absolute http(s) URL.
///
/// Returns the URL without trailing slashes.
pub fn validate_base_url(base_url: &str) -> Result<&str> {
    let parsed = url::Url::parse(base_url)
        .map_err(|e| GhFeedError::Config(format!("invalid feed base URL '{base_url}': {e}")))?;

    match parsed.scheme() {
        "http" | "https" => Ok(base_url.trim_end_matches('/')),
        scheme => Err(GhFeedError::Config(format!(
            "unsupported feed URL scheme: {scheme}"
        ))),
    }
}

/// Join an already validated base URL and a username.
///
/// The username is percent-encoded so it always stays a single path segment.
pub fn join_feed_url(base: &str, username: &str) -> String {
    format!("{}/{}.atom", base, urlencoding::encode(username))
}

/// Feed source backed by an HTTP client.
pub struct HttpFeedSource {
    client: Client,
    max_feed_size: u64,
}

impl HttpFeedSource {
    /// Create a new source from the feed configuration.
    pub fn new(config: &FeedConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .read_timeout(Duration::from_secs(config.read_timeout_secs))
            .timeout(Duration::from_secs(config.total_timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| GhFeedError::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            max_feed_size: config.max_feed_size_bytes,
        })
    }
}

#[async_trait]
impl FeedSource for HttpFeedSource {
    async fn fetch_items(&self, url: &str) -> std::result::Result<ItemStream, FeedError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FeedError::Network(e.to_string()))?;

        // Anything but 200 is rejected before the body is touched
        if response.status() != StatusCode::OK {
            return Err(FeedError::BadStatus(response.status().as_u16()));
        }

        if let Some(content_length) = response.content_length() {
            if content_length > self.max_feed_size {
                return Err(FeedError::TooLarge {
                    size: content_length,
                    max: self.max_feed_size,
                });
            }
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FeedError::Network(format!("failed to read response: {e}")))?;

        if bytes.len() as u64 > self.max_feed_size {
            return Err(FeedError::TooLarge {
                size: bytes.len() as u64,
                max: self.max_feed_size,
            });
        }

        debug!(url, bytes = bytes.len(), "Fetched feed");
        decode_feed(&bytes, Utc::now())
    }
}

/// Decode feed bytes into an item stream.
///
/// The document is validated up front; entries are normalized only as the
/// stream is polled. Entries without a date get `fetched_at`.
pub fn decode_feed(
    bytes: &[u8],
    fetched_at: DateTime<Utc>,
) -> std::result::Result<ItemStream, FeedError> {
    let feed = parser::parse(bytes).map_err(|e| FeedError::Parse(e.to_string()))?;

    Ok(stream::iter(feed.entries)
        .map(move |entry| Ok(normalize_entry(entry, fetched_at)))
        .boxed())
}

/// Convert a parsed entry into a [`FeedItem`].
fn normalize_entry(entry: Entry, fetched_at: DateTime<Utc>) -> FeedItem {
    let title = entry
        .title
        .map(|t| t.content.trim().to_string())
        .unwrap_or_else(|| "Untitled".to_string());
    let link = entry
        .links
        .first()
        .map(|l| l.href.clone())
        .unwrap_or_default();
    let published = entry.published.or(entry.updated).unwrap_or(fetched_at);
    let description = entry
        .content
        .and_then(|c| c.body)
        .or(entry.summary.map(|s| s.content))
        .unwrap_or_default();

    FeedItem {
        title,
        link,
        published,
        description,
    }
}
