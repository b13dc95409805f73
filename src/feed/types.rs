//! Feed types for ghfeed.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// One normalized feed entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedItem {
    /// Entry title.
    pub title: String,
    /// Link to the activity on the web; empty when the entry has none.
    pub link: String,
    /// When the entry was published (or last updated).
    pub published: DateTime<Utc>,
    /// HTML body of the entry.
    pub description: String,
}

/// Which error message a failure is reported with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The feed could not be retrieved.
    Request,
    /// The feed was retrieved but could not be decoded.
    FeedParser,
}

/// Feed fetch and decode errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeedError {
    /// Transport failure (DNS, connection, timeout, body read).
    #[error("failed to fetch feed: {0}")]
    Network(String),

    /// The server answered with something other than 200.
    #[error("bad status code: {0}")]
    BadStatus(u16),

    /// The feed is bigger than the configured limit.
    #[error("feed too large: {size} bytes (max {max} bytes)")]
    TooLarge {
        /// Reported or actual size in bytes.
        size: u64,
        /// Configured limit in bytes.
        max: u64,
    },

    /// The body is not a valid Atom/RSS document.
    #[error("failed to parse feed: {0}")]
    Parse(String),
}

impl FeedError {
    /// Get the error message category for this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            FeedError::Network(_) | FeedError::BadStatus(_) | FeedError::TooLarge { .. } => {
                ErrorCategory::Request
            }
            FeedError::Parse(_) => ErrorCategory::FeedParser,
        }
    }
}
