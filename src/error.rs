//! Error types for ghfeed.

use thiserror::Error;

use crate::feed::FeedError;

/// Common error type for ghfeed.
#[derive(Error, Debug)]
pub enum GhFeedError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Template error.
    #[error("template error: {0}")]
    Template(#[from] crate::template::TemplateError),

    /// Feed fetch or decode error.
    #[error("feed error: {0}")]
    Feed(#[from] FeedError),
}

/// Result type alias for ghfeed operations.
pub type Result<T> = std::result::Result<T, GhFeedError>;
