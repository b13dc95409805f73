//! Feed item source for ghfeed.
//!
//! Fetches a user's activity feed over HTTP and exposes its entries as a lazy
//! stream of [`FeedItem`]s.

mod fetcher;
mod types;

pub use fetcher::{
    decode_feed, feed_url, join_feed_url, validate_base_url, FeedSource, HttpFeedSource, ItemStream,
};
pub use types::{ErrorCategory, FeedError, FeedItem};
