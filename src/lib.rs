//! ghfeed - GitHub activity feed chat command
//!
//! Answers `!ghFeed[ <username>][ <count>]` with the most recent entries of a
//! GitHub user's public Atom feed, one chat line per entry.

pub mod channel;
pub mod command;
pub mod config;
pub mod datetime;
pub mod error;
pub mod extract;
pub mod feed;
pub mod handler;
pub mod logging;
pub mod pipeline;
pub mod shortener;
pub mod template;

pub use channel::{Channel, ConsoleChannel, Delivery, DeliveryTarget, MemoryChannel};
pub use command::{parse_command, FeedCommand, FeedRequest};
pub use config::Config;
pub use error::{GhFeedError, Result};
pub use extract::Extractor;
pub use feed::{ErrorCategory, FeedError, FeedItem, FeedSource, HttpFeedSource, ItemStream};
pub use handler::{CommandOutcome, Handler};
pub use pipeline::{Pipeline, PipelineOutcome};
pub use shortener::{HttpShortener, PassthroughShortener, ShortenError, UrlShortener};
pub use template::{TemplateContext, TemplateEngine, TemplateError, Value};
