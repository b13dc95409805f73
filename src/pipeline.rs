//! Item pipeline.
//!
//! Drains a feed item stream under the requested count, turns each admitted
//! item into a chat line and delivers it.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use tracing::{debug, error, warn};

use crate::channel::{Channel, DeliveryTarget};
use crate::command::FeedRequest;
use crate::config::Config;
use crate::datetime::{format_published, time_ago};
use crate::extract::Extractor;
use crate::feed::{FeedError, FeedItem, ItemStream};
use crate::shortener::UrlShortener;
use crate::template::{self, TemplateContext, TemplateEngine, Value};

/// Source of the current time.
pub type Clock = fn() -> DateTime<Utc>;

/// What a pipeline run did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineOutcome {
    /// Items taken from the stream.
    pub admitted: usize,
    /// Item messages delivered.
    pub delivered: usize,
}

/// Turns feed items into delivered chat lines.
pub struct Pipeline {
    config: Arc<Config>,
    templates: Arc<TemplateEngine>,
    extractor: Extractor,
    shortener: Arc<dyn UrlShortener>,
    clock: Clock,
}

impl Pipeline {
    /// Create a pipeline.
    pub fn new(
        config: Arc<Config>,
        templates: Arc<TemplateEngine>,
        extractor: Extractor,
        shortener: Arc<dyn UrlShortener>,
    ) -> Self {
        Self {
            config,
            templates,
            extractor,
            shortener,
            clock: Utc::now,
        }
    }

    /// Replace the clock used for relative times.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Process `items` for `request`.
    ///
    /// At most `request.count` items are pulled from the stream; it is never
    /// polled again once that many have been admitted. Items are handled one
    /// at a time, so deliveries keep feed order. When the stream ends without
    /// yielding anything, the no-items message goes privately to `requester`.
    ///
    /// `base` holds the request-wide template variables (`nick`, `username`,
    /// `url`, `config`). Errors from the stream are returned as-is.
    pub async fn process(
        &self,
        mut items: ItemStream,
        request: &FeedRequest,
        requester: &str,
        target: &DeliveryTarget,
        base: &TemplateContext,
        channel: &dyn Channel,
    ) -> Result<PipelineOutcome, FeedError> {
        let now = (self.clock)();
        let mut outcome = PipelineOutcome::default();

        while outcome.admitted < request.count {
            let Some(item) = items.try_next().await? else {
                break;
            };
            outcome.admitted += 1;

            debug!(
                username = %request.username,
                index = outcome.admitted,
                title = %item.title,
                "Processing feed item"
            );

            let context = self.item_context(base, &item, &now).await;
            match self.templates.render(template::SUCCESS, &context) {
                Ok(text) => {
                    channel.deliver(&text, target.recipient()).await;
                    outcome.delivered += 1;
                }
                Err(e) => {
                    error!(error = %e, title = %item.title, "Failed to render feed item");
                }
            }
        }

        if outcome.admitted == 0 {
            debug!(username = %request.username, "Feed has no items");
            match self.templates.render(template::ERROR_NO_ITEMS, base) {
                Ok(text) => channel.deliver(&text, Some(requester)).await,
                Err(e) => error!(error = %e, "Failed to render no-items message"),
            }
        }

        Ok(outcome)
    }

    /// Build the template context of one item.
    async fn item_context(
        &self,
        base: &TemplateContext,
        item: &FeedItem,
        now: &DateTime<Utc>,
    ) -> TemplateContext {
        let moment = &self.config.moment;
        let date = format_published(&item.published, &moment.timezone, &moment.format);
        let time_ago = time_ago(&item.published, now, &moment.locale);

        let extracted = self.extractor.extract(&item.description);
        let messages = if extracted.is_empty() {
            self.config.messages.no_details.clone()
        } else {
            extracted.join(", ")
        };

        let short_url = self.short_url(&item.link).await;

        let mut context = base.child();
        context.set(
            "item",
            Value::object([
                ("title", Value::string(&item.title)),
                ("link", Value::string(&item.link)),
                ("date", Value::string(&date)),
                ("description", Value::string(&item.description)),
            ]),
        );
        context.set("date", date);
        context.set("timeAgo", time_ago);
        context.set("messages", messages);
        context.set("shortUrl", short_url);
        context
    }

    /// Shorten `link`, falling back to the link itself on failure.
    async fn short_url(&self, link: &str) -> String {
        if link.is_empty() {
            return String::new();
        }

        match self.shortener.shorten(link).await {
            Ok(short) => short,
            Err(e) => {
                warn!(error = %e, link, "URL shortening failed, using original link");
                link.to_string()
            }
        }
    }
}
