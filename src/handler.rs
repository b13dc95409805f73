//! Command handler.
//!
//! Ties a parsed trigger to the feed source, the item pipeline and the
//! channel it came from. Every failure ends in a single private message to
//! the requester.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::channel::{Channel, DeliveryTarget};
use crate::command::{parse_command, FeedCommand, FeedRequest};
use crate::config::Config;
use crate::extract::Extractor;
use crate::feed::{join_feed_url, validate_base_url, ErrorCategory, FeedError, FeedSource};
use crate::pipeline::{Clock, Pipeline, PipelineOutcome};
use crate::shortener::UrlShortener;
use crate::template::{self, TemplateContext, TemplateEngine, Value};
use crate::{GhFeedError, Result};

/// How a command invocation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// The requested count was above the maximum; nothing was fetched.
    ThresholdExceeded,
    /// Fetching or decoding the feed failed.
    Failed(FeedError),
    /// The invocation ran out of time.
    TimedOut,
    /// The feed had no items.
    NoItems,
    /// This many item messages were delivered.
    Delivered(usize),
}

/// Handles `!ghFeed` commands.
pub struct Handler {
    config: Arc<Config>,
    templates: Arc<TemplateEngine>,
    source: Arc<dyn FeedSource>,
    pipeline: Pipeline,
    base_url: String,
    config_value: Value,
}

impl Handler {
    /// Create a handler.
    ///
    /// Fails when the configured templates, selectors or base URL are invalid.
    pub fn new(
        config: Arc<Config>,
        source: Arc<dyn FeedSource>,
        shortener: Arc<dyn UrlShortener>,
    ) -> Result<Self> {
        let templates = Arc::new(TemplateEngine::from_messages(&config.messages)?);
        let extractor = Extractor::new(&config.extract)?;
        let base_url = validate_base_url(&config.feed.base_url)?.to_string();
        let config_value = serde_json::to_value(config.as_ref())
            .map(Value::from)
            .map_err(|e| {
                GhFeedError::Config(format!("cannot expose config to templates: {e}"))
            })?;

        let pipeline = Pipeline::new(
            Arc::clone(&config),
            Arc::clone(&templates),
            extractor,
            shortener,
        );

        Ok(Self {
            config,
            templates,
            source,
            pipeline,
            base_url,
            config_value,
        })
    }

    /// Replace the clock used for relative times.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.pipeline = self.pipeline.with_clock(clock);
        self
    }

    /// The configuration this handler runs with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Handle a chat line from `nick`.
    ///
    /// Returns `None` when the line is not a feed command.
    pub async fn on_message(
        &self,
        nick: &str,
        line: &str,
        channel: &dyn Channel,
    ) -> Option<CommandOutcome> {
        let command = parse_command(&self.config.command.trigger, line)?;
        Some(self.on_command(nick, &command, channel).await)
    }

    /// Handle a parsed command from `nick`.
    pub async fn on_command(
        &self,
        nick: &str,
        command: &FeedCommand,
        channel: &dyn Channel,
    ) -> CommandOutcome {
        let request = self.resolve(nick, command);
        let counts = &self.config.message_count;

        info!(
            nick,
            username = %request.username,
            count = request.count,
            "Handling feed command"
        );

        let mut context = self.base_context(nick, &request);

        if request.count > counts.maximum {
            warn!(
                nick,
                count = request.count,
                maximum = counts.maximum,
                "Requested item count above maximum"
            );
            self.send_private(template::ERROR_THRESHOLD, &context, nick, channel)
                .await;
            return CommandOutcome::ThresholdExceeded;
        }

        let target = if request.count > counts.threshold {
            DeliveryTarget::Private(nick.to_string())
        } else {
            DeliveryTarget::Broadcast
        };

        let url = join_feed_url(&self.base_url, &request.username);
        context.set("url", url.as_str());

        let run = self.run(&url, &request, nick, &target, &context, channel);
        let result = match self.config.command.timeout_secs {
            0 => Ok(run.await),
            secs => tokio::time::timeout(Duration::from_secs(secs), run).await,
        };

        match result {
            Ok(Ok(outcome)) if outcome.admitted == 0 => CommandOutcome::NoItems,
            Ok(Ok(outcome)) => {
                info!(
                    nick,
                    username = %request.username,
                    delivered = outcome.delivered,
                    "Feed command finished"
                );
                CommandOutcome::Delivered(outcome.delivered)
            }
            Ok(Err(e)) => {
                error!(url = %url, error = %e, "Feed command failed");
                self.send_feed_error(&e, &context, nick, channel).await;
                CommandOutcome::Failed(e)
            }
            Err(_) => {
                let secs = self.config.command.timeout_secs;
                error!(url = %url, timeout_secs = secs, "Feed command timed out");
                let timeout = FeedError::Network(format!("timed out after {secs}s"));
                self.send_feed_error(&timeout, &context, nick, channel).await;
                CommandOutcome::TimedOut
            }
        }
    }

    /// Fill in the arguments the command left out.
    ///
    /// A zero count counts as missing, and the result is never below 1.
    fn resolve(&self, nick: &str, command: &FeedCommand) -> FeedRequest {
        let count = command
            .count
            .filter(|&count| count > 0)
            .unwrap_or(self.config.message_count.default);

        FeedRequest {
            username: command
                .username
                .clone()
                .unwrap_or_else(|| nick.to_string()),
            count: count.max(1),
        }
    }

    /// Variables shared by every message of one request.
    fn base_context(&self, nick: &str, request: &FeedRequest) -> TemplateContext {
        let mut context = TemplateContext::new();
        context.set("nick", nick);
        context.set("username", request.username.as_str());
        context.set("count", request.count);
        context.set("config", self.config_value.clone());
        context
    }

    async fn run(
        &self,
        url: &str,
        request: &FeedRequest,
        nick: &str,
        target: &DeliveryTarget,
        context: &TemplateContext,
        channel: &dyn Channel,
    ) -> std::result::Result<PipelineOutcome, FeedError> {
        debug!(url, "Fetching feed");
        let items = self.source.fetch_items(url).await?;
        self.pipeline
            .process(items, request, nick, target, context, channel)
            .await
    }

    /// Report a feed failure with the message of its category.
    async fn send_feed_error(
        &self,
        e: &FeedError,
        context: &TemplateContext,
        nick: &str,
        channel: &dyn Channel,
    ) {
        let name = match e.category() {
            ErrorCategory::Request => template::ERROR_REQUEST,
            ErrorCategory::FeedParser => template::ERROR_FEED_PARSER,
        };

        let mut context = context.child();
        context.set("error", e.to_string());
        self.send_private(name, &context, nick, channel).await;
    }

    async fn send_private(
        &self,
        name: &str,
        context: &TemplateContext,
        nick: &str,
        channel: &dyn Channel,
    ) {
        match self.templates.render(name, context) {
            Ok(text) => channel.deliver(&text, Some(nick)).await,
            Err(e) => error!(template = name, error = %e, "Failed to render message"),
        }
    }
}
