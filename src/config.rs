//! Configuration module for ghfeed.
//!
//! The configuration is read once at startup from TOML, optionally merged with
//! a user override file, validated, and then shared read-only for the lifetime
//! of the process.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{GhFeedError, Result};

/// Item count policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MessageCountConfig {
    /// Number of items posted when the command gives no count.
    #[serde(default = "default_count")]
    pub default: usize,
    /// Requests above this count are answered privately instead of in the channel.
    #[serde(default = "default_threshold")]
    pub threshold: usize,
    /// Requests above this count are refused.
    #[serde(default = "default_maximum")]
    pub maximum: usize,
}

fn default_count() -> usize {
    1
}

fn default_threshold() -> usize {
    3
}

fn default_maximum() -> usize {
    10
}

impl Default for MessageCountConfig {
    fn default() -> Self {
        Self {
            default: default_count(),
            threshold: default_threshold(),
            maximum: default_maximum(),
        }
    }
}

/// Date display configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MomentConfig {
    /// Locale for relative times (en / ja).
    #[serde(default = "default_locale")]
    pub locale: String,
    /// strftime-style format for the item date.
    #[serde(default = "default_date_format")]
    pub format: String,
    /// Timezone for the item date (e.g., "UTC", "Europe/Helsinki").
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

fn default_locale() -> String {
    "en".to_string()
}

fn default_date_format() -> String {
    "%Y-%m-%d %H:%M".to_string()
}

fn default_timezone() -> String {
    "UTC".to_string()
}

impl Default for MomentConfig {
    fn default() -> Self {
        Self {
            locale: default_locale(),
            format: default_date_format(),
            timezone: default_timezone(),
        }
    }
}

/// Error message templates.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorMessagesConfig {
    /// Sent when the requested count is above `messageCount.maximum`.
    #[serde(default = "default_threshold_message")]
    pub threshold: String,
    /// Sent on transport errors and non-200 responses.
    #[serde(default = "default_request_message")]
    pub request: String,
    /// Sent when the response body is not a feed.
    #[serde(default = "default_feed_parser_message")]
    pub feed_parser: String,
    /// Sent when the feed has no entries.
    #[serde(default = "default_no_items_message")]
    pub no_items: String,
}

fn default_threshold_message() -> String {
    "You requested too many items, the maximum is ${config.messageCount.maximum}.".to_string()
}

fn default_request_message() -> String {
    "Oh noes, error with request - ${error}".to_string()
}

fn default_feed_parser_message() -> String {
    "Oh noes, error with FeedParser - ${error}".to_string()
}

fn default_no_items_message() -> String {
    "No items found for ${username} (${url})".to_string()
}

impl Default for ErrorMessagesConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold_message(),
            request: default_request_message(),
            feed_parser: default_feed_parser_message(),
            no_items: default_no_items_message(),
        }
    }
}

/// Message templates.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagesConfig {
    /// Template for one feed item.
    #[serde(default = "default_success_message")]
    pub success: String,
    /// Substituted for `messages` when nothing could be extracted from an item.
    #[serde(default = "default_no_details")]
    pub no_details: String,
    /// Error templates.
    #[serde(default)]
    pub errors: ErrorMessagesConfig,
}

fn default_success_message() -> String {
    "${timeAgo}: ${item.title} - ${messages} - ${shortUrl}".to_string()
}

fn default_no_details() -> String {
    "No detailed info".to_string()
}

impl Default for MessagesConfig {
    fn default() -> Self {
        Self {
            success: default_success_message(),
            no_details: default_no_details(),
            errors: ErrorMessagesConfig::default(),
        }
    }
}

/// Feed endpoint and HTTP client configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeedConfig {
    /// Base URL; the feed of `user` is `<base_url>/<user>.atom`.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Connection timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Read timeout in seconds.
    #[serde(default = "default_read_timeout")]
    pub read_timeout_secs: u64,
    /// Total request timeout in seconds.
    #[serde(default = "default_total_timeout")]
    pub total_timeout_secs: u64,
    /// Maximum number of redirects.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
    /// Maximum feed size in bytes.
    #[serde(default = "default_max_feed_size")]
    pub max_feed_size_bytes: u64,
    /// User agent sent with feed requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_base_url() -> String {
    "https://github.com".to_string()
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_read_timeout() -> u64 {
    20
}

fn default_total_timeout() -> u64 {
    30
}

fn default_max_redirects() -> usize {
    5
}

fn default_max_feed_size() -> u64 {
    5 * 1024 * 1024 // 5MB
}

fn default_user_agent() -> String {
    concat!("ghfeed/", env!("CARGO_PKG_VERSION")).to_string()
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            connect_timeout_secs: default_connect_timeout(),
            read_timeout_secs: default_read_timeout(),
            total_timeout_secs: default_total_timeout(),
            max_redirects: default_max_redirects(),
            max_feed_size_bytes: default_max_feed_size(),
            user_agent: default_user_agent(),
        }
    }
}

/// CSS selectors used to pull messages out of an item body.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExtractConfig {
    /// Commit list items; an inner `blockquote` holds the message when present,
    /// otherwise the item's own text is used.
    #[serde(default = "default_commit_selector")]
    pub commit_selector: String,
    /// Issue, comment and pull request titles; the `title` attribute is used.
    #[serde(default = "default_title_selector")]
    pub title_selector: String,
}

fn default_commit_selector() -> String {
    ".commits li".to_string()
}

fn default_title_selector() -> String {
    ".title a[title]".to_string()
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            commit_selector: default_commit_selector(),
            title_selector: default_title_selector(),
        }
    }
}

/// Which URL shortener to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ShortenerKind {
    /// Post the original link.
    #[default]
    None,
    /// Resolve through an is.gd compatible HTTP endpoint.
    Http,
}

/// URL shortener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ShortenerConfig {
    /// Shortener implementation.
    #[serde(default)]
    pub kind: ShortenerKind,
    /// Endpoint for the HTTP shortener.
    #[serde(default = "default_shortener_endpoint")]
    pub endpoint: String,
    /// Request timeout in seconds.
    #[serde(default = "default_shortener_timeout")]
    pub timeout_secs: u64,
}

fn default_shortener_endpoint() -> String {
    "https://is.gd/create.php".to_string()
}

fn default_shortener_timeout() -> u64 {
    10
}

impl Default for ShortenerConfig {
    fn default() -> Self {
        Self {
            kind: ShortenerKind::default(),
            endpoint: default_shortener_endpoint(),
            timeout_secs: default_shortener_timeout(),
        }
    }
}

/// Chat command configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CommandConfig {
    /// Trigger word.
    #[serde(default = "default_trigger")]
    pub trigger: String,
    /// Upper bound for one command invocation in seconds.
    #[serde(default = "default_command_timeout")]
    pub timeout_secs: u64,
}

fn default_trigger() -> String {
    "!ghFeed".to_string()
}

fn default_command_timeout() -> u64 {
    60
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            trigger: default_trigger(),
            timeout_secs: default_command_timeout(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Optional log file; logs always go to stderr as well.
    #[serde(default)]
    pub file: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Item count policy.
    #[serde(default, rename = "messageCount")]
    pub message_count: MessageCountConfig,
    /// Date display.
    #[serde(default)]
    pub moment: MomentConfig,
    /// Message templates.
    #[serde(default)]
    pub messages: MessagesConfig,
    /// Feed endpoint and HTTP client.
    #[serde(default)]
    pub feed: FeedConfig,
    /// Message extraction selectors.
    #[serde(default)]
    pub extract: ExtractConfig,
    /// URL shortener.
    #[serde(default)]
    pub shortener: ShortenerConfig,
    /// Chat command.
    #[serde(default)]
    pub command: CommandConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(GhFeedError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and deep-merge a second file over it.
    ///
    /// Tables are merged key by key; any other value in the override replaces
    /// the base value.
    pub fn load_with_overrides<P: AsRef<Path>, Q: AsRef<Path>>(
        base: P,
        overrides: Q,
    ) -> Result<Self> {
        let base = std::fs::read_to_string(base.as_ref()).map_err(GhFeedError::Io)?;
        let overrides = std::fs::read_to_string(overrides.as_ref()).map_err(GhFeedError::Io)?;
        Self::parse_with_overrides(&base, &overrides)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| GhFeedError::Config(format!("config parse error: {e}")))
    }

    /// Parse a base TOML string with an override TOML string merged over it.
    pub fn parse_with_overrides(base: &str, overrides: &str) -> Result<Self> {
        let mut base: toml::Value = toml::from_str(base)
            .map_err(|e| GhFeedError::Config(format!("config parse error: {e}")))?;
        let overrides: toml::Value = toml::from_str(overrides)
            .map_err(|e| GhFeedError::Config(format!("override parse error: {e}")))?;

        merge_toml(&mut base, overrides);

        base.try_into::<Config>()
            .map_err(|e| GhFeedError::Config(format!("config parse error: {e}")))
    }

    /// Validate the configuration.
    ///
    /// Returns an error if:
    /// - `messageCount.default` is 0 or above `messageCount.maximum`
    /// - `messageCount.threshold` is above `messageCount.maximum`
    /// - `feed.base_url` is not an http(s) URL
    /// - an extraction selector or a message template does not parse
    pub fn validate(&self) -> Result<()> {
        let counts = &self.message_count;
        if counts.default == 0 {
            return Err(GhFeedError::Config(
                "messageCount.default must be at least 1".to_string(),
            ));
        }
        if counts.default > counts.maximum {
            return Err(GhFeedError::Config(format!(
                "messageCount.default ({}) is above messageCount.maximum ({})",
                counts.default, counts.maximum
            )));
        }
        if counts.threshold > counts.maximum {
            return Err(GhFeedError::Config(format!(
                "messageCount.threshold ({}) is above messageCount.maximum ({})",
                counts.threshold, counts.maximum
            )));
        }

        crate::feed::validate_base_url(&self.feed.base_url)?;
        crate::extract::Extractor::new(&self.extract)?;
        crate::template::TemplateEngine::from_messages(&self.messages)?;

        Ok(())
    }
}

/// Recursively merge `overlay` into `base`.
fn merge_toml(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, value) in overlay_table {
                match base_table.get_mut(&key) {
                    Some(existing) => merge_toml(existing, value),
                    None => {
                        base_table.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.message_count.default, 1);
        assert_eq!(config.message_count.threshold, 3);
        assert_eq!(config.message_count.maximum, 10);
        assert_eq!(config.moment.locale, "en");
        assert_eq!(config.moment.format, "%Y-%m-%d %H:%M");
        assert_eq!(config.moment.timezone, "UTC");
        assert_eq!(config.messages.no_details, "No detailed info");
        assert_eq!(config.feed.base_url, "https://github.com");
        assert_eq!(config.feed.max_feed_size_bytes, 5 * 1024 * 1024);
        assert_eq!(config.shortener.kind, ShortenerKind::None);
        assert_eq!(config.command.trigger, "!ghFeed");
        assert_eq!(config.command.timeout_secs, 60);
        assert_eq!(config.logging.level, "info");
        assert!(config.logging.file.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_empty_config() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.message_count.maximum, 10);
        assert_eq!(config.messages.errors.request, default_request_message());
    }

    #[test]
    fn test_parse_camel_case_keys() {
        let toml = r#"
[messageCount]
default = 2
threshold = 4
maximum = 8

[messages]
success = "${item.title}"
noDetails = "-"

[messages.errors]
feedParser = "bad feed: ${error}"
noItems = "nothing for ${username}"
"#;

        let config = Config::parse(toml).unwrap();
        assert_eq!(config.message_count.default, 2);
        assert_eq!(config.message_count.threshold, 4);
        assert_eq!(config.message_count.maximum, 8);
        assert_eq!(config.messages.success, "${item.title}");
        assert_eq!(config.messages.no_details, "-");
        assert_eq!(config.messages.errors.feed_parser, "bad feed: ${error}");
        assert_eq!(config.messages.errors.no_items, "nothing for ${username}");
        // Untouched keys keep their defaults
        assert_eq!(config.messages.errors.request, default_request_message());
    }

    #[test]
    fn test_parse_shortener_kind() {
        let config = Config::parse("[shortener]\nkind = \"http\"").unwrap();
        assert_eq!(config.shortener.kind, ShortenerKind::Http);
        assert_eq!(config.shortener.endpoint, "https://is.gd/create.php");

        assert!(Config::parse("[shortener]\nkind = \"bitly\"").is_err());
    }

    #[test]
    fn test_parse_invalid_toml() {
        let result = Config::parse("[messageCount\ndefault = 1");
        assert!(matches!(result, Err(GhFeedError::Config(_))));
    }

    #[test]
    fn test_parse_with_overrides_merges_tables() {
        let base = r#"
[messageCount]
default = 1
threshold = 3
maximum = 10

[messages.errors]
request = "base request"
noItems = "base no items"
"#;
        let overrides = r#"
[messageCount]
maximum = 20

[messages.errors]
noItems = "override no items"
"#;

        let config = Config::parse_with_overrides(base, overrides).unwrap();
        assert_eq!(config.message_count.default, 1);
        assert_eq!(config.message_count.threshold, 3);
        assert_eq!(config.message_count.maximum, 20);
        assert_eq!(config.messages.errors.request, "base request");
        assert_eq!(config.messages.errors.no_items, "override no items");
    }

    #[test]
    fn test_merge_toml_replaces_non_tables() {
        let mut base: toml::Value = toml::from_str("a = [1, 2]\nb = \"x\"").unwrap();
        let overlay: toml::Value = toml::from_str("a = [3]\nc = true").unwrap();

        merge_toml(&mut base, overlay);

        let expected: toml::Value = toml::from_str("a = [3]\nb = \"x\"\nc = true").unwrap();
        assert_eq!(base, expected);
    }

    #[test]
    fn test_load_with_overrides_from_files() {
        let mut base = NamedTempFile::new().unwrap();
        writeln!(base, "[moment]\nlocale = \"en\"\nformat = \"%d.%m.%Y\"").unwrap();
        let mut overrides = NamedTempFile::new().unwrap();
        writeln!(overrides, "[moment]\nlocale = \"ja\"").unwrap();

        let config = Config::load_with_overrides(base.path(), overrides.path()).unwrap();
        assert_eq!(config.moment.locale, "ja");
        assert_eq!(config.moment.format, "%d.%m.%Y");
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load("/nonexistent/ghfeed.toml");
        assert!(matches!(result, Err(GhFeedError::Io(_))));
    }

    #[test]
    fn test_validate_default_above_maximum() {
        let mut config = Config::default();
        config.message_count.default = 11;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_zero_default() {
        let mut config = Config::default();
        config.message_count.default = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_threshold_above_maximum() {
        let mut config = Config::default();
        config.message_count.threshold = 11;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_bad_base_url() {
        let mut config = Config::default();
        config.feed.base_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_bad_selector() {
        let mut config = Config::default();
        config.extract.commit_selector = "li[".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_bad_template() {
        let mut config = Config::default();
        config.messages.errors.no_items = "No items for ${username".to_string();
        assert!(matches!(config.validate(), Err(GhFeedError::Template(_))));
    }

    #[test]
    fn test_config_serializes_camel_case() {
        let value = serde_json::to_value(Config::default()).unwrap();
        assert_eq!(value["messageCount"]["maximum"], 10);
        assert_eq!(value["messages"]["errors"]["feedParser"], default_feed_parser_message());
    }
}
