//! Chat trigger parsing for ghfeed.
//!
//! Recognizes `!ghFeed[ <username>][ <count>]`. The username is any
//! non-whitespace token and the count a positive decimal literal.

use std::fmt;

/// Arguments of a recognized trigger.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedCommand {
    /// Whose feed to show; the requester when absent.
    pub username: Option<String>,
    /// How many items to show; the configured default when absent.
    pub count: Option<usize>,
}

impl FeedCommand {
    /// Create a command with explicit arguments.
    pub fn new(username: Option<&str>, count: Option<usize>) -> Self {
        Self {
            username: username.map(String::from),
            count,
        }
    }
}

impl fmt::Display for FeedCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.username, self.count) {
            (Some(username), Some(count)) => write!(f, "{username} {count}"),
            (Some(username), None) => write!(f, "{username}"),
            (None, _) => Ok(()),
        }
    }
}

/// A resolved request: every argument filled in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedRequest {
    /// Whose feed to fetch.
    pub username: String,
    /// How many items to post (at least 1).
    pub count: usize,
}

/// Parse a chat line against `trigger`.
///
/// Returns `None` when the line is not the trigger or its arguments do not
/// fit the pattern. A single argument is always the username, even if it
/// is numeric.
pub fn parse_command(trigger: &str, line: &str) -> Option<FeedCommand> {
    let mut tokens = line.split_whitespace();

    if tokens.next()? != trigger {
        return None;
    }

    let username = tokens.next();
    let count = match tokens.next() {
        Some(token) => Some(parse_count(token)?),
        None => None,
    };

    if tokens.next().is_some() {
        return None;
    }

    Some(FeedCommand::new(username, count))
}

/// Parse a positive decimal count.
fn parse_count(token: &str) -> Option<usize> {
    if !token.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    match token.parse::<usize>() {
        Ok(0) | Err(_) => None,
        Ok(count) => Some(count),
    }
}
