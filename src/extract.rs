//! Message extraction from feed item bodies.
//!
//! A GitHub activity entry carries an HTML body. Push events list their
//! commits as `<li>` elements under a `.commits` container, while issue,
//! comment and pull request events link their subject with a `title`
//! attribute. The extractor turns both into short plain-text messages.

use scraper::{ElementRef, Html, Selector};

use crate::config::ExtractConfig;
use crate::{GhFeedError, Result};

/// Pulls human-readable messages out of an item's HTML body.
#[derive(Debug, Clone)]
pub struct Extractor {
    commit: Selector,
    quote: Selector,
    title: Selector,
}

impl Extractor {
    /// Compile the configured selectors.
    pub fn new(config: &ExtractConfig) -> Result<Self> {
        Ok(Self {
            commit: parse_selector(&config.commit_selector)?,
            quote: parse_selector("blockquote")?,
            title: parse_selector(&config.title_selector)?,
        })
    }

    /// Extract messages from `markup`.
    ///
    /// Commit messages come first, in document order, followed by the `title`
    /// attributes of title anchors. A commit item that wraps a `blockquote`
    /// contributes the quote's text, other items their own text. Whitespace is
    /// collapsed and empty results are dropped, so the list is empty when
    /// nothing matches.
    pub fn extract(&self, markup: &str) -> Vec<String> {
        let fragment = Html::parse_fragment(markup);

        let commits = fragment
            .select(&self.commit)
            .map(|item| element_text(item.select(&self.quote).next().unwrap_or(item)));
        let titles = fragment
            .select(&self.title)
            .filter_map(|el| el.value().attr("title"))
            .map(collapse_whitespace);

        commits.chain(titles).filter(|m| !m.is_empty()).collect()
    }
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector)
        .map_err(|e| GhFeedError::Config(format!("invalid selector '{selector}': {e}")))
}

fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<&str>>().join(" ")
}
