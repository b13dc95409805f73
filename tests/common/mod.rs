//! Test helpers for E2E tests.
//!
//! Provides TestFeedServer, a local HTTP server serving fixture feeds and a
//! shortener endpoint, plus config and clock helpers.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::{StatusCode, Uri};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use chrono::{DateTime, TimeZone, Utc};
use tokio::net::TcpListener;

use ghfeed::config::{Config, ShortenerKind};
use ghfeed::{Handler, HttpFeedSource};

/// Fixed "now" used by every E2E test: one hour after the newest fixture entry.
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

/// GitHub-style Atom feed of `octocat` with five entries, newest first.
pub const OCTOCAT_ATOM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom" xmlns:media="http://search.yahoo.com/mrss/" xml:lang="en-US">
  <id>tag:github.com,2008:/octocat</id>
  <link type="text/html" rel="alternate" href="https://github.com/octocat"/>
  <link type="application/atom+xml" rel="self" href="https://github.com/octocat.atom"/>
  <title>octocat’s Activity</title>
  <updated>2024-05-01T11:00:00Z</updated>
  <entry>
    <id>tag:github.com,2008:PushEvent/5</id>
    <published>2024-05-01T11:00:00Z</published>
    <updated>2024-05-01T11:00:00Z</updated>
    <link type="text/html" rel="alternate" href="https://github.com/octocat/hello/compare/a...b"/>
    <title type="html">octocat pushed to main at octocat/hello</title>
    <author><name>octocat</name></author>
    <content type="html">&lt;div class=&quot;push&quot;&gt;&lt;div class=&quot;commits&quot;&gt;&lt;ul&gt;&lt;li&gt;&lt;code&gt;&lt;a href=&quot;https://github.com/octocat/hello/commit/a&quot;&gt;a1b2c3d&lt;/a&gt;&lt;/code&gt;&lt;div class=&quot;message&quot;&gt;&lt;blockquote&gt;Fix bug&lt;/blockquote&gt;&lt;/div&gt;&lt;/li&gt;&lt;li&gt;&lt;code&gt;&lt;a href=&quot;https://github.com/octocat/hello/commit/b&quot;&gt;e4f5a6b&lt;/a&gt;&lt;/code&gt;&lt;div class=&quot;message&quot;&gt;&lt;blockquote&gt;Add README&lt;/blockquote&gt;&lt;/div&gt;&lt;/li&gt;&lt;/ul&gt;&lt;/div&gt;&lt;/div&gt;</content>
  </entry>
  <entry>
    <id>tag:github.com,2008:IssueCommentEvent/4</id>
    <published>2024-05-01T09:00:00Z</published>
    <updated>2024-05-01T09:00:00Z</updated>
    <link type="text/html" rel="alternate" href="https://github.com/octocat/hello/issues/7#issuecomment-1"/>
    <title type="html">octocat commented on issue octocat/hello#7</title>
    <author><name>octocat</name></author>
    <content type="html">&lt;div class=&quot;details&quot;&gt;&lt;div class=&quot;title&quot;&gt;&lt;a href=&quot;https://github.com/octocat/hello/issues/7&quot; title=&quot;Crash on empty input&quot;&gt;octocat/hello#7&lt;/a&gt;&lt;/div&gt;&lt;/div&gt;</content>
  </entry>
  <entry>
    <id>tag:github.com,2008:WatchEvent/3</id>
    <published>2024-04-30T12:00:00Z</published>
    <updated>2024-04-30T12:00:00Z</updated>
    <link type="text/html" rel="alternate" href="https://github.com/rust-lang/rust"/>
    <title type="html">octocat starred rust-lang/rust</title>
    <author><name>octocat</name></author>
    <content type="html">&lt;div class=&quot;watch_started&quot;&gt;&lt;span&gt;starred&lt;/span&gt;&lt;/div&gt;</content>
  </entry>
  <entry>
    <id>tag:github.com,2008:CreateEvent/2</id>
    <published>2024-04-28T12:00:00Z</published>
    <updated>2024-04-28T12:00:00Z</updated>
    <link type="text/html" rel="alternate" href="https://github.com/octocat/hello"/>
    <title type="html">octocat created a repository octocat/hello</title>
    <author><name>octocat</name></author>
    <content type="html">&lt;div class=&quot;create&quot;&gt;&lt;/div&gt;</content>
  </entry>
  <entry>
    <id>tag:github.com,2008:ForkEvent/1</id>
    <published>2024-03-01T12:00:00Z</published>
    <updated>2024-03-01T12:00:00Z</updated>
    <link type="text/html" rel="alternate" href="https://github.com/octocat/linguist"/>
    <title type="html">octocat forked octocat/linguist from github/linguist</title>
    <author><name>octocat</name></author>
  </entry>
</feed>"#;

/// Atom feed without entries.
pub const EMPTY_ATOM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <id>tag:github.com,2008:/quiet</id>
  <title>quiet’s Activity</title>
  <updated>2024-05-01T12:00:00Z</updated>
</feed>"#;

#[derive(Clone, Default)]
struct ServerState {
    feed_requests: Arc<AtomicUsize>,
    shorten_requests: Arc<AtomicUsize>,
}

/// Local HTTP server standing in for github.com and is.gd.
///
/// Routes:
/// - `/octocat.atom`: [`OCTOCAT_ATOM`]
/// - `/quiet.atom`: [`EMPTY_ATOM`]
/// - `/garbage.atom`: 200 with a non-feed body
/// - `/slow.atom`: answers after 30 seconds
/// - `/shorten?format=simple&url=..`: `http://sho.rt/<n>` per call
/// - anything else: 404
pub struct TestFeedServer {
    addr: SocketAddr,
    state: ServerState,
}

impl TestFeedServer {
    /// Start the server on an ephemeral port.
    pub async fn start() -> Self {
        let state = ServerState::default();
        let router = Router::new()
            .route("/shorten", get(shorten))
            .fallback(feed)
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self { addr, state }
    }

    /// Base URL to use as `feed.base_url`.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Shortener endpoint.
    pub fn shorten_endpoint(&self) -> String {
        format!("http://{}/shorten", self.addr)
    }

    /// Number of feed requests served so far.
    pub fn feed_requests(&self) -> usize {
        self.state.feed_requests.load(Ordering::SeqCst)
    }

    /// Number of shortener requests served so far.
    pub fn shorten_requests(&self) -> usize {
        self.state.shorten_requests.load(Ordering::SeqCst)
    }

    /// Default configuration pointed at this server.
    pub fn config(&self) -> Config {
        let mut config = Config::default();
        config.feed.base_url = self.base_url();
        config.shortener.endpoint = self.shorten_endpoint();
        config
    }

    /// Same as [`config`](Self::config) with the HTTP shortener enabled.
    pub fn config_with_shortener(&self) -> Config {
        let mut config = self.config();
        config.shortener.kind = ShortenerKind::Http;
        config
    }
}

async fn feed(State(state): State<ServerState>, uri: Uri) -> impl IntoResponse {
    state.feed_requests.fetch_add(1, Ordering::SeqCst);

    match uri.path() {
        "/octocat.atom" => (StatusCode::OK, OCTOCAT_ATOM.to_string()),
        "/quiet.atom" => (StatusCode::OK, EMPTY_ATOM.to_string()),
        "/garbage.atom" => (StatusCode::OK, "This is not XML".to_string()),
        "/slow.atom" => {
            tokio::time::sleep(Duration::from_secs(30)).await;
            (StatusCode::OK, EMPTY_ATOM.to_string())
        }
        _ => (StatusCode::NOT_FOUND, "Not Found".to_string()),
    }
}

async fn shorten(
    State(state): State<ServerState>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let n = state.shorten_requests.fetch_add(1, Ordering::SeqCst) + 1;

    match (params.get("format").map(String::as_str), params.get("url")) {
        (Some("simple"), Some(url)) if url.starts_with("http") => {
            (StatusCode::OK, format!("http://sho.rt/{n}"))
        }
        _ => (StatusCode::BAD_REQUEST, "Error: bad request".to_string()),
    }
}

/// Build a handler for `config` using the real HTTP feed source.
pub fn handler(config: Config) -> Handler {
    let config = Arc::new(config);
    let source = HttpFeedSource::new(&config.feed).unwrap();
    let shortener = ghfeed::shortener::from_config(&config.shortener).unwrap();
    Handler::new(config, Arc::new(source), shortener)
        .unwrap()
        .with_clock(fixed_now)
}
