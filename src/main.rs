use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};

use ghfeed::channel::ConsoleChannel;
use ghfeed::feed::HttpFeedSource;
use ghfeed::{shortener, Config, Handler};

/// Load the configuration named on the command line.
///
/// Usage: `ghfeed [config.toml] [overrides.toml]`
fn load_config() -> Config {
    let mut args = std::env::args().skip(1);
    let path = args.next().unwrap_or_else(|| "config.toml".to_string());

    let loaded = match args.next() {
        Some(overrides) => Config::load_with_overrides(&path, &overrides),
        None => Config::load(&path),
    };

    match loaded {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load {path}: {e}");
            eprintln!("Using default configuration.");
            Config::default()
        }
    }
}

fn build_handler(config: &Arc<Config>) -> ghfeed::Result<Handler> {
    let source = HttpFeedSource::new(&config.feed)?;
    let shortener = shortener::from_config(&config.shortener)?;
    Handler::new(Arc::clone(config), Arc::new(source), shortener)
}

#[tokio::main]
async fn main() {
    let config = load_config();

    // Initialize logging
    if let Err(e) = ghfeed::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        // Fall back to console-only logging
        ghfeed::logging::init_console_only(&config.logging.level);
    }

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {e}");
        std::process::exit(1);
    }

    let config = Arc::new(config);
    let handler = match build_handler(&config) {
        Ok(handler) => Arc::new(handler),
        Err(e) => {
            error!("Failed to start: {e}");
            std::process::exit(1);
        }
    };

    info!(
        trigger = %config.command.trigger,
        base_url = %config.feed.base_url,
        "ghfeed ready, reading '<nick> <message>' lines from stdin"
    );

    let channel = Arc::new(ConsoleChannel::new("#ghfeed"));
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut tasks = tokio::task::JoinSet::new();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                error!("Failed to read stdin: {e}");
                break;
            }
        };

        let Some((nick, message)) = line.trim().split_once(char::is_whitespace) else {
            continue;
        };
        let nick = nick.to_string();
        let message = message.to_string();
        let handler = Arc::clone(&handler);
        let channel = Arc::clone(&channel);

        tasks.spawn(async move {
            handler
                .on_message(&nick, &message, channel.as_ref())
                .await
        });
    }

    while tasks.join_next().await.is_some() {}
    info!("ghfeed stopped");
}
