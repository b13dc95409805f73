//! Message delivery.
//!
//! A [`Channel`] is the chat transport the command was received on. It
//! delivers a line either to everyone in the channel or privately to one nick.

use async_trait::async_trait;
use tokio::sync::Mutex;

/// Where the messages of one request go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryTarget {
    /// Only to this nick.
    Private(String),
    /// To everyone in the channel.
    Broadcast,
}

impl DeliveryTarget {
    /// The private recipient, `None` for broadcasts.
    pub fn recipient(&self) -> Option<&str> {
        match self {
            DeliveryTarget::Private(nick) => Some(nick),
            DeliveryTarget::Broadcast => None,
        }
    }
}

/// Chat transport.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Deliver `text` privately to `target`, or to the whole channel when
    /// `target` is `None`.
    async fn deliver(&self, text: &str, target: Option<&str>);
}

/// A recorded delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// Delivered text.
    pub text: String,
    /// Private recipient, `None` for broadcasts.
    pub target: Option<String>,
}

impl Delivery {
    /// Check if the delivery went to a single nick.
    pub fn is_private(&self) -> bool {
        self.target.is_some()
    }
}

/// Channel that keeps every delivery in memory.
#[derive(Debug, Default)]
pub struct MemoryChannel {
    deliveries: Mutex<Vec<Delivery>>,
}

impl MemoryChannel {
    /// Create an empty channel.
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything delivered so far, in delivery order.
    pub async fn deliveries(&self) -> Vec<Delivery> {
        self.deliveries.lock().await.clone()
    }
}

#[async_trait]
impl Channel for MemoryChannel {
    async fn deliver(&self, text: &str, target: Option<&str>) {
        self.deliveries.lock().await.push(Delivery {
            text: text.to_string(),
            target: target.map(String::from),
        });
    }
}

/// Channel that prints to stdout.
#[derive(Debug, Clone)]
pub struct ConsoleChannel {
    name: String,
}

impl ConsoleChannel {
    /// Create a console channel with a display name such as `#general`.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Format one output line.
    fn format_line(&self, text: &str, target: Option<&str>) -> String {
        match target {
            Some(nick) => format!("[{} -> {}] {}", self.name, nick, text),
            None => format!("[{}] {}", self.name, text),
        }
    }
}

#[async_trait]
impl Channel for ConsoleChannel {
    async fn deliver(&self, text: &str, target: Option<&str>) {
        println!("{}", self.format_line(text, target));
    }
}
