use async_trait::async_trait;
use std::sync::Arc;

use crate::application::errors::BotError;
use crate::domain::entities::MessageEvent;

/// Outbound half of a messaging platform
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Send a text message to a channel, returning the platform's message id
    async fn send_message(&self, channel_id: &str, text: &str) -> Result<String, BotError>;
}

/// Per-event context handed to an [`EventHandler`]
#[derive(Clone)]
pub struct Context {
    pub messenger: Arc<dyn Messenger>,
    pub self_id: String,
}

impl Context {
    pub fn new(messenger: Arc<dyn Messenger>, self_id: impl Into<String>) -> Self {
        Self {
            messenger,
            self_id: self_id.into(),
        }
    }
}

/// Receiver of inbound message events.
///
/// Platforms may invoke `message` concurrently for different events.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn message(&self, ctx: Context, event: MessageEvent);
}

/// Bot trait - an authenticated session with a messaging platform
#[async_trait]
pub trait Bot: Send + Sync {
    /// Register the handler for inbound message events, replacing any previous one
    fn on_message(&mut self, handler: Arc<dyn EventHandler>);

    /// Open the real-time connection and start delivering events
    async fn open(&mut self) -> Result<(), BotError>;

    /// Close the connection. Safe to call when not open.
    async fn close(&mut self);

    /// Shared handle used to send messages
    fn messenger(&self) -> Arc<dyn Messenger>;

    /// The bot's own identity
    fn bot_info(&self) -> BotInfo;
}

/// What a [`Connector`] needs to open a session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSettings {
    pub token: String,
    /// Base URL that platform API requests are routed through instead of the public endpoint
    pub api_proxy: Option<String>,
}

impl SessionSettings {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            api_proxy: None,
        }
    }

    pub fn with_api_proxy(mut self, proxy: Option<String>) -> Self {
        self.api_proxy = proxy;
        self
    }
}

/// Builds and authenticates a [`Bot`] session
#[async_trait]
pub trait Connector: Send + Sync {
    type Bot: Bot;

    async fn connect(&self, settings: &SessionSettings) -> Result<Self::Bot, BotError>;
}

/// Bot information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotInfo {
    pub id: String,
    pub name: String,
}
