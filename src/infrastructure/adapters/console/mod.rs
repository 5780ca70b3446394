//! Console adapter for development/testing

use async_trait::async_trait;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;

use crate::application::errors::BotError;
use crate::domain::entities::{MessageEvent, User};
use crate::domain::traits::{
    Bot, BotInfo, Connector, Context, EventHandler, Messenger, SessionSettings,
};

pub const CONSOLE_CHANNEL: &str = "console";
pub const CONSOLE_USER: &str = "console-user";
pub const CONSOLE_BOT: &str = "console";

/// Prints outbound messages to stdout
pub struct ConsoleMessenger;

#[async_trait]
impl Messenger for ConsoleMessenger {
    async fn send_message(&self, _channel_id: &str, text: &str) -> Result<String, BotError> {
        println!("[BOT] {}", text);
        Ok("console_msg".to_string())
    }
}

/// Console bot adapter for local development.
///
/// Every stdin line is delivered as a message from [`CONSOLE_USER`].
pub struct ConsoleAdapter {
    info: BotInfo,
    messenger: Arc<dyn Messenger>,
    handler: Option<Arc<dyn EventHandler>>,
    reader: Option<JoinHandle<()>>,
}

impl ConsoleAdapter {
    pub fn new() -> Self {
        Self {
            info: BotInfo {
                id: CONSOLE_BOT.to_string(),
                name: "biblebot".to_string(),
            },
            messenger: Arc::new(ConsoleMessenger),
            handler: None,
            reader: None,
        }
    }

    /// Turn one input line into an inbound event
    pub fn event_for_line(line: &str) -> MessageEvent {
        MessageEvent::new(CONSOLE_CHANNEL, User::new(CONSOLE_USER).with_username("you"), line)
    }
}

impl Default for ConsoleAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Bot for ConsoleAdapter {
    fn on_message(&mut self, handler: Arc<dyn EventHandler>) {
        self.handler = Some(handler);
    }

    async fn open(&mut self) -> Result<(), BotError> {
        tracing::info!("Starting console bot (dev mode)");

        let handler = self.handler.clone();
        let ctx = Context::new(self.messenger(), self.info.id.clone());

        self.reader = Some(tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        if let Some(handler) = &handler {
                            handler.message(ctx.clone(), ConsoleAdapter::event_for_line(&line)).await;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        tracing::warn!("Failed to read stdin: {}", e);
                        break;
                    }
                }
            }
            tracing::debug!("Console input closed");
        }));
        Ok(())
    }

    async fn close(&mut self) {
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
    }

    fn messenger(&self) -> Arc<dyn Messenger> {
        self.messenger.clone()
    }

    fn bot_info(&self) -> BotInfo {
        self.info.clone()
    }
}

/// Connector for [`ConsoleAdapter`]; needs no token
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleConnector;

#[async_trait]
impl Connector for ConsoleConnector {
    type Bot = ConsoleAdapter;

    async fn connect(&self, _settings: &SessionSettings) -> Result<ConsoleAdapter, BotError> {
        Ok(ConsoleAdapter::new())
    }
}
