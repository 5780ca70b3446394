//! Discord adapter - serenity client behind the [`Bot`] trait
//!
//! The serenity client owns the gateway connection, including heartbeats,
//! session resume and reconnects. This module only bridges its events into
//! [`EventHandler`] calls and its REST client into a [`Messenger`].

use async_trait::async_trait;
use serenity::all::{
    ChannelId, ClientBuilder, Context as SerenityContext, EventHandler as SerenityEventHandler,
    GatewayIntents, Http, HttpBuilder, Message, Ready, ShardManager,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::application::errors::BotError;
use crate::domain::entities::{MessageEvent, User};
use crate::domain::traits::{
    Bot, BotInfo, Connector, Context, EventHandler, Messenger, SessionSettings,
};

/// Events the session subscribes to. Message content is a privileged intent.
pub const INTENTS: GatewayIntents = GatewayIntents::GUILD_MESSAGES
    .union(GatewayIntents::DIRECT_MESSAGES)
    .union(GatewayIntents::MESSAGE_CONTENT);

/// How long `open` waits for the gateway READY event
pub const OPEN_TIMEOUT: Duration = Duration::from_secs(30);

fn build_http(settings: &SessionSettings) -> Http {
    let mut builder = HttpBuilder::new(settings.token.trim());
    if let Some(proxy) = &settings.api_proxy {
        // The proxy handles rate limits for every process sharing it
        builder = builder.proxy(proxy.trim_end_matches('/')).ratelimiter_disabled(true);
    }
    builder.build()
}

/// Map a serenity error onto the bot's error kinds
fn api_error(err: serenity::Error) -> BotError {
    match &err {
        serenity::Error::Http(http) => match http.status_code().map(|s| s.as_u16()) {
            Some(401) | Some(403) => BotError::Auth(err.to_string()),
            _ => BotError::Network(err.to_string()),
        },
        serenity::Error::Json(_) => BotError::Parse(err.to_string()),
        serenity::Error::Gateway(_) => BotError::Gateway(err.to_string()),
        _ => BotError::Network(err.to_string()),
    }
}

/// Sends messages through the Discord REST API
pub struct DiscordMessenger {
    http: Arc<Http>,
}

impl DiscordMessenger {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Messenger for DiscordMessenger {
    async fn send_message(&self, channel_id: &str, text: &str) -> Result<String, BotError> {
        let id = channel_id
            .parse::<u64>()
            .ok()
            .filter(|id| *id != 0)
            .ok_or_else(|| BotError::Parse(format!("invalid channel id {:?}", channel_id)))?;

        let sent = ChannelId::new(id).say(&self.http, text).await.map_err(api_error)?;
        Ok(sent.id.to_string())
    }
}

/// Forwards serenity events to the registered handler
struct EventBridge {
    handler: Option<Arc<dyn EventHandler>>,
    ctx: Context,
    ready: Mutex<Option<oneshot::Sender<()>>>,
}

impl EventBridge {
    fn event_for(msg: &Message) -> MessageEvent {
        let author = User::new(msg.author.id.to_string()).with_username(msg.author.name.clone());
        MessageEvent::new(msg.channel_id.to_string(), author, msg.content.clone())
            .with_id(msg.id.to_string())
    }
}

#[async_trait]
impl SerenityEventHandler for EventBridge {
    async fn ready(&self, _ctx: SerenityContext, ready: Ready) {
        tracing::debug!("Gateway ready as {} (session {})", ready.user.name, ready.session_id);

        let waiter = match self.ready.lock() {
            Ok(mut slot) => slot.take(),
            Err(_) => None,
        };
        if let Some(tx) = waiter {
            let _ = tx.send(());
        }
    }

    async fn message(&self, _ctx: SerenityContext, msg: Message) {
        if let Some(handler) = &self.handler {
            handler.message(self.ctx.clone(), Self::event_for(&msg)).await;
        }
    }
}

/// A started serenity client
struct ClientSession {
    shard_manager: Arc<ShardManager>,
    task: JoinHandle<Result<(), serenity::Error>>,
}

/// Discord bot adapter
pub struct DiscordAdapter {
    http: Arc<Http>,
    settings: SessionSettings,
    info: BotInfo,
    handler: Option<Arc<dyn EventHandler>>,
    session: Option<ClientSession>,
}

impl DiscordAdapter {
    /// Build a session and authenticate the token against the REST API
    pub async fn connect(settings: &SessionSettings) -> Result<Self, BotError> {
        if settings.token.trim().is_empty() {
            return Err(BotError::Auth("token is empty".to_string()));
        }

        let http = Arc::new(build_http(settings));
        let me = http.get_current_user().await.map_err(api_error)?;
        let info = BotInfo {
            id: me.id.to_string(),
            name: me.name.clone(),
        };
        tracing::debug!("Authenticated as {} ({})", info.name, info.id);

        Ok(Self {
            http,
            settings: settings.clone(),
            info,
            handler: None,
            session: None,
        })
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    async fn check_gateway(&self) -> Result<(), BotError> {
        let gateway = self.http.get_bot_gateway().await.map_err(api_error)?;
        let limit = &gateway.session_start_limit;
        tracing::debug!(
            "Gateway {} ({} of {} session starts left)",
            gateway.url,
            limit.remaining,
            limit.total
        );

        if limit.remaining == 0 {
            return Err(BotError::Gateway(format!(
                "session start limit reached, resets in {} ms",
                limit.reset_after
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Bot for DiscordAdapter {
    fn on_message(&mut self, handler: Arc<dyn EventHandler>) {
        self.handler = Some(handler);
    }

    async fn open(&mut self) -> Result<(), BotError> {
        if self.is_open() {
            tracing::warn!("Gateway already open");
            return Ok(());
        }

        self.check_gateway().await?;

        let (ready_tx, ready_rx) = oneshot::channel();
        let bridge = EventBridge {
            handler: self.handler.clone(),
            ctx: Context::new(self.messenger(), self.info.id.clone()),
            ready: Mutex::new(Some(ready_tx)),
        };

        let mut client = ClientBuilder::new_with_http(build_http(&self.settings), INTENTS)
            .event_handler(bridge)
            .await
            .map_err(api_error)?;
        let shard_manager = client.shard_manager.clone();
        let mut task = tokio::spawn(async move { client.start().await });

        let failure = tokio::select! {
            ready = ready_rx => match ready {
                Ok(()) => None,
                Err(_) => Some(BotError::Gateway("client stopped before READY".to_string())),
            },
            ended = &mut task => Some(match ended {
                Ok(Ok(())) => BotError::Gateway("client stopped before READY".to_string()),
                Ok(Err(e)) => api_error(e),
                Err(e) => BotError::Internal(e.to_string()),
            }),
            _ = tokio::time::sleep(OPEN_TIMEOUT) => {
                Some(BotError::Gateway(format!("no READY within {:?}", OPEN_TIMEOUT)))
            }
        };

        if let Some(err) = failure {
            shard_manager.shutdown_all().await;
            task.abort();
            return Err(err);
        }

        self.session = Some(ClientSession { shard_manager, task });
        Ok(())
    }

    async fn close(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };

        session.shard_manager.shutdown_all().await;
        match session.task.await {
            Ok(Err(e)) => tracing::warn!("Discord client stopped with error: {}", e),
            Err(e) if !e.is_cancelled() => tracing::warn!("Discord client task failed: {}", e),
            _ => tracing::debug!("Discord client stopped"),
        }
    }

    fn messenger(&self) -> Arc<dyn Messenger> {
        Arc::new(DiscordMessenger::new(self.http.clone()))
    }

    fn bot_info(&self) -> BotInfo {
        self.info.clone()
    }
}

impl Drop for DiscordAdapter {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            session.task.abort();
        }
    }
}

/// Connects [`DiscordAdapter`] sessions
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscordConnector;

#[async_trait]
impl Connector for DiscordConnector {
    type Bot = DiscordAdapter;

    async fn connect(&self, settings: &SessionSettings) -> Result<DiscordAdapter, BotError> {
        DiscordAdapter::connect(settings).await
    }
}
