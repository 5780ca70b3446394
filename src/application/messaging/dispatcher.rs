//! Command dispatcher - Maps inbound messages to an optional reply

use async_trait::async_trait;

use crate::application::lifecycle::StateWatch;
use crate::domain::entities::{MessageEvent, Reply};
use crate::domain::traits::{Context, EventHandler};

/// The only recognised command. Matched by exact equality.
pub const PING_COMMAND: &str = "+ping";

/// Reply sent for [`PING_COMMAND`]
pub const PING_REPLY: &str = "pong";

/// Dispatcher for inbound message events.
///
/// Holds no per-event state. When gated, events are only handled while the
/// watched lifecycle is running.
#[derive(Debug, Clone, Default)]
pub struct CommandDispatcher {
    gate: Option<StateWatch>,
}

impl CommandDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_gate(mut self, gate: StateWatch) -> Self {
        self.gate = Some(gate);
        self
    }

    fn accepting(&self) -> bool {
        self.gate.as_ref().map_or(true, StateWatch::is_running)
    }

    /// Decide the reply for one event, if any.
    ///
    /// Messages authored by `self_id` never produce a reply.
    pub fn dispatch(&self, event: &MessageEvent, self_id: &str) -> Option<Reply> {
        if event.author_id() == self_id {
            return None;
        }

        if event.content == PING_COMMAND {
            return Some(Reply::new(event.channel_id.clone(), PING_REPLY));
        }

        None
    }
}

#[async_trait]
impl EventHandler for CommandDispatcher {
    async fn message(&self, ctx: Context, event: MessageEvent) {
        if !self.accepting() {
            tracing::debug!("[{}] dropped message {} outside running state", event.channel_id, event.id);
            return;
        }

        let Some(reply) = self.dispatch(&event, &ctx.self_id) else {
            return;
        };

        tracing::debug!("[{}] {}: {} -> {}", reply.channel_id, event.author, event.content, reply.text);

        // Send failures are logged and go no further
        if let Err(e) = ctx.messenger.send_message(&reply.channel_id, &reply.text).await {
            tracing::warn!("Failed to send reply to channel {}: {}", reply.channel_id, e);
        }
    }
}
