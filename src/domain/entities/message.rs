use super::User;

/// An inbound message delivered by the messaging platform.
///
/// Events are consumed by the dispatcher and discarded; nothing keeps them.
#[derive(Debug, Clone)]
pub struct MessageEvent {
    pub id: String,
    pub channel_id: String,
    pub author: User,
    pub content: String,
}

impl MessageEvent {
    pub fn new(channel_id: impl Into<String>, author: User, content: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            channel_id: channel_id.into(),
            author,
            content: content.into(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn author_id(&self) -> &str {
        &self.author.id
    }
}

/// An outbound text message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub channel_id: String,
    pub text: String,
}

impl Reply {
    pub fn new(channel_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            channel_id: channel_id.into(),
            text: text.into(),
        }
    }
}
