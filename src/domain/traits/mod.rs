//! Domain traits - Abstractions for messaging platform implementations

pub mod bot;

pub use bot::{Bot, BotInfo, Connector, Context, EventHandler, Messenger, SessionSettings};
