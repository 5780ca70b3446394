//! Message handling - Event-driven command dispatch

pub mod dispatcher;

pub use dispatcher::{CommandDispatcher, PING_COMMAND, PING_REPLY};
