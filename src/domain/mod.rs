//! Domain layer - Core types with no platform dependencies
//!
//! This layer contains:
//! - Entities: Inbound message events and their authors
//! - Traits: Abstractions over the messaging platform (Bot, Messenger, Connector)

pub mod entities;
pub mod traits;
