//! Application layer - Use cases and process orchestration
//!
//! This layer contains:
//! - Errors: Startup and runtime error types
//! - Messaging: Command dispatch for inbound messages
//! - Lifecycle: Startup, run and shutdown sequencing

pub mod errors;
pub mod lifecycle;
pub mod messaging;
