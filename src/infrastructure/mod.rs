//! Infrastructure layer - External concerns
//!
//! This layer contains:
//! - Config: Configuration loading
//! - Adapters: Platform integrations (Discord, console)
//! - Signal: OS termination signals

pub mod config;
pub mod adapters;
pub mod signal;
