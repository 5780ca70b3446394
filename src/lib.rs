//! BibleBot - a Discord bot that answers `+ping` with `pong`

pub mod domain;
pub mod application;
pub mod infrastructure;
