//! Application layer errors

use thiserror::Error;

/// General bot errors
#[derive(Error, Debug)]
pub enum BotError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Gateway error: {0}")]
    Gateway(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Fatal startup failures, one per process exit code
#[derive(Error, Debug)]
pub enum StartupError {
    #[error("couldn't load config: {0}")]
    Config(#[from] ConfigError),

    #[error("couldn't start discord session: {0}")]
    Client(#[source] BotError),

    #[error("couldn't open a connection: {0}")]
    Connect(#[source] BotError),

    #[error("internal error: {0}")]
    Internal(#[source] BotError),
}

impl StartupError {
    /// Process exit status for this failure class
    pub fn exit_code(&self) -> u8 {
        match self {
            StartupError::Config(_) => 1,
            StartupError::Client(_) => 2,
            StartupError::Connect(_) => 3,
            StartupError::Internal(_) => 4,
        }
    }
}
