//! Process lifecycle - startup, run until signalled, shutdown

use std::fmt;
use std::future::Future;
use std::path::Path;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::application::errors::{BotError, StartupError};
use crate::application::messaging::CommandDispatcher;
use crate::domain::traits::{Bot, Connector};
use crate::infrastructure::config::Config;

/// Upper bound on how long closing the connection may take
pub const CLOSE_TIMEOUT: Duration = Duration::from_secs(10);

/// Lifecycle states, in the only order they may be visited
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LifecycleState {
    #[default]
    Unstarted,
    Configuring,
    Connecting,
    Running,
    ShuttingDown,
    Stopped,
}

impl LifecycleState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => LifecycleState::Unstarted,
            1 => LifecycleState::Configuring,
            2 => LifecycleState::Connecting,
            3 => LifecycleState::Running,
            4 => LifecycleState::ShuttingDown,
            _ => LifecycleState::Stopped,
        }
    }

    pub fn next(self) -> Option<Self> {
        match self {
            LifecycleState::Unstarted => Some(LifecycleState::Configuring),
            LifecycleState::Configuring => Some(LifecycleState::Connecting),
            LifecycleState::Connecting => Some(LifecycleState::Running),
            LifecycleState::Running => Some(LifecycleState::ShuttingDown),
            LifecycleState::ShuttingDown => Some(LifecycleState::Stopped),
            LifecycleState::Stopped => None,
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleState::Unstarted => "unstarted",
            LifecycleState::Configuring => "configuring",
            LifecycleState::Connecting => "connecting",
            LifecycleState::Running => "running",
            LifecycleState::ShuttingDown => "shutting down",
            LifecycleState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Read-only view of a [`Lifecycle`]'s current state, shareable across tasks
#[derive(Debug, Clone, Default)]
pub struct StateWatch(Arc<AtomicU8>);

impl StateWatch {
    pub fn get(&self) -> LifecycleState {
        LifecycleState::from_u8(self.0.load(Ordering::Acquire))
    }

    pub fn is_running(&self) -> bool {
        self.get() == LifecycleState::Running
    }

    fn set(&self, state: LifecycleState) {
        self.0.store(state as u8, Ordering::Release);
    }
}

/// Forward-only state tracker
#[derive(Debug, Default)]
pub struct Lifecycle {
    state: StateWatch,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> LifecycleState {
        self.state.get()
    }

    /// Shared view that follows every transition
    pub fn watch(&self) -> StateWatch {
        self.state.clone()
    }

    /// Move to `to`, which must be the immediate successor of the current state
    pub fn advance(&mut self, to: LifecycleState) -> Result<(), BotError> {
        let from = self.state.get();
        if from.next() != Some(to) {
            return Err(BotError::Internal(format!(
                "invalid lifecycle transition {} -> {}",
                from, to
            )));
        }
        tracing::debug!("Lifecycle: {} -> {}", from, to);
        self.state.set(to);
        Ok(())
    }
}

/// Startup and shutdown sequencing around a single [`Bot`] session
pub struct Controller<C: Connector> {
    connector: C,
    lifecycle: Lifecycle,
    token_override: Option<String>,
}

impl<C: Connector> Controller<C> {
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            lifecycle: Lifecycle::new(),
            token_override: None,
        }
    }

    /// Use `token` instead of the one in the config file
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token_override = token;
        self
    }

    pub fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    fn advance(&mut self, to: LifecycleState) -> Result<(), StartupError> {
        self.lifecycle.advance(to).map_err(StartupError::Internal)
    }

    /// Load config from `config_path`, connect, and serve until `shutdown` resolves
    pub async fn run<F>(&mut self, config_path: &Path, shutdown: F) -> Result<(), StartupError>
    where
        F: Future<Output = ()>,
    {
        self.advance(LifecycleState::Configuring)?;
        let config = Config::load(config_path)?.with_token(self.token_override.take());

        self.advance(LifecycleState::Connecting)?;
        let mut bot = self
            .connector
            .connect(&config.session_settings())
            .await
            .map_err(StartupError::Client)?;

        // Events reaching the dispatcher outside Running are dropped
        bot.on_message(Arc::new(CommandDispatcher::new().with_gate(self.lifecycle.watch())));
        bot.open().await.map_err(StartupError::Connect)?;

        self.advance(LifecycleState::Running)?;
        tracing::info!("BibleBot v{} by Seraphim R.P. (vypr)", config.meta.version);
        tracing::debug!("Logged in as {} ({})", bot.bot_info().name, bot.bot_info().id);

        shutdown.await;

        self.advance(LifecycleState::ShuttingDown)?;
        tracing::info!("received closing signal, goodbye");
        if tokio::time::timeout(CLOSE_TIMEOUT, bot.close()).await.is_err() {
            tracing::warn!("Connection did not close within {:?}", CLOSE_TIMEOUT);
        }

        self.advance(LifecycleState::Stopped)?;
        Ok(())
    }
}
