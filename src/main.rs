use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use biblebot::application::errors::StartupError;
use biblebot::application::lifecycle::Controller;
use biblebot::domain::traits::Connector;
use biblebot::infrastructure::adapters::console::ConsoleConnector;
use biblebot::infrastructure::adapters::discord::DiscordConnector;
use biblebot::infrastructure::config::Config;
use biblebot::infrastructure::signal::wait_for_termination;

#[derive(Parser)]
#[command(name = "biblebot")]
#[command(about = "A Discord bot that answers +ping", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Bot token (overrides config)
    #[arg(short, long)]
    token: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot
    Run {
        /// Read messages from stdin instead of connecting to Discord
        #[arg(long)]
        console: bool,
    },
    /// Show version
    Version,
    /// Generate default config
    InitConfig,
}

fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { console } => {
            if console {
                run_bot(ConsoleConnector, &cli.config, cli.token)
            } else {
                run_bot(DiscordConnector, &cli.config, cli.token)
            }
        }
        Commands::Version => {
            println!("biblebot v{}", env!("CARGO_PKG_VERSION"));
            ExitCode::SUCCESS
        }
        Commands::InitConfig => init_config(&cli.config),
    }
}

fn run_bot<C: Connector>(connector: C, config_path: &Path, token_override: Option<String>) -> ExitCode {
    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to start async runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut controller = Controller::new(connector).with_token(token_override);
    let result = rt.block_on(controller.run(config_path, wait_for_termination()));

    // Blocking stdin reads would otherwise hold the runtime open
    rt.shutdown_timeout(Duration::from_secs(1));

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => report(&e),
    }
}

fn report(err: &StartupError) -> ExitCode {
    tracing::error!("{}", err);
    ExitCode::from(err.exit_code())
}

fn init_config(path: &Path) -> ExitCode {
    match Config::write_default(path) {
        Ok(()) => {
            println!("Wrote default config to {}", path.display());
            println!("Set BibleBot.token before running the bot.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Failed to write config: {}", e);
            ExitCode::FAILURE
        }
    }
}
