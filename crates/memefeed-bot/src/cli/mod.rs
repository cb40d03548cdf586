//! CLI entry and dispatch.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use memefeed_core::config::{self, Config};
use memefeed_core::logging;

mod commands;

#[derive(Parser)]
#[command(name = "memefeed-bot")]
#[command(version)]
#[command(about = "Telegram bot serving a browsable meme feed")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file (default: $MEMEFEED_HOME/config.toml)
    #[arg(long, global = true, env = "MEMEFEED_CONFIG", value_name = "PATH")]
    config: Option<PathBuf>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Run the Telegram bot (long-polling); the default
    Run,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config.unwrap_or_else(config::paths::config_path);

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Config { command } => match command {
            ConfigCommands::Path => {
                commands::config::path(&config_path);
                Ok(())
            }
            ConfigCommands::Init => commands::config::init(&config_path),
        },
        Commands::Run => {
            let config = Config::load_from(&config_path).context("load config")?;
            config.validate()?;
            let _log_guard = logging::init(&config.logging)?;
            tracing::info!(config = %config_path.display(), "loaded config");

            let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;
            rt.block_on(memefeed_bot::run(config))
        }
    }
}
