mod command;
pub mod output;
mod shell;

pub use command::{Commands, Shift};

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};

use shift_core::backend::Backend;
use shift_core::config::{ShiftConfig, ENV_MIGRATIONS_PATH};
use shift_runtime::PostgresBackend;

/// Configuration file picked up from the working directory when present.
const DEFAULT_CONFIG: &str = "shift.toml";

/// shift - paired upgrade/downgrade schema migrations
#[derive(Parser, Debug)]
#[command(name = "shift")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path (defaults to shift.toml, then DBSHIFT_* environment variables).
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Migrations directory path.
    #[arg(short, long, global = true)]
    pub migrations_dir: Option<PathBuf>,

    /// Database URL (overrides configuration).
    #[arg(long, global = true)]
    pub database_url: Option<String>,

    /// Enable debug logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Command to run; starts an interactive shell when omitted.
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Install the tracing subscriber. Logs go to stderr.
    pub fn init_tracing(&self) {
        let log_level = if self.verbose { "debug" } else { "warn" };
        tracing_subscriber::fmt()
            .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.to_string()))
            .with_writer(std::io::stderr)
            .init();
    }

    /// Resolve configuration from file or environment plus command-line overrides.
    pub fn load_config(&self) -> Result<ShiftConfig> {
        let file = self
            .config
            .clone()
            .or_else(|| Some(PathBuf::from(DEFAULT_CONFIG)).filter(|p| p.exists()));

        let mut config = match file {
            Some(path) => {
                info!("Loading configuration from {}", path.display());
                ShiftConfig::from_file(&path)?
            }
            None => {
                let migrations_dir = self.migrations_dir.clone();
                ShiftConfig::from_lookup(|key| {
                    if key == ENV_MIGRATIONS_PATH {
                        if let Some(dir) = &migrations_dir {
                            return Some(dir.display().to_string());
                        }
                    }
                    std::env::var(key).ok()
                })?
            }
        };

        if let Some(dir) = &self.migrations_dir {
            config.migrations.path = dir.clone();
        }
        if let Some(url) = &self.database_url {
            config.database.url = url.clone();
        }

        config.validate()?;
        Ok(config)
    }

    /// Execute the CLI against the configured Postgres database.
    pub async fn execute(self) -> Result<()> {
        // Load .env if present
        dotenvy::dotenv().ok();

        let config = self.load_config()?;
        if !config.database.is_configured() {
            anyhow::bail!(
                "No database configured.\nSet DATABASE_URL, pass --database-url, or add [database] url to {}.",
                DEFAULT_CONFIG
            );
        }

        let backend = Arc::new(PostgresBackend::connect(&config.database).await?);
        let shift = Shift::new(config, backend.clone());
        let dispatch = |command: Commands| run_locked(&shift, &backend, command);

        match self.command {
            Some(command) => dispatch(command).await,
            None => shell::run(dispatch).await,
        }
    }
}

/// Run `command` while holding the database's migration lock when it
/// executes migrations.
async fn run_locked<B: Backend>(
    shift: &Shift<B>,
    backend: &PostgresBackend,
    command: Commands,
) -> Result<()> {
    if !command.is_mutating() {
        return shift.dispatch(command).await;
    }

    let lock = backend.lock().await?;
    let result = shift.dispatch(command).await;

    if let Err(e) = lock.release().await {
        warn!("Failed to release migration lock: {}", e);
    }
    result
}
