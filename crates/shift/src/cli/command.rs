use anyhow::Result;
use clap::Subcommand;

use shift_core::backend::Backend;
use shift_core::config::ShiftConfig;
use shift_core::migration::Version;
use shift_runtime::MigrationRunner;

use super::output;

/// Migration commands, shared by one-shot and interactive use.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Show the current checkpoint and the pending migrations in both directions.
    Status {
        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Create an empty downgrade/upgrade pair stamped with the current time.
    Create {
        /// Migration name.
        name: String,
    },

    /// Apply pending upgrades, optionally up to and including a version.
    Upgrade {
        /// Last version to upgrade to (inclusive).
        #[arg(value_name = "TO_INCLUSIVE_VERSION")]
        to: Option<String>,
    },

    /// Apply pending downgrades, optionally down to and including a version.
    Downgrade {
        /// Last version to downgrade to (inclusive).
        #[arg(value_name = "TO_INCLUSIVE_VERSION")]
        to: Option<String>,
    },
}

impl Commands {
    /// Whether the command runs migrations and so needs exclusive access.
    pub fn is_mutating(&self) -> bool {
        matches!(self, Commands::Upgrade { .. } | Commands::Downgrade { .. })
    }
}

/// Operator front end over a [`MigrationRunner`].
pub struct Shift<B> {
    runner: MigrationRunner<B>,
}

impl<B: Backend> Shift<B> {
    pub fn new(config: ShiftConfig, backend: B) -> Self {
        Self {
            runner: MigrationRunner::new(config, backend),
        }
    }

    pub fn runner(&self) -> &MigrationRunner<B> {
        &self.runner
    }

    /// Run one command, rendering its output.
    pub async fn dispatch(&self, command: Commands) -> Result<()> {
        match command {
            Commands::Status { json } => self.status(json).await,
            Commands::Create { name } => self.create(&name),
            Commands::Upgrade { to } => self.upgrade(to.as_deref()).await,
            Commands::Downgrade { to } => self.downgrade(to.as_deref()).await,
        }
    }

    async fn status(&self, json: bool) -> Result<()> {
        let report = self.runner.status().await?;
        if json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            output::status(&report);
        }
        Ok(())
    }

    fn create(&self, name: &str) -> Result<()> {
        let pair = self.runner.create(name)?;
        for m in &pair {
            output::success(format_args!("Created {}", m.path.display()));
        }
        Ok(())
    }

    async fn upgrade(&self, to: Option<&str>) -> Result<()> {
        let bound = bound(to);
        let report = self.runner.upgrade(bound.as_ref(), output::applied).await?;
        if report.is_empty() {
            output::success("Nothing to upgrade");
        }
        Ok(())
    }

    async fn downgrade(&self, to: Option<&str>) -> Result<()> {
        let bound = bound(to);
        let report = self.runner.downgrade(bound.as_ref(), output::applied).await?;
        if report.is_empty() {
            output::success("Nothing to downgrade");
        }
        Ok(())
    }
}

/// An empty bound means "no bound".
pub(crate) fn bound(to: Option<&str>) -> Option<Version> {
    to.map(str::trim)
        .filter(|v| !v.is_empty())
        .map(Version::new)
}
