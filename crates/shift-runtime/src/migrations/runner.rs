//! Migration runner.
//!
//! Reads the checkpoint, builds a fresh catalog, plans, and applies the plan
//! one migration at a time. The checkpoint is written after every
//! successful step, so a run that stops half way leaves the checkpoint
//! pointing at the last migration that actually completed.

use std::time::Instant;

use chrono::Local;
use serde::Serialize;
use shift_core::backend::Backend;
use shift_core::config::ShiftConfig;
use shift_core::error::{Result, ShiftError};
use shift_core::migration::{AppliedMigration, Checkpoint, Migration, Version};
use tracing::{debug, info, warn};

use super::catalog::Catalog;
use super::create::create_migration_pair;
use super::plan::Plan;

/// Pending work in both directions from the current checkpoint.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub checkpoint: Checkpoint,
    pub upgrades: Plan,
    pub downgrades: Plan,
}

/// Migrations applied by one successful run.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub applied: Vec<AppliedMigration>,
}

impl RunReport {
    pub fn is_empty(&self) -> bool {
        self.applied.is_empty()
    }
}

/// Drives a backend through planned migrations.
pub struct MigrationRunner<B> {
    config: ShiftConfig,
    backend: B,
}

impl<B: Backend> MigrationRunner<B> {
    pub fn new(config: ShiftConfig, backend: B) -> Self {
        Self { config, backend }
    }

    pub fn config(&self) -> &ShiftConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Scan the migrations directory.
    pub fn catalog(&self) -> Result<Catalog> {
        Catalog::load(
            &self.config.migrations.path,
            self.config.migrations.direction_rule,
        )
    }

    async fn checkpoint(&self) -> Result<Checkpoint> {
        let checkpoint = self.backend.checkpoint().await?;
        debug!(
            "Current checkpoint: version={:?} direction={}",
            checkpoint.version.as_str(),
            checkpoint.direction
        );
        Ok(checkpoint)
    }

    /// Report what an unbounded upgrade and downgrade would run.
    pub async fn status(&self) -> Result<StatusReport> {
        let checkpoint = self.checkpoint().await?;
        let catalog = self.catalog()?;

        Ok(StatusReport {
            upgrades: Plan::upgrade(&catalog, &checkpoint, None),
            downgrades: Plan::downgrade(&catalog, &checkpoint, None),
            checkpoint,
        })
    }

    /// Plan an upgrade up to and including `bound`.
    pub async fn plan_upgrade(&self, bound: Option<&Version>) -> Result<Plan> {
        let checkpoint = self.checkpoint().await?;
        let catalog = self.catalog()?;
        Ok(Plan::upgrade(&catalog, &checkpoint, bound))
    }

    /// Plan a downgrade down to and including `bound`.
    pub async fn plan_downgrade(&self, bound: Option<&Version>) -> Result<Plan> {
        let checkpoint = self.checkpoint().await?;
        let catalog = self.catalog()?;
        Ok(Plan::downgrade(&catalog, &checkpoint, bound))
    }

    /// Apply every eligible upgrade, oldest first.
    ///
    /// `on_applied` is called after each migration has been checkpointed.
    pub async fn upgrade<F>(&self, bound: Option<&Version>, on_applied: F) -> Result<RunReport>
    where
        F: FnMut(&AppliedMigration),
    {
        if self.config.options.upgrade_disabled {
            return Err(ShiftError::Disabled("upgrading"));
        }

        let plan = self.plan_upgrade(bound).await?;
        self.execute(&plan, on_applied).await
    }

    /// Apply every eligible downgrade, newest first.
    pub async fn downgrade<F>(&self, bound: Option<&Version>, on_applied: F) -> Result<RunReport>
    where
        F: FnMut(&AppliedMigration),
    {
        if self.config.options.downgrade_disabled {
            return Err(ShiftError::Disabled("downgrading"));
        }

        let plan = self.plan_downgrade(bound).await?;
        self.execute(&plan, on_applied).await
    }

    /// Apply `plan` in order, stopping at the first failure.
    ///
    /// A migration whose execution fails is not checkpointed and nothing
    /// after it is attempted. If execution succeeds but the checkpoint
    /// write fails, the migration's effect is in place without being
    /// recorded; that is reported as [`ShiftError::Checkpoint`].
    pub async fn execute<F>(&self, plan: &Plan, mut on_applied: F) -> Result<RunReport>
    where
        F: FnMut(&AppliedMigration),
    {
        if plan.is_empty() {
            info!("No {} migrations to run", plan.direction);
            return Ok(RunReport::default());
        }

        info!("Running {} {} migration(s)", plan.len(), plan.direction);
        let mut report = RunReport::default();

        for migration in plan {
            let applied = self.apply(migration).await?;
            on_applied(&applied);
            report.applied.push(applied);
        }

        Ok(report)
    }

    async fn apply(&self, migration: &Migration) -> Result<AppliedMigration> {
        let file_name = migration.file_name();
        info!("Applying migration: {}", file_name);

        let payload = tokio::fs::read(&migration.path).await.map_err(|e| {
            ShiftError::Execution {
                migration: file_name.clone(),
                message: format!("cannot read {}: {}", migration.path.display(), e),
            }
        })?;

        let started = Instant::now();
        if let Err(e) = self.backend.execute_migration(&payload).await {
            warn!("Migration {} failed: {}", file_name, e);
            return Err(ShiftError::Execution {
                migration: file_name,
                message: e.to_string(),
            });
        }
        let duration = started.elapsed();

        if let Err(e) = self.backend.set_checkpoint(migration, duration).await {
            warn!(
                "Migration {} was applied but not checkpointed: {}",
                file_name, e
            );
            return Err(ShiftError::Checkpoint {
                migration: file_name,
                message: e.to_string(),
            });
        }

        info!(
            "Migration applied: {} ({:.3}s)",
            file_name,
            duration.as_secs_f64()
        );

        Ok(AppliedMigration {
            migration: migration.clone(),
            duration,
        })
    }

    /// Create an empty downgrade/upgrade pair stamped with the current time.
    pub fn create(&self, name: &str) -> Result<[Migration; 2]> {
        if self.config.options.create_disabled {
            return Err(ShiftError::Disabled("creating"));
        }

        let version = Version::from_timestamp(&Local::now());
        create_migration_pair(
            &self.config.migrations.path,
            name,
            self.backend.extension(),
            &version,
        )
    }
}
