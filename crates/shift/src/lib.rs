//! shift - paired upgrade/downgrade schema migrations.
//!
//! The binary drives PostgreSQL. Other targets can reuse the command layer
//! by implementing [`Backend`] and handing it to [`Shift`].

pub mod cli;

pub use cli::{Cli, Commands, Shift};

pub use shift_core::backend::Backend;
pub use shift_core::config::ShiftConfig;
pub use shift_core::error::{Result, ShiftError};
pub use shift_core::migration::{Checkpoint, Direction, Migration, Version};
pub use shift_runtime::{MemoryBackend, MigrationRunner, PostgresBackend};
