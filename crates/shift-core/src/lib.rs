pub mod backend;
pub mod config;
pub mod error;
pub mod migration;

pub use backend::{Backend, BackendFuture};
pub use config::{DirectionRule, ShiftConfig};
pub use error::{Result, ShiftError};
pub use migration::{AppliedMigration, Checkpoint, Direction, Migration, Version};
