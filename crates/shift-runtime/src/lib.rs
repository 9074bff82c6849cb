pub mod backend;
pub mod db;
pub mod migrations;

pub use backend::{MemoryBackend, MigrationLock, PostgresBackend};
pub use db::Database;
pub use migrations::{Catalog, MigrationRunner, Plan, RunReport, StatusReport};
