mod memory;
mod postgres;

pub use memory::MemoryBackend;
pub use postgres::{split_sql_statements, MigrationLock, PostgresBackend};
