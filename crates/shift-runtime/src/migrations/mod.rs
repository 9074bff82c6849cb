mod catalog;
mod create;
mod filter;
mod plan;
mod runner;

pub use catalog::Catalog;
pub use create::{create_migration_pair, migration_file_name};
pub use filter::{is_downgradable, is_upgradable};
pub use plan::Plan;
pub use runner::{MigrationRunner, RunReport, StatusReport};
