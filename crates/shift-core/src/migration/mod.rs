mod direction;
mod version;

pub use direction::Direction;
pub use version::Version;

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// A single migration file discovered in the migrations directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Migration {
    /// Version prefix of the file name (left of the first `-`).
    pub version: Version,
    /// Remainder of the file name (right of the first `-`).
    pub name: String,
    /// Whether this file moves the schema forward or back.
    pub direction: Direction,
    /// Location the payload is read from.
    #[serde(skip)]
    pub path: PathBuf,
}

impl Migration {
    pub fn new(
        version: impl Into<Version>,
        name: impl Into<String>,
        direction: Direction,
        path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            version: version.into(),
            name: name.into(),
            direction,
            path: path.into(),
        }
    }

    /// Original file name, `<version>-<name>`.
    pub fn file_name(&self) -> String {
        format!("{}-{}", self.version, self.name)
    }
}

/// The durable record of the most recently applied migration.
///
/// The default value (`""`, `Downgrade`) describes a target that has never
/// been migrated: every upgrade is eligible and no downgrade is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Checkpoint {
    pub version: Version,
    pub direction: Direction,
}

impl Checkpoint {
    pub fn new(version: impl Into<Version>, direction: Direction) -> Self {
        Self {
            version: version.into(),
            direction,
        }
    }

    /// Checkpoint recorded after `migration` completes.
    pub fn after(migration: &Migration) -> Self {
        Self {
            version: migration.version.clone(),
            direction: migration.direction,
        }
    }
}

/// A migration that was executed and checkpointed during a run.
#[derive(Debug, Clone)]
pub struct AppliedMigration {
    pub migration: Migration,
    pub duration: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkpoint_default() {
        let checkpoint = Checkpoint::default();
        assert!(checkpoint.version.is_empty());
        assert_eq!(checkpoint.direction, Direction::Downgrade);
    }

    #[test]
    fn test_checkpoint_after() {
        let m = Migration::new("123", "hello-world.up.sql", Direction::Upgrade, "/tmp/x");
        assert_eq!(Checkpoint::after(&m), Checkpoint::new("123", Direction::Upgrade));
    }

    #[test]
    fn test_file_name() {
        let m = Migration::new(
            "20190926154408",
            "hello-world.down.sql",
            Direction::Downgrade,
            "/tmp/20190926154408-hello-world.down.sql",
        );
        assert_eq!(m.file_name(), "20190926154408-hello-world.down.sql");
    }

    #[test]
    fn test_checkpoint_json() {
        let checkpoint = Checkpoint::new("20190901", Direction::Upgrade);
        let json = serde_json::to_string(&checkpoint).unwrap();
        assert_eq!(json, r#"{"version":"20190901","direction":"upgrade"}"#);

        let parsed: Checkpoint = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, checkpoint);
    }
}
