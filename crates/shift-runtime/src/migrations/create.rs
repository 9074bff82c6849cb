//! Scaffolding for new migration pairs.

use std::fs::OpenOptions;
use std::path::Path;

use shift_core::error::{Result, ShiftError};
use shift_core::migration::{Direction, Migration, Version};
use tracing::info;

/// File name for one half of a pair: `<version>-<name>.<word>.<extension>`.
pub fn migration_file_name(
    version: &Version,
    name: &str,
    direction: Direction,
    extension: &str,
) -> String {
    format!(
        "{}-{}.{}.{}",
        version,
        name,
        direction.as_word(),
        extension.trim_start_matches('.')
    )
}

/// Write an empty downgrade file and an empty upgrade file sharing `version`.
///
/// The downgrade half is written first; if the upgrade half cannot be
/// created the downgrade half is removed again so the directory never holds
/// an unpaired file.
pub fn create_migration_pair(
    dir: &Path,
    name: &str,
    extension: &str,
    version: &Version,
) -> Result<[Migration; 2]> {
    validate_name(name)?;
    if extension.trim_start_matches('.').is_empty() {
        return Err(ShiftError::InvalidArgument(
            "backend did not provide a migration file extension".to_string(),
        ));
    }

    let down = new_migration(dir, name, extension, version, Direction::Downgrade);
    let up = new_migration(dir, name, extension, version, Direction::Upgrade);

    write_empty(&down.path)?;
    if let Err(e) = write_empty(&up.path) {
        let _ = std::fs::remove_file(&down.path);
        return Err(e);
    }

    info!("Created migration pair {} in {}", version, dir.display());
    Ok([down, up])
}

fn new_migration(
    dir: &Path,
    name: &str,
    extension: &str,
    version: &Version,
    direction: Direction,
) -> Migration {
    let file_name = migration_file_name(version, name, direction, extension);
    let path = dir.join(&file_name);
    let rest = file_name
        .split_once('-')
        .map(|(_, rest)| rest.to_string())
        .unwrap_or_default();

    Migration::new(version.clone(), rest, direction, path)
}

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(ShiftError::InvalidArgument("missing migration name".to_string()));
    }
    if name.starts_with('.') || name.contains(['/', '\\']) {
        return Err(ShiftError::InvalidArgument(format!(
            "invalid migration name '{}'",
            name
        )));
    }
    Ok(())
}

fn write_empty(path: &Path) -> Result<()> {
    OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| {
            ShiftError::InvalidArgument(format!("cannot create {}: {}", path.display(), e))
        })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::Catalog;
    use shift_core::config::DirectionRule;
    use tempfile::TempDir;

    #[test]
    fn test_migration_file_name() {
        let cases = [
            ("123", "hello-world", Direction::Upgrade, "sql", "123-hello-world.up.sql"),
            ("123", "hello-world", Direction::Downgrade, "sql", "123-hello-world.down.sql"),
            ("456", "bye-world", Direction::Upgrade, ".sql", "456-bye-world.up.sql"),
            ("789", "new-world", Direction::Downgrade, "txt", "789-new-world.down.txt"),
        ];

        for (version, name, direction, ext, expected) in cases {
            assert_eq!(
                migration_file_name(&Version::new(version), name, direction, ext),
                expected
            );
        }
    }

    #[test]
    fn test_create_pair() {
        let dir = TempDir::new().unwrap();
        let version = Version::new("20190926154408");

        let [down, up] =
            create_migration_pair(dir.path(), "hello-world", "sql", &version).unwrap();

        assert_eq!(down.path, dir.path().join("20190926154408-hello-world.down.sql"));
        assert_eq!(up.path, dir.path().join("20190926154408-hello-world.up.sql"));
        assert_eq!(up.name, "hello-world.up.sql");
        assert!(down.path.exists());
        assert!(up.path.exists());
        assert_eq!(std::fs::read(&up.path).unwrap().len(), 0);
    }

    #[test]
    fn test_created_pair_round_trips_through_catalog() {
        let dir = TempDir::new().unwrap();
        create_migration_pair(dir.path(), "first", "sql", &Version::new("20190901000000")).unwrap();
        create_migration_pair(dir.path(), "second", "sql", &Version::new("20190915000000")).unwrap();

        for rule in [DirectionRule::Positional, DirectionRule::Tagged] {
            let catalog = Catalog::load(dir.path(), rule).unwrap();
            let directions: Vec<Direction> = catalog.iter().map(|m| m.direction).collect();
            assert_eq!(
                directions,
                [
                    Direction::Downgrade,
                    Direction::Upgrade,
                    Direction::Downgrade,
                    Direction::Upgrade
                ]
            );
        }
    }

    #[test]
    fn test_create_rejects_bad_names() {
        let dir = TempDir::new().unwrap();
        let version = Version::new("1");

        for name in ["", "  ", "../escape", ".hidden", "a/b"] {
            assert!(
                create_migration_pair(dir.path(), name, "sql", &version).is_err(),
                "{name:?}"
            );
        }
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_create_refuses_to_overwrite() {
        let dir = TempDir::new().unwrap();
        let version = Version::new("1");

        create_migration_pair(dir.path(), "a", "sql", &version).unwrap();
        assert!(create_migration_pair(dir.path(), "a", "sql", &version).is_err());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);
    }

    #[test]
    fn test_create_cleans_up_unpaired_half() {
        let dir = TempDir::new().unwrap();
        let version = Version::new("1");
        std::fs::write(dir.path().join("1-a.up.sql"), "").unwrap();

        assert!(create_migration_pair(dir.path(), "a", "sql", &version).is_err());
        assert!(!dir.path().join("1-a.down.sql").exists());
    }
}
