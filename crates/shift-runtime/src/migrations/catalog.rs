//! Migration discovery.
//!
//! A catalog is one pass over a flat migrations directory. Every regular,
//! non-hidden file becomes a [`Migration`]; files are taken in file-name
//! order, which is what makes the down/up pairing deterministic.

use std::collections::HashSet;
use std::path::Path;

use shift_core::config::DirectionRule;
use shift_core::error::{Result, ShiftError};
use shift_core::migration::{Checkpoint, Direction, Migration, Version};
use tracing::{debug, warn};

use super::filter::{is_downgradable, is_upgradable};

/// Separates the version from the rest of a migration file name.
const VERSION_DELIMITER: char = '-';

/// All migrations found in one directory listing, in file-name order.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    migrations: Vec<Migration>,
}

impl Catalog {
    /// Scan `dir` and build the catalog.
    ///
    /// Any file name that cannot be parsed aborts the whole scan.
    pub fn load(dir: &Path, rule: DirectionRule) -> Result<Self> {
        let entries = std::fs::read_dir(dir).map_err(|e| {
            ShiftError::Config(format!(
                "Failed to read migrations directory {}: {}",
                dir.display(),
                e
            ))
        })?;

        let mut file_names = Vec::new();
        for entry in entries {
            let entry = entry?;
            let path = entry.path();

            if path.is_dir() {
                continue;
            }

            let file_name = entry.file_name();
            if file_name.as_encoded_bytes().starts_with(b".") {
                continue;
            }

            let file_name = file_name.to_str().ok_or_else(|| ShiftError::BadMigrationFile {
                file_name: file_name.to_string_lossy().into_owned(),
            })?;

            file_names.push(file_name.to_string());
        }

        let catalog = Self::from_file_names(dir, file_names, rule)?;
        debug!(
            "Loaded {} migrations from {}",
            catalog.len(),
            dir.display()
        );
        Ok(catalog)
    }

    /// Build a catalog from bare file names located in `dir`.
    ///
    /// Names are sorted before directions are derived.
    pub fn from_file_names<I, S>(dir: &Path, file_names: I, rule: DirectionRule) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut file_names: Vec<String> = file_names.into_iter().map(Into::into).collect();
        file_names.sort();

        let mut seen = HashSet::new();
        let mut migrations = Vec::with_capacity(file_names.len());

        for (index, file_name) in file_names.iter().enumerate() {
            let migration = parse_file_name(dir, file_name, index, rule)?;

            if !seen.insert((migration.version.clone(), migration.direction)) {
                return Err(ShiftError::DuplicateMigration {
                    version: migration.version,
                    direction: migration.direction,
                });
            }

            migrations.push(migration);
        }

        Ok(Self { migrations })
    }

    pub fn migrations(&self) -> &[Migration] {
        &self.migrations
    }

    pub fn len(&self) -> usize {
        self.migrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.migrations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Migration> {
        self.migrations.iter()
    }

    /// Migrations eligible for an upgrade run, in catalog order.
    pub fn upgradable(&self, checkpoint: &Checkpoint, bound: Option<&Version>) -> Vec<Migration> {
        self.iter()
            .filter(|m| is_upgradable(m, checkpoint, bound))
            .cloned()
            .collect()
    }

    /// Migrations eligible for a downgrade run, in catalog order.
    pub fn downgradable(&self, checkpoint: &Checkpoint, bound: Option<&Version>) -> Vec<Migration> {
        self.iter()
            .filter(|m| is_downgradable(m, checkpoint, bound))
            .cloned()
            .collect()
    }
}

fn parse_file_name(
    dir: &Path,
    file_name: &str,
    index: usize,
    rule: DirectionRule,
) -> Result<Migration> {
    let (version, name) = match file_name.split_once(VERSION_DELIMITER) {
        Some((version, name)) if !version.is_empty() => (version, name),
        _ => {
            return Err(ShiftError::BadMigrationFile {
                file_name: file_name.to_string(),
            })
        }
    };

    let positional = Direction::from_position(index);
    let direction = match rule {
        DirectionRule::Positional => positional,
        DirectionRule::Tagged => match direction_word(name) {
            Some(tagged) => {
                if tagged != positional {
                    warn!(
                        "Migration {} is tagged '{}' but sits in a '{}' position; check for unpaired files",
                        file_name, tagged, positional
                    );
                }
                tagged
            }
            None => positional,
        },
    };

    Ok(Migration::new(version, name, direction, dir.join(file_name)))
}

/// The `up`/`down` word in `<name>.<word>.<ext>`, if there is one.
fn direction_word(name: &str) -> Option<Direction> {
    let segments: Vec<&str> = name.split('.').collect();
    if segments.len() < 3 {
        return None;
    }

    segments[segments.len() - 2].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const PAIRS: [&str; 4] = [
        "20190901-a.down.sql",
        "20190901-a.up.sql",
        "20190915-b.down.sql",
        "20190915-b.up.sql",
    ];

    fn write_files(dir: &Path, names: &[&str]) {
        for name in names {
            fs::write(dir.join(name), "").unwrap();
        }
    }

    #[test]
    fn test_load_sorted_pairs() {
        let dir = TempDir::new().unwrap();
        // Written out of order on purpose
        write_files(dir.path(), &[PAIRS[3], PAIRS[0], PAIRS[2], PAIRS[1]]);

        let catalog = Catalog::load(dir.path(), DirectionRule::Positional).unwrap();
        let names: Vec<String> = catalog.iter().map(|m| m.file_name()).collect();
        assert_eq!(names, PAIRS);

        let first = &catalog.migrations()[0];
        assert_eq!(first.version.as_str(), "20190901");
        assert_eq!(first.name, "a.down.sql");
        assert_eq!(first.path, dir.path().join("20190901-a.down.sql"));
    }

    #[test]
    fn test_load_skips_hidden_and_directories() {
        let dir = TempDir::new().unwrap();
        write_files(dir.path(), &PAIRS);
        fs::write(dir.path().join(".gitkeep"), "").unwrap();
        fs::create_dir(dir.path().join("20190801-archive")).unwrap();

        let catalog = Catalog::load(dir.path(), DirectionRule::Positional).unwrap();
        assert_eq!(catalog.len(), 4);
        assert_eq!(catalog.migrations()[0].direction, Direction::Downgrade);
    }

    #[cfg(unix)]
    #[test]
    fn test_load_skips_hidden_non_utf8_names() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = TempDir::new().unwrap();
        write_files(dir.path(), &PAIRS[..2]);
        let hidden = OsStr::from_bytes(b".swap-\xff\xfe");
        if fs::write(dir.path().join(hidden), "").is_err() {
            // Filesystem refuses non-UTF-8 names
            return;
        }

        let catalog = Catalog::load(dir.path(), DirectionRule::Tagged).unwrap();
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn test_load_empty_dir() {
        let dir = TempDir::new().unwrap();
        let catalog = Catalog::load(dir.path(), DirectionRule::Tagged).unwrap();
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_load_missing_dir() {
        let err = Catalog::load(Path::new("/nonexistent/shift"), DirectionRule::Tagged).unwrap_err();
        assert!(matches!(err, ShiftError::Config(_)));
    }

    #[test]
    fn test_bad_file_aborts_whole_scan() {
        let dir = TempDir::new().unwrap();
        write_files(dir.path(), &PAIRS);
        write_files(dir.path(), &["README"]);

        let err = Catalog::load(dir.path(), DirectionRule::Positional).unwrap_err();
        match err {
            ShiftError::BadMigrationFile { file_name } => assert_eq!(file_name, "README"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_version_is_bad_file() {
        let err = Catalog::from_file_names(Path::new("/m"), ["-a.up.sql"], DirectionRule::Tagged)
            .unwrap_err();
        assert!(matches!(err, ShiftError::BadMigrationFile { .. }));
    }

    #[test]
    fn test_name_keeps_remaining_delimiters() {
        let catalog = Catalog::from_file_names(
            Path::new("/m"),
            ["20190926154408-hello-world.down.sql"],
            DirectionRule::Positional,
        )
        .unwrap();
        let m = &catalog.migrations()[0];
        assert_eq!(m.version.as_str(), "20190926154408");
        assert_eq!(m.name, "hello-world.down.sql");
    }

    #[test]
    fn test_positional_ignores_direction_word() {
        // Sorted order puts every word in the wrong slot
        let names = ["1-a.up.sql", "1-b.down.sql", "2-a.up.sql", "2-b.down.sql"];
        let catalog =
            Catalog::from_file_names(Path::new("/m"), names, DirectionRule::Positional).unwrap();

        assert_eq!(catalog.migrations()[0].name, "a.up.sql");
        assert_eq!(catalog.migrations()[0].direction, Direction::Downgrade);

        for (index, m) in catalog.iter().enumerate() {
            assert_eq!(m.direction, Direction::from_position(index), "{}", m.file_name());
        }
    }

    #[test]
    fn test_positional_alternates() {
        let names: Vec<String> = (0..6)
            .flat_map(|i| {
                [
                    format!("{:04}-step.down.sql", i),
                    format!("{:04}-step.up.sql", i),
                ]
            })
            .collect();
        let catalog =
            Catalog::from_file_names(Path::new("/m"), names, DirectionRule::Positional).unwrap();

        for (index, m) in catalog.iter().enumerate() {
            let expected = if index % 2 == 0 {
                Direction::Downgrade
            } else {
                Direction::Upgrade
            };
            assert_eq!(m.direction, expected);
        }
    }

    #[test]
    fn test_tagged_uses_direction_word() {
        // An orphaned upgrade shifts every later position
        let names = ["1-a.up.sql", "2-b.down.sql", "2-b.up.sql"];
        let catalog =
            Catalog::from_file_names(Path::new("/m"), names, DirectionRule::Tagged).unwrap();

        let directions: Vec<Direction> = catalog.iter().map(|m| m.direction).collect();
        assert_eq!(
            directions,
            [Direction::Upgrade, Direction::Downgrade, Direction::Upgrade]
        );
    }

    #[test]
    fn test_tagged_falls_back_to_position() {
        let names = ["1-a.sql", "1-b.sql"];
        let catalog =
            Catalog::from_file_names(Path::new("/m"), names, DirectionRule::Tagged).unwrap();

        assert_eq!(catalog.migrations()[0].direction, Direction::Downgrade);
        assert_eq!(catalog.migrations()[1].direction, Direction::Upgrade);
    }

    #[test]
    fn test_duplicate_version_and_direction() {
        let names = ["1-a.up.sql", "1-b.up.sql"];
        let err =
            Catalog::from_file_names(Path::new("/m"), names, DirectionRule::Tagged).unwrap_err();
        match err {
            ShiftError::DuplicateMigration { version, direction } => {
                assert_eq!(version.as_str(), "1");
                assert_eq!(direction, Direction::Upgrade);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_direction_word() {
        assert_eq!(direction_word("a.up.sql"), Some(Direction::Upgrade));
        assert_eq!(direction_word("hello-world.down.txt"), Some(Direction::Downgrade));
        assert_eq!(direction_word("a.sql"), None);
        assert_eq!(direction_word("a.sideways.sql"), None);
    }
}
