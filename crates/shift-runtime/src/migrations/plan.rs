//! Execution ordering.

use std::slice;

use serde::Serialize;
use shift_core::migration::{Checkpoint, Direction, Migration, Version};

use super::catalog::Catalog;

/// An ordered list of migrations to run in one direction.
///
/// Upgrades run oldest first, downgrades newest first. Sorting is stable,
/// so equal versions keep their catalog order.
#[derive(Debug, Clone, Serialize)]
pub struct Plan {
    pub direction: Direction,
    pub migrations: Vec<Migration>,
}

impl Plan {
    /// Order already-filtered migrations for `direction`.
    pub fn sequence(direction: Direction, mut migrations: Vec<Migration>) -> Self {
        match direction {
            Direction::Upgrade => migrations.sort_by(|a, b| a.version.compare(&b.version)),
            Direction::Downgrade => migrations.sort_by(|a, b| b.version.compare(&a.version)),
        }

        Self {
            direction,
            migrations,
        }
    }

    /// Upgrades eligible from `checkpoint`, up to and including `bound`.
    pub fn upgrade(catalog: &Catalog, checkpoint: &Checkpoint, bound: Option<&Version>) -> Self {
        Self::sequence(Direction::Upgrade, catalog.upgradable(checkpoint, bound))
    }

    /// Downgrades eligible from `checkpoint`, down to and including `bound`.
    pub fn downgrade(catalog: &Catalog, checkpoint: &Checkpoint, bound: Option<&Version>) -> Self {
        Self::sequence(Direction::Downgrade, catalog.downgradable(checkpoint, bound))
    }

    pub fn len(&self) -> usize {
        self.migrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.migrations.is_empty()
    }

    pub fn iter(&self) -> slice::Iter<'_, Migration> {
        self.migrations.iter()
    }
}

impl<'a> IntoIterator for &'a Plan {
    type Item = &'a Migration;
    type IntoIter = slice::Iter<'a, Migration>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
