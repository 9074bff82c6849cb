use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ShiftError;

/// Whether a migration moves the schema forward or undoes a forward step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// The zero value: a fresh checkpoint points at "nothing applied".
    #[default]
    Downgrade,
    Upgrade,
}

impl Direction {
    /// Word embedded in migration file names (`<version>-<name>.<word>.<ext>`).
    pub fn as_word(&self) -> &'static str {
        match self {
            Direction::Downgrade => "down",
            Direction::Upgrade => "up",
        }
    }

    /// Direction implied by a file's position in a sorted listing.
    pub fn from_position(index: usize) -> Self {
        if index % 2 == 0 {
            Direction::Downgrade
        } else {
            Direction::Upgrade
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_word())
    }
}

impl FromStr for Direction {
    type Err = ShiftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "up" | "upgrade" => Ok(Direction::Upgrade),
            "down" | "downgrade" => Ok(Direction::Downgrade),
            other => Err(ShiftError::InvalidArgument(format!(
                "unknown migration direction '{}'",
                other
            ))),
        }
    }
}
