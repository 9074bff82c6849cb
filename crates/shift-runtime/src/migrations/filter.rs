//! Eligibility predicates.
//!
//! Exactly one direction is eligible for the checkpoint's own version: an
//! upgraded version can be downgraded but not upgraded again, and the
//! other way round.

use std::cmp::Ordering;

use shift_core::migration::{Checkpoint, Direction, Migration, Version};

/// Whether `m` belongs in an upgrade run from `checkpoint`.
///
/// `bound` is an inclusive ceiling. An empty bound is no bound.
pub fn is_upgradable(m: &Migration, checkpoint: &Checkpoint, bound: Option<&Version>) -> bool {
    if m.direction != Direction::Upgrade {
        return false;
    }

    // Never re-offer anything older than the checkpoint
    if m.version.compare(&checkpoint.version) == Ordering::Less {
        return false;
    }

    // Already the last applied upgrade
    if m.version == checkpoint.version && checkpoint.direction == Direction::Upgrade {
        return false;
    }

    if let Some(bound) = bound.filter(|b| !b.is_empty()) {
        if m.version.compare(bound) == Ordering::Greater {
            return false;
        }
    }

    true
}

/// Whether `m` belongs in a downgrade run from `checkpoint`.
///
/// `bound` is an inclusive floor. An empty bound is no bound.
pub fn is_downgradable(m: &Migration, checkpoint: &Checkpoint, bound: Option<&Version>) -> bool {
    if m.direction != Direction::Downgrade {
        return false;
    }

    if m.version.compare(&checkpoint.version) == Ordering::Greater {
        return false;
    }

    // Already the last applied downgrade
    if m.version == checkpoint.version && checkpoint.direction == Direction::Downgrade {
        return false;
    }

    if let Some(bound) = bound.filter(|b| !b.is_empty()) {
        if m.version.compare(bound) == Ordering::Less {
            return false;
        }
    }

    true
}
