use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};

/// Position of a migration in history.
///
/// Versions are opaque strings ordered byte-wise. Producers are expected to
/// emit fixed-width, zero-padded values (see [`Version::TIMESTAMP_FORMAT`])
/// so that string order matches chronological order. Versions of differing
/// lengths still compare as strings: `"9"` sorts after `"10"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Version(String);

impl Version {
    /// `chrono` format used when stamping newly created migrations.
    pub const TIMESTAMP_FORMAT: &'static str = "%Y%m%d%H%M%S";

    pub fn new(version: impl Into<String>) -> Self {
        Self(version.into())
    }

    /// The version of a checkpoint that has never seen a migration.
    pub fn zero() -> Self {
        Self(String::new())
    }

    /// Stamp a version from a point in time.
    pub fn from_timestamp<Tz>(at: &DateTime<Tz>) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        Self(at.format(Self::TIMESTAMP_FORMAT).to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Lexicographic comparison; never numeric, never date-aware.
    pub fn compare(&self, other: &Version) -> Ordering {
        self.0.as_str().cmp(other.0.as_str())
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Version {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Version {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Version {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    const SAMPLES: &[&str] = &[
        "",
        "1",
        "10",
        "9",
        "20190901",
        "20190901000000",
        "20190915",
        "20190915120000",
        "a",
        "A",
    ];

    #[test]
    fn test_compare_is_lexicographic() {
        assert_eq!(Version::new("9").compare(&Version::new("10")), Ordering::Greater);
        assert_eq!(Version::new("10").compare(&Version::new("9")), Ordering::Less);
        assert_eq!(
            Version::new("20190901").compare(&Version::new("20190901")),
            Ordering::Equal
        );
        assert_eq!(Version::zero().compare(&Version::new("0")), Ordering::Less);
    }

    #[test]
    fn test_compare_matches_ord() {
        for a in SAMPLES {
            for b in SAMPLES {
                let (va, vb) = (Version::new(*a), Version::new(*b));
                assert_eq!(va.compare(&vb), va.cmp(&vb), "{a:?} vs {b:?}");
            }
        }
    }

    #[test]
    fn test_compare_antisymmetric() {
        for a in SAMPLES {
            for b in SAMPLES {
                let (va, vb) = (Version::new(*a), Version::new(*b));
                assert_eq!(va.compare(&vb), vb.compare(&va).reverse());
                if va.compare(&vb) == Ordering::Equal {
                    assert_eq!(va, vb);
                }
            }
        }
    }

    #[test]
    fn test_compare_transitive() {
        for a in SAMPLES {
            for b in SAMPLES {
                for c in SAMPLES {
                    let (va, vb, vc) = (Version::new(*a), Version::new(*b), Version::new(*c));
                    if va.compare(&vb) != Ordering::Greater && vb.compare(&vc) != Ordering::Greater
                    {
                        assert_ne!(va.compare(&vc), Ordering::Greater, "{a:?} {b:?} {c:?}");
                    }
                }
            }
        }
    }

    #[test]
    fn test_from_timestamp() {
        let at = Utc.with_ymd_and_hms(2019, 9, 26, 15, 44, 8).unwrap();
        assert_eq!(Version::from_timestamp(&at).as_str(), "20190926154408");
    }

    #[test]
    fn test_serde_transparent() {
        let json = serde_json::to_string(&Version::new("123")).unwrap();
        assert_eq!(json, "\"123\"");
    }
}
