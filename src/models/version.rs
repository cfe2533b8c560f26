// src/models/version.rs

//! NuGet semantic version parsing and comparison.
//!
//! NuGet versions are looser than SemVer 2.0: one to four numeric components,
//! optional dot-separated release labels, optional build metadata.
//! - "1.0" → 1.0.0
//! - "1.0.0.0" → 1.0.0 (a zero revision is dropped on normalize)
//! - "2.1.0-beta.2+sha.abc" → release labels ["beta", "2"], metadata "sha.abc"

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{AppError, Result};

static VERSION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(\d+)(?:\.(\d+))?(?:\.(\d+))?(?:\.(\d+))?(?:-([0-9A-Za-z-]+(?:\.[0-9A-Za-z-]+)*))?(?:\+([0-9A-Za-z-]+(?:\.[0-9A-Za-z-]+)*))?$",
    )
    .expect("version pattern is valid")
});

/// A parsed NuGet package version.
#[derive(Debug, Clone)]
pub struct NuGetVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub revision: u64,
    pub release_labels: Vec<String>,
    pub metadata: Option<String>,
}

impl NuGetVersion {
    /// Parse a version string.
    pub fn parse(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let caps = VERSION_PATTERN
            .captures(trimmed)
            .ok_or_else(|| AppError::parse("package version", format!("invalid version '{s}'")))?;

        let number = |idx: usize| -> Result<u64> {
            match caps.get(idx) {
                Some(m) => m.as_str().parse::<u64>().map_err(|e| {
                    AppError::parse("package version", format!("invalid version '{s}': {e}"))
                }),
                None => Ok(0),
            }
        };

        Ok(Self {
            major: number(1)?,
            minor: number(2)?,
            patch: number(3)?,
            revision: number(4)?,
            release_labels: caps
                .get(5)
                .map(|m| m.as_str().split('.').map(str::to_string).collect())
                .unwrap_or_default(),
            metadata: caps.get(6).map(|m| m.as_str().to_string()),
        })
    }

    /// Whether the version carries release labels.
    pub fn is_prerelease(&self) -> bool {
        !self.release_labels.is_empty()
    }

    /// Normalized string form. Build metadata is dropped.
    pub fn to_normalized_string(&self) -> String {
        let mut out = format!("{}.{}.{}", self.major, self.minor, self.patch);
        if self.revision > 0 {
            out.push_str(&format!(".{}", self.revision));
        }
        if self.is_prerelease() {
            out.push('-');
            out.push_str(&self.release_labels.join("."));
        }
        out
    }

    fn compare_labels(a: &[String], b: &[String]) -> Ordering {
        // A release sorts above every prerelease of the same numbers
        match (a.is_empty(), b.is_empty()) {
            (true, true) => return Ordering::Equal,
            (true, false) => return Ordering::Greater,
            (false, true) => return Ordering::Less,
            (false, false) => {}
        }

        for (x, y) in a.iter().zip(b.iter()) {
            let ord = match (x.parse::<u64>(), y.parse::<u64>()) {
                (Ok(nx), Ok(ny)) => nx.cmp(&ny),
                (Ok(_), Err(_)) => Ordering::Less,
                (Err(_), Ok(_)) => Ordering::Greater,
                (Err(_), Err(_)) => x.to_lowercase().cmp(&y.to_lowercase()),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        a.len().cmp(&b.len())
    }
}

impl FromStr for NuGetVersion {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for NuGetVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_normalized_string())
    }
}

impl Ord for NuGetVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch, self.revision)
            .cmp(&(other.major, other.minor, other.patch, other.revision))
            .then_with(|| Self::compare_labels(&self.release_labels, &other.release_labels))
    }
}

impl PartialOrd for NuGetVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for NuGetVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for NuGetVersion {}

impl Hash for NuGetVersion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (self.major, self.minor, self.patch, self.revision).hash(state);
        self.release_labels.len().hash(state);
        for label in &self.release_labels {
            // Must agree with compare_labels: "01" == "1", "RC" == "rc"
            match label.parse::<u64>() {
                Ok(n) => n.hash(state),
                Err(_) => label.to_lowercase().hash(state),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn v(s: &str) -> NuGetVersion {
        NuGetVersion::parse(s).unwrap()
    }

    #[test]
    fn test_parse_components() {
        let version = v("2.1.0-beta.2+sha.abc");
        assert_eq!((version.major, version.minor, version.patch), (2, 1, 0));
        assert_eq!(version.release_labels, vec!["beta", "2"]);
        assert_eq!(version.metadata.as_deref(), Some("sha.abc"));
        assert!(version.is_prerelease());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(NuGetVersion::parse("").is_err());
        assert!(NuGetVersion::parse("one.two").is_err());
        assert!(NuGetVersion::parse("1.0.0.0.0").is_err());
        assert!(NuGetVersion::parse("1.0-").is_err());
    }

    #[test]
    fn test_short_forms_are_equal() {
        assert_eq!(v("1.0"), v("1.0.0"));
        assert_eq!(v("1.0.0.0"), v("1.0.0"));
        assert_eq!(v("1.0.0+build"), v("1.0.0"));
        assert_eq!(v("1.0.0-RC"), v("1.0.0-rc"));
    }

    #[test]
    fn test_ordering() {
        assert!(v("1.0") < v("2.0"));
        assert!(v("1.0.0-alpha") < v("1.0.0"));
        assert!(v("1.0.0-alpha") < v("1.0.0-beta"));
        assert!(v("1.0.0-alpha.2") < v("1.0.0-alpha.10"));
        assert!(v("1.0.0-1") < v("1.0.0-alpha"));
        assert!(v("1.0.0-alpha") < v("1.0.0-alpha.1"));
        assert!(v("1.0.0.1") > v("1.0.0"));
    }

    #[test]
    fn test_hash_agrees_with_eq() {
        let mut set = HashSet::new();
        set.insert(v("1.0"));
        set.insert(v("1.0.0.0"));
        set.insert(v("1.0.0-Beta.01"));
        set.insert(v("1.0.0-beta.1"));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_normalized_string() {
        assert_eq!(v("1.0").to_string(), "1.0.0");
        assert_eq!(v("1.2.3.4-rc.1+meta").to_string(), "1.2.3.4-rc.1");
    }
}
