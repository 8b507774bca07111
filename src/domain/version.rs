//! Semantic version model
//!
//! Wraps [`semver::Version`] so that equality, ordering and hashing follow SemVer
//! precedence: build metadata is accepted on input but never compared or rendered.

use crate::error::{RelsyncError, Result};
use semver::{BuildMetadata, Prerelease, Version};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Semantic version representation
#[derive(Debug, Clone)]
pub struct SemanticVersion {
    inner: Version,
}

impl SemanticVersion {
    /// Create a clean release version
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        SemanticVersion {
            inner: Version::new(major, minor, patch),
        }
    }

    /// Parse a version string, accepting an optional leading `v` (e.g. "v1.2.3-rc.1+build.5")
    pub fn parse(text: &str) -> Result<Self> {
        let clean = text.strip_prefix('v').unwrap_or(text);

        Version::parse(clean)
            .map(|inner| SemanticVersion { inner })
            .map_err(|e| RelsyncError::invalid_version(text, e.to_string()))
    }

    pub fn major(&self) -> u64 {
        self.inner.major
    }

    pub fn minor(&self) -> u64 {
        self.inner.minor
    }

    pub fn patch(&self) -> u64 {
        self.inner.patch
    }

    /// The prerelease part, if any (e.g. "rc.1")
    pub fn prerelease(&self) -> Option<&str> {
        if self.inner.pre.is_empty() {
            None
        } else {
            Some(self.inner.pre.as_str())
        }
    }

    /// The build metadata, if any. Input-only: never rendered or compared.
    pub fn build(&self) -> Option<&str> {
        if self.inner.build.is_empty() {
            None
        } else {
            Some(self.inner.build.as_str())
        }
    }

    pub fn is_prerelease(&self) -> bool {
        !self.inner.pre.is_empty()
    }

    /// The `major.minor.patch` part with prerelease and build dropped
    pub fn release_core(&self) -> Self {
        SemanticVersion::new(self.major(), self.minor(), self.patch())
    }

    /// Copy of this version's release core carrying the given prerelease
    pub fn with_prerelease(&self, prerelease: &str) -> Result<Self> {
        let pre = Prerelease::new(prerelease).map_err(|e| {
            let input = format!("{}-{}", self.release_core(), prerelease);
            RelsyncError::invalid_version(input, e.to_string())
        })?;

        let mut inner = Version::new(self.major(), self.minor(), self.patch());
        inner.pre = pre;
        inner.build = BuildMetadata::EMPTY;
        Ok(SemanticVersion { inner })
    }

    /// Canonical string form: `major.minor.patch[-prerelease]`
    pub fn render(&self) -> String {
        self.to_string()
    }

    /// Total order by SemVer precedence, ignoring build metadata
    pub fn compare(&self, other: &Self) -> Ordering {
        self.inner.cmp_precedence(&other.inner)
    }

    /// Compare only the release cores, ignoring any suffixes
    pub fn compare_core(&self, other: &Self) -> Ordering {
        (self.major(), self.minor(), self.patch()).cmp(&(other.major(), other.minor(), other.patch()))
    }
}

impl PartialEq for SemanticVersion {
    fn eq(&self, other: &Self) -> bool {
        self.compare(other) == Ordering::Equal
    }
}

impl Eq for SemanticVersion {}

impl PartialOrd for SemanticVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SemanticVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other)
    }
}

impl Hash for SemanticVersion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.major.hash(state);
        self.inner.minor.hash(state);
        self.inner.patch.hash(state);
        self.inner.pre.hash(state);
    }
}

impl fmt::Display for SemanticVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major(), self.minor(), self.patch())?;
        if let Some(pre) = self.prerelease() {
            write!(f, "-{}", pre)?;
        }
        Ok(())
    }
}

impl FromStr for SemanticVersion {
    type Err = RelsyncError;

    fn from_str(s: &str) -> Result<Self> {
        SemanticVersion::parse(s)
    }
}

impl Serialize for SemanticVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SemanticVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        SemanticVersion::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> SemanticVersion {
        SemanticVersion::parse(s).unwrap()
    }

    #[test]
    fn test_version_parse() {
        let parsed = v("1.2.3");
        assert_eq!(parsed.major(), 1);
        assert_eq!(parsed.minor(), 2);
        assert_eq!(parsed.patch(), 3);
        assert_eq!(parsed.prerelease(), None);
        assert_eq!(parsed.build(), None);
    }

    #[test]
    fn test_version_parse_with_v_prefix() {
        assert_eq!(v("v1.2.3"), SemanticVersion::new(1, 2, 3));
    }

    #[test]
    fn test_version_parse_prerelease_and_build() {
        let parsed = v("1.0.0-rc.1+build.5");
        assert_eq!(parsed.prerelease(), Some("rc.1"));
        assert_eq!(parsed.build(), Some("build.5"));
    }

    #[test]
    fn test_version_parse_missing_patch() {
        let err = SemanticVersion::parse("1.2").unwrap_err();
        assert!(matches!(err, RelsyncError::InvalidVersion { .. }));
    }

    #[test]
    fn test_version_parse_leading_zero() {
        let err = SemanticVersion::parse("1.02.0").unwrap_err();
        assert!(matches!(err, RelsyncError::InvalidVersion { .. }));
    }

    #[test]
    fn test_version_parse_rejects_garbage() {
        for input in ["", "v", "1.2.3.4", "a.b.c", "1.2.3-", "1.2.3-01", " 1.2.3", "V1.2.3"] {
            assert!(SemanticVersion::parse(input).is_err(), "{} should fail", input);
        }
    }

    #[test]
    fn test_render_drops_build_metadata() {
        assert_eq!(v("1.2.3+sha.abc").render(), "1.2.3");
        assert_eq!(v("v1.2.3-beta.2+sha.abc").render(), "1.2.3-beta.2");
    }

    #[test]
    fn test_render_parse_is_stable() {
        for input in ["0.0.0", "1.2.3", "10.20.30-alpha.1", "1.0.0-x-y.7.z+meta", "v2.0.0-rc"] {
            let parsed = v(input);
            assert_eq!(v(&parsed.render()), parsed);
        }
    }

    #[test]
    fn test_equality_ignores_build() {
        assert_eq!(v("1.2.3+a"), v("1.2.3+b"));
        assert_eq!(v("1.2.3-rc.1+a"), v("1.2.3-rc.1"));
        assert_ne!(v("1.2.3-rc.1"), v("1.2.3-rc.2"));
    }

    #[test]
    fn test_ordering_release_above_prerelease() {
        assert!(v("1.0.0") > v("1.0.0-rc.9"));
        assert!(v("1.0.0-rc.9") > v("0.9.9"));
    }

    #[test]
    fn test_ordering_semver_precedence_chain() {
        let chain = [
            "1.0.0-alpha",
            "1.0.0-alpha.1",
            "1.0.0-alpha.beta",
            "1.0.0-beta",
            "1.0.0-beta.2",
            "1.0.0-beta.11",
            "1.0.0-rc.1",
            "1.0.0",
        ];
        for pair in chain.windows(2) {
            assert_eq!(v(pair[0]).compare(&v(pair[1])), Ordering::Less, "{} < {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_ordering_numeric_fields() {
        assert!(v("1.10.0") > v("1.9.0"));
        assert!(v("2.0.0") > v("1.99.99"));
        assert_eq!(v("1.2.3").compare(&v("v1.2.3+x")), Ordering::Equal);
    }

    #[test]
    fn test_release_core() {
        assert_eq!(v("1.2.3-rc.4+b").release_core(), SemanticVersion::new(1, 2, 3));
        assert_eq!(v("1.2.3-rc.4").compare_core(&v("1.2.3")), Ordering::Equal);
    }

    #[test]
    fn test_with_prerelease() {
        let tagged = v("0.6.0+meta").with_prerelease("rc.1").unwrap();
        assert_eq!(tagged.render(), "0.6.0-rc.1");
        assert!(v("0.6.0").with_prerelease("bad!").is_err());
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&v("1.2.3-rc.1")).unwrap();
        assert_eq!(json, "\"1.2.3-rc.1\"");
        let back: SemanticVersion = serde_json::from_str(&json).unwrap();
        assert_eq!(back, v("1.2.3-rc.1"));
        assert!(serde_json::from_str::<SemanticVersion>("\"1.2\"").is_err());
    }
}
