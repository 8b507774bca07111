use crate::domain::version::SemanticVersion;
use crate::error::{RelsyncError, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// How significantly a version increased, ordered by severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BumpKind {
    #[default]
    None,
    Patch,
    Minor,
    Major,
}

impl BumpKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BumpKind::None => "none",
            BumpKind::Patch => "patch",
            BumpKind::Minor => "minor",
            BumpKind::Major => "major",
        }
    }

    /// `None` for [`BumpKind::None`], so reports can leave the field absent
    pub fn as_option(self) -> Option<BumpKind> {
        match self {
            BumpKind::None => None,
            other => Some(other),
        }
    }
}

impl fmt::Display for BumpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify the transition from `old` to `new`.
///
/// Field-wise and one-directional: the most significant component that increased
/// decides, and decreases are never reported. A pure downgrade such as `1.5.3 -> 1.4.2`
/// yields [`BumpKind::None`], indistinguishable from "no change", while `1.5.0 -> 1.4.9`
/// is a patch bump because its patch component went up.
pub fn classify(old: &SemanticVersion, new: &SemanticVersion) -> BumpKind {
    if new.major() > old.major() {
        BumpKind::Major
    } else if new.minor() > old.minor() {
        BumpKind::Minor
    } else if new.patch() > old.patch() {
        BumpKind::Patch
    } else {
        BumpKind::None
    }
}

/// Classification for an entity tracked for the first time
pub fn classify_missing() -> BumpKind {
    BumpKind::Major
}

/// Symmetric change detection on release cores.
///
/// Separate from [`classify`], which must keep ignoring downgrades.
pub fn changed(old: &SemanticVersion, new: &SemanticVersion) -> bool {
    old.compare_core(new) != Ordering::Equal
}

/// Apply `bump` to `current`.
///
/// Any real bump yields a clean release; [`BumpKind::None`] returns `current` untouched.
/// Fails with [`RelsyncError::InvalidVersion`] when the bumped component is already `u64::MAX`.
pub fn next_version(current: &SemanticVersion, bump: BumpKind) -> Result<SemanticVersion> {
    let (major, minor, patch) = (current.major(), current.minor(), current.patch());
    Ok(match bump {
        BumpKind::Major => SemanticVersion::new(increment(current, major, "major")?, 0, 0),
        BumpKind::Minor => SemanticVersion::new(major, increment(current, minor, "minor")?, 0),
        BumpKind::Patch => SemanticVersion::new(major, minor, increment(current, patch, "patch")?),
        BumpKind::None => current.clone(),
    })
}

fn increment(current: &SemanticVersion, value: u64, field: &str) -> Result<u64> {
    value.checked_add(1).ok_or_else(|| {
        let reason = format!("{} component cannot be bumped past {}", field, u64::MAX);
        RelsyncError::invalid_version(current.to_string(), reason)
    })
}

/// Pre-release aware variant of [`next_version`].
///
/// A prerelease such as `0.6.0-rc.2` already reserves `0.6.0`, so a bump whose
/// less significant components are zero finalizes that core instead of skipping it.
pub fn next_release(current: &SemanticVersion, bump: BumpKind) -> Result<SemanticVersion> {
    if !current.is_prerelease() {
        return next_version(current, bump);
    }

    let keeps_core = match bump {
        BumpKind::Major => current.minor() == 0 && current.patch() == 0,
        BumpKind::Minor => current.patch() == 0,
        BumpKind::Patch => true,
        BumpKind::None => return Ok(current.clone()),
    };

    if keeps_core {
        Ok(current.release_core())
    } else {
        next_version(current, bump)
    }
}
