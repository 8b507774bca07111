//! Pre-release train handling for the parent chart version
//!
//! A train is a run of versions sharing one release core and identifier, told apart
//! by a trailing counter: `0.6.0-rc`, `0.6.0-rc.1`, `0.6.0-rc.2`, ...
//! See semver.org: https://semver.org/#spec-item-9

use crate::domain::version::SemanticVersion;
use crate::error::{RelsyncError, Result};
use semver::Prerelease as SemverPrerelease;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// A validated pre-release identifier such as "rc" or "beta"
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PrereleaseIdentifier(String);

impl PrereleaseIdentifier {
    /// Parse an identifier; it must be a valid SemVer prerelease on its own
    pub fn parse(s: &str) -> Result<Self> {
        s.parse()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for PrereleaseIdentifier {
    type Err = RelsyncError;

    fn from_str(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Err(RelsyncError::invalid_version(s, "empty pre-release identifier"));
        }
        SemverPrerelease::new(s)
            .map(|_| PrereleaseIdentifier(s.to_string()))
            .map_err(|e| RelsyncError::invalid_version(s, e.to_string()))
    }
}

impl fmt::Display for PrereleaseIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A prerelease split into its identifier and optional trailing counter
///
/// # Examples
/// - "rc" -> PreRelease { identifier: "rc", iteration: None }
/// - "rc.3" -> PreRelease { identifier: "rc", iteration: Some(3) }
/// - "alpha.beta" -> PreRelease { identifier: "alpha.beta", iteration: None }
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreRelease {
    pub identifier: String,
    pub iteration: Option<u64>,
}

impl PreRelease {
    /// Split a prerelease string. Only a trailing all-digit dot segment counts as the
    /// counter, and only when something precedes it.
    pub fn parse(s: &str) -> Self {
        if let Some((head, tail)) = s.rsplit_once('.') {
            if !tail.is_empty() && tail.chars().all(|c| c.is_ascii_digit()) {
                if let Ok(n) = tail.parse::<u64>() {
                    return PreRelease {
                        identifier: head.to_string(),
                        iteration: Some(n),
                    };
                }
            }
        }

        PreRelease {
            identifier: s.to_string(),
            iteration: None,
        }
    }

    /// Next counter in the train; a bare identifier counts as iteration 0
    pub fn increment_iteration(&self) -> Result<Self> {
        let iteration = self.iteration.unwrap_or(0).checked_add(1).ok_or_else(|| {
            RelsyncError::invalid_version(self.to_string(), "pre-release counter cannot be incremented")
        })?;
        Ok(PreRelease {
            identifier: self.identifier.clone(),
            iteration: Some(iteration),
        })
    }
}

impl fmt::Display for PreRelease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identifier)?;
        if let Some(iter) = self.iteration {
            write!(f, ".{}", iter)?;
        }
        Ok(())
    }
}

/// Which branch of the sequencer produced a pre-release version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrainState {
    NewTrain,
    IncrementTrain,
}

/// Outcome of [`sequence`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequenced {
    pub version: SemanticVersion,
    /// `None` on the stable path (no identifier supplied)
    pub train: Option<TrainState>,
}

/// Decide the parent's target version from its current version and a clean candidate.
///
/// 1. no identifier: the candidate itself
/// 2. candidate core above current core: `candidate-identifier` (new train)
/// 3. current already on a train with this identifier: `core(current)-identifier.{n+1}`
/// 4. otherwise: `candidate-identifier` (new train, even at the current core)
pub fn sequence(
    current: &SemanticVersion,
    candidate: &SemanticVersion,
    identifier: Option<&PrereleaseIdentifier>,
) -> Result<Sequenced> {
    let Some(identifier) = identifier else {
        return Ok(Sequenced {
            version: candidate.clone(),
            train: None,
        });
    };

    if candidate.compare_core(current) == Ordering::Greater {
        return Ok(Sequenced {
            version: candidate.with_prerelease(identifier.as_str())?,
            train: Some(TrainState::NewTrain),
        });
    }

    if let Some(existing) = current.prerelease().map(PreRelease::parse) {
        if existing.identifier == identifier.as_str() {
            let next = existing.increment_iteration()?;
            return Ok(Sequenced {
                version: current.with_prerelease(&next.to_string())?,
                train: Some(TrainState::IncrementTrain),
            });
        }
    }

    Ok(Sequenced {
        version: candidate.with_prerelease(identifier.as_str())?,
        train: Some(TrainState::NewTrain),
    })
}
