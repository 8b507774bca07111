//! Reduction of per-entity bumps into a single bump for the parent chart

use crate::domain::bump::BumpKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The two-level scheme the parent chart is versioned with
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParentBump {
    Patch,
    Minor,
}

impl From<ParentBump> for BumpKind {
    fn from(bump: ParentBump) -> Self {
        match bump {
            ParentBump::Patch => BumpKind::Patch,
            ParentBump::Minor => BumpKind::Minor,
        }
    }
}

impl fmt::Display for ParentBump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&BumpKind::from(*self), f)
    }
}

/// The most severe bump, or [`BumpKind::None`] when there is nothing to bump
pub fn dominant<I>(bumps: I) -> BumpKind
where
    I: IntoIterator<Item = BumpKind>,
{
    bumps.into_iter().max().unwrap_or(BumpKind::None)
}

/// Dampen a bump for the parent: at most one minor step per release cycle
pub fn coarsen(bump: BumpKind) -> ParentBump {
    match bump {
        BumpKind::None | BumpKind::Patch => ParentBump::Patch,
        BumpKind::Minor | BumpKind::Major => ParentBump::Minor,
    }
}
