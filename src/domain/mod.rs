//! Domain logic - pure version rules independent of git and file I/O

pub mod aggregate;
pub mod bump;
pub mod prerelease;
pub mod selection;
pub mod tag;
pub mod version;

pub use aggregate::{coarsen, dominant, ParentBump};
pub use bump::{changed, classify, classify_missing, next_release, next_version, BumpKind};
pub use prerelease::{sequence, PreRelease, PrereleaseIdentifier, Sequenced, TrainState};
pub use selection::{resolve_choice, Selection};
pub use tag::{sort_tags_newest_first, TagPattern};
pub use version::SemanticVersion;
