use std::fmt;

/// Non-fatal issues hit while inspecting submodules.
/// The affected submodule is skipped or left unchanged and the warning is shown to the user.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundaryWarning {
    /// The chart file does not exist in the submodule work tree
    ChartNotFound { submodule: String, path: String },
    /// The chart file could not be read at a given tag
    UnreadableChartAtTag {
        submodule: String,
        tag: String,
        reason: String,
    },
    /// Fetching tags from the remote failed
    FetchFailed { submodule: String, reason: String },
    /// The interactive selection was not understood
    UnrecognizedSelection { submodule: String, input: String },
    /// The submodule has no tags at all
    NoTags { submodule: String },
}

impl BoundaryWarning {
    /// Submodule the warning is about
    pub fn submodule(&self) -> &str {
        match self {
            BoundaryWarning::ChartNotFound { submodule, .. }
            | BoundaryWarning::UnreadableChartAtTag { submodule, .. }
            | BoundaryWarning::FetchFailed { submodule, .. }
            | BoundaryWarning::UnrecognizedSelection { submodule, .. }
            | BoundaryWarning::NoTags { submodule } => submodule,
        }
    }
}

impl fmt::Display for BoundaryWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundaryWarning::ChartNotFound { submodule, path } => {
                write!(f, "Chart '{}' not found in submodule '{}'", path, submodule)
            }
            BoundaryWarning::UnreadableChartAtTag {
                submodule,
                tag,
                reason,
            } => {
                write!(
                    f,
                    "Cannot read chart of '{}' at tag '{}': {}",
                    submodule, tag, reason
                )
            }
            BoundaryWarning::FetchFailed { submodule, reason } => {
                write!(f, "Fetching tags for '{}' failed: {}", submodule, reason)
            }
            BoundaryWarning::UnrecognizedSelection { submodule, input } => {
                write!(
                    f,
                    "Unrecognized selection '{}' for '{}', skipping",
                    input, submodule
                )
            }
            BoundaryWarning::NoTags { submodule } => {
                write!(f, "Submodule '{}' has no tags", submodule)
            }
        }
    }
}
