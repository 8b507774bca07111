//! Git operations abstraction layer
//!
//! The workflows talk to git only through the [Repository] trait, so they can run
//! against a real repository or an in-memory mock.
//!
//! - [repository::Git2Repository]: real implementation on top of the `git2` crate
//! - [mock::MockRepository]: mock implementation for testing
//!
//! Submodule paths are always relative to the parent repository root.

pub mod mock;
pub mod repository;

pub use mock::MockRepository;
pub use repository::Git2Repository;

use crate::error::Result;
use indexmap::IndexMap;

/// Tags of one submodule as seen after fetching
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagListing {
    /// All tags, newest first
    pub tags: Vec<String>,
    /// Tag pointing exactly at the submodule HEAD, if any
    pub current: Option<String>,
}

impl TagListing {
    /// Newest tag, if the submodule has any
    pub fn latest(&self) -> Option<&str> {
        self.tags.first().map(String::as_str)
    }
}

/// Common git operation trait for abstraction
///
/// All implementors must be `Send + Sync`. Methods return [crate::error::Result] and
/// map underlying `git2` failures to [crate::error::RelsyncError] variants.
pub trait Repository: Send + Sync {
    /// Submodule name -> path, in `.gitmodules` order
    fn submodules(&self) -> Result<IndexMap<String, String>>;

    /// Fetch tags of a submodule from `remote`
    fn fetch_tags(&self, path: &str, remote: &str) -> Result<()>;

    /// Tags of a submodule, newest first, and the tag at its HEAD
    fn tags(&self, path: &str) -> Result<TagListing>;

    /// Contents of `file` at revision `rev` of a submodule, without checking it out
    ///
    /// # Returns
    /// * `Ok(content)` - File contents as UTF-8
    /// * `Err` - If the revision or file does not exist
    fn read_file_at(&self, path: &str, rev: &str, file: &str) -> Result<String>;

    /// Check out `rev` in a submodule (detached HEAD)
    fn checkout(&self, path: &str, rev: &str) -> Result<()>;

    /// Stage `path` (a submodule pointer or file) in the parent repository
    fn stage(&self, path: &str) -> Result<()>;

    /// Stage everything and commit it in the parent repository
    ///
    /// # Returns
    /// * `Ok(true)` - A commit was created
    /// * `Ok(false)` - Nothing to commit
    fn commit_all(&self, message: &str) -> Result<bool>;

    /// All tags of the parent repository
    fn parent_tags(&self) -> Result<Vec<String>>;

    /// Create a lightweight tag on the parent HEAD
    fn create_tag(&self, name: &str) -> Result<()>;
}
