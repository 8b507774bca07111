use crate::domain::sort_tags_newest_first;
use crate::error::{RelsyncError, Result};
use crate::git::{Repository, TagListing};
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

/// Operations a [MockRepository] has been asked to perform
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordedOps {
    /// (submodule path, revision)
    pub checkouts: Vec<(String, String)>,
    pub fetched: Vec<String>,
    pub staged: Vec<String>,
    pub commits: Vec<String>,
}

/// Mock repository for testing without actual git operations
pub struct MockRepository {
    submodules: IndexMap<String, String>,
    tags: HashMap<String, Vec<String>>,
    files: HashMap<(String, String, String), String>,
    fetch_failures: HashSet<String>,
    has_changes: bool,
    current: Mutex<HashMap<String, String>>,
    parent_tags: Mutex<Vec<String>>,
    ops: Mutex<RecordedOps>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockRepository {
    /// Create a new empty mock repository
    pub fn new() -> Self {
        MockRepository {
            submodules: IndexMap::new(),
            tags: HashMap::new(),
            files: HashMap::new(),
            fetch_failures: HashSet::new(),
            has_changes: true,
            current: Mutex::new(HashMap::new()),
            parent_tags: Mutex::new(Vec::new()),
            ops: Mutex::new(RecordedOps::default()),
        }
    }

    /// Register a submodule
    pub fn add_submodule(&mut self, name: impl Into<String>, path: impl Into<String>) {
        self.submodules.insert(name.into(), path.into());
    }

    /// Add a tag to a submodule; `current` marks it as the checked out one
    pub fn add_tag(&mut self, path: &str, tag: impl Into<String>, current: bool) {
        let tag = tag.into();
        if current {
            lock(&self.current).insert(path.to_string(), tag.clone());
        }
        let tags = self.tags.entry(path.to_string()).or_default();
        tags.push(tag);
        sort_tags_newest_first(tags);
    }

    /// Store the contents of `file` at `rev` of a submodule
    pub fn add_file(&mut self, path: &str, rev: &str, file: &str, content: impl Into<String>) {
        self.files.insert(
            (path.to_string(), rev.to_string(), file.to_string()),
            content.into(),
        );
    }

    /// Make fetching tags of a submodule fail
    pub fn fail_fetch(&mut self, path: &str) {
        self.fetch_failures.insert(path.to_string());
    }

    /// Whether `commit_all` finds anything to commit
    pub fn set_has_changes(&mut self, has_changes: bool) {
        self.has_changes = has_changes;
    }

    /// Add an existing tag to the parent repository
    pub fn add_parent_tag(&mut self, tag: impl Into<String>) {
        lock(&self.parent_tags).push(tag.into());
    }

    /// Snapshot of the recorded operations
    pub fn ops(&self) -> RecordedOps {
        lock(&self.ops).clone()
    }

    /// Tag currently checked out in a submodule
    pub fn current_tag(&self, path: &str) -> Option<String> {
        lock(&self.current).get(path).cloned()
    }
}

impl Default for MockRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl Repository for MockRepository {
    fn submodules(&self) -> Result<IndexMap<String, String>> {
        Ok(self.submodules.clone())
    }

    fn fetch_tags(&self, path: &str, remote: &str) -> Result<()> {
        if self.fetch_failures.contains(path) {
            return Err(RelsyncError::repository(format!(
                "Fetching tags in '{}' from '{}' failed",
                path, remote
            )));
        }
        lock(&self.ops).fetched.push(path.to_string());
        Ok(())
    }

    fn tags(&self, path: &str) -> Result<TagListing> {
        Ok(TagListing {
            tags: self.tags.get(path).cloned().unwrap_or_default(),
            current: self.current_tag(path),
        })
    }

    fn read_file_at(&self, path: &str, rev: &str, file: &str) -> Result<String> {
        self.files
            .get(&(path.to_string(), rev.to_string(), file.to_string()))
            .cloned()
            .ok_or_else(|| {
                RelsyncError::repository(format!("Cannot read '{}:{}' in '{}'", rev, file, path))
            })
    }

    fn checkout(&self, path: &str, rev: &str) -> Result<()> {
        let known = self.tags.get(path).is_some_and(|tags| tags.iter().any(|t| t == rev));
        if !known {
            return Err(RelsyncError::repository(format!(
                "Cannot resolve '{}' in '{}'",
                rev, path
            )));
        }
        lock(&self.current).insert(path.to_string(), rev.to_string());
        lock(&self.ops)
            .checkouts
            .push((path.to_string(), rev.to_string()));
        Ok(())
    }

    fn stage(&self, path: &str) -> Result<()> {
        lock(&self.ops).staged.push(path.to_string());
        Ok(())
    }

    fn commit_all(&self, message: &str) -> Result<bool> {
        if !self.has_changes {
            return Ok(false);
        }
        lock(&self.ops).commits.push(message.to_string());
        Ok(true)
    }

    fn parent_tags(&self) -> Result<Vec<String>> {
        Ok(lock(&self.parent_tags).clone())
    }

    fn create_tag(&self, name: &str) -> Result<()> {
        let mut tags = lock(&self.parent_tags);
        if tags.iter().any(|t| t == name) {
            return Err(RelsyncError::repository(format!("Tag '{}' already exists", name)));
        }
        tags.push(name.to_string());
        Ok(())
    }
}
