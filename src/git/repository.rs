use crate::domain::sort_tags_newest_first;
use crate::error::{RelsyncError, Result};
use crate::git::TagListing;
use git2::build::CheckoutBuilder;
use git2::{Cred, CredentialType, FetchOptions, IndexAddOption, RemoteCallbacks, Repository as Git2Repo};
use indexmap::IndexMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Git access through libgit2, rooted at the parent repository's work tree.
///
/// Repositories are opened per call so the handle stays `Send + Sync`.
pub struct Git2Repository {
    root: PathBuf,
}

impl Git2Repository {
    /// Open or discover a git repository
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = Git2Repo::discover(path)?;
        let root = repo
            .workdir()
            .ok_or_else(|| RelsyncError::repository("bare repositories are not supported"))?
            .to_path_buf();

        Ok(Git2Repository { root })
    }

    /// Work tree root of the parent repository
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn parent(&self) -> Result<Git2Repo> {
        Ok(Git2Repo::open(&self.root)?)
    }

    fn submodule(&self, path: &str) -> Result<Git2Repo> {
        Git2Repo::open(self.root.join(path)).map_err(|e| {
            RelsyncError::repository(format!("Cannot open submodule at '{}': {}", path, e))
        })
    }
}

/// Credentials for fetching: SSH keys from ~/.ssh, then the SSH agent, then defaults
fn remote_callbacks<'a>() -> RemoteCallbacks<'a> {
    let mut callbacks = RemoteCallbacks::new();
    callbacks.credentials(|_url, username_from_url, allowed_types| {
        let username = username_from_url.unwrap_or("git");

        if allowed_types.contains(CredentialType::SSH_KEY) {
            if let Some(home) = dirs::home_dir() {
                for key in ["id_ed25519", "id_rsa", "id_ecdsa"] {
                    let key_path = home.join(".ssh").join(key);
                    if key_path.exists() {
                        if let Ok(cred) = Cred::ssh_key(username, None, &key_path, None) {
                            return Ok(cred);
                        }
                    }
                }
            }

            if let Ok(cred) = Cred::ssh_key_from_agent(username) {
                return Ok(cred);
            }
        }

        Cred::default()
    });
    callbacks
}

impl super::Repository for Git2Repository {
    fn submodules(&self) -> Result<IndexMap<String, String>> {
        let repo = self.parent()?;
        let mut submodules = IndexMap::new();

        for submodule in repo.submodules()? {
            let Some(name) = submodule.name() else {
                warn!(path = %submodule.path().display(), "skipping submodule with non UTF-8 name");
                continue;
            };
            submodules.insert(name.to_string(), submodule.path().to_string_lossy().into_owned());
        }

        Ok(submodules)
    }

    fn fetch_tags(&self, path: &str, remote: &str) -> Result<()> {
        let repo = self.submodule(path)?;
        let mut remote = repo.find_remote(remote).map_err(|e| {
            RelsyncError::repository(format!("Cannot find remote '{}' in '{}': {}", remote, path, e))
        })?;

        let mut fetch_options = FetchOptions::new();
        fetch_options.remote_callbacks(remote_callbacks());

        remote
            .fetch(&["+refs/tags/*:refs/tags/*"], Some(&mut fetch_options), None)
            .map_err(|e| RelsyncError::repository(format!("Fetching tags in '{}' failed: {}", path, e)))?;

        debug!(submodule = path, "fetched tags");
        Ok(())
    }

    fn tags(&self, path: &str) -> Result<TagListing> {
        let repo = self.submodule(path)?;

        let mut tags: Vec<String> = repo
            .tag_names(None)?
            .iter()
            .flatten()
            .map(str::to_string)
            .collect();
        sort_tags_newest_first(&mut tags);

        let head = repo.head().ok().and_then(|h| h.peel_to_commit().ok()).map(|c| c.id());
        let current = head.and_then(|head_oid| {
            tags.iter()
                .find(|tag| {
                    repo.find_reference(&format!("refs/tags/{}", tag))
                        .and_then(|r| r.peel_to_commit())
                        .map(|commit| commit.id() == head_oid)
                        .unwrap_or(false)
                })
                .cloned()
        });

        Ok(TagListing { tags, current })
    }

    fn read_file_at(&self, path: &str, rev: &str, file: &str) -> Result<String> {
        let repo = self.submodule(path)?;
        let spec = format!("{}:{}", rev, file);

        let blob = repo
            .revparse_single(&spec)
            .and_then(|obj| obj.peel_to_blob())
            .map_err(|e| RelsyncError::repository(format!("Cannot read '{}' in '{}': {}", spec, path, e)))?;

        String::from_utf8(blob.content().to_vec())
            .map_err(|_| RelsyncError::repository(format!("'{}' in '{}' is not UTF-8", spec, path)))
    }

    fn checkout(&self, path: &str, rev: &str) -> Result<()> {
        let repo = self.submodule(path)?;
        let commit = repo
            .revparse_single(rev)
            .and_then(|obj| obj.peel_to_commit())
            .map_err(|e| RelsyncError::repository(format!("Cannot resolve '{}' in '{}': {}", rev, path, e)))?;

        repo.checkout_tree(commit.as_object(), Some(CheckoutBuilder::new().safe()))?;
        repo.set_head_detached(commit.id())?;

        debug!(submodule = path, rev, "checked out");
        Ok(())
    }

    fn stage(&self, path: &str) -> Result<()> {
        let repo = self.parent()?;

        for mut submodule in repo.submodules()? {
            if submodule.path() == Path::new(path) {
                submodule.add_to_index(true)?;
                return Ok(());
            }
        }

        let mut index = repo.index()?;
        index.add_path(Path::new(path))?;
        index.write()?;
        Ok(())
    }

    fn commit_all(&self, message: &str) -> Result<bool> {
        let repo = self.parent()?;
        let mut index = repo.index()?;
        index.add_all(["*"], IndexAddOption::DEFAULT, None)?;
        index.update_all(["*"], None)?;
        index.write()?;

        let tree_oid = index.write_tree()?;
        let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());

        if parent.as_ref().map(|c| c.tree_id()) == Some(tree_oid) {
            debug!("nothing to commit");
            return Ok(false);
        }

        let tree = repo.find_tree(tree_oid)?;
        let signature = repo.signature()?;
        let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();
        let oid = repo.commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)?;

        debug!(commit = %oid, message, "created commit");
        Ok(true)
    }

    fn parent_tags(&self) -> Result<Vec<String>> {
        let repo = self.parent()?;
        let tags = repo.tag_names(None)?;
        Ok(tags.iter().flatten().map(str::to_string).collect())
    }

    fn create_tag(&self, name: &str) -> Result<()> {
        let repo = self.parent()?;
        let head = repo.head()?.peel_to_commit()?;
        repo.tag_lightweight(name, head.as_object(), false)
            .map_err(|e| RelsyncError::repository(format!("Cannot create tag '{}': {}", name, e)))?;
        Ok(())
    }
}
