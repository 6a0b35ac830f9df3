//! Git-backed snapshot store
//!
//! Each project gets a bare side repository under the storage location,
//! named after a hash of the canonical project path. Every command runs as
//! `git --git-dir=<store> --work-tree=<project>` so the user's own repository
//! (if any) is never touched. Trees are built on throwaway index files, which
//! keeps change queries from contending with an in-flight store.

use super::traits::{normalize_relative, BackendError, BackendResult, SnapshotBackend};
use crate::checkpoint::config::CheckpointConfig;
use crate::checkpoint::models::{CommitId, StoreId};
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::io::AsyncWriteExt;
use tokio::process::Command as TokioCommand;
use tracing::debug;

/// Snapshot backend that shells out to the `git` executable
#[derive(Debug)]
pub struct GitSnapshotBackend {
    storage_location: PathBuf,
    git_binary: String,
    author_name: String,
    author_email: String,
    scratch_counter: AtomicU64,
}

/// Repository and work tree a git command runs against
#[derive(Clone, Copy)]
struct GitTarget<'a> {
    store: &'a StoreId,
    work_tree: Option<&'a Path>,
    index: Option<&'a Path>,
}

/// Temporary index file, removed on drop
struct ScratchIndex {
    path: PathBuf,
}

impl Drop for ScratchIndex {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

impl GitSnapshotBackend {
    /// Create a backend storing repositories under `storage_location`
    pub fn new(storage_location: impl Into<PathBuf>) -> Self {
        let defaults = CheckpointConfig::default();
        Self {
            storage_location: storage_location.into(),
            git_binary: defaults.git_binary,
            author_name: defaults.author_name,
            author_email: defaults.author_email,
            scratch_counter: AtomicU64::new(0),
        }
    }

    /// Create a backend from checkpoint configuration
    pub fn from_config(config: &CheckpointConfig) -> Self {
        Self {
            storage_location: config.resolved_storage_location(),
            git_binary: config.git_binary.clone(),
            author_name: config.author_name.clone(),
            author_email: config.author_email.clone(),
            scratch_counter: AtomicU64::new(0),
        }
    }

    pub fn storage_location(&self) -> &Path {
        &self.storage_location
    }

    /// Store directory name for a canonical project path
    fn store_name(canonical_project: &Path) -> String {
        let digest = Sha256::digest(canonical_project.to_string_lossy().as_bytes());
        let hex = format!("{:x}", digest);
        format!("{}.git", &hex[..16])
    }

    fn scratch_index(&self, store: &StoreId) -> ScratchIndex {
        let n = self.scratch_counter.fetch_add(1, Ordering::SeqCst);
        ScratchIndex {
            path: store
                .path()
                .join(format!("index.scratch-{}-{}", std::process::id(), n)),
        }
    }

    fn command(&self, target: Option<GitTarget<'_>>, args: &[&str]) -> TokioCommand {
        let mut cmd = TokioCommand::new(&self.git_binary);
        cmd.env("GIT_TERMINAL_PROMPT", "0")
            .env("GIT_AUTHOR_NAME", &self.author_name)
            .env("GIT_AUTHOR_EMAIL", &self.author_email)
            .env("GIT_COMMITTER_NAME", &self.author_name)
            .env("GIT_COMMITTER_EMAIL", &self.author_email)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        if let Some(target) = target {
            cmd.arg(format!("--git-dir={}", target.store.path().display()));
            if let Some(work_tree) = target.work_tree {
                cmd.arg(format!("--work-tree={}", work_tree.display()));
                // Path arguments and --stdin lists are resolved against the cwd.
                cmd.current_dir(work_tree);
            }
            if let Some(index) = target.index {
                cmd.env("GIT_INDEX_FILE", index);
            }
        }
        cmd.args(["-c", "core.autocrlf=false"]);
        cmd.args(args);
        cmd
    }

    /// Run git and return the raw output, whatever the exit status
    async fn output(
        &self,
        target: Option<GitTarget<'_>>,
        args: &[&str],
        stdin: Option<Vec<u8>>,
    ) -> BackendResult<std::process::Output> {
        debug!(args = ?args, "running git");
        let mut cmd = self.command(target, args);

        let Some(input) = stdin else {
            cmd.stdin(Stdio::null());
            return Ok(cmd.output().await?);
        };

        cmd.stdin(Stdio::piped());
        let mut child = cmd.spawn()?;
        if let Some(mut pipe) = child.stdin.take() {
            pipe.write_all(&input).await?;
            pipe.shutdown().await?;
        }
        Ok(child.wait_with_output().await?)
    }

    /// Run git, failing on a non-zero exit, and return trimmed stdout
    async fn run(
        &self,
        target: Option<GitTarget<'_>>,
        args: &[&str],
        stdin: Option<Vec<u8>>,
    ) -> BackendResult<String> {
        let output = self.output(target, args, stdin).await?;
        if !output.status.success() {
            return Err(BackendError::git(
                args.first().copied().unwrap_or("git"),
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Resolve a revision, returning None when it does not exist
    async fn rev_parse(&self, store: &StoreId, rev: &str) -> BackendResult<Option<String>> {
        let target = GitTarget {
            store,
            work_tree: None,
            index: None,
        };
        let output = self
            .output(Some(target), &["rev-parse", "--verify", "-q", rev], None)
            .await?;
        if !output.status.success() {
            return Ok(None);
        }
        let value = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok((!value.is_empty()).then_some(value))
    }

    /// Build a tree object holding exactly `paths` as they are on disk
    async fn write_tree(
        &self,
        project_dir: &Path,
        store: &StoreId,
        paths: &[PathBuf],
    ) -> BackendResult<String> {
        let index = self.scratch_index(store);
        let target = GitTarget {
            store,
            work_tree: Some(project_dir),
            index: Some(&index.path),
        };

        self.run(Some(target), &["read-tree", "--empty"], None).await?;
        if !paths.is_empty() {
            self.run(
                Some(target),
                &["update-index", "--add", "--remove", "-z", "--stdin"],
                Some(nul_separated(paths)?),
            )
            .await?;
        }
        self.run(Some(target), &["write-tree"], None).await
    }
}

/// NUL-separated normalized path list for `-z --stdin` commands
fn nul_separated(paths: &[PathBuf]) -> BackendResult<Vec<u8>> {
    let mut buffer = Vec::new();
    for path in paths {
        buffer.extend_from_slice(normalize_relative(path)?.as_bytes());
        buffer.push(0);
    }
    Ok(buffer)
}

#[async_trait]
impl SnapshotBackend for GitSnapshotBackend {
    fn backend_type(&self) -> &'static str {
        "git"
    }

    async fn is_available(&self) -> bool {
        match self.output(None, &["--version"], None).await {
            Ok(output) => output.status.success(),
            Err(e) => {
                debug!(error = %e, binary = %self.git_binary, "git is not runnable");
                false
            }
        }
    }

    async fn locate(&self, project_dir: &Path) -> BackendResult<StoreId> {
        let canonical = tokio::fs::canonicalize(project_dir).await?;
        let store_dir = self.storage_location.join(Self::store_name(&canonical));
        let store = StoreId(store_dir.clone());

        if !store_dir.join("HEAD").exists() {
            tokio::fs::create_dir_all(&self.storage_location).await?;
            let dir = store_dir.to_string_lossy().to_string();
            self.run(None, &["init", "--bare", "-q", dir.as_str()], None)
                .await?;
            let target = GitTarget {
                store: &store,
                work_tree: None,
                index: None,
            };
            self.run(Some(target), &["config", "gc.auto", "0"], None)
                .await?;
            tokio::fs::write(
                store_dir.join("description"),
                format!("{}\n", canonical.display()),
            )
            .await?;
            debug!(store = %store, project = %canonical.display(), "created snapshot store");
        }

        Ok(store)
    }

    async fn has_unsaved_changes(
        &self,
        project_dir: &Path,
        store: &StoreId,
        paths: &[PathBuf],
    ) -> BackendResult<bool> {
        let Some(head_tree) = self.rev_parse(store, "HEAD^{tree}").await? else {
            return Ok(true);
        };
        let tree = self.write_tree(project_dir, store, paths).await?;
        Ok(tree != head_tree)
    }

    async fn latest_snapshot_id(&self, store: &StoreId) -> BackendResult<CommitId> {
        self.rev_parse(store, "HEAD")
            .await?
            .map(CommitId)
            .ok_or(BackendError::NoSnapshots)
    }

    async fn store(
        &self,
        project_dir: &Path,
        store: &StoreId,
        message: &str,
        paths: &[PathBuf],
    ) -> BackendResult<CommitId> {
        let tree = self.write_tree(project_dir, store, paths).await?;
        let parent = self.rev_parse(store, "HEAD").await?;
        let target = GitTarget {
            store,
            work_tree: None,
            index: None,
        };

        let mut args = vec!["commit-tree", tree.as_str(), "-m", message];
        if let Some(parent) = parent.as_deref() {
            args.extend(["-p", parent]);
        }
        let commit = self.run(Some(target), &args, None).await?;
        self.run(Some(target), &["update-ref", "HEAD", commit.as_str()], None)
            .await?;

        debug!(store = %store, commit = %commit, files = paths.len(), "stored snapshot");
        Ok(CommitId(commit))
    }

    async fn restore(
        &self,
        project_dir: &Path,
        store: &StoreId,
        commit: &CommitId,
        paths: &[PathBuf],
    ) -> BackendResult<()> {
        let target = GitTarget {
            store,
            work_tree: None,
            index: None,
        };
        let object = format!("{}^{{commit}}", commit.as_str());
        if self.rev_parse(store, &object).await?.is_none() {
            return Err(BackendError::UnknownSnapshot(commit.to_string()));
        }

        let listing = self
            .run(
                Some(target),
                &["ls-tree", "-r", "-z", "--name-only", commit.as_str()],
                None,
            )
            .await?;
        let in_commit: HashSet<&str> = listing.split('\0').filter(|p| !p.is_empty()).collect();

        let mut selected = Vec::new();
        for path in paths {
            let normalized = normalize_relative(path)?;
            if in_commit.contains(normalized.as_str()) {
                selected.push(PathBuf::from(normalized));
            } else {
                debug!(
                    path = %normalized,
                    commit = %commit.short(),
                    "path not in snapshot, left untouched"
                );
            }
        }
        if selected.is_empty() {
            return Ok(());
        }

        let index = self.scratch_index(store);
        let target = GitTarget {
            store,
            work_tree: Some(project_dir),
            index: Some(&index.path),
        };
        self.run(Some(target), &["read-tree", commit.as_str()], None)
            .await?;
        self.run(
            Some(target),
            &["checkout-index", "-f", "-z", "--stdin"],
            Some(nul_separated(&selected)?),
        )
        .await?;

        debug!(store = %store, commit = %commit, files = selected.len(), "restored snapshot");
        Ok(())
    }
}
