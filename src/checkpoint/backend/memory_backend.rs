//! In-process snapshot store
//!
//! Keeps file contents in memory, keyed by project. Useful for embedding the
//! checkpoint manager where git is not wanted, and for tests.

use super::traits::{normalize_relative, BackendError, BackendResult, SnapshotBackend};
use crate::checkpoint::models::{CommitId, StoreId};
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

type FileTree = BTreeMap<String, Vec<u8>>;

#[derive(Debug, Clone)]
struct MemorySnapshot {
    id: CommitId,
    files: FileTree,
}

/// Snapshot backend holding every snapshot in memory
#[derive(Debug)]
pub struct MemoryBackend {
    available: bool,
    stores: Mutex<HashMap<StoreId, Vec<MemorySnapshot>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            available: true,
            stores: Mutex::new(HashMap::new()),
        }
    }

    /// A backend that reports itself unavailable, as when git is missing
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new()
        }
    }

    /// Number of snapshots held for a store
    pub fn snapshot_count(&self, store: &StoreId) -> usize {
        self.lock()
            .map(|stores| stores.get(store).map_or(0, Vec::len))
            .unwrap_or(0)
    }

    fn lock(
        &self,
    ) -> BackendResult<std::sync::MutexGuard<'_, HashMap<StoreId, Vec<MemorySnapshot>>>> {
        self.stores
            .lock()
            .map_err(|_| BackendError::Other("memory store lock poisoned".to_string()))
    }

    fn latest(&self, store: &StoreId) -> BackendResult<Option<MemorySnapshot>> {
        Ok(self
            .lock()?
            .get(store)
            .and_then(|snapshots| snapshots.last().cloned()))
    }

    /// Read the current contents of `paths`; missing files are left out
    async fn read_tree(project_dir: &Path, paths: &[PathBuf]) -> BackendResult<FileTree> {
        let mut files = FileTree::new();
        for path in paths {
            let key = normalize_relative(path)?;
            match tokio::fs::read(project_dir.join(&key)).await {
                Ok(content) => {
                    files.insert(key, content);
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(files)
    }

    fn commit_id(parent: Option<&CommitId>, message: &str, files: &FileTree) -> CommitId {
        let mut hasher = Sha256::new();
        if let Some(parent) = parent {
            hasher.update(parent.as_str().as_bytes());
        }
        hasher.update(message.as_bytes());
        for (path, content) in files {
            hasher.update(path.as_bytes());
            hasher.update((content.len() as u64).to_le_bytes());
            hasher.update(content);
        }
        let hex = format!("{:x}", hasher.finalize());
        CommitId(hex[..40].to_string())
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SnapshotBackend for MemoryBackend {
    fn backend_type(&self) -> &'static str {
        "memory"
    }

    async fn is_available(&self) -> bool {
        self.available
    }

    async fn locate(&self, project_dir: &Path) -> BackendResult<StoreId> {
        let store = StoreId(PathBuf::from(format!("memory:{}", project_dir.display())));
        self.lock()?.entry(store.clone()).or_default();
        Ok(store)
    }

    async fn has_unsaved_changes(
        &self,
        project_dir: &Path,
        store: &StoreId,
        paths: &[PathBuf],
    ) -> BackendResult<bool> {
        let Some(latest) = self.latest(store)? else {
            return Ok(true);
        };
        let current = Self::read_tree(project_dir, paths).await?;
        Ok(current != latest.files)
    }

    async fn latest_snapshot_id(&self, store: &StoreId) -> BackendResult<CommitId> {
        self.latest(store)?
            .map(|snapshot| snapshot.id)
            .ok_or(BackendError::NoSnapshots)
    }

    async fn store(
        &self,
        project_dir: &Path,
        store: &StoreId,
        message: &str,
        paths: &[PathBuf],
    ) -> BackendResult<CommitId> {
        let files = Self::read_tree(project_dir, paths).await?;
        let mut stores = self.lock()?;
        let snapshots = stores.entry(store.clone()).or_default();
        let id = Self::commit_id(snapshots.last().map(|s| &s.id), message, &files);
        snapshots.push(MemorySnapshot {
            id: id.clone(),
            files,
        });
        Ok(id)
    }

    async fn restore(
        &self,
        project_dir: &Path,
        store: &StoreId,
        commit: &CommitId,
        paths: &[PathBuf],
    ) -> BackendResult<()> {
        let snapshot = self
            .lock()?
            .get(store)
            .and_then(|snapshots| snapshots.iter().find(|s| &s.id == commit).cloned())
            .ok_or_else(|| BackendError::UnknownSnapshot(commit.to_string()))?;

        for path in paths {
            let key = normalize_relative(path)?;
            let Some(content) = snapshot.files.get(&key) else {
                continue;
            };
            let target = project_dir.join(&key);
            if let Some(parent) = target.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(&target, content).await?;
        }
        Ok(())
    }
}
