//! Snapshot Backend Abstraction
//!
//! File-tree snapshots live in a content-addressed store behind the
//! [`SnapshotBackend`] trait. The default implementation drives a bare side
//! repository with the `git` executable; an in-memory store is provided for
//! embedding and tests.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │  CheckpointManager  │
//! └──────────┬──────────┘
//!            │ store / restore
//! ┌──────────▼──────────┐
//! │    WorkerChannel    │
//! └──────────┬──────────┘
//!            │
//! ┌──────────▼──────────┐
//! │   SnapshotBackend   │  <-- Trait
//! └──────────┬──────────┘
//!     ┌──────┴──────┐
//! ┌───▼───┐   ┌─────▼────┐
//! │  Git  │   │  Memory  │
//! └───────┘   └──────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use agent_rewind::checkpoint::backend::{GitSnapshotBackend, SnapshotBackend};
//! use std::path::{Path, PathBuf};
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let backend = GitSnapshotBackend::new("/tmp/snapshots");
//!     let project = Path::new(".");
//!     let store = backend.locate(project).await?;
//!     let paths = vec![PathBuf::from("Cargo.toml")];
//!     let commit = backend.store(project, &store, "snapshot", &paths).await?;
//!     backend.restore(project, &store, &commit, &paths).await?;
//!     Ok(())
//! }
//! ```

mod git_backend;
mod memory_backend;
mod traits;

pub use git_backend::GitSnapshotBackend;
pub use memory_backend::MemoryBackend;
pub(crate) use traits::normalize_relative;
pub use traits::{BackendError, BackendResult, SnapshotBackend};
