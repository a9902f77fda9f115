//! Hierarchical-namespace client boundary.
//!
//! The trait captures exactly the operations the lifecycle subsystem needs
//! from the storage cluster: rename, symlink handling, unlink/rmdir,
//! directory listing and recursive aggregate counters. Every call may fail
//! with `Fs::NotFound`; under concurrent deletion callers must treat that as
//! a benign race, not corruption.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use grovefs_types::Result;

/// What kind of namespace object a directory entry refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
    Symlink,
}

impl EntryKind {
    pub fn is_dir(&self) -> bool {
        matches!(self, EntryKind::Directory)
    }
}

/// One directory entry, tagged with its kind and change time.
#[derive(Debug, Clone)]
pub struct DirEntry {
    pub name: String,
    pub kind: EntryKind,
    /// Change time of the entry, used for creation-order listings.
    pub ctime: DateTime<Utc>,
}

/// Recursive aggregate counters for a directory subtree.
///
/// Maintained by the cluster without a full tree walk; the local
/// implementation computes them by walking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecursiveStats {
    /// Total bytes of file data under the path.
    pub bytes: u64,
    /// Total regular files under the path.
    pub files: u64,
    /// Total directories under the path.
    pub subdirs: u64,
}

/// Namespace operations against the storage cluster.
#[async_trait]
pub trait FsClient: Send + Sync {
    /// Atomically rename `src` to `dst`.
    async fn rename(&self, src: &Path, dst: &Path) -> Result<()>;

    /// Create a symlink at `link` pointing at `target`.
    async fn symlink(&self, target: &Path, link: &Path) -> Result<()>;

    /// Read the target of the symlink at `link`.
    async fn read_link(&self, link: &Path) -> Result<PathBuf>;

    /// Remove a file or symlink.
    async fn unlink(&self, path: &Path) -> Result<()>;

    /// Remove an empty directory.
    async fn rmdir(&self, path: &Path) -> Result<()>;

    /// Create a directory and any missing parents.
    async fn mkdirs(&self, path: &Path) -> Result<()>;

    /// List the entries of a directory (excluding `.` and `..`).
    async fn read_dir(&self, path: &Path) -> Result<Vec<DirEntry>>;

    /// Recursive aggregate counters for the subtree rooted at `path`.
    async fn recursive_stats(&self, path: &Path) -> Result<RecursiveStats>;
}

/// List a directory's entries ordered by change time, oldest first.
///
/// Used wherever enumeration order stands in for creation order: trash
/// entries are reclaimed oldest-first, and clone-index entries are measured
/// in the order the clones were launched.
pub async fn read_dir_by_ctime_order(fs: &dyn FsClient, path: &Path) -> Result<Vec<DirEntry>> {
    let mut entries = fs.read_dir(path).await?;
    entries.sort_by_key(|e| e.ctime);
    Ok(entries)
}
