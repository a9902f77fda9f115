//! Trash can: durable holding area and reclaim driver for deleted subvolumes.
//!
//! Deleting a subvolume is a two-step affair: the container is atomically
//! renamed into the volume's trash directory under a fresh unique name, and
//! a purge worker later reclaims its storage by deleting the tree bottom-up.
//! Reclaim is cancellable between any two namespace operations and leaves a
//! resumable, partially-deleted entry behind when cancelled.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;

use grovefs_client::{read_dir_by_ctime_order, DirEntry, FsClient};
use grovefs_types::{make_error, Result, StatusCode, VolumeName};
use uuid::Uuid;

use crate::layout::VolumeSpec;
use crate::rate::RateMonitor;

/// Aggregate contents of a trash directory, for operator visibility.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrashStats {
    /// Trash entries (trashed subvolumes) not yet fully reclaimed.
    pub subvols_left: u64,
    /// Namespace objects remaining under the trash root, at any depth.
    pub files_left: u64,
}

impl TrashStats {
    pub fn is_empty(&self) -> bool {
        self.files_left == 0
    }
}

/// A volume's trash directory.
pub struct TrashCan {
    fs: Arc<dyn FsClient>,
    path: PathBuf,
}

impl TrashCan {
    /// Handle to a trash directory that is assumed to exist.
    pub fn new(fs: Arc<dyn FsClient>, path: PathBuf) -> Self {
        Self { fs, path }
    }

    /// Create the volume's trash directory (and parents) if missing.
    pub async fn create(
        fs: Arc<dyn FsClient>,
        spec: &VolumeSpec,
        volume: &VolumeName,
    ) -> Result<Self> {
        let path = spec.trash_path(volume);
        fs.mkdirs(&path).await?;
        Ok(Self { fs, path })
    }

    /// Open the volume's existing trash directory; fails if it is missing.
    pub async fn open(
        fs: Arc<dyn FsClient>,
        spec: &VolumeSpec,
        volume: &VolumeName,
    ) -> Result<Self> {
        let path = spec.trash_path(volume);
        fs.read_dir(&path).await?;
        Ok(Self { fs, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn entry_path(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }

    /// Move `path` into the trash under a freshly generated unique name.
    ///
    /// The rename is atomic; on failure the underlying error propagates and
    /// the caller retains responsibility for retry. Returns the entry name.
    pub async fn dump(&self, path: &Path) -> Result<String> {
        let name = Uuid::new_v4().to_string();
        let entry = self.entry_path(&name);
        self.fs.rename(path, &entry).await?;
        tracing::info!(
            from = %path.display(),
            entry = %name,
            "Moved subvolume into trash"
        );
        Ok(name)
    }

    /// Keep a weak reference to `target` as a symlink named `name` under the
    /// trash root, independent of whether `target` is itself trashed.
    pub async fn link(&self, target: &Path, name: &str) -> Result<()> {
        self.fs.symlink(target, &self.entry_path(name)).await
    }

    /// Remove a weak reference created by [`TrashCan::link`].
    pub async fn delink(&self, name: &str) -> Result<()> {
        self.fs.unlink(&self.entry_path(name)).await
    }

    /// Trash entries ordered by change time, oldest first.
    ///
    /// Reclaim fairness and the purge-progress estimator both rely on this
    /// order.
    pub async fn entries_by_ctime(&self) -> Result<Vec<DirEntry>> {
        read_dir_by_ctime_order(self.fs.as_ref(), &self.path).await
    }

    /// Reclaim one trash entry: delete its tree depth-first, children before
    /// parent, then the entry directory itself.
    ///
    /// `should_cancel` is checked before every namespace operation; when it
    /// turns true the walk stops with `Interrupted`, leaving the entry
    /// directory (and whatever was not yet deleted) in place so a later
    /// reclaim can resume. A child that is already gone counts as success.
    /// Every successful unlink/rmdir is recorded on `rate`.
    pub async fn reclaim(
        &self,
        entry: &str,
        should_cancel: &(dyn Fn() -> bool + Sync),
        rate: &RateMonitor,
    ) -> Result<()> {
        let root = self.entry_path(entry);
        tracing::debug!(entry = entry, "Reclaiming trash entry");

        match self.rmtree(root, should_cancel, rate).await {
            Ok(()) => {
                tracing::info!(entry = entry, "Trash entry reclaimed");
                Ok(())
            }
            Err(status) if status.is_interrupted() => {
                tracing::debug!(entry = entry, "Reclaim cancelled, entry retained");
                Err(status)
            }
            Err(status) => {
                tracing::warn!(entry = entry, error = %status, "Reclaim failed");
                Err(status)
            }
        }
    }

    fn rmtree<'a>(
        &'a self,
        root: PathBuf,
        should_cancel: &'a (dyn Fn() -> bool + Sync),
        rate: &'a RateMonitor,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            let entries = match self.fs.read_dir(&root).await {
                Ok(entries) => entries,
                // Already removed, e.g. by a concurrent reclaim.
                Err(status) if status.is_not_found() => return Ok(()),
                Err(status) => return Err(status),
            };

            for entry in entries {
                if should_cancel() {
                    return make_error(StatusCode::INTERRUPTED);
                }

                let child = root.join(&entry.name);
                if entry.kind.is_dir() {
                    self.rmtree(child, should_cancel, rate).await?;
                } else {
                    match self.fs.unlink(&child).await {
                        Ok(()) => {
                            rate.record();
                        }
                        Err(status) if status.is_not_found() => {}
                        Err(status) => return Err(status),
                    }
                }
            }

            // Remove the directory only if we were not asked to cancel
            // (it would not be empty otherwise anyway).
            if should_cancel() {
                return make_error(StatusCode::INTERRUPTED);
            }
            match self.fs.rmdir(&root).await {
                Ok(()) => {
                    rate.record();
                    Ok(())
                }
                Err(status) if status.is_not_found() => Ok(()),
                Err(status) => Err(status),
            }
        })
    }

    /// Count what remains under the trash root: entries at the top level and
    /// namespace objects at any depth. Entries vanishing mid-walk (purge
    /// workers run concurrently) are skipped, not errors.
    pub async fn stats(&self) -> Result<TrashStats> {
        let mut stats = TrashStats::default();

        let top = match self.fs.read_dir(&self.path).await {
            Ok(entries) => entries,
            Err(status) if status.is_not_found() => return Ok(stats),
            Err(status) => return Err(status),
        };

        let mut pending = Vec::new();
        for entry in top {
            stats.subvols_left += 1;
            stats.files_left += 1;
            if entry.kind.is_dir() {
                pending.push(self.path.join(&entry.name));
            }
        }

        while let Some(dir) = pending.pop() {
            let entries = match self.fs.read_dir(&dir).await {
                Ok(entries) => entries,
                Err(status) if status.is_not_found() => continue,
                Err(status) => return Err(status),
            };
            for entry in entries {
                stats.files_left += 1;
                if entry.kind.is_dir() {
                    pending.push(dir.join(&entry.name));
                }
            }
        }

        Ok(stats)
    }
}
