//! Progress source for in-flight clone jobs.
//!
//! Clone jobs are registered in a durable per-volume index: a directory of
//! symlinks, one per job, each pointing at the clone-destination subvolume's
//! base path. The executor removes an entry when its clone finishes, fails
//! or is cancelled, so every entry seen here describes a live job, except
//! when it vanishes between discovery and resolution; that is a normal race
//! handled by skipping the job for the tick.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use grovefs_client::{read_dir_by_ctime_order, CloneSource, FsClient, MetadataStore};
use grovefs_types::{GroupName, Result, SnapshotName, SubvolumeName, VolumeName};

use crate::config::ConcurrencyLimits;
use crate::layout::{list_volumes, VolumeSpec};
use crate::reporter::{ProgressSource, TickSample};
use crate::stats::copy_ratio;

/// A fully resolved in-flight clone job.
#[derive(Debug, Clone)]
pub struct CloneInfo {
    pub volume: VolumeName,

    pub src_group: GroupName,
    pub src_subvolume: SubvolumeName,
    pub src_snapshot: SnapshotName,
    /// Data path of the source snapshot being copied from.
    pub src_path: PathBuf,

    pub dst_group: GroupName,
    pub dst_subvolume: SubvolumeName,
    /// Data path of the in-progress destination.
    pub dst_path: PathBuf,
}

/// Enumerates clone jobs cluster-wide and measures each one's copy ratio.
pub struct CloneProgressSource {
    fs: Arc<dyn FsClient>,
    metadata: Arc<dyn MetadataStore>,
    spec: VolumeSpec,
    limits: Arc<ConcurrencyLimits>,
}

impl CloneProgressSource {
    pub fn new(
        fs: Arc<dyn FsClient>,
        metadata: Arc<dyn MetadataStore>,
        spec: VolumeSpec,
        limits: Arc<ConcurrencyLimits>,
    ) -> Self {
        Self {
            fs,
            metadata,
            spec,
            limits,
        }
    }

    /// Resolve one clone-index entry into a [`CloneInfo`].
    ///
    /// Resolution is destination-first: the index link names the destination
    /// subvolume, whose own metadata record then names the source. Either
    /// step may find the job already gone.
    async fn resolve_clone(&self, volume: &VolumeName, entry_name: &str) -> Result<CloneInfo> {
        let link = self.spec.clone_index_path(volume).join(entry_name);
        let dst_base = self.fs.read_link(&link).await?;

        let (dst_group, dst_subvolume) =
            self.spec.resolve_group_and_subvolume(volume, &dst_base)?;
        let dst_path = self
            .metadata
            .subvolume_data_path(volume, &dst_group, &dst_subvolume)
            .await?;

        let CloneSource {
            group: src_group,
            subvolume: src_subvolume,
            snapshot: src_snapshot,
            data_path: src_path,
        } = self
            .metadata
            .clone_source(volume, &dst_group, &dst_subvolume)
            .await?;

        Ok(CloneInfo {
            volume: volume.clone(),
            src_group,
            src_subvolume,
            src_snapshot,
            src_path,
            dst_group,
            dst_subvolume,
            dst_path,
        })
    }

    /// Resolve every registered clone job, cluster-wide, in launch order.
    ///
    /// Jobs that vanish mid-resolution are skipped silently; jobs whose
    /// resolution fails for any other reason are skipped with a warning.
    /// Neither stops the enumeration.
    pub async fn collect_clones(&self) -> Result<Vec<CloneInfo>> {
        let mut clones = Vec::new();

        for volume in list_volumes(self.fs.as_ref(), &self.spec).await? {
            let index_path = self.spec.clone_index_path(&volume);
            let entries = match read_dir_by_ctime_order(self.fs.as_ref(), &index_path).await {
                Ok(entries) => entries,
                // Volume has no clone index: no clones were ever scheduled.
                Err(status) if status.is_not_found() => continue,
                Err(status) => return Err(status),
            };

            for entry in entries {
                match self.resolve_clone(&volume, &entry.name).await {
                    Ok(info) => clones.push(info),
                    Err(status) if status.is_not_found() => {
                        tracing::debug!(
                            volume = %volume,
                            entry = %entry.name,
                            "Clone job vanished during resolution, skipping"
                        );
                    }
                    Err(status) => {
                        tracing::warn!(
                            volume = %volume,
                            entry = %entry.name,
                            error = %status,
                            "Failed to resolve clone job, skipping this tick"
                        );
                    }
                }
            }
        }

        tracing::debug!(clones = clones.len(), "Collected clone jobs");
        Ok(clones)
    }
}

#[async_trait]
impl ProgressSource for CloneProgressSource {
    fn op_name(&self) -> &'static str {
        "clone"
    }

    async fn sample(&self) -> Result<TickSample> {
        let clones = self.collect_clones().await?;

        let mut ratios = Vec::with_capacity(clones.len());
        for clone in &clones {
            match copy_ratio(self.fs.as_ref(), &clone.src_path, &clone.dst_path).await {
                Ok(ratio) => ratios.push(ratio),
                Err(status) => {
                    // Isolated per-job failure: the rest of the tick proceeds.
                    tracing::warn!(
                        volume = %clone.volume,
                        subvolume = %clone.dst_subvolume,
                        error = %status,
                        "Failed to measure clone, skipping this tick"
                    );
                }
            }
        }

        Ok(TickSample {
            ratios,
            limit: self.limits.max_concurrent_clones(),
        })
    }
}
