//! Subvolume metadata store boundary.
//!
//! Subvolume identity, quota and clone-origin records are owned by another
//! part of the cluster; the lifecycle subsystem only reads them. Both
//! lookups may fail `Fs::NotFound` when the job they describe completed
//! between discovery and resolution; callers skip the job for that tick.

use std::path::PathBuf;

use async_trait::async_trait;
use grovefs_types::{GroupName, Result, SnapshotName, SubvolumeName, VolumeName};

/// Identity and data path of the snapshot a clone copies from.
#[derive(Debug, Clone)]
pub struct CloneSource {
    pub group: GroupName,
    pub subvolume: SubvolumeName,
    pub snapshot: SnapshotName,
    /// Resolved path of the snapshot's data tree.
    pub data_path: PathBuf,
}

/// Read-only access to subvolume metadata records.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Resolved data path of a subvolume (for a clone destination, the
    /// in-progress copy target).
    async fn subvolume_data_path(
        &self,
        volume: &VolumeName,
        group: &GroupName,
        subvolume: &SubvolumeName,
    ) -> Result<PathBuf>;

    /// The clone origin recorded on a clone-destination subvolume.
    async fn clone_source(
        &self,
        volume: &VolumeName,
        group: &GroupName,
        subvolume: &SubvolumeName,
    ) -> Result<CloneSource>;
}
