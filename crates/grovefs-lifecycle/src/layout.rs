//! Well-known directory layout of a grovefs cluster namespace.
//!
//! Volumes live under a single base directory. Within a volume, subvolumes
//! are grouped into group directories; trashed subvolumes move into the
//! reserved `_deleting` group, and the durable clone-job index is a
//! directory of symlinks under `_index/clone`.

use std::path::{Component, Path, PathBuf};

use grovefs_client::FsClient;
use grovefs_types::{
    make_error_msg, GroupName, JobCode, Result, Status, SubvolumeName, VolumeName,
};

/// Reserved group holding trashed subvolumes awaiting purge.
pub const TRASH_DIR_NAME: &str = "_deleting";

/// Directory of symlinks recording in-flight clone jobs.
pub const CLONE_INDEX_DIR: &str = "_index/clone";

/// Path construction and parsing for the cluster layout.
#[derive(Debug, Clone)]
pub struct VolumeSpec {
    base_dir: PathBuf,
}

impl VolumeSpec {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn volume_path(&self, volume: &VolumeName) -> PathBuf {
        self.base_dir.join(volume.as_ref())
    }

    pub fn group_path(&self, volume: &VolumeName, group: &GroupName) -> PathBuf {
        self.volume_path(volume).join(group.as_ref())
    }

    pub fn subvolume_path(
        &self,
        volume: &VolumeName,
        group: &GroupName,
        subvolume: &SubvolumeName,
    ) -> PathBuf {
        self.group_path(volume, group).join(subvolume.as_ref())
    }

    pub fn trash_path(&self, volume: &VolumeName) -> PathBuf {
        self.volume_path(volume).join(TRASH_DIR_NAME)
    }

    pub fn clone_index_path(&self, volume: &VolumeName) -> PathBuf {
        self.volume_path(volume).join(CLONE_INDEX_DIR)
    }

    /// Parse a subvolume base path back into its group and subvolume names.
    ///
    /// Inverse of [`VolumeSpec::subvolume_path`]; used to resolve clone-index
    /// links, whose targets are subvolume base paths.
    pub fn resolve_group_and_subvolume(
        &self,
        volume: &VolumeName,
        path: &Path,
    ) -> Result<(GroupName, SubvolumeName)> {
        let volume_path = self.volume_path(volume);
        let relative = path.strip_prefix(&volume_path).map_err(|_| {
            Status::with_message(
                JobCode::BAD_SUBVOLUME_PATH,
                format!(
                    "{} is not under volume {}",
                    path.display(),
                    volume_path.display()
                ),
            )
        })?;

        let mut parts = relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(s) => s.to_str(),
                _ => None,
            });

        match (parts.next(), parts.next(), parts.next()) {
            (Some(group), Some(subvolume), None) => {
                Ok((GroupName::from(group), SubvolumeName::from(subvolume)))
            }
            _ => make_error_msg(
                JobCode::BAD_SUBVOLUME_PATH,
                format!("{} is not a subvolume base path", path.display()),
            ),
        }
    }
}

/// List the volumes present in the cluster namespace.
pub async fn list_volumes(fs: &dyn FsClient, spec: &VolumeSpec) -> Result<Vec<VolumeName>> {
    let entries = fs.read_dir(spec.base_dir()).await?;
    Ok(entries
        .into_iter()
        .filter(|e| e.kind.is_dir())
        .map(|e| VolumeName::from(e.name))
        .collect())
}
