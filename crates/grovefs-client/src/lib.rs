//! Boundary contracts consumed by the grovefs lifecycle subsystem.
//!
//! The subsystem tracks long-running namespace operations (purge, clone) but
//! performs none of the heavy lifting itself. Everything it talks to is
//! defined here as a trait (for testability / mocking) together with the
//! implementations that ship with this repository:
//!
//! - [`FsClient`]: hierarchical-namespace operations against the cluster,
//!   with [`LocalFsClient`] as the local-disk implementation.
//! - [`MetadataStore`]: subvolume metadata records (clone origin, data paths).
//! - [`ProgressChannel`]: the operator-facing progress publication channel,
//!   with [`LogProgressChannel`] writing to the tracing log and
//!   [`RecordingProgressChannel`] capturing updates in memory.

pub mod fs;
pub mod local;
pub mod metadata;
pub mod progress;

pub use fs::{read_dir_by_ctime_order, DirEntry, EntryKind, FsClient, RecursiveStats};
pub use local::LocalFsClient;
pub use metadata::{CloneSource, MetadataStore};
pub use progress::{
    IndicatorUpdate, LogProgressChannel, ProgressChannel, RecordingProgressChannel,
};
