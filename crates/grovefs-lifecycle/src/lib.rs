//! Lifecycle tracking for long-running grovefs namespace jobs.
//!
//! Two kinds of background jobs run against a grovefs cluster for minutes to
//! hours: recursive deletion of trashed subvolumes ("purge") and recursive
//! copy-on-snapshot duplication ("clone"). This crate owns the durable trash
//! holding area with its cancellable reclaim driver, and the progress
//! reporting framework that re-derives the state of all in-flight jobs from
//! durable on-disk state every tick and publishes aggregate indicators.
//!
//! It schedules no work itself: the worker pools that drain the queues live
//! elsewhere, and every external collaborator is reached through the traits
//! in `grovefs-client`.

pub mod clone_progress;
pub mod config;
pub mod layout;
pub mod purge_progress;
pub mod rate;
pub mod reporter;
pub mod stats;
pub mod trash;

pub use clone_progress::{CloneInfo, CloneProgressSource};
pub use config::{ConcurrencyLimits, ReporterConfig};
pub use layout::{list_volumes, VolumeSpec};
pub use purge_progress::PurgeProgressSource;
pub use rate::RateMonitor;
pub use reporter::{ProgressReporter, ProgressSource, TickSample};
pub use stats::{clone_stats, copy_ratio, format_count, format_size, CloneStats};
pub use trash::{TrashCan, TrashStats};
