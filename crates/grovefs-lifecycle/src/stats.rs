//! Copy-completion estimation from recursive counters.
//!
//! A clone's progress is estimated without instrumenting the copy path: the
//! cluster maintains recursive byte/file counters per directory, so comparing
//! the destination's counters against the source snapshot's gives a ratio.
//! The destination is still being written, so the ratio is a best-effort
//! snapshot, clamped to `[0, 1]`.

use std::path::Path;

use grovefs_client::{FsClient, RecursiveStats};
use grovefs_types::Result;

/// Completion ratio of a copy from `src` to `dst`, in `[0.0, 1.0]`.
///
/// If either side's counters are unavailable (already reclaimed) or the
/// source is empty, the ratio is defined as `0.0`; there is never a division
/// by zero and never a value above `1.0`.
pub async fn copy_ratio(fs: &dyn FsClient, src: &Path, dst: &Path) -> Result<f64> {
    let src_stats = match fs.recursive_stats(src).await {
        Ok(stats) => stats,
        Err(status) if status.is_not_found() => return Ok(0.0),
        Err(status) => return Err(status),
    };
    let dst_stats = match fs.recursive_stats(dst).await {
        Ok(stats) => stats,
        Err(status) if status.is_not_found() => return Ok(0.0),
        Err(status) => return Err(status),
    };

    if src_stats.bytes == 0 {
        return Ok(0.0);
    }
    Ok((dst_stats.bytes as f64 / src_stats.bytes as f64).clamp(0.0, 1.0))
}

/// Detailed copy statistics for one clone, for operator display.
#[derive(Debug, Clone, Copy, Default)]
pub struct CloneStats {
    pub bytes_total: u64,
    pub bytes_copied: u64,
    pub files_total: u64,
    pub files_copied: u64,
}

impl CloneStats {
    pub fn percent(&self) -> f64 {
        if self.bytes_total == 0 {
            return 0.0;
        }
        (self.bytes_copied as f64 / self.bytes_total as f64).clamp(0.0, 1.0) * 100.0
    }

    /// One-line report like `"42.50% (1.5 GB/3.52 GB, 120/300 files)"`.
    pub fn report(&self) -> String {
        format!(
            "{:.2}% ({}/{}, {}/{} files)",
            self.percent(),
            format_size(self.bytes_copied),
            format_size(self.bytes_total),
            format_count(self.files_copied),
            format_count(self.files_total),
        )
    }
}

/// Gather [`CloneStats`] for one source/destination pair.
pub async fn clone_stats(fs: &dyn FsClient, src: &Path, dst: &Path) -> Result<CloneStats> {
    let src_stats = fs.recursive_stats(src).await?;
    let dst_stats = match fs.recursive_stats(dst).await {
        Ok(stats) => stats,
        Err(status) if status.is_not_found() => RecursiveStats::default(),
        Err(status) => return Err(status),
    };

    Ok(CloneStats {
        bytes_total: src_stats.bytes,
        bytes_copied: dst_stats.bytes,
        files_total: src_stats.files,
        files_copied: dst_stats.files,
    })
}

const SIZE_UNITS: [&str; 7] = ["B", "KB", "MB", "GB", "TB", "PB", "EB"];
const COUNT_UNITS: [&str; 5] = ["", "K", "M", "B", "T"];

fn scaled(value: u64, step: f64, units: &[&str]) -> String {
    if (value as f64) < step {
        return match units[0] {
            "" => format!("{}", value),
            unit => format!("{} {}", value, unit),
        };
    }

    let mut v = value as f64;
    let mut i = 0;
    while v >= step && i < units.len() - 1 {
        v /= step;
        i += 1;
    }

    let s = format!("{:.2}", v);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    match units[i] {
        "" => s.to_string(),
        unit => format!("{} {}", s, unit),
    }
}

/// Byte size in human-readable form, 1024-based: `"1.5 GB"`.
pub fn format_size(bytes: u64) -> String {
    scaled(bytes, 1024.0, &SIZE_UNITS)
}

/// Plain count in human-readable form, 1000-based: `"1.2 M"`.
pub fn format_count(n: u64) -> String {
    scaled(n, 1000.0, &COUNT_UNITS)
}
