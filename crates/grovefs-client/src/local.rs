//! Local-disk implementation of [`FsClient`].
//!
//! Backs the admin tooling and the test suite. Recursive counters are
//! computed by walking, since a plain filesystem does not maintain them;
//! entries vanishing mid-walk are skipped, matching the cluster contract
//! under concurrent deletion.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use grovefs_types::{FsCode, Result, Status, StatusCode};

use crate::fs::{DirEntry, EntryKind, FsClient, RecursiveStats};

/// [`FsClient`] over the local filesystem.
#[derive(Debug, Default, Clone)]
pub struct LocalFsClient;

impl LocalFsClient {
    pub fn new() -> Self {
        Self
    }
}

fn map_io_err(e: io::Error, path: &Path) -> Status {
    let code = match e.kind() {
        io::ErrorKind::NotFound => FsCode::NOT_FOUND,
        io::ErrorKind::PermissionDenied => FsCode::NO_PERMISSION,
        io::ErrorKind::AlreadyExists => FsCode::EXISTS,
        _ => StatusCode::IO_ERROR,
    };
    Status::with_message(code, format!("{}: {}", path.display(), e))
}

#[cfg(unix)]
fn entry_ctime(meta: &fs::Metadata) -> DateTime<Utc> {
    use std::os::unix::fs::MetadataExt;
    DateTime::from_timestamp(meta.ctime(), meta.ctime_nsec() as u32).unwrap_or_default()
}

#[cfg(not(unix))]
fn entry_ctime(meta: &fs::Metadata) -> DateTime<Utc> {
    meta.modified().map(DateTime::from).unwrap_or_default()
}

#[async_trait]
impl FsClient for LocalFsClient {
    async fn rename(&self, src: &Path, dst: &Path) -> Result<()> {
        fs::rename(src, dst).map_err(|e| map_io_err(e, src))
    }

    async fn symlink(&self, target: &Path, link: &Path) -> Result<()> {
        #[cfg(unix)]
        return std::os::unix::fs::symlink(target, link).map_err(|e| map_io_err(e, link));

        #[cfg(not(unix))]
        return grovefs_types::make_error_msg(
            StatusCode::NOT_IMPLEMENTED,
            "symlinks are only supported on unix",
        );
    }

    async fn read_link(&self, link: &Path) -> Result<PathBuf> {
        fs::read_link(link).map_err(|e| map_io_err(e, link))
    }

    async fn unlink(&self, path: &Path) -> Result<()> {
        fs::remove_file(path).map_err(|e| map_io_err(e, path))
    }

    async fn rmdir(&self, path: &Path) -> Result<()> {
        fs::remove_dir(path).map_err(|e| map_io_err(e, path))
    }

    async fn mkdirs(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path).map_err(|e| map_io_err(e, path))
    }

    async fn read_dir(&self, path: &Path) -> Result<Vec<DirEntry>> {
        let rd = fs::read_dir(path).map_err(|e| map_io_err(e, path))?;

        let mut entries = Vec::new();
        for entry in rd {
            let entry = match entry {
                Ok(e) => e,
                // The directory changed under us; present what we saw.
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(map_io_err(e, path)),
            };

            let name = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(_) => {
                    tracing::warn!(
                        path = %entry.path().display(),
                        "Skipping non-UTF8 entry name"
                    );
                    continue;
                }
            };

            // DirEntry::metadata does not follow symlinks.
            let meta = match entry.metadata() {
                Ok(m) => m,
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(map_io_err(e, &entry.path())),
            };

            let kind = if meta.file_type().is_symlink() {
                EntryKind::Symlink
            } else if meta.is_dir() {
                EntryKind::Directory
            } else {
                EntryKind::File
            };

            entries.push(DirEntry {
                name,
                kind,
                ctime: entry_ctime(&meta),
            });
        }

        Ok(entries)
    }

    async fn recursive_stats(&self, path: &Path) -> Result<RecursiveStats> {
        // Probe the root first so a missing path is NOT_FOUND rather than zeros.
        fs::symlink_metadata(path).map_err(|e| map_io_err(e, path))?;

        let mut stats = RecursiveStats::default();
        let mut pending = vec![path.to_path_buf()];

        while let Some(dir) = pending.pop() {
            let rd = match fs::read_dir(&dir) {
                Ok(rd) => rd,
                // Reclaimed while we were walking.
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(map_io_err(e, &dir)),
            };

            for entry in rd {
                let entry = match entry {
                    Ok(e) => e,
                    Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                    Err(e) => return Err(map_io_err(e, &dir)),
                };
                let meta = match entry.metadata() {
                    Ok(m) => m,
                    Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                    Err(e) => return Err(map_io_err(e, &entry.path())),
                };

                if meta.file_type().is_symlink() {
                    stats.files += 1;
                } else if meta.is_dir() {
                    stats.subdirs += 1;
                    pending.push(entry.path());
                } else {
                    stats.files += 1;
                    stats.bytes += meta.len();
                }
            }
        }

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("grovefs-test-local-{}", name));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[tokio::test]
    async fn test_read_dir_kinds() {
        let dir = scratch_dir("read-dir");
        fs::create_dir(dir.join("sub")).unwrap();
        fs::write(dir.join("data"), b"abc").unwrap();
        std::os::unix::fs::symlink(dir.join("data"), dir.join("ln")).unwrap();

        let fs_client = LocalFsClient::new();
        let mut entries = fs_client.read_dir(&dir).await.unwrap();
        entries.sort_by(|a, b| a.name.cmp(&b.name));

        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].name, "data");
        assert_eq!(entries[0].kind, EntryKind::File);
        assert_eq!(entries[1].name, "ln");
        assert_eq!(entries[1].kind, EntryKind::Symlink);
        assert_eq!(entries[2].name, "sub");
        assert_eq!(entries[2].kind, EntryKind::Directory);

        let _ = fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_read_dir_missing_is_not_found() {
        let fs_client = LocalFsClient::new();
        let err = fs_client
            .read_dir(Path::new("/nonexistent/grovefs/dir"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_recursive_stats_counts() {
        let dir = scratch_dir("rstats");
        fs::create_dir_all(dir.join("a/b")).unwrap();
        fs::write(dir.join("a/f1"), b"12345").unwrap();
        fs::write(dir.join("a/b/f2"), b"1234567890").unwrap();

        let fs_client = LocalFsClient::new();
        let stats = fs_client.recursive_stats(&dir).await.unwrap();
        assert_eq!(stats.bytes, 15);
        assert_eq!(stats.files, 2);
        assert_eq!(stats.subdirs, 2);

        let _ = fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_recursive_stats_missing_root() {
        let fs_client = LocalFsClient::new();
        let err = fs_client
            .recursive_stats(Path::new("/nonexistent/grovefs/root"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_rename_and_symlink_roundtrip() {
        let dir = scratch_dir("rename");
        fs::write(dir.join("old"), b"x").unwrap();

        let fs_client = LocalFsClient::new();
        fs_client
            .rename(&dir.join("old"), &dir.join("new"))
            .await
            .unwrap();
        assert!(!dir.join("old").exists());
        assert!(dir.join("new").exists());

        fs_client
            .symlink(&dir.join("new"), &dir.join("ref"))
            .await
            .unwrap();
        let target = fs_client.read_link(&dir.join("ref")).await.unwrap();
        assert_eq!(target, dir.join("new"));

        // A dangling link still reads back; that race is benign for callers.
        fs_client.unlink(&dir.join("new")).await.unwrap();
        let target = fs_client.read_link(&dir.join("ref")).await.unwrap();
        assert_eq!(target, dir.join("new"));

        let _ = fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_unlink_missing_is_not_found() {
        let fs_client = LocalFsClient::new();
        let err = fs_client
            .unlink(Path::new("/nonexistent/grovefs/file"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
