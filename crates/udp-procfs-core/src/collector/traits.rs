//! Filesystem access behind a trait so the collectors can run against the
//! real `/proc` or an in-memory tree.

use std::io;
use std::path::{Path, PathBuf};

use tracing::trace;

/// Read-only filesystem operations needed by the collectors.
pub trait FileSystem: Send + Sync {
    /// Reads the entire contents of a file as a string.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Lists the entries of a directory as full paths.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>>;
}

impl<F: FileSystem + ?Sized> FileSystem for &F {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        (**self).read_to_string(path)
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        (**self).read_dir(path)
    }
}

/// Filesystem implementation that delegates to `std::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealFs;

impl RealFs {
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for RealFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    /// Entries come back in directory-listing order. Entries that fail to
    /// read are skipped; only a failure to open `path` itself is an error.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let entries = std::fs::read_dir(path)?;
        Ok(readable_entries(
            path,
            entries.map(|entry| entry.map(|e| e.path())),
        ))
    }
}

/// Keeps the entries that listed cleanly.
fn readable_entries(
    dir: &Path,
    entries: impl IntoIterator<Item = io::Result<PathBuf>>,
) -> Vec<PathBuf> {
    entries
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(e) => {
                trace!(dir = %dir.display(), error = %e, "skipping unreadable directory entry");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_real_fs_read_to_string() {
        let dir = tempfile::tempdir().unwrap();
        let status = dir.path().join("status");
        fs::write(&status, "Name:\tstatsd\n").unwrap();

        let content = RealFs::new().read_to_string(&status).unwrap();
        assert_eq!(content, "Name:\tstatsd\n");
    }

    #[test]
    fn test_real_fs_read_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("1")).unwrap();
        fs::create_dir(dir.path().join("2")).unwrap();
        fs::write(dir.path().join("uptime"), "1.0 2.0\n").unwrap();

        let mut entries = RealFs::new().read_dir(dir.path()).unwrap();
        entries.sort();
        assert_eq!(
            entries,
            vec![
                dir.path().join("1"),
                dir.path().join("2"),
                dir.path().join("uptime")
            ]
        );
    }

    #[test]
    fn test_unreadable_entries_are_skipped() {
        let entries = vec![
            Ok(PathBuf::from("/proc/1")),
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied")),
            Ok(PathBuf::from("/proc/4242")),
            Err(io::Error::new(io::ErrorKind::NotFound, "exited")),
        ];

        assert_eq!(
            readable_entries(Path::new("/proc"), entries),
            vec![PathBuf::from("/proc/1"), PathBuf::from("/proc/4242")]
        );
    }

    #[test]
    fn test_real_fs_read_dir_missing_dir() {
        let err = RealFs::new()
            .read_dir(Path::new("/nonexistent/path/12345"))
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_real_fs_missing_path() {
        let err = RealFs::new()
            .read_to_string(Path::new("/nonexistent/path/12345"))
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
