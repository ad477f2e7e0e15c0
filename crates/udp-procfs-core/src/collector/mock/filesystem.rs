//! In-memory mock filesystem.
//!
//! `MockFs` simulates a `/proc` tree in memory so collector tests run on any
//! platform. Directory listings come back in sorted path order, which makes
//! "first match in scan order" deterministic.

use crate::collector::traits::FileSystem;
use crate::models::Protocol;
use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};

/// In-memory filesystem for testing.
#[derive(Debug, Clone, Default)]
pub struct MockFs {
    /// Map from path to file contents.
    files: BTreeMap<PathBuf, String>,
    /// Set of directories (for read_dir support).
    directories: BTreeSet<PathBuf>,
    /// Paths that exist but fail to read, like a status file of a process
    /// owned by another user.
    denied: BTreeSet<PathBuf>,
}

impl MockFs {
    /// Creates a new empty mock filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file with the given content.
    ///
    /// Parent directories are automatically created.
    pub fn add_file(&mut self, path: impl AsRef<Path>, content: impl Into<String>) {
        let path = path.as_ref().to_path_buf();
        self.add_parents(&path);
        self.files.insert(path, content.into());
    }

    /// Adds an empty directory.
    pub fn add_dir(&mut self, path: impl AsRef<Path>) {
        let path = path.as_ref().to_path_buf();
        self.add_parents(&path);
        self.directories.insert(path);
    }

    /// Adds a file that is listed by `read_dir` but fails with
    /// `PermissionDenied` when read.
    pub fn add_denied_file(&mut self, path: impl AsRef<Path>) {
        let path = path.as_ref().to_path_buf();
        self.add_parents(&path);
        self.denied.insert(path);
    }

    /// Removes a file, simulating a process that exited or a table that
    /// vanished between ticks.
    pub fn remove_file(&mut self, path: impl AsRef<Path>) {
        self.files.remove(path.as_ref());
    }

    /// Adds `/proc/[pid]/status` for a process with the given name.
    pub fn add_process(&mut self, pid: u32, name: &str) {
        self.add_file(
            format!("/proc/{}/status", pid),
            format!(
                "Name:\t{}\nUmask:\t0022\nState:\tS (sleeping)\nTgid:\t{}\nNgid:\t0\nPid:\t{}\nPPid:\t1\nUid:\t0\t0\t0\t0\nGid:\t0\t0\t0\t0\nThreads:\t4\n",
                name, pid, pid
            ),
        );
    }

    /// Sets `/proc/[pid]/net/<protocol>` to `content`, replacing any
    /// previous table.
    pub fn add_socket_table(&mut self, pid: u32, protocol: Protocol, content: impl Into<String>) {
        self.add_file(
            format!("/proc/{}/net/{}", pid, protocol.table_file()),
            content,
        );
    }

    fn add_parents(&mut self, path: &Path) {
        let mut parent = path.parent();
        while let Some(p) = parent {
            if !p.as_os_str().is_empty() {
                self.directories.insert(p.to_path_buf());
            }
            parent = p.parent();
        }
    }
}

impl FileSystem for MockFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        if self.denied.contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("permission denied: {:?}", path),
            ));
        }
        self.files.get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("file not found: {:?}", path),
            )
        })
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        if !self.directories.contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("directory not found: {:?}", path),
            ));
        }

        let is_child = |p: &&PathBuf| p.parent().is_some_and(|parent| parent == path);

        let entries: BTreeSet<PathBuf> = self
            .files
            .keys()
            .chain(self.directories.iter())
            .chain(self.denied.iter())
            .filter(is_child)
            .cloned()
            .collect();

        Ok(entries.into_iter().collect())
    }
}
