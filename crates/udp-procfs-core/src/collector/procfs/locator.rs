//! One-shot lookup of a PID by process name from `/proc/[pid]/status`.

use crate::collector::procfs::parser::parse_status_name;
use crate::collector::traits::FileSystem;
use crate::models::ProcessIdentity;
use std::path::Path;
use tracing::{debug, trace};

/// Error type for process discovery. Both variants are fatal at startup.
#[derive(Debug)]
pub enum LocateError {
    /// No process with this name was found after a full scan.
    NotFound { name: String },
    /// The proc root itself could not be listed.
    Io(std::io::Error),
}

impl std::fmt::Display for LocateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LocateError::NotFound { name } => {
                write!(f, "unable to find proc with the name: {}", name)
            }
            LocateError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for LocateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LocateError::Io(e) => Some(e),
            LocateError::NotFound { .. } => None,
        }
    }
}

impl From<std::io::Error> for LocateError {
    fn from(e: std::io::Error) -> Self {
        LocateError::Io(e)
    }
}

/// Resolves a process name to a PID by scanning the proc root.
pub struct ProcessLocator<F: FileSystem> {
    fs: F,
    proc_path: String,
}

impl<F: FileSystem> ProcessLocator<F> {
    /// Creates a new locator.
    ///
    /// # Arguments
    /// * `fs` - Filesystem implementation (real or mock)
    /// * `proc_path` - Base path to proc filesystem (usually "/proc")
    pub fn new(fs: F, proc_path: impl Into<String>) -> Self {
        Self {
            fs,
            proc_path: proc_path.into(),
        }
    }

    /// Finds the first process whose registered name equals `name`.
    ///
    /// Entries are visited in directory-listing order, so with several
    /// identically-named processes the winner is implementation-defined.
    /// Entries that cannot be read or whose status is malformed are
    /// skipped; processes come and go while the scan runs.
    pub fn locate(&self, name: &str) -> Result<ProcessIdentity, LocateError> {
        let entries = self.fs.read_dir(Path::new(&self.proc_path))?;

        for entry in entries {
            let Some(pid) = entry
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(|n| n.parse::<u32>().ok())
            else {
                continue;
            };

            let status_path = entry.join("status");
            let content = match self.fs.read_to_string(&status_path) {
                Ok(content) => content,
                Err(e) => {
                    trace!(pid, error = %e, "skipping unreadable status");
                    continue;
                }
            };

            match parse_status_name(&content) {
                Some(found) if found == name => {
                    debug!(pid, name, "matched process");
                    return Ok(ProcessIdentity::resolved(name, pid));
                }
                Some(_) => {}
                None => trace!(pid, "skipping malformed status"),
            }
        }

        Err(LocateError::NotFound {
            name: name.to_string(),
        })
    }
}
