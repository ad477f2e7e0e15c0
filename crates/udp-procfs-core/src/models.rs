//! Shared data types passed between the collector, reconciler and sink.

use std::fmt;
use std::path::PathBuf;

/// Socket-table family sampled for the target process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Protocol {
    Udp,
    Udp6,
}

impl Protocol {
    /// Every protocol, in the order a tick samples them.
    pub const ALL: [Protocol; 2] = [Protocol::Udp, Protocol::Udp6];

    /// Label value used for exported metrics.
    pub fn as_str(self) -> &'static str {
        match self {
            Protocol::Udp => "udp",
            Protocol::Udp6 => "udp6",
        }
    }

    /// File name of the table under `/proc/[pid]/net/`.
    pub fn table_file(self) -> &'static str {
        self.as_str()
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The process being watched, resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessIdentity {
    pub name: String,
    pub pid: u32,
    pub resolved: bool,
}

impl ProcessIdentity {
    /// Identity for a process found by a scan.
    pub fn resolved(name: impl Into<String>, pid: u32) -> Self {
        Self {
            name: name.into(),
            pid,
            resolved: true,
        }
    }

    /// Path of the socket table for `protocol`, e.g. `/proc/42/net/udp6`.
    pub fn socket_table_path(&self, proc_path: &str, protocol: Protocol) -> PathBuf {
        PathBuf::from(format!(
            "{}/{}/net/{}",
            proc_path,
            self.pid,
            protocol.table_file()
        ))
    }
}

/// Per-protocol sums over every row of one socket-table snapshot.
///
/// `queued` is a point-in-time occupancy; `dropped` is the kernel's
/// cumulative drop count and may go backwards across kernel-side resets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SocketTotals {
    pub queued: u64,
    pub dropped: u64,
}
