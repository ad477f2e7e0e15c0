//! Per-tick sampling of `/proc/[pid]/net/udp` and `/proc/[pid]/net/udp6`.

use crate::collector::procfs::parser::{ParseError, parse_socket_table};
use crate::collector::traits::FileSystem;
use crate::models::{ProcessIdentity, Protocol, SocketTotals};
use tracing::{debug, warn};

/// Result of sampling one socket table.
///
/// Failures stay distinguishable here and collapse to zero totals only at
/// the export boundary via [`SampleOutcome::totals`].
#[derive(Debug)]
pub enum SampleOutcome {
    /// Every row parsed.
    Sampled(SocketTotals),
    /// The table could not be read, e.g. the process exited.
    Unavailable(std::io::Error),
    /// A row did not parse; the partial sum was discarded.
    Malformed(ParseError),
}

impl SampleOutcome {
    /// Totals to export for this tick: the parsed sums, or (0, 0) on failure.
    pub fn totals(&self) -> SocketTotals {
        match self {
            SampleOutcome::Sampled(totals) => *totals,
            SampleOutcome::Unavailable(_) | SampleOutcome::Malformed(_) => SocketTotals::default(),
        }
    }

    /// Short name of the outcome for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            SampleOutcome::Sampled(_) => "sampled",
            SampleOutcome::Unavailable(_) => "unavailable",
            SampleOutcome::Malformed(_) => "malformed",
        }
    }

    pub fn is_sampled(&self) -> bool {
        matches!(self, SampleOutcome::Sampled(_))
    }
}

/// Reads and parses socket tables for a resolved process.
pub struct SocketTableReader<F: FileSystem> {
    fs: F,
    proc_path: String,
}

impl<F: FileSystem> SocketTableReader<F> {
    /// Creates a new reader rooted at `proc_path` (usually "/proc").
    pub fn new(fs: F, proc_path: impl Into<String>) -> Self {
        Self {
            fs,
            proc_path: proc_path.into(),
        }
    }

    /// Samples the `protocol` table of `identity`. Never fails; problems are
    /// reported through the outcome and logged.
    pub fn sample(&self, identity: &ProcessIdentity, protocol: Protocol) -> SampleOutcome {
        let path = identity.socket_table_path(&self.proc_path, protocol);

        let content = match self.fs.read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "socket table unavailable");
                return SampleOutcome::Unavailable(e);
            }
        };

        match parse_socket_table(&content) {
            Ok(totals) => SampleOutcome::Sampled(totals),
            Err(e) => {
                warn!(path = %path.display(), %protocol, error = %e, "unable to parse UDP buffers");
                SampleOutcome::Malformed(e)
            }
        }
    }
}
