//! Parsers for `/proc` files.
//!
//! These are pure functions over file content, testable with plain strings.

use crate::models::SocketTotals;

/// Column of `tx_queue:rx_queue` in a socket-table row.
const QUEUE_FIELD: usize = 4;
/// Column of the cumulative per-socket drop count.
const DROPS_FIELD: usize = 12;

/// Error type for parsing failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// 1-based line number of the offending row.
    pub line: usize,
    pub message: String,
}

impl ParseError {
    pub fn new(line: usize, msg: impl Into<String>) -> Self {
        Self {
            line,
            message: msg.into(),
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "parse error at line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for ParseError {}

/// Extracts the process name from `/proc/[pid]/status` content.
///
/// Only the first line is considered and it must look like `Name:\t<name>`.
/// Returns `None` for anything else.
pub fn parse_status_name(content: &str) -> Option<&str> {
    let first = content.lines().next()?;
    let rest = first.strip_prefix("Name:")?;
    Some(rest.strip_prefix('\t').unwrap_or(rest))
}

/// Parses `/proc/[pid]/net/udp` or `/proc/[pid]/net/udp6` content into
/// totals across all sockets.
///
/// Format (one header line, then one row per socket):
/// ```text
///    sl  local_address rem_address   st tx_queue rx_queue tr tm->when retrnsmt   uid  timeout inode ref pointer drops
///   133: 00000000:1FBD 00000000:0000 07 00000180:00000000 00:00000000 00000000   998        0 25013 2 ffff8a0c3b2e1000 12
/// ```
///
/// The queued contribution of a row is the hex value left of the `:` in
/// field 4; the drop contribution is the decimal field 12.
///
/// A single malformed row fails the whole table: no partial sums are
/// returned, so a kernel format change cannot export half-accumulated
/// totals.
pub fn parse_socket_table(content: &str) -> Result<SocketTotals, ParseError> {
    let mut totals = SocketTotals::default();

    for (idx, line) in content.lines().enumerate().skip(1) {
        let line_no = idx + 1;
        if line.trim().is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() <= DROPS_FIELD {
            return Err(ParseError::new(
                line_no,
                format!(
                    "expected at least {} fields, got {}",
                    DROPS_FIELD + 1,
                    fields.len()
                ),
            ));
        }

        let (tx_queue, _rx_queue) = fields[QUEUE_FIELD].split_once(':').ok_or_else(|| {
            ParseError::new(
                line_no,
                format!("queue field {:?} is not tx:rx", fields[QUEUE_FIELD]),
            )
        })?;
        let queued = u32::from_str_radix(tx_queue, 16).map_err(|e| {
            ParseError::new(line_no, format!("invalid tx_queue {:?}: {}", tx_queue, e))
        })?;

        let dropped: u64 = fields[DROPS_FIELD].parse().map_err(|e| {
            ParseError::new(
                line_no,
                format!("invalid drops {:?}: {}", fields[DROPS_FIELD], e),
            )
        })?;

        totals.queued = totals.queued.saturating_add(u64::from(queued));
        totals.dropped = totals.dropped.saturating_add(dropped);
    }

    Ok(totals)
}
