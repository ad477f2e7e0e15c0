//! Mock filesystem for testing collectors without a real `/proc`.

mod filesystem;
mod scenarios;

pub use filesystem::MockFs;
pub use scenarios::{STATSD_UDP6_TABLE, STATSD_UDP_TABLE, UDP_TABLE_HEADER};
