//! Readers for the Linux `/proc` files the exporter depends on.
//!
//! - `parser` — pure parsers for `status` and `net/udp{,6}` content
//! - `locator` — one-shot PID lookup by process name
//! - `socket_table` — per-tick socket-table sampling with explicit outcomes

pub mod locator;
pub mod parser;
pub mod socket_table;

pub use locator::{LocateError, ProcessLocator};
pub use parser::{ParseError, parse_socket_table, parse_status_name};
pub use socket_table::{SampleOutcome, SocketTableReader};
