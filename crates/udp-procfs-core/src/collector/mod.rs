//! `/proc` access for the UDP exporter.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                       collector                          │
//! │  ┌────────────────────┐   ┌───────────────────────────┐  │
//! │  │  ProcessLocator    │   │   SocketTableReader       │  │
//! │  │  - /proc/[pid]/    │   │  - /proc/[pid]/net/udp    │  │
//! │  │    status          │   │  - /proc/[pid]/net/udp6   │  │
//! │  └─────────┬──────────┘   └─────────────┬─────────────┘  │
//! │            └──────────────┬─────────────┘                │
//! │                    ┌──────▼──────┐                       │
//! │                    │  FileSystem │ (trait)               │
//! │                    └──────┬──────┘                       │
//! └───────────────────────────┼──────────────────────────────┘
//!                    ┌────────┴────────┐
//!             ┌──────▼──────┐   ┌──────▼──────┐
//!             │   RealFs    │   │   MockFs    │
//!             │  (Linux)    │   │  (Testing)  │
//!             └─────────────┘   └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```
//! use udp_procfs_core::collector::{MockFs, ProcessLocator, SocketTableReader};
//! use udp_procfs_core::models::Protocol;
//!
//! let fs = MockFs::statsd_host();
//! let identity = ProcessLocator::new(&fs, "/proc").locate("statsd").unwrap();
//! let reader = SocketTableReader::new(&fs, "/proc");
//! let totals = reader.sample(&identity, Protocol::Udp).totals();
//! assert_eq!(totals.queued, 0x200);
//! ```

pub mod mock;
pub mod procfs;
pub mod traits;

pub use mock::MockFs;
pub use procfs::{
    LocateError, ParseError, ProcessLocator, SampleOutcome, SocketTableReader,
    parse_socket_table,
};
pub use traits::{FileSystem, RealFs};
