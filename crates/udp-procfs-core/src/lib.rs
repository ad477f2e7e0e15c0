//! udp-procfs-core — UDP socket buffer sampling for a single process.
//!
//! Provides:
//! - `collector` — `/proc` access (real and mock), process discovery and
//!   socket-table parsing
//! - `reconcile` — turns kernel drop totals into non-negative deltas
//! - `sampler` — the periodic sampling loop
//! - `metrics` — the metrics sink trait and its Prometheus implementation
//! - `models` — shared data types (protocols, process identity, totals)

pub mod collector;
pub mod metrics;
pub mod models;
pub mod reconcile;
pub mod sampler;

/// Crate version, shared with the exporter binary.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
