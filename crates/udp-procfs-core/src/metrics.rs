//! Metrics sinks: where each tick's queued gauge and dropped delta go.
//!
//! [`PrometheusSink`] is the production sink, read concurrently by the HTTP
//! endpoint while the sampling loop writes. [`RecordingSink`] keeps plain
//! values for tests.

use std::collections::HashMap;
use std::sync::Mutex;

use prometheus::{Encoder, IntCounterVec, IntGaugeVec, Opts, Registry, TextEncoder};

use crate::models::Protocol;

pub const QUEUED_METRIC: &str = "statsd_exporter_udp_buffer_queued";
pub const DROPPED_METRIC: &str = "statsd_exporter_udp_buffer_dropped";

/// Receives per-tick updates from the sampling loop.
///
/// Implementations must tolerate concurrent readers while the loop writes.
pub trait MetricsSink: Send + Sync {
    /// Overwrites the current queued gauge for `protocol`.
    fn set_queued(&self, protocol: Protocol, queued: u64);

    /// Adds `delta` to the cumulative dropped counter for `protocol`.
    fn add_dropped(&self, protocol: Protocol, delta: u64);
}

impl<S: MetricsSink + ?Sized> MetricsSink for std::sync::Arc<S> {
    fn set_queued(&self, protocol: Protocol, queued: u64) {
        (**self).set_queued(protocol, queued)
    }

    fn add_dropped(&self, protocol: Protocol, delta: u64) {
        (**self).add_dropped(protocol, delta)
    }
}

/// Error type for metric registration and encoding failures.
#[derive(Debug)]
pub enum SinkError {
    Prometheus(prometheus::Error),
    Encoding(std::string::FromUtf8Error),
}

impl std::fmt::Display for SinkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SinkError::Prometheus(e) => write!(f, "prometheus error: {}", e),
            SinkError::Encoding(e) => write!(f, "metrics are not valid UTF-8: {}", e),
        }
    }
}

impl std::error::Error for SinkError {}

impl From<prometheus::Error> for SinkError {
    fn from(e: prometheus::Error) -> Self {
        SinkError::Prometheus(e)
    }
}

impl From<std::string::FromUtf8Error> for SinkError {
    fn from(e: std::string::FromUtf8Error) -> Self {
        SinkError::Encoding(e)
    }
}

/// Prometheus-backed sink with its own registry.
#[derive(Clone)]
pub struct PrometheusSink {
    registry: Registry,
    queued: IntGaugeVec,
    dropped: IntCounterVec,
}

impl PrometheusSink {
    /// Creates and registers both metric families. Every protocol label is
    /// initialised at zero so the series are visible before the first tick.
    pub fn new() -> Result<Self, SinkError> {
        let registry = Registry::new();

        let queued = IntGaugeVec::new(
            Opts::new(
                QUEUED_METRIC,
                "The number of queued UDP messages in the linux buffer.",
            ),
            &["protocol"],
        )?;
        let dropped = IntCounterVec::new(
            Opts::new(
                DROPPED_METRIC,
                "The number of dropped UDP messages in the linux buffer",
            ),
            &["protocol"],
        )?;

        registry.register(Box::new(queued.clone()))?;
        registry.register(Box::new(dropped.clone()))?;

        for protocol in Protocol::ALL {
            queued.with_label_values(&[protocol.as_str()]).set(0);
            dropped.with_label_values(&[protocol.as_str()]).reset();
        }

        Ok(Self {
            registry,
            queued,
            dropped,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn queued(&self, protocol: Protocol) -> i64 {
        self.queued.with_label_values(&[protocol.as_str()]).get()
    }

    pub fn dropped(&self, protocol: Protocol) -> u64 {
        self.dropped.with_label_values(&[protocol.as_str()]).get()
    }

    /// Renders the registry in the Prometheus text exposition format.
    pub fn encode(&self) -> Result<String, SinkError> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    /// Content type matching [`PrometheusSink::encode`].
    pub fn content_type(&self) -> String {
        TextEncoder::new().format_type().to_string()
    }
}

impl MetricsSink for PrometheusSink {
    fn set_queued(&self, protocol: Protocol, queued: u64) {
        let value = i64::try_from(queued).unwrap_or(i64::MAX);
        self.queued.with_label_values(&[protocol.as_str()]).set(value);
    }

    fn add_dropped(&self, protocol: Protocol, delta: u64) {
        self.dropped
            .with_label_values(&[protocol.as_str()])
            .inc_by(delta);
    }
}

/// In-memory sink for tests.
#[derive(Debug, Default)]
pub struct RecordingSink {
    queued: Mutex<HashMap<Protocol, u64>>,
    dropped: Mutex<HashMap<Protocol, u64>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queued(&self, protocol: Protocol) -> u64 {
        self.queued
            .lock()
            .map(|m| m.get(&protocol).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    pub fn dropped(&self, protocol: Protocol) -> u64 {
        self.dropped
            .lock()
            .map(|m| m.get(&protocol).copied().unwrap_or(0))
            .unwrap_or(0)
    }
}

impl MetricsSink for RecordingSink {
    fn set_queued(&self, protocol: Protocol, queued: u64) {
        if let Ok(mut m) = self.queued.lock() {
            m.insert(protocol, queued);
        }
    }

    fn add_dropped(&self, protocol: Protocol, delta: u64) {
        if let Ok(mut m) = self.dropped.lock() {
            *m.entry(protocol).or_insert(0) += delta;
        }
    }
}
