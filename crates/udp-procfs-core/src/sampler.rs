//! The periodic sampling loop: read both UDP tables, reconcile the drop
//! totals, push the results to the sink, sleep, repeat.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::collector::procfs::{SampleOutcome, SocketTableReader};
use crate::collector::traits::FileSystem;
use crate::metrics::MetricsSink;
use crate::models::{ProcessIdentity, Protocol};
use crate::reconcile::SampleReconciler;

/// Default time between the end of one tick and the start of the next.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(10);

/// Granularity at which the sleep between ticks checks for shutdown.
const SLEEP_SLICE: Duration = Duration::from_millis(100);

/// What one tick did for one protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolSample {
    pub protocol: Protocol,
    /// Value written to the queued gauge.
    pub queued: u64,
    /// Kernel drop total observed; 0 when the table was not sampled.
    pub dropped_total: u64,
    /// Value added to the dropped counter.
    pub delta: u64,
    /// `SampleOutcome::kind` of the read.
    pub outcome: &'static str,
}

/// Per-protocol results of one tick, in sampling order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub samples: Vec<ProtocolSample>,
}

impl TickReport {
    pub fn get(&self, protocol: Protocol) -> Option<&ProtocolSample> {
        self.samples.iter().find(|s| s.protocol == protocol)
    }
}

/// Drives sampling for one resolved process.
pub struct SamplingLoop<F: FileSystem, S: MetricsSink> {
    reader: SocketTableReader<F>,
    identity: ProcessIdentity,
    sink: S,
    reconciler: SampleReconciler,
    interval: Duration,
    ticks: u64,
}

impl<F: FileSystem, S: MetricsSink> SamplingLoop<F, S> {
    pub fn new(
        reader: SocketTableReader<F>,
        identity: ProcessIdentity,
        sink: S,
        interval: Duration,
    ) -> Self {
        Self {
            reader,
            identity,
            sink,
            reconciler: SampleReconciler::new(),
            interval,
            ticks: 0,
        }
    }

    pub fn identity(&self) -> &ProcessIdentity {
        &self.identity
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn reconciler(&self) -> &SampleReconciler {
        &self.reconciler
    }

    /// Number of ticks completed so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Runs one sampling iteration over every protocol, sequentially.
    ///
    /// A table that cannot be read or parsed exports a zero gauge and a zero
    /// delta and leaves the drop baseline untouched; the other protocol is
    /// sampled as usual.
    pub fn tick(&mut self) -> TickReport {
        let mut report = TickReport::default();

        for protocol in Protocol::ALL {
            let outcome = self.reader.sample(&self.identity, protocol);
            let totals = outcome.totals();

            let delta = match outcome {
                SampleOutcome::Sampled(_) => self.reconciler.reconcile(protocol, totals.dropped),
                SampleOutcome::Unavailable(_) | SampleOutcome::Malformed(_) => 0,
            };

            self.sink.set_queued(protocol, totals.queued);
            self.sink.add_dropped(protocol, delta);

            report.samples.push(ProtocolSample {
                protocol,
                queued: totals.queued,
                dropped_total: totals.dropped,
                delta,
                outcome: outcome.kind(),
            });
        }

        self.ticks += 1;
        report
    }

    /// Ticks until `running` is cleared.
    ///
    /// The next tick starts `interval` after the previous one finished, so
    /// slow reads shift the schedule rather than bunching ticks up.
    pub fn run(&mut self, running: &AtomicBool) {
        info!(
            pid = self.identity.pid,
            name = %self.identity.name,
            interval_secs = self.interval.as_secs_f64(),
            "starting sampling loop"
        );

        while running.load(Ordering::SeqCst) {
            let t0 = Instant::now();
            let report = self.tick();

            for sample in &report.samples {
                debug!(
                    protocol = %sample.protocol,
                    queued = sample.queued,
                    dropped_total = sample.dropped_total,
                    delta = sample.delta,
                    outcome = sample.outcome,
                    duration_us = t0.elapsed().as_micros() as u64,
                    tick = self.ticks,
                    "tick completed"
                );
            }

            let mut remaining = self.interval;
            while remaining > Duration::ZERO && running.load(Ordering::SeqCst) {
                let sleep_time = remaining.min(SLEEP_SLICE);
                std::thread::sleep(sleep_time);
                remaining = remaining.saturating_sub(sleep_time);
            }
        }

        info!(ticks = self.ticks, "sampling loop stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::mock::{MockFs, UDP_TABLE_HEADER};
    use crate::metrics::{PrometheusSink, RecordingSink};
    use std::sync::Arc;
    use std::thread;

    fn table(queue: &str, drops: u64) -> String {
        format!(
            "{}\n  133: 00000000:1FBD 00000000:0000 07 {} 00:00000000 00000000     0        0 25013 2 0000000000000000 {}\n",
            UDP_TABLE_HEADER, queue, drops
        )
    }

    fn statsd_loop(fs: MockFs) -> SamplingLoop<MockFs, Arc<RecordingSink>> {
        SamplingLoop::new(
            SocketTableReader::new(fs, "/proc"),
            ProcessIdentity::resolved("statsd", 4242),
            Arc::new(RecordingSink::new()),
            DEFAULT_INTERVAL,
        )
    }

    #[test]
    fn test_tick_samples_both_protocols() {
        let mut sampler = statsd_loop(MockFs::statsd_host());

        let report = sampler.tick();
        assert_eq!(report.samples.len(), 2);
        assert_eq!(report.samples[0].protocol, Protocol::Udp);
        assert_eq!(report.samples[1].protocol, Protocol::Udp6);

        let sink = sampler.sink();
        assert_eq!(sink.queued(Protocol::Udp), 512);
        assert_eq!(sink.dropped(Protocol::Udp), 42);
        assert_eq!(sink.queued(Protocol::Udp6), 16);
        assert_eq!(sink.dropped(Protocol::Udp6), 5);
        assert_eq!(sampler.ticks(), 1);
    }

    #[test]
    fn test_consecutive_ticks_add_deltas() {
        let mut fs = MockFs::statsd_host();
        fs.add_socket_table(4242, Protocol::Udp, table("0A:0000", 5));
        let reader_fs = fs.clone();
        let mut sampler = statsd_loop(reader_fs);

        let first = sampler.tick();
        assert_eq!(
            first.get(Protocol::Udp),
            Some(&ProtocolSample {
                protocol: Protocol::Udp,
                queued: 10,
                dropped_total: 5,
                delta: 5,
                outcome: "sampled",
            })
        );

        fs.add_socket_table(4242, Protocol::Udp, table("0A:0000", 8));
        sampler.reader = SocketTableReader::new(fs, "/proc");

        let second = sampler.tick();
        assert_eq!(second.get(Protocol::Udp).map(|s| s.delta), Some(3));
        assert_eq!(sampler.sink().dropped(Protocol::Udp), 8);
    }

    #[test]
    fn test_reset_clamps_and_rebases() {
        let mut fs = MockFs::statsd_host();
        let mut dropped = Vec::new();
        let mut sampler = statsd_loop(fs.clone());

        for total in [100u64, 40, 45] {
            fs.add_socket_table(4242, Protocol::Udp, table("00:0000", total));
            sampler.reader = SocketTableReader::new(fs.clone(), "/proc");
            let report = sampler.tick();
            dropped.push(report.get(Protocol::Udp).map(|s| s.delta));
        }

        assert_eq!(dropped, vec![Some(100), Some(0), Some(5)]);
        assert_eq!(sampler.sink().dropped(Protocol::Udp), 105);
        assert_eq!(sampler.reconciler().state().baseline(Protocol::Udp), 45);
    }

    #[test]
    fn test_failed_table_is_zero_tick_and_keeps_baseline() {
        let mut fs = MockFs::statsd_host();
        let mut sampler = statsd_loop(fs.clone());
        sampler.tick();

        fs.remove_file("/proc/4242/net/udp");
        fs.add_socket_table(4242, Protocol::Udp6, format!("{}\nnot a row\n", UDP_TABLE_HEADER));
        sampler.reader = SocketTableReader::new(fs.clone(), "/proc");
        let report = sampler.tick();

        let udp = report.get(Protocol::Udp).unwrap();
        assert_eq!((udp.queued, udp.delta, udp.outcome), (0, 0, "unavailable"));
        let udp6 = report.get(Protocol::Udp6).unwrap();
        assert_eq!((udp6.queued, udp6.delta, udp6.outcome), (0, 0, "malformed"));
        assert_eq!(sampler.sink().queued(Protocol::Udp), 0);
        assert_eq!(sampler.reconciler().state().baseline(Protocol::Udp), 42);

        // The table comes back unchanged: nothing is counted twice.
        sampler.reader = SocketTableReader::new(MockFs::statsd_host(), "/proc");
        let report = sampler.tick();
        assert_eq!(report.get(Protocol::Udp).map(|s| s.delta), Some(0));
        assert_eq!(sampler.sink().dropped(Protocol::Udp), 42);
        assert_eq!(sampler.sink().dropped(Protocol::Udp6), 5);
    }

    #[test]
    fn test_tick_with_prometheus_sink() {
        let sink = Arc::new(PrometheusSink::new().unwrap());
        let mut sampler = SamplingLoop::new(
            SocketTableReader::new(MockFs::statsd_host(), "/proc"),
            ProcessIdentity::resolved("statsd", 4242),
            sink.clone(),
            DEFAULT_INTERVAL,
        );
        sampler.tick();
        sampler.tick();

        assert_eq!(sink.queued(Protocol::Udp), 512);
        assert_eq!(sink.dropped(Protocol::Udp), 42);
        let text = sink.encode().unwrap();
        assert!(text.contains("statsd_exporter_udp_buffer_dropped{protocol=\"udp6\"} 5"));
    }

    #[test]
    fn test_run_stops_when_flag_cleared() {
        let running = Arc::new(AtomicBool::new(true));
        let handle = {
            let running = running.clone();
            thread::spawn(move || {
                let mut sampler = SamplingLoop::new(
                    SocketTableReader::new(MockFs::statsd_host(), "/proc"),
                    ProcessIdentity::resolved("statsd", 4242),
                    RecordingSink::new(),
                    Duration::from_millis(5),
                );
                sampler.run(&running);
                sampler
            })
        };

        thread::sleep(Duration::from_millis(50));
        running.store(false, Ordering::SeqCst);
        let sampler = handle.join().unwrap();

        assert!(sampler.ticks() >= 1);
        // Counters only reflect the first tick's totals; later ticks add zero.
        assert_eq!(sampler.sink().dropped(Protocol::Udp), 42);
    }

    #[test]
    fn test_run_not_started_when_flag_clear() {
        let running = AtomicBool::new(false);
        let mut sampler = statsd_loop(MockFs::statsd_host());
        sampler.run(&running);
        assert_eq!(sampler.ticks(), 0);
    }
}
