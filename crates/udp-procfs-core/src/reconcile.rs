//! Reconciliation of cumulative kernel drop counters into exported deltas.
//!
//! The kernel's per-socket drop counts only grow while a socket lives, but
//! the table-wide sum can go backwards when sockets close or the process
//! restarts. Exported counters must never decrease, so a regression is
//! clamped to a zero delta and the baseline moves to the new total.

use std::collections::HashMap;

use tracing::warn;

use crate::models::Protocol;

// ---------------------------------------------------------------------------
// Delta helpers
// ---------------------------------------------------------------------------

/// Compute u64 delta, returning `None` on counter regression (reset).
pub fn delta(current: u64, prior: u64) -> Option<u64> {
    current.checked_sub(prior)
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Last observed drop total per protocol.
///
/// A protocol without an entry has a baseline of zero, so the first tick
/// exports the full kernel total.
#[derive(Debug, Default, Clone)]
pub struct ReconcilerState {
    last_dropped: HashMap<Protocol, u64>,
}

impl ReconcilerState {
    pub fn baseline(&self, protocol: Protocol) -> u64 {
        self.last_dropped.get(&protocol).copied().unwrap_or(0)
    }
}

/// Turns successive drop totals into non-negative deltas.
///
/// Must be fed exactly once per protocol per tick; a second call with the
/// same sample would compute against a baseline it already consumed.
#[derive(Debug, Default)]
pub struct SampleReconciler {
    state: ReconcilerState,
}

impl SampleReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ReconcilerState {
        &self.state
    }

    /// Returns the delta to add to the exported counter for `protocol` and
    /// moves the baseline to `current`.
    pub fn reconcile(&mut self, protocol: Protocol, current: u64) -> u64 {
        let prior = self.state.baseline(protocol);
        self.state.last_dropped.insert(protocol, current);

        match delta(current, prior) {
            Some(d) => d,
            None => {
                warn!(
                    %protocol,
                    previous = prior,
                    current,
                    "dropped count went backwards, rebasing"
                );
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delta() {
        assert_eq!(delta(8, 5), Some(3));
        assert_eq!(delta(5, 5), Some(0));
        assert_eq!(delta(40, 100), None);
    }

    #[test]
    fn test_untouched_protocol_has_zero_baseline() {
        let mut reconciler = SampleReconciler::new();
        reconciler.reconcile(Protocol::Udp, 12);

        assert_eq!(reconciler.state().baseline(Protocol::Udp), 12);
        assert_eq!(reconciler.state().baseline(Protocol::Udp6), 0);
    }

    #[test]
    fn test_first_tick_uses_zero_baseline() {
        let mut reconciler = SampleReconciler::new();
        assert_eq!(reconciler.reconcile(Protocol::Udp, 5), 5);
        assert_eq!(reconciler.state().baseline(Protocol::Udp), 5);
    }

    #[test]
    fn test_non_decreasing_sequence_sums_to_span() {
        let totals = [7u64, 7, 9, 15, 15, 16, 120];
        let mut reconciler = SampleReconciler::new();
        reconciler.reconcile(Protocol::Udp, totals[0]);

        let applied: u64 = totals[1..]
            .iter()
            .map(|&t| reconciler.reconcile(Protocol::Udp, t))
            .sum();
        assert_eq!(applied, totals[totals.len() - 1] - totals[0]);
    }

    #[test]
    fn test_regression_clamps_and_rebases() {
        let mut reconciler = SampleReconciler::new();
        reconciler.reconcile(Protocol::Udp, 100);

        assert_eq!(reconciler.reconcile(Protocol::Udp, 40), 0);
        assert_eq!(reconciler.state().baseline(Protocol::Udp), 40);
        assert_eq!(reconciler.reconcile(Protocol::Udp, 45), 5);
    }

    #[test]
    fn test_regression_does_not_retrigger() {
        let mut reconciler = SampleReconciler::new();
        reconciler.reconcile(Protocol::Udp6, 100);
        reconciler.reconcile(Protocol::Udp6, 10);

        // Holding at the new baseline yields zero deltas, not repeated clamps.
        assert_eq!(reconciler.reconcile(Protocol::Udp6, 10), 0);
        assert_eq!(reconciler.reconcile(Protocol::Udp6, 11), 1);
    }

    #[test]
    fn test_exported_counter_never_decreases() {
        let totals = [3u64, 9, 2, 0, 50, 49, 49, 60, 1];
        let mut reconciler = SampleReconciler::new();
        let mut exported = 0u64;
        let mut history = Vec::new();

        for t in totals {
            exported += reconciler.reconcile(Protocol::Udp, t);
            history.push(exported);
        }

        assert!(history.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(exported, 3 + 6 + 50 + 11);
    }

    #[test]
    fn test_protocols_are_independent() {
        let mut reconciler = SampleReconciler::new();
        reconciler.reconcile(Protocol::Udp, 100);
        reconciler.reconcile(Protocol::Udp6, 3);

        assert_eq!(reconciler.reconcile(Protocol::Udp, 50), 0);
        assert_eq!(reconciler.reconcile(Protocol::Udp6, 4), 1);
        assert_eq!(reconciler.state().baseline(Protocol::Udp), 50);
    }
}
