//! Configuration and pure predicates for the four flush triggers.
//!
//! The wall-clock side of the trigger clock (tracking `last_sent_at`) lives
//! in `simplemux-core::clock`, which calls into the predicates here with an
//! already-computed elapsed time. Keeping the predicates pure (no
//! `std::time::Instant`) is what makes them unit-testable in this `no_std`
//! crate without a fake clock.

use alloc::vec::Vec;

use derive_more::Display;

/// "Effectively infinite" sentinel for `timeout`/`period`: a value this
/// large means the trigger is treated as disabled.
pub const SENTINEL_US: u64 = 100_000_000;

/// Upper bound on `limit_packets`.
pub const MAX_LIMIT_PACKETS: u32 = 100;

/// Immutable trigger configuration, resolved once at startup.
#[derive(Debug, Clone, Copy)]
pub struct TriggersConfig {
    /// Packet-count trigger: flush once the buffer holds this many packets.
    pub limit_packets: u32,
    /// Size trigger: flush once the buffer exceeds this many bytes.
    pub size_threshold: usize,
    /// Idle-timeout trigger, in microseconds.
    pub timeout_us: u64,
    /// Hard-period trigger, in microseconds.
    pub period_us: u64,
}

impl TriggersConfig {
    /// Resolve a configuration from raw CLI-style inputs, applying the §3
    /// defaulting invariant:
    ///
    /// - if any of `{size_threshold, timeout, period}` is tightened from its
    ///   sentinel and `limit_packets` was left at 0, `limit_packets` becomes
    ///   100;
    /// - if *none* of the four is set, `limit_packets` becomes 1 (send
    ///   immediately).
    #[must_use]
    pub fn resolve(
        limit_packets: u32,
        size_threshold: usize,
        timeout_us: u64,
        period_us: u64,
        mtu: usize,
    ) -> Self {
        let default_size_threshold = mtu.saturating_sub(28);
        let size_tightened = size_threshold < default_size_threshold;
        let timeout_tightened = timeout_us < SENTINEL_US;
        let period_tightened = period_us < SENTINEL_US;

        let limit_packets = if limit_packets != 0 {
            limit_packets
        } else if size_tightened || timeout_tightened || period_tightened {
            MAX_LIMIT_PACKETS
        } else {
            1
        };

        Self {
            limit_packets,
            size_threshold,
            timeout_us,
            period_us,
        }
    }

    /// `true` if the timeout trigger can never fire because the period
    /// trigger always wins first.
    #[must_use]
    pub fn timeout_dominated(&self) -> bool {
        self.timeout_us >= self.period_us
    }
}

/// Which trigger fired, in tie-break order:
/// `numpacket_limit`, `size_limit`, `timeout`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum FlushReason {
    /// `buf.count() == limit_packets`
    #[display("numpacket_limit")]
    NumpacketLimit,
    /// `buf.size() > size_threshold`
    #[display("size_limit")]
    SizeLimit,
    /// `now - last_sent_at > timeout`
    #[display("timeout")]
    Timeout,
    /// The hard period elapsed with nothing else to report (only produced by
    /// the wall-clock half in `simplemux-core`, on an empty-tick flush).
    #[display("period")]
    Period,
}

/// Evaluate the disjunctive trigger predicate.
///
/// Returns every reason that currently holds, in tie-break order. Empty if
/// none hold. This predicate is monotone in `count`, `size`, and
/// `elapsed_us`: once any reason is true it stays true until the caller
/// flushes (nothing here can make it false again on its own).
#[must_use]
pub fn should_flush(
    config: &TriggersConfig,
    count: usize,
    size: usize,
    elapsed_us: u64,
) -> Vec<FlushReason> {
    let mut reasons = Vec::with_capacity(3);
    if count == config.limit_packets as usize {
        reasons.push(FlushReason::NumpacketLimit);
    }
    if size > config.size_threshold {
        reasons.push(FlushReason::SizeLimit);
    }
    if elapsed_us > config.timeout_us {
        reasons.push(FlushReason::Timeout);
    }
    reasons
}

/// Microseconds remaining until the hard period elapses.
#[must_use]
pub fn time_until_period(period_us: u64, elapsed_since_last_sent_us: u64) -> u64 {
    period_us.saturating_sub(elapsed_since_last_sent_us)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaulting_none_set_sends_immediately() {
        let cfg = TriggersConfig::resolve(0, 1472, SENTINEL_US, SENTINEL_US, 1500);
        assert_eq!(cfg.limit_packets, 1);
    }

    #[test]
    fn defaulting_size_tightened_sets_limit_to_100() {
        let cfg = TriggersConfig::resolve(0, 1000, SENTINEL_US, SENTINEL_US, 1500);
        assert_eq!(cfg.limit_packets, 100);
    }

    #[test]
    fn defaulting_explicit_limit_is_preserved() {
        let cfg = TriggersConfig::resolve(3, 1472, SENTINEL_US, SENTINEL_US, 1500);
        assert_eq!(cfg.limit_packets, 3);
    }

    #[test]
    fn timeout_dominated_when_not_less_than_period() {
        let cfg = TriggersConfig::resolve(3, 1472, 100, 100, 1500);
        assert!(cfg.timeout_dominated());
        let cfg = TriggersConfig::resolve(3, 1472, 50, 100, 1500);
        assert!(!cfg.timeout_dominated());
    }

    #[test]
    fn should_flush_reports_numpacket_limit() {
        let cfg = TriggersConfig::resolve(3, 1472, SENTINEL_US, SENTINEL_US, 1500);
        let reasons = should_flush(&cfg, 3, 10, 0);
        assert_eq!(reasons, alloc::vec![FlushReason::NumpacketLimit]);
    }

    #[test]
    fn should_flush_can_report_multiple_reasons_at_once() {
        let cfg = TriggersConfig {
            limit_packets: 3,
            size_threshold: 50,
            timeout_us: 100,
            period_us: SENTINEL_US,
        };
        let reasons = should_flush(&cfg, 3, 60, 200);
        assert_eq!(
            reasons,
            alloc::vec![
                FlushReason::NumpacketLimit,
                FlushReason::SizeLimit,
                FlushReason::Timeout
            ]
        );
    }

    #[test]
    fn should_flush_is_empty_when_nothing_fires() {
        let cfg = TriggersConfig::resolve(3, 1472, SENTINEL_US, SENTINEL_US, 1500);
        let reasons = should_flush(&cfg, 1, 10, 0);
        assert!(reasons.is_empty());
    }

    #[test]
    fn time_until_period_never_negative() {
        assert_eq!(time_until_period(100, 200), 0);
        assert_eq!(time_until_period(100, 40), 60);
    }
}
