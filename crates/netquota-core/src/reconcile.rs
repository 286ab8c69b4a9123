// ── Counter reconciliation ──
//
// Raw interface counters restart from zero when the interface is re-created
// or the host reboots. Any decrease is taken to mean such a restart: the
// previous reading is credited in full and the new reading counts from zero.
// A counter that wraps at a non-zero modulus, or an unrelated driver reset,
// cannot be told apart from this and is treated the same way.

use crate::model::{AccountingState, CounterGain, Sample};

/// Bytes gained on one counter between two raw readings.
pub fn counter_gain(last: u64, current: u64) -> u64 {
    if current < last {
        last.saturating_add(current)
    } else {
        current - last
    }
}

/// Fold `sample` into the running totals of `state`.
///
/// Receive and transmit are handled independently. `last_*` always ends up
/// holding the raw sample.
pub fn reconcile(state: &mut AccountingState, sample: Sample) -> CounterGain {
    let gain = CounterGain {
        received: counter_gain(state.last_received, sample.received),
        transmitted: counter_gain(state.last_transmitted, sample.transmitted),
    };

    state.total_received = state.total_received.saturating_add(gain.received);
    state.total_transmitted = state.total_transmitted.saturating_add(gain.transmitted);
    state.last_received = sample.received;
    state.last_transmitted = sample.transmitted;

    gain
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{counter_gain, reconcile};
    use crate::model::{AccountingState, CounterGain, Sample};

    fn sample(received: u64, transmitted: u64) -> Sample {
        Sample {
            received,
            transmitted,
        }
    }

    #[test]
    fn monotonic_counters_sum_deltas() {
        let mut state = AccountingState::default();
        let raw = [100_u64, 250, 250, 1_000, 4_096];

        for r in raw {
            reconcile(&mut state, sample(r, r / 2));
        }

        // With a zero starting point the deltas telescope to the last reading.
        assert_eq!(state.total_received, 4_096);
        assert_eq!(state.total_transmitted, 2_048);
        assert_eq!(state.last_received, 4_096);
        assert_eq!(state.last_transmitted, 2_048);
    }

    #[test]
    fn deltas_are_relative_to_persisted_last_values() {
        let mut state = AccountingState {
            total_received: 10_000,
            last_received: 700,
            ..AccountingState::default()
        };

        let gain = reconcile(&mut state, sample(900, 0));

        assert_eq!(gain.received, 200);
        assert_eq!(state.total_received, 10_200);
    }

    #[test]
    fn reboot_credits_previous_epoch() {
        let mut state = AccountingState {
            last_received: 500,
            last_transmitted: 40,
            ..AccountingState::default()
        };

        let gain = reconcile(&mut state, sample(100, 60));

        assert_eq!(
            gain,
            CounterGain {
                received: 600,
                transmitted: 20,
            }
        );
        assert_eq!(state.total_received, 600);
        assert_eq!(state.total_transmitted, 20);
        assert_eq!(state.last_received, 100);
        assert_eq!(state.last_transmitted, 60);
    }

    #[test]
    fn reset_to_exact_zero_credits_last_value() {
        assert_eq!(counter_gain(1_234, 0), 1_234);
    }

    #[test]
    fn unchanged_counter_gains_nothing() {
        assert_eq!(counter_gain(42, 42), 0);
    }

    #[test]
    fn totals_saturate_instead_of_overflowing() {
        let mut state = AccountingState {
            total_received: u64::MAX - 1,
            last_received: 0,
            ..AccountingState::default()
        };

        reconcile(&mut state, sample(10, 0));

        assert_eq!(state.total_received, u64::MAX);
    }

    #[test]
    fn mixed_sequence_with_reboot() {
        let mut state = AccountingState::default();
        let mut gained = 0_u64;
        for r in [100_u64, 300, 50, 80] {
            gained += reconcile(&mut state, sample(r, 0)).received;
        }

        // 100 + 200 + (300 + 50) + 30
        assert_eq!(gained, 680);
        assert_eq!(state.total_received, 680);
    }
}
