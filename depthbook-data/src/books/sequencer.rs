use serde::{Deserialize, Serialize};
use tracing::warn;

/// Forward gap between the sequence number expected next and the one received.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize)]
pub struct Drift {
    pub expected: u64,
    pub got: u64,
}

/// Tracks the last observed update sequence number and flags forward gaps as [`Drift`].
///
/// A recorded [`Drift`] is sticky: it survives in-order updates and is only replaced by a newer
/// gap or cleared by [`SequenceTracker::reset`]. No resynchronisation is attempted.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub struct SequenceTracker {
    last: Option<u64>,
    drift: Option<Drift>,
}

impl SequenceTracker {
    /// Observe the sequence number of the next update, returning the current [`Drift`] state.
    ///
    /// ### Observe Scenarios
    /// 1. First observation since construction or reset: baseline, no drift
    /// 2. `sequence == last + 1`: in order
    /// 3. `sequence > last + 1`: gap, drift recorded
    /// 4. `sequence <= last`: duplicate or late, baseline moves without drift
    pub fn observe(&mut self, sequence: u64) -> Option<Drift> {
        if let Some(last) = self.last {
            let expected = last.saturating_add(1);
            if sequence > expected {
                warn!(expected, got = sequence, "order book sequence drift detected");
                self.drift = Some(Drift {
                    expected,
                    got: sequence,
                });
            }
        }

        self.last = Some(sequence);
        self.drift
    }

    pub fn last(&self) -> Option<u64> {
        self.last
    }

    pub fn drift(&self) -> Option<Drift> {
        self.drift
    }

    /// Forget the baseline and any recorded [`Drift`].
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_tracker_observe() {
        struct TestCase {
            sequences: Vec<u64>,
            expected_drift: Option<Drift>,
            expected_last: Option<u64>,
        }

        let tests = vec![
            TestCase {
                // TC0: no observations
                sequences: vec![],
                expected_drift: None,
                expected_last: None,
            },
            TestCase {
                // TC1: first observation is the baseline
                sequences: vec![42],
                expected_drift: None,
                expected_last: Some(42),
            },
            TestCase {
                // TC2: forward gap
                sequences: vec![5, 7],
                expected_drift: Some(Drift {
                    expected: 6,
                    got: 7,
                }),
                expected_last: Some(7),
            },
            TestCase {
                // TC3: duplicate
                sequences: vec![5, 5],
                expected_drift: None,
                expected_last: Some(5),
            },
            TestCase {
                // TC4: late update moves the baseline back
                sequences: vec![7, 5],
                expected_drift: None,
                expected_last: Some(5),
            },
            TestCase {
                // TC5: drift is sticky across in-order updates
                sequences: vec![5, 7, 8, 9],
                expected_drift: Some(Drift {
                    expected: 6,
                    got: 7,
                }),
                expected_last: Some(9),
            },
            TestCase {
                // TC6: a newer gap replaces the old drift
                sequences: vec![1, 3, 4, 10],
                expected_drift: Some(Drift {
                    expected: 5,
                    got: 10,
                }),
                expected_last: Some(10),
            },
            TestCase {
                // TC7: no overflow at the end of the sequence space
                sequences: vec![u64::MAX, u64::MAX],
                expected_drift: None,
                expected_last: Some(u64::MAX),
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let mut tracker = SequenceTracker::default();
            for sequence in test.sequences {
                tracker.observe(sequence);
            }
            assert_eq!(tracker.drift(), test.expected_drift, "TC{} failed", index);
            assert_eq!(tracker.last(), test.expected_last, "TC{} failed", index);
        }
    }

    #[test]
    fn test_sequence_tracker_reset() {
        let mut tracker = SequenceTracker::default();
        tracker.observe(5);
        tracker.observe(7);
        assert!(tracker.drift().is_some());

        tracker.reset();
        assert_eq!(tracker, SequenceTracker::default());

        // Next observation after reset is a fresh baseline
        assert_eq!(tracker.observe(100), None);
    }
}
