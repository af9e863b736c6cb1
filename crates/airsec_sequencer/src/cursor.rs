// SPDX-License-Identifier: MIT OR Apache-2.0
//! Clock-free bookkeeping of which stages of a run have fired.

use crate::sequence::Sequence;
use std::ops::Range;
use std::time::Duration;

/// Position of a run within its sequence.
///
/// Stages before `next` have fired; the cursor only moves forward, so a
/// stage can be handed out at most once per cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageCursor {
    next: usize,
}

impl StageCursor {
    /// Cursor positioned before the first stage
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stages already handed out
    pub fn fired(&self) -> usize {
        self.next
    }

    /// Whether every stage has been handed out
    pub fn is_finished(&self, sequence: &Sequence) -> bool {
        self.next >= sequence.len()
    }

    /// Offset of the next stage to fire
    pub fn next_offset(&self, sequence: &Sequence) -> Option<Duration> {
        sequence.stages().get(self.next).map(|s| s.offset)
    }

    /// Move past every stage due at `elapsed`, returning their indices.
    ///
    /// Stages sharing an offset are returned together in declared order.
    pub fn advance(&mut self, sequence: &Sequence, elapsed: Duration) -> Range<usize> {
        let start = self.next;
        let due = sequence.stages()[start.min(sequence.len())..]
            .iter()
            .take_while(|s| s.offset <= elapsed)
            .count();
        self.next = start + due;
        start..self.next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::Stage;

    fn tied() -> Sequence {
        Sequence::from_stages(
            "tied",
            [
                Stage::at_millis("s1", "one", 0),
                Stage::at_millis("s2", "two", 700),
                Stage::at_millis("s3", "three", 700),
                Stage::at_millis("s4", "four", 1400),
                Stage::at_millis("s5", "five", 2100),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_advance_batches_ties() {
        let sequence = tied();
        let mut cursor = StageCursor::new();

        assert_eq!(cursor.advance(&sequence, Duration::ZERO), 0..1);
        let next = cursor.next_offset(&sequence);
        assert_eq!(next, Some(Duration::from_millis(700)));
        assert_eq!(cursor.advance(&sequence, Duration::from_millis(699)), 1..1);
        assert_eq!(cursor.advance(&sequence, Duration::from_millis(700)), 1..3);
        assert_eq!(cursor.fired(), 3);
    }

    #[test]
    fn test_advance_catches_up_late_ticks() {
        let sequence = tied();
        let mut cursor = StageCursor::new();

        assert_eq!(cursor.advance(&sequence, Duration::from_secs(5)), 0..5);
        assert!(cursor.is_finished(&sequence));
        assert_eq!(cursor.next_offset(&sequence), None);
        assert_eq!(cursor.advance(&sequence, Duration::from_secs(10)), 5..5);
    }
}
