/// How a sequence number relates to the ones accepted before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The very first packet.
    First,
    /// Exactly the packet after the last accepted one.
    Next,
    /// Ahead of the expected packet; `lost` packets were skipped.
    Gap { lost: u16 },
    /// Same as the last accepted packet.
    Duplicate,
    /// Behind the last accepted packet.
    OutOfOrder,
}

impl Verdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::First | Verdict::Next | Verdict::Gap { .. })
    }
}

/// Tracks the last accepted 16-bit RTP sequence number.
///
/// Comparison is done in serial number arithmetic: a number is considered
/// behind the expected one when it lies within the half of the sequence
/// space preceding it. This keeps the tracker working across the wrap from
/// 65535 to 0, also when packets around the wrap were lost.
#[derive(Debug, Default, Clone)]
pub struct SequenceTracker {
    last: Option<u16>,
}

impl SequenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<u16> {
        self.last
    }

    /// Judges `seq` and, if it is accepted, makes it the last accepted
    /// number.
    pub fn track(&mut self, seq: u16) -> Verdict {
        let verdict = match self.last {
            None => Verdict::First,
            Some(last) if seq == last => Verdict::Duplicate,
            Some(last) => {
                let expected = last.wrapping_add(1);
                match seq.wrapping_sub(expected) {
                    0 => Verdict::Next,
                    ahead if ahead < 0x8000 => Verdict::Gap { lost: ahead },
                    _ => Verdict::OutOfOrder,
                }
            }
        };

        if verdict.is_accepted() {
            self.last = Some(seq);
        }
        verdict
    }
}

#[cfg(test)]
mod tests {

    use super::{SequenceTracker, Verdict};

    #[test]
    fn first_packet_is_accepted() {
        let mut tracker = SequenceTracker::new();
        assert_eq!(tracker.last(), None);
        assert_eq!(tracker.track(0), Verdict::First);
        assert_eq!(tracker.last(), Some(0));
    }

    #[test]
    fn in_order_sequence() {
        let mut tracker = SequenceTracker::new();
        let verdicts = (100..105).map(|seq| tracker.track(seq)).collect::<Vec<_>>();
        assert_eq!(verdicts[0], Verdict::First);
        assert!(verdicts[1..].iter().all(|verdict| *verdict == Verdict::Next));
    }

    #[test]
    fn duplicate_is_dropped() {
        let mut tracker = SequenceTracker::new();
        tracker.track(7);
        assert_eq!(tracker.track(7), Verdict::Duplicate);
        assert_eq!(tracker.last(), Some(7));
    }

    #[test]
    fn older_packet_is_dropped() {
        let mut tracker = SequenceTracker::new();
        tracker.track(7);
        assert_eq!(tracker.track(6), Verdict::OutOfOrder);
        assert_eq!(tracker.last(), Some(7));
        assert_eq!(tracker.track(8), Verdict::Next);
    }

    #[test]
    fn gap_is_reported() {
        let mut tracker = SequenceTracker::new();
        tracker.track(7);
        assert_eq!(tracker.track(9), Verdict::Gap { lost: 1 });
        assert_eq!(tracker.last(), Some(9));
    }

    #[test]
    fn wraps_around() {
        let mut tracker = SequenceTracker::new();
        tracker.track(65534);
        assert_eq!(tracker.track(65535), Verdict::Next);
        assert_eq!(tracker.track(0), Verdict::Next);
        assert_eq!(tracker.track(65535), Verdict::OutOfOrder);
    }

    #[test]
    fn gap_across_wrap() {
        let mut tracker = SequenceTracker::new();
        tracker.track(65534);
        assert_eq!(tracker.track(1), Verdict::Gap { lost: 2 });
        assert_eq!(tracker.track(2), Verdict::Next);
    }
}
