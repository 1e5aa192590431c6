//! Events queued on the transport, keyed by beat position

use crate::types::chord_symbol::PitchSet;
use crate::types::time::Time;
use std::cmp::Ordering;

/// An action due at an absolute beat from the start of playback
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledEvent {
    pub beat: Time,
    pub action: ScheduledAction,
    /// Cancellation generation the event was queued under
    pub generation: u64,
}

impl ScheduledEvent {
    pub fn new(beat: Time, action: ScheduledAction, generation: u64) -> Self {
        Self {
            beat,
            action,
            generation,
        }
    }
}

impl PartialOrd for ScheduledEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduledEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap behavior (earliest first). On the same
        // beat, triggers come out before a stop.
        other
            .beat
            .cmp(&self.beat)
            .then_with(|| other.action.rank().cmp(&self.action.rank()))
    }
}

/// What the transport does when an event comes due
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduledAction {
    /// Sound these pitches for the given number of beats
    Trigger {
        pitches: PitchSet,
        duration_beats: Time,
    },
    /// Halt the transport
    Stop,
}

impl ScheduledAction {
    fn rank(&self) -> u8 {
        match self {
            ScheduledAction::Trigger { .. } => 0,
            ScheduledAction::Stop => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::time::{beats, time};
    use std::collections::BinaryHeap;

    #[test]
    fn test_scheduled_event_ordering() {
        let mut heap = BinaryHeap::new();
        heap.push(ScheduledEvent::new(beats(2), ScheduledAction::Stop, 0));
        heap.push(ScheduledEvent::new(
            time(1, 4),
            ScheduledAction::Trigger {
                pitches: PitchSet::new(vec![]),
                duration_beats: time(1, 5),
            },
            0,
        ));
        heap.push(ScheduledEvent::new(beats(1), ScheduledAction::Stop, 0));

        assert_eq!(heap.pop().map(|e| e.beat), Some(time(1, 4)));
        assert_eq!(heap.pop().map(|e| e.beat), Some(beats(1)));
        assert_eq!(heap.pop().map(|e| e.beat), Some(beats(2)));
    }

    #[test]
    fn test_trigger_before_stop_on_same_beat() {
        let trigger = ScheduledAction::Trigger {
            pitches: PitchSet::new(vec![]),
            duration_beats: time(1, 5),
        };
        let mut heap = BinaryHeap::new();
        heap.push(ScheduledEvent::new(beats(1), ScheduledAction::Stop, 0));
        heap.push(ScheduledEvent::new(beats(1), trigger.clone(), 0));
        heap.push(ScheduledEvent::new(beats(1), trigger.clone(), 0));

        let actions: Vec<ScheduledAction> = std::iter::from_fn(|| heap.pop().map(|e| e.action)).collect();
        assert_eq!(actions, vec![trigger.clone(), trigger, ScheduledAction::Stop]);
    }
}
