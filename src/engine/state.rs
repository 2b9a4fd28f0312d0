// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;

use crate::notes::{PadIndex, PAD_COUNT};

/// A pad transition, published after the engine has updated its state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PadEvent {
    Started(PadIndex),
    Stopped(PadIndex),
}

impl PadEvent {
    pub fn pad(&self) -> PadIndex {
        match self {
            PadEvent::Started(pad) | PadEvent::Stopped(pad) => *pad,
        }
    }
}

/// The observable sounding flag of every pad.
///
/// Only the engine writes here, and only while holding its voice lock, so a
/// reader never sees a pad flip without the matching event following it.
pub struct PadState {
    sounding: [AtomicBool; PAD_COUNT],
    subscribers: Mutex<Vec<Sender<PadEvent>>>,
}

impl PadState {
    pub(super) fn new() -> PadState {
        PadState {
            sounding: std::array::from_fn(|_| AtomicBool::new(false)),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// True while the pad is held down and its voice is playing.
    pub fn is_sounding(&self, pad: PadIndex) -> bool {
        self.sounding[pad.get()].load(Ordering::Acquire)
    }

    /// The sounding flag of every pad, by index.
    pub fn snapshot(&self) -> [bool; PAD_COUNT] {
        std::array::from_fn(|i| self.sounding[i].load(Ordering::Acquire))
    }

    /// Number of pads currently sounding.
    pub fn sounding_count(&self) -> usize {
        self.snapshot().iter().filter(|s| **s).count()
    }

    /// Subscribes to pad events. Events arrive in the order they happened.
    /// Dropping the receiver unsubscribes.
    pub fn subscribe(&self) -> Receiver<PadEvent> {
        let (tx, rx) = crossbeam_channel::unbounded();
        self.subscribers.lock().push(tx);
        rx
    }

    pub(super) fn set(&self, pad: PadIndex, sounding: bool) {
        self.sounding[pad.get()].store(sounding, Ordering::Release);
    }

    pub(super) fn publish(&self, event: PadEvent) {
        self.subscribers.lock().retain(|tx| tx.send(event).is_ok());
    }

    #[cfg(test)]
    fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pad(index: usize) -> PadIndex {
        PadIndex::new(index).unwrap()
    }

    #[test]
    fn test_snapshot_reflects_flags() {
        let state = PadState::new();
        assert_eq!(state.snapshot(), [false; PAD_COUNT]);

        state.set(pad(3), true);
        state.set(pad(15), true);
        let snapshot = state.snapshot();
        assert!(snapshot[3] && snapshot[15]);
        assert_eq!(state.sounding_count(), 2);
        assert!(state.is_sounding(pad(3)));
        assert!(!state.is_sounding(pad(4)));

        state.set(pad(3), false);
        assert_eq!(state.sounding_count(), 1);
    }

    #[test]
    fn test_events_arrive_in_order() {
        let state = PadState::new();
        let rx = state.subscribe();

        state.publish(PadEvent::Started(pad(0)));
        state.publish(PadEvent::Started(pad(1)));
        state.publish(PadEvent::Stopped(pad(0)));

        let events: Vec<PadEvent> = rx.try_iter().collect();
        assert_eq!(
            events,
            vec![
                PadEvent::Started(pad(0)),
                PadEvent::Started(pad(1)),
                PadEvent::Stopped(pad(0)),
            ]
        );
        assert_eq!(events[2].pad(), pad(0));
    }

    #[test]
    fn test_dropped_subscribers_are_pruned() {
        let state = PadState::new();
        let kept = state.subscribe();
        drop(state.subscribe());
        assert_eq!(state.subscriber_count(), 2);

        state.publish(PadEvent::Started(pad(2)));
        assert_eq!(state.subscriber_count(), 1);
        assert_eq!(kept.try_recv(), Ok(PadEvent::Started(pad(2))));
    }
}
