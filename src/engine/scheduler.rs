//! Timestamped parameter events travelling from control code to the renderer.

use rtrb::{Consumer, Producer, PushError, RingBuffer};
use tracing::warn;

use super::UnitId;

/// Capacity of the control → render event ring.
pub const EVENT_QUEUE_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Frequency,
    Cutoff,
    Gain,
}

/// "Set `param` of `unit` to `value` at device frame `frame`."
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamEvent {
    pub unit: UnitId,
    pub param: ParamKind,
    pub value: f32,
    pub frame: u64,
}

/// Control-side end of the event ring.
pub struct Scheduler {
    tx: Producer<ParamEvent>,
}

impl Scheduler {
    pub fn new() -> (Self, Consumer<ParamEvent>) {
        let (tx, rx) = RingBuffer::<ParamEvent>::new(EVENT_QUEUE_CAPACITY);
        (Self { tx }, rx)
    }

    /// Push without blocking. Returns false when the renderer is gone or the
    /// ring is full; the event is dropped in both cases.
    pub fn enqueue(&mut self, event: ParamEvent) -> bool {
        if self.tx.is_abandoned() {
            warn!(?event, "renderer dropped; discarding parameter event");
            return false;
        }
        match self.tx.push(event) {
            Ok(()) => true,
            Err(PushError::Full(event)) => {
                warn!(?event, "parameter queue full; discarding event");
                false
            }
        }
    }

    pub fn slots(&self) -> usize {
        self.tx.slots()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(frame: u64) -> ParamEvent {
        ParamEvent {
            unit: UnitId(1),
            param: ParamKind::Frequency,
            value: 440.0,
            frame,
        }
    }

    #[test]
    fn events_arrive_in_order() {
        let (mut scheduler, mut rx) = Scheduler::new();
        assert!(scheduler.enqueue(event(10)));
        assert!(scheduler.enqueue(event(5)));

        assert_eq!(rx.pop().map(|e| e.frame), Ok(10));
        assert_eq!(rx.pop().map(|e| e.frame), Ok(5));
        assert!(rx.pop().is_err());
    }

    #[test]
    fn full_queue_drops_instead_of_blocking() {
        let (mut scheduler, _rx) = Scheduler::new();
        for frame in 0..EVENT_QUEUE_CAPACITY as u64 {
            assert!(scheduler.enqueue(event(frame)));
        }
        assert_eq!(scheduler.slots(), 0);
        assert!(!scheduler.enqueue(event(999)));
    }

    #[test]
    fn abandoned_queue_reports_failure() {
        let (mut scheduler, rx) = Scheduler::new();
        drop(rx);
        assert!(!scheduler.enqueue(event(0)));
    }
}
