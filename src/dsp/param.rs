//! Scheduled parameter values.

use std::collections::VecDeque;

use tracing::warn;

/*
Parameter Automation
====================

Control code never touches a running unit directly. It asks for a value to
change at a given moment on the device clock, and the render side applies the
step when playback reaches that frame.

  control thread:   set_frequency(1000.0, 1.0)      "one second from now"
                          │
                          ▼
  scheduler:        ParamEvent { frame: now + sr }   (lock-free ring)
                          │
                          ▼
  render thread:    AudioParam::schedule(frame, 1000.0)
                    ...440, 440, 440, [frame] 1000, 1000, ...

Only step changes exist (set-value-at-time). Events in the past apply on the
first frame rendered after they arrive.

Audio-rate vs control-rate
--------------------------

  fill()           one value per sample, sample-accurate steps.
                   Used where a step inside a block is audible (pitch, gain).

  block_value()    one value per block, taken at the first frame.
                   Used where recomputing coefficients per sample is wasteful
                   (filter cutoff).
*/

/// Pending steps per parameter. Storage is allocated up front; steps past
/// this are dropped so the render thread never reallocates.
pub const MAX_PENDING_EVENTS: usize = 256;

pub struct AudioParam {
    value: f32,
    min: f32,
    max: f32,
    /// Pending (frame, value) steps sorted by frame.
    events: VecDeque<(u64, f32)>,
}

impl AudioParam {
    pub fn new(value: f32, min: f32, max: f32) -> Self {
        Self {
            value: value.clamp(min, max),
            min,
            max,
            events: VecDeque::with_capacity(MAX_PENDING_EVENTS),
        }
    }

    /// Current value, i.e. the last step that took effect.
    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn pending(&self) -> usize {
        self.events.len()
    }

    /// Queue a step to `value` at `frame`. Steps at the same frame keep
    /// their arrival order. Returns false if the timeline is full and the
    /// step was dropped.
    pub fn schedule(&mut self, frame: u64, value: f32) -> bool {
        if self.events.len() >= MAX_PENDING_EVENTS {
            warn!(frame, value, "parameter timeline full; dropping step");
            return false;
        }
        let value = value.clamp(self.min, self.max);
        let index = self.events.partition_point(|&(at, _)| at <= frame);
        self.events.insert(index, (frame, value));
        true
    }

    /// Write one value per frame starting at `start_frame`.
    pub fn fill(&mut self, out: &mut [f32], start_frame: u64) {
        for (offset, slot) in out.iter_mut().enumerate() {
            self.advance_to(start_frame + offset as u64);
            *slot = self.value;
        }
    }

    /// Apply every step due by `start_frame` and return the resulting value.
    pub fn block_value(&mut self, start_frame: u64) -> f32 {
        self.advance_to(start_frame);
        self.value
    }

    #[inline]
    fn advance_to(&mut self, frame: u64) {
        while let Some(&(at, value)) = self.events.front() {
            if at > frame {
                break;
            }
            self.value = value;
            self.events.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_value_is_clamped() {
        let param = AudioParam::new(50_000.0, 0.0, 24_000.0);
        assert_eq!(param.value(), 24_000.0);
    }

    #[test]
    fn step_lands_on_scheduled_frame() {
        let mut param = AudioParam::new(440.0, 0.0, 24_000.0);
        param.schedule(10, 1000.0);

        let mut values = vec![0.0f32; 16];
        param.fill(&mut values, 0);

        assert!(values[..10].iter().all(|&v| v == 440.0));
        assert!(values[10..].iter().all(|&v| v == 1000.0));
        assert_eq!(param.pending(), 0);
    }

    #[test]
    fn late_events_apply_immediately() {
        let mut param = AudioParam::new(1.0, 0.0, 2.0);
        param.schedule(5, 0.5);

        assert_eq!(param.block_value(100), 0.5);
    }

    #[test]
    fn events_are_applied_in_frame_order() {
        let mut param = AudioParam::new(0.0, -10.0, 10.0);
        param.schedule(8, 3.0);
        param.schedule(2, 1.0);
        param.schedule(4, 2.0);

        let mut values = vec![0.0f32; 10];
        param.fill(&mut values, 0);

        assert_eq!(values, [0.0, 0.0, 1.0, 1.0, 2.0, 2.0, 2.0, 2.0, 3.0, 3.0]);
    }

    #[test]
    fn same_frame_keeps_arrival_order() {
        let mut param = AudioParam::new(0.0, -10.0, 10.0);
        param.schedule(3, 1.0);
        param.schedule(3, 2.0);

        assert_eq!(param.block_value(3), 2.0);
    }

    #[test]
    fn full_timeline_drops_steps_without_growing() {
        let mut param = AudioParam::new(0.0, 0.0, 1_000.0);
        let capacity = param.events.capacity();

        for frame in 0..MAX_PENDING_EVENTS as u64 {
            assert!(param.schedule(1_000 + frame, 1.0));
        }
        assert!(!param.schedule(0, 2.0));

        assert_eq!(param.pending(), MAX_PENDING_EVENTS);
        assert_eq!(param.events.capacity(), capacity);
        assert_eq!(param.block_value(0), 0.0);
    }

    #[test]
    fn future_event_waits_across_blocks() {
        let mut param = AudioParam::new(0.25, 0.0, 1.0);
        param.schedule(300, 0.75);

        assert_eq!(param.block_value(0), 0.25);
        assert_eq!(param.block_value(256), 0.25);
        assert_eq!(param.block_value(512), 0.75);
    }
}
