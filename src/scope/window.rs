use std::ops::Range;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::scope::period::{is_rising_crossing, PeriodDetector};

/*
Display Window
==============

The analyser always captures its full buffer. The display window picks the
slice of it that gets drawn, which is how the scope zooms without losing
capture quality.

  Explicit       len   = min(window_size or buffer_len, buffer_len)
                 start = clamp(start_index, 0, buffer_len − len)

  SingleCycle    p = detected period
                 len   = p
                 start = first rising crossing in 1..min(buffer_len − p, max(p, 200)),
                         or 0 if none, clamped so the cycle fits

                 no period → len = min(512, buffer_len), start = 0

  buffer (2048)
  ├──────────────────────────────────────────────────────────┤
        ├──── len ────┤
        start

Every result satisfies start + len ≤ buffer_len.
*/

/// Window length used when no period can be detected.
pub const FALLBACK_WINDOW: usize = 512;
/// Minimum number of samples searched for a cycle start.
pub const MIN_ALIGN_SEARCH: usize = 200;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
    /// Fixed slice. `None` shows the whole buffer; a size of 0 is raised to 1.
    Explicit {
        window_size: Option<usize>,
        start_index: usize,
    },
    /// Exactly one detected cycle, aligned to a rising zero crossing.
    SingleCycle,
}

impl Default for DisplayMode {
    fn default() -> Self {
        DisplayMode::Explicit {
            window_size: None,
            start_index: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DisplayWindow {
    pub start: usize,
    pub len: usize,
}

impl DisplayWindow {
    pub fn end(&self) -> usize {
        self.start + self.len
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end()
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The windowed samples. Panics if the window does not fit `samples`.
    pub fn slice<'a>(&self, samples: &'a [f32]) -> &'a [f32] {
        &samples[self.range()]
    }
}

/// Chooses display windows, reusing period-detection scratch across ticks.
#[derive(Debug, Default)]
pub struct WindowSelector {
    mode: DisplayMode,
    detector: PeriodDetector,
    last_period: Option<usize>,
}

impl WindowSelector {
    pub fn new(mode: DisplayMode) -> Self {
        Self {
            mode,
            detector: PeriodDetector::new(),
            last_period: None,
        }
    }

    pub fn mode(&self) -> DisplayMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: DisplayMode) {
        self.mode = mode;
    }

    /// Period found by the latest single-cycle selection.
    pub fn last_period(&self) -> Option<usize> {
        self.last_period
    }

    pub fn select(&mut self, samples: &[f32]) -> DisplayWindow {
        match self.mode {
            DisplayMode::Explicit {
                window_size,
                start_index,
            } => {
                self.last_period = None;
                explicit_window(samples.len(), window_size, start_index)
            }
            DisplayMode::SingleCycle => {
                self.last_period = self.detector.detect(samples);
                single_cycle_window(samples, self.last_period)
            }
        }
    }
}

/// One-shot window selection.
pub fn select_window(samples: &[f32], mode: DisplayMode) -> DisplayWindow {
    WindowSelector::new(mode).select(samples)
}

fn explicit_window(buffer_len: usize, window_size: Option<usize>, start_index: usize) -> DisplayWindow {
    let len = window_size.unwrap_or(buffer_len).max(1).min(buffer_len);
    DisplayWindow {
        start: start_index.min(buffer_len - len),
        len,
    }
}

fn single_cycle_window(samples: &[f32], period: Option<usize>) -> DisplayWindow {
    let buffer_len = samples.len();

    match period {
        Some(period) if period > 0 && period < buffer_len => {
            let search = (buffer_len - period).min(period.max(MIN_ALIGN_SEARCH));
            let found = (1..search)
                .find(|&i| is_rising_crossing(samples[i - 1], samples[i]))
                .unwrap_or(0);
            DisplayWindow {
                start: found.min(buffer_len - period),
                len: period,
            }
        }
        _ => DisplayWindow {
            start: 0,
            len: FALLBACK_WINDOW.min(buffer_len),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::TAU;

    fn explicit(window_size: Option<usize>, start_index: usize) -> DisplayMode {
        DisplayMode::Explicit {
            window_size,
            start_index,
        }
    }

    /// Sine whose rising zeros fall at `offset + k·period`.
    fn sine(period: f32, offset: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (TAU * (i as f32 - offset) / period).sin())
            .collect()
    }

    #[test]
    fn explicit_start_is_clamped_to_fit() {
        let samples = vec![0.0f32; 2048];
        let window = select_window(&samples, explicit(Some(256), 1800));
        assert_eq!(window, DisplayWindow { start: 1792, len: 256 });
    }

    #[test]
    fn explicit_defaults_to_full_buffer() {
        let samples = vec![0.0f32; 2048];
        let window = select_window(&samples, DisplayMode::default());
        assert_eq!(window, DisplayWindow { start: 0, len: 2048 });
    }

    #[test]
    fn explicit_size_is_capped_and_raised() {
        let samples = vec![0.0f32; 512];
        assert_eq!(
            select_window(&samples, explicit(Some(4096), 100)),
            DisplayWindow { start: 0, len: 512 }
        );
        assert_eq!(
            select_window(&samples, explicit(Some(0), 600)),
            DisplayWindow { start: 511, len: 1 }
        );
    }

    #[test]
    fn single_cycle_frames_one_period() {
        let samples = sine(100.0, 30.1, 2048);
        let window = select_window(&samples, DisplayMode::SingleCycle);

        assert_eq!(window.len, 100);
        // first rising crossing between samples 30 and 31
        assert_eq!(window.start, 31);
        assert!(window.end() <= samples.len());
    }

    #[test]
    fn single_cycle_starts_at_zero_when_no_crossing_is_near() {
        // silent lead-in longer than the alignment search of 200 samples
        let mut samples = sine(100.0, 250.1, 2048);
        samples[..250].fill(0.0);

        let window = select_window(&samples, DisplayMode::SingleCycle);
        assert_eq!(window, DisplayWindow { start: 0, len: 100 });
    }

    #[test]
    fn single_cycle_falls_back_without_period() {
        let silence = vec![0.0f32; 2048];
        assert_eq!(
            select_window(&silence, DisplayMode::SingleCycle),
            DisplayWindow { start: 0, len: FALLBACK_WINDOW }
        );

        let short = vec![0.0f32; 100];
        assert_eq!(
            select_window(&short, DisplayMode::SingleCycle),
            DisplayWindow { start: 0, len: 100 }
        );
    }

    #[test]
    fn single_cycle_start_is_clamped() {
        // period of exactly half the buffer, the longest accepted
        let samples = sine(200.0, 0.1, 400);
        let window = select_window(&samples, DisplayMode::SingleCycle);
        assert_eq!(window.len, 200);
        assert!(window.end() <= 400);
    }

    #[test]
    fn empty_buffer_yields_empty_window() {
        for mode in [explicit(None, 0), explicit(Some(64), 10), DisplayMode::SingleCycle] {
            assert_eq!(select_window(&[], mode), DisplayWindow { start: 0, len: 0 });
        }
    }

    #[test]
    fn windows_never_exceed_bounds() {
        let samples = sine(37.0, 0.1, 300);
        for len in [0usize, 1, 2, 7, 150, 300] {
            let buffer = &samples[..len];
            for size in [None, Some(0), Some(1), Some(64), Some(1000)] {
                for start in [0usize, 5, 299, usize::MAX / 2] {
                    let window = select_window(buffer, explicit(size, start));
                    assert!(window.end() <= len, "len {len} size {size:?} start {start}");
                }
            }
            let window = select_window(buffer, DisplayMode::SingleCycle);
            assert!(window.end() <= len);
        }
    }

    #[test]
    fn selector_remembers_period() {
        let samples = sine(64.0, 0.1, 1024);
        let mut selector = WindowSelector::new(DisplayMode::SingleCycle);
        selector.select(&samples);
        assert_eq!(selector.last_period(), Some(64));

        selector.set_mode(DisplayMode::default());
        selector.select(&samples);
        assert_eq!(selector.last_period(), None);
    }
}
