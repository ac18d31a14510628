/*
Zero-Crossing Period Detection
==============================

Finds the length of one cycle of a periodic signal from its rising zero
crossings.

  s[i-1] ≤ 0 < 0.01 < s[i]          rising crossing between i-1 and i

            ╱╲        ╱╲        ╱╲
      ─────╱──╲──────╱──╲──────╱──╲────
          ▲    ╲╱   ▲    ╲╱   ▲
          c0        c1        c2          deltas: c1-c0, c2-c1

The crossing position is interpolated linearly between the two samples:

  x = (i − 1) + s[i−1] / (s[i−1] − s[i])

The period is the median delta (upper median), rounded. The small threshold
above zero keeps noise hovering around zero from registering as crossings.

Rejected: fewer than two crossings, or a period shorter than 2 samples or
longer than half the buffer (fewer than two full cycles visible).
*/

/// Minimum amplitude after a crossing for it to count.
pub const CROSSING_THRESHOLD: f32 = 0.01;

/// True when a rising crossing lies between `samples[i - 1]` and `samples[i]`.
#[inline]
pub fn is_rising_crossing(previous: f32, current: f32) -> bool {
    previous <= 0.0 && current > CROSSING_THRESHOLD
}

/// Period detector that keeps its scratch storage between calls.
#[derive(Debug, Default)]
pub struct PeriodDetector {
    crossings: Vec<f32>,
    deltas: Vec<f32>,
}

impl PeriodDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Period in samples, or `None` when no stable period is found.
    pub fn detect(&mut self, samples: &[f32]) -> Option<usize> {
        self.crossings.clear();
        self.deltas.clear();

        for (i, pair) in samples.windows(2).enumerate() {
            let (previous, current) = (pair[0], pair[1]);
            if is_rising_crossing(previous, current) {
                let fraction = previous / (previous - current);
                self.crossings.push(i as f32 + fraction);
            }
        }

        if self.crossings.len() < 2 {
            return None;
        }

        self.deltas
            .extend(self.crossings.windows(2).map(|pair| pair[1] - pair[0]));
        self.deltas.sort_unstable_by(f32::total_cmp);
        let median = self.deltas[self.deltas.len() / 2];

        if median < 2.0 || median > samples.len() as f32 / 2.0 {
            return None;
        }

        Some(median.round() as usize)
    }
}

/// One-shot period detection.
pub fn detect_period(samples: &[f32]) -> Option<usize> {
    PeriodDetector::new().detect(samples)
}
