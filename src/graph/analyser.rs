use std::sync::{Arc, Mutex, PoisonError};

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use tracing::debug;

use crate::{
    dsp::history::{HistoryWriter, SampleHistory},
    engine::{context::AudioContext, processor::UnitKind, UnitId},
    error::EngineError,
    graph::node::{Ancestral, Ancestry, Destination, NodeKind, NodeLinks, Sinkable},
    scope::render_loop::SampleTap,
};

/*
Analyser Tap
============

Passes audio through unchanged and mirrors it to the control side.

  render thread                              control thread
  ─────────────                              ──────────────
  Analyser unit ──▶ history ──try_lock──▶ [ snapshot ] ──lock──▶ fill_buffer
                   (newest N)                  │
                                               └──────▶ fill_frequency_data
                                                        Hann + FFT, dB

The snapshot always holds the newest `buffer_length` samples, zero-padded
until that many have arrived, however long the reader stays away. Reading
never consumes it: two reads with no audio in between return the same data.

Frequency data
--------------

  magnitude[k] = |FFT(window · x)[k]| / N
  smoothed[k]  = τ · smoothed[k] + (1 − τ) · magnitude[k]
  out[k]       = max(20 · log10(smoothed[k]), −100 dB)       k < N / 2
*/

/// Floor of `fill_frequency_data`, in dB.
pub const MIN_DECIBELS: f32 = -100.0;

struct TapReader {
    snapshot: Arc<Mutex<SampleHistory>>,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    spectrum: Vec<Complex<f32>>,
    smoothed: Vec<f32>,
}

impl TapReader {
    fn new(snapshot: Arc<Mutex<SampleHistory>>, buffer_length: usize) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(buffer_length);

        let window = (0..buffer_length)
            .map(|i| {
                if buffer_length > 1 {
                    let denom = (buffer_length - 1) as f32;
                    0.5 * (1.0 - (std::f32::consts::TAU * i as f32 / denom).cos())
                } else {
                    1.0
                }
            })
            .collect();

        Self {
            snapshot,
            fft,
            window,
            spectrum: vec![Complex::new(0.0, 0.0); buffer_length],
            smoothed: vec![0.0; buffer_length / 2],
        }
    }

    fn fill_buffer(&self, out: &mut [f32]) {
        let snapshot = self.snapshot.lock().unwrap_or_else(PoisonError::into_inner);
        let count = out.len().min(snapshot.len());
        for (slot, sample) in out.iter_mut().zip(snapshot.latest(count)) {
            *slot = sample.clamp(-1.0, 1.0);
        }
    }

    fn fill_frequency_data(&mut self, out: &mut [f32], smoothing: f32) {
        let len = self.spectrum.len();
        {
            let snapshot = self.snapshot.lock().unwrap_or_else(PoisonError::into_inner);
            for ((bin, sample), &w) in self
                .spectrum
                .iter_mut()
                .zip(snapshot.latest(len))
                .zip(&self.window)
            {
                *bin = Complex::new(sample * w, 0.0);
            }
        }
        self.fft.process(&mut self.spectrum);

        let scale = 1.0 / len as f32;
        for (smoothed, bin) in self.smoothed.iter_mut().zip(&self.spectrum) {
            let magnitude = bin.norm() * scale;
            *smoothed = smoothing * *smoothed + (1.0 - smoothing) * magnitude;
        }

        for (slot, &magnitude) in out.iter_mut().zip(&self.smoothed) {
            *slot = if magnitude > 0.0 {
                (20.0 * magnitude.log10()).max(MIN_DECIBELS)
            } else {
                MIN_DECIBELS
            };
        }
    }
}

pub struct Analyser {
    id: UnitId,
    links: NodeLinks,
    buffer_length: usize,
    smoothing: f32,
    reader: Mutex<TapReader>,
}

impl Analyser {
    /// `buffer_length` is the analysis window (at least 2 samples);
    /// `smoothing` is clamped to [0, 1).
    pub fn new(
        context: &AudioContext,
        destination: &Destination,
        buffer_length: usize,
        smoothing: f32,
    ) -> Result<Arc<Self>, EngineError> {
        let buffer_length = buffer_length.max(2);
        let (writer, snapshot) = HistoryWriter::new(buffer_length);
        let id = context.create_unit(UnitKind::analyser(writer))?;
        context.connect(id, destination.input())?;
        debug!(?id, buffer_length, "analyser created");

        Ok(Arc::new(Self {
            id,
            links: NodeLinks::default(),
            buffer_length,
            smoothing: smoothing.clamp(0.0, 0.999),
            reader: Mutex::new(TapReader::new(snapshot, buffer_length)),
        }))
    }

    pub fn buffer_length(&self) -> usize {
        self.buffer_length
    }

    /// Number of bins written by `fill_frequency_data`.
    pub fn frequency_bin_count(&self) -> usize {
        self.buffer_length / 2
    }

    pub fn smoothing_time_constant(&self) -> f32 {
        self.smoothing
    }

    /// Copy the newest `min(out.len(), buffer_length)` samples into `out`,
    /// oldest first, clamped to [-1, 1].
    pub fn fill_buffer(&self, out: &mut [f32]) {
        self.reader
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .fill_buffer(out);
    }

    /// Smoothed magnitude spectrum in dB, `buffer_length / 2` bins.
    pub fn fill_frequency_data(&self, out: &mut [f32]) {
        self.reader
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .fill_frequency_data(out, self.smoothing);
    }
}

impl SampleTap for Analyser {
    fn fill_buffer(&self, out: &mut [f32]) {
        Analyser::fill_buffer(self, out);
    }

    fn buffer_length(&self) -> usize {
        self.buffer_length
    }
}

impl Sinkable for Analyser {
    fn input(&self) -> UnitId {
        self.id
    }
}

impl Ancestral for Analyser {
    fn id(&self) -> UnitId {
        self.id
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Analyser
    }

    fn links(&self) -> &NodeLinks {
        &self.links
    }

    fn ancestry(&self) -> Ancestry {
        Ancestry::Transparent
    }
}
