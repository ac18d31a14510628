//! Fixed-length sample history, published from the render side.

use std::sync::{Arc, Mutex, TryLockError};

/*
Analyser History
================

The render side owns the authoritative history and overwrites its oldest
samples, so it always holds the newest `len` samples no matter how long the
reader stays away. After every block it copies itself into a shared
snapshot:

  render block ──▶ local history ──try_lock──▶ shared snapshot ──▶ reader

If the reader holds the snapshot lock, that block's publish is skipped. The
next block publishes the complete local history, so nothing goes missing.
*/

/// Ring of the last `len` samples.
#[derive(Debug, Clone)]
pub struct SampleHistory {
    samples: Vec<f32>,
    write: usize,
}

impl SampleHistory {
    /// Zero-filled history of `len` samples (at least 1).
    pub fn new(len: usize) -> Self {
        Self {
            samples: vec![0.0; len.max(1)],
            write: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Append `block`, dropping the oldest samples.
    pub fn push_slice(&mut self, block: &[f32]) {
        let len = self.samples.len();
        if block.len() >= len {
            self.samples.copy_from_slice(&block[block.len() - len..]);
            self.write = 0;
            return;
        }

        let first = (len - self.write).min(block.len());
        self.samples[self.write..self.write + first].copy_from_slice(&block[..first]);
        let rest = block.len() - first;
        self.samples[..rest].copy_from_slice(&block[first..]);
        self.write = (self.write + block.len()) % len;
    }

    /// The newest `count` samples (at most `len`), oldest first.
    pub fn latest(&self, count: usize) -> impl Iterator<Item = f32> + '_ {
        let len = self.samples.len();
        let count = count.min(len);
        let start = (self.write + len - count) % len;
        (0..count).map(move |i| self.samples[(start + i) % len])
    }

    /// Overwrite with `other`, which must have the same length.
    fn copy_from(&mut self, other: &SampleHistory) {
        self.samples.copy_from_slice(&other.samples);
        self.write = other.write;
    }
}

/// Render-side writer for one analyser.
pub struct HistoryWriter {
    local: SampleHistory,
    shared: Arc<Mutex<SampleHistory>>,
}

impl HistoryWriter {
    /// Writer plus the snapshot handle read by the control side.
    pub fn new(len: usize) -> (Self, Arc<Mutex<SampleHistory>>) {
        let local = SampleHistory::new(len);
        let shared = Arc::new(Mutex::new(local.clone()));
        (
            Self {
                local,
                shared: shared.clone(),
            },
            shared,
        )
    }

    /// Record a rendered block and publish it if the reader is not busy.
    pub fn write(&mut self, block: &[f32]) {
        self.local.push_slice(block);

        let snapshot = match self.shared.try_lock() {
            Ok(guard) => Some(guard),
            Err(TryLockError::Poisoned(poisoned)) => Some(poisoned.into_inner()),
            Err(TryLockError::WouldBlock) => None,
        };
        if let Some(mut snapshot) = snapshot {
            snapshot.copy_from(&self.local);
        }
    }
}
