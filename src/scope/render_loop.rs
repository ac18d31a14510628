use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use crate::scope::window::{DisplayMode, DisplayWindow, WindowSelector};

/// Source of captured samples.
pub trait SampleTap {
    /// Copy the newest `min(out.len(), buffer_length())` samples into `out`.
    fn fill_buffer(&self, out: &mut [f32]);

    fn buffer_length(&self) -> usize;
}

impl<T: SampleTap + ?Sized> SampleTap for Arc<T> {
    fn fill_buffer(&self, out: &mut [f32]) {
        (**self).fill_buffer(out)
    }

    fn buffer_length(&self) -> usize {
        (**self).buffer_length()
    }
}

/// Whatever draws a tick's result.
pub trait WaveformView {
    fn present(&mut self, samples: &[f32], window: DisplayWindow);
}

impl<F: FnMut(&[f32], DisplayWindow)> WaveformView for F {
    fn present(&mut self, samples: &[f32], window: DisplayWindow) {
        self(samples, window)
    }
}

/// Shared stop flag. Cancelling is permanent and takes effect between ticks.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Per-frame scope driver: refill one reusable buffer, pick the window,
/// hand both to the view.
pub struct RenderLoop<T: SampleTap> {
    tap: T,
    buffer: Vec<f32>,
    selector: WindowSelector,
    token: CancelToken,
    ticks: u64,
}

impl<T: SampleTap> RenderLoop<T> {
    pub fn new(tap: T, mode: DisplayMode) -> Self {
        let buffer = vec![0.0; tap.buffer_length()];
        Self {
            tap,
            buffer,
            selector: WindowSelector::new(mode),
            token: CancelToken::new(),
            ticks: 0,
        }
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.token.clone()
    }

    pub fn mode(&self) -> DisplayMode {
        self.selector.mode()
    }

    pub fn set_mode(&mut self, mode: DisplayMode) {
        self.selector.set_mode(mode);
    }

    pub fn selector(&self) -> &WindowSelector {
        &self.selector
    }

    /// Samples captured by the latest tick.
    pub fn buffer(&self) -> &[f32] {
        &self.buffer
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Run one frame. Returns `None` without touching anything once cancelled.
    pub fn tick<V: WaveformView + ?Sized>(&mut self, view: &mut V) -> Option<DisplayWindow> {
        if self.token.is_cancelled() {
            return None;
        }

        self.tap.fill_buffer(&mut self.buffer);
        let window = self.selector.select(&self.buffer);
        view.present(&self.buffer, window);
        self.ticks += 1;
        Some(window)
    }

    /// Tick until cancelled. `pace` runs between ticks (frame timing, input)
    /// and may cancel through the token it receives.
    pub fn run<V, P>(&mut self, view: &mut V, mut pace: P)
    where
        V: WaveformView + ?Sized,
        P: FnMut(&CancelToken),
    {
        let token = self.token.clone();
        while self.tick(view).is_some() {
            pace(&token);
        }
    }
}
