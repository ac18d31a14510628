//! Oscilloscope application: input handling and layout

use std::{sync::Arc, time::Duration};

use color_eyre::eyre::Result as EyreResult;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    DefaultTerminal, Frame,
};
use tracing::info;
use waveframe::{
    dsp::filter::{max_cutoff, MIN_CUTOFF_HZ},
    graph::analyser::Analyser,
    AudioEngine, ContextState, DisplayMode, RenderLoop,
};

use crate::waveform::WaveformChart;

/// One equal-tempered semitone.
const SEMITONE: f32 = 1.059_463_1;
/// Cutoff step for `[` / `]`, a quarter octave.
const CUTOFF_STEP: f32 = 1.189_207_1;
/// Frequency scheduled by `f`, one second ahead.
const JUMP_FREQUENCY: f32 = 1000.0;
const FRAME_TIME: Duration = Duration::from_millis(16);

pub struct App {
    engine: AudioEngine,
    scope: RenderLoop<Arc<Analyser>>,
    chart: WaveformChart,
    /// Explicit-mode settings, kept while single-cycle mode is active.
    window_size: Option<usize>,
    start_index: usize,
}

impl App {
    pub fn new(engine: AudioEngine, mode: DisplayMode) -> Self {
        let analyser = engine.analyser().clone();
        let buffer_length = analyser.buffer_length();
        let (window_size, start_index) = match mode {
            DisplayMode::Explicit {
                window_size,
                start_index,
            } => (window_size, start_index),
            DisplayMode::SingleCycle => (None, 0),
        };

        Self {
            engine,
            scope: RenderLoop::new(analyser, mode),
            chart: WaveformChart::new(buffer_length),
            window_size,
            start_index,
        }
    }

    /// Tick the scope once per frame until `q` cancels it.
    pub fn run(mut self, mut terminal: DefaultTerminal) -> EyreResult<()> {
        let token = self.scope.cancel_token();

        while self.scope.tick(&mut self.chart).is_some() {
            terminal.draw(|frame| self.render(frame))?;

            if event::poll(FRAME_TIME)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        if matches!(key.code, KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc) {
                            token.cancel();
                        } else {
                            self.handle_key(key.code)?;
                        }
                    }
                }
            }
        }

        info!(ticks = self.scope.ticks(), "scope stopped");
        Ok(())
    }

    fn handle_key(&mut self, key: KeyCode) -> EyreResult<()> {
        let sample_rate = self.engine.context().sample_rate();

        match key {
            KeyCode::Char(' ') => match self.engine.state() {
                ContextState::Running => self.engine.suspend()?,
                _ => self.engine.resume()?,
            },
            KeyCode::Char('f') => self.engine.set_frequency(JUMP_FREQUENCY, 1.0)?,
            KeyCode::Up => self.retune(SEMITONE)?,
            KeyCode::Down => self.retune(1.0 / SEMITONE)?,
            KeyCode::Char(']') => {
                let cutoff = (self.engine.filter().cutoff() * CUTOFF_STEP).min(max_cutoff(sample_rate));
                self.engine.set_cutoff(cutoff)?;
            }
            KeyCode::Char('[') => {
                let cutoff = (self.engine.filter().cutoff() / CUTOFF_STEP).max(MIN_CUTOFF_HZ);
                self.engine.set_cutoff(cutoff)?;
            }
            KeyCode::Char('i') => {
                let inverted = self.engine.gain().state().is_inverted();
                self.engine.set_inverted(!inverted)?;
            }
            KeyCode::Char('c') => {
                let mode = match self.scope.mode() {
                    DisplayMode::SingleCycle => self.explicit_mode(),
                    DisplayMode::Explicit { .. } => DisplayMode::SingleCycle,
                };
                self.scope.set_mode(mode);
            }
            KeyCode::Left => self.scroll(false),
            KeyCode::Right => self.scroll(true),
            KeyCode::Char('+') | KeyCode::Char('=') => self.zoom(0.5),
            KeyCode::Char('-') => self.zoom(2.0),
            _ => {}
        }
        Ok(())
    }

    fn retune(&self, ratio: f32) -> EyreResult<()> {
        let nyquist = self.engine.context().sample_rate() * 0.5;
        let frequency = (self.engine.source().current_frequency() * ratio).clamp(1.0, nyquist);
        self.engine.set_frequency(frequency, 0.0)?;
        Ok(())
    }

    fn explicit_mode(&self) -> DisplayMode {
        DisplayMode::Explicit {
            window_size: self.window_size,
            start_index: self.start_index,
        }
    }

    fn buffer_length(&self) -> usize {
        self.engine.analyser().buffer_length()
    }

    /// Move the explicit window by an eighth of its length.
    fn scroll(&mut self, forward: bool) {
        let len = self.window_size.unwrap_or(self.buffer_length());
        let step = (len / 8).max(1);
        let max_start = self.buffer_length().saturating_sub(len);
        self.start_index = if forward {
            (self.start_index + step).min(max_start)
        } else {
            self.start_index.saturating_sub(step)
        };
        if !matches!(self.scope.mode(), DisplayMode::SingleCycle) {
            self.scope.set_mode(self.explicit_mode());
        }
    }

    /// Scale the explicit window size; a full-buffer window maps back to `None`.
    fn zoom(&mut self, factor: f64) {
        let buffer_length = self.buffer_length();
        let len = self.window_size.unwrap_or(buffer_length);
        let scaled = ((len as f64 * factor).round() as usize).clamp(8, buffer_length);
        self.window_size = (scaled < buffer_length).then_some(scaled);
        if !matches!(self.scope.mode(), DisplayMode::SingleCycle) {
            self.scope.set_mode(self.explicit_mode());
        }
    }

    fn render(&self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Status bar
                Constraint::Min(8),    // Waveform
                Constraint::Length(1), // Help bar
            ])
            .split(frame.area());

        self.render_status(frame, chunks[0]);
        self.chart.render(frame, chunks[1]);

        let help = Paragraph::new(
            " [Space] Play/Pause  [F] 1 kHz in 1 s  [↑↓] Pitch  [[ ]] Cutoff  [I] Invert  \
             [C] Single cycle  [←→] Scroll  [+-] Zoom  [Q] Quit",
        )
        .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(help, chunks[2]);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().title(" waveframe ").borders(Borders::ALL);

        let state = self.engine.state();
        let (symbol, label, color) = match state {
            ContextState::Running => ("▶", "Running", Color::Green),
            ContextState::Suspended => ("⏸", "Suspended", Color::Yellow),
            ContextState::Closed => ("■", "Closed", Color::Red),
        };

        let mode = match self.scope.mode() {
            DisplayMode::SingleCycle => match self.scope.selector().last_period() {
                Some(period) => format!("cycle {period} smp"),
                None => "cycle ?".to_string(),
            },
            DisplayMode::Explicit { .. } => "explicit".to_string(),
        };

        let context = self.engine.context();
        let gain = self.engine.gain().state();
        let line = Line::from(vec![
            Span::styled(format!(" {symbol} {label}  "), Style::default().fg(color)),
            Span::styled(
                format!("t {:.2}s  ", context.current_time()),
                Style::default().fg(Color::White),
            ),
            Span::styled(
                format!(
                    "{:?} {:.1} Hz  ",
                    self.engine.waveform(),
                    self.engine.source().current_frequency()
                ),
                Style::default().fg(Color::Cyan),
            ),
            Span::styled(
                format!("LP {:.0} Hz  ", self.engine.filter().cutoff()),
                Style::default().fg(Color::Magenta),
            ),
            Span::styled(
                format!(
                    "gain {}{:.2}  ",
                    if gain.is_inverted() { "-" } else { "" },
                    gain.magnitude()
                ),
                Style::default().fg(Color::LightBlue),
            ),
            Span::styled(mode, Style::default().fg(Color::DarkGray)),
            Span::styled(
                format!("  {:.1}kHz", context.sample_rate() / 1000.0),
                Style::default().fg(Color::DarkGray),
            ),
        ]);

        frame.render_widget(Paragraph::new(line).block(block), area);
    }
}
