//! Waveform oscilloscope widget

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    symbols,
    text::Span,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType},
    Frame,
};
use waveframe::{DisplayWindow, WaveformView};

/// Chart points for the latest display window, reused every tick.
#[derive(Default)]
pub struct WaveformChart {
    points: Vec<(f64, f64)>,
    window: DisplayWindow,
}

impl WaveformChart {
    pub fn new(capacity: usize) -> Self {
        Self {
            points: Vec::with_capacity(capacity),
            window: DisplayWindow::default(),
        }
    }

    /// Render the waveform oscilloscope
    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let title = format!(
            " Waveform [{}..{}) ",
            self.window.start,
            self.window.end()
        );
        let block = Block::default().title(title).borders(Borders::ALL);

        let dataset = Dataset::default()
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Green))
            .data(&self.points);

        let x_max = self.window.len.saturating_sub(1).max(1) as f64;
        let chart = Chart::new(vec![dataset])
            .block(block)
            .x_axis(
                Axis::default()
                    .bounds([0.0, x_max])
                    .labels(vec![
                        Span::raw("0"),
                        Span::raw(format!("{}", self.window.len)),
                    ])
                    .style(Style::default().fg(Color::DarkGray)),
            )
            .y_axis(
                Axis::default()
                    .bounds([-1.0, 1.0])
                    .labels(vec![Span::raw("-1"), Span::raw("0"), Span::raw("1")])
                    .style(Style::default().fg(Color::DarkGray)),
            );

        frame.render_widget(chart, area);
    }
}

impl WaveformView for WaveformChart {
    fn present(&mut self, samples: &[f32], window: DisplayWindow) {
        self.points.clear();
        self.points.extend(
            window
                .slice(samples)
                .iter()
                .enumerate()
                .map(|(i, &sample)| (i as f64, sample as f64)),
        );
        self.window = window;
    }
}
