//! waveframe - terminal oscilloscope for a small synthesized signal graph
//!
//! Run with: cargo run -- --single-cycle

mod app;
mod waveform;

use std::{
    fs::File,
    path::{Path, PathBuf},
    sync::Mutex,
};

use clap::{Parser, ValueEnum};
use color_eyre::eyre::{Result as EyreResult, WrapErr};
use tracing_subscriber::EnvFilter;
use waveframe::{AnalyserProfile, AudioEngine, DisplayMode, EngineConfig, SourceConfig};

use app::App;

#[derive(Parser)]
#[command(name = "waveframe")]
#[command(about = "Oscillator → filter → gain → analyser, drawn as a live oscilloscope", long_about = None)]
struct Cli {
    /// Source waveform
    #[arg(short, long, value_enum, default_value_t = Source::Saw)]
    source: Source,

    /// Source frequency in Hz
    #[arg(short, long, default_value = "440")]
    frequency: f32,

    /// Low-pass cutoff in Hz
    #[arg(short, long, default_value = "10000")]
    cutoff: f32,

    /// Output gain magnitude
    #[arg(short, long, default_value = "1.0")]
    gain: f32,

    /// Start with inverted polarity
    #[arg(long)]
    invert: bool,

    /// Pulse duty cycle (pulse source only)
    #[arg(long, default_value = "0.01")]
    duty: f32,

    /// Number of harmonics in the pulse table (pulse source only)
    #[arg(long, default_value = "64")]
    harmonics: usize,

    /// Use the 512-sample analyser instead of 2048
    #[arg(long)]
    compact: bool,

    /// Frame exactly one detected cycle
    #[arg(long)]
    single_cycle: bool,

    /// Samples shown in explicit mode (default: whole buffer)
    #[arg(short, long)]
    window: Option<usize>,

    /// First sample shown in explicit mode
    #[arg(long, default_value = "0")]
    start: usize,

    /// Start playing immediately instead of waiting for space
    #[arg(long)]
    autoplay: bool,

    /// Write logs to this file (RUST_LOG overrides the default filter)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Source {
    Saw,
    Pulse,
}

impl Cli {
    fn engine_config(&self) -> EngineConfig {
        let source = match self.source {
            Source::Saw => SourceConfig::Sawtooth,
            Source::Pulse => SourceConfig::Pulse {
                duty: self.duty,
                harmonics: self.harmonics,
            },
        };
        let profile = if self.compact {
            AnalyserProfile::Compact
        } else {
            AnalyserProfile::Detailed
        };

        EngineConfig::default()
            .with_profile(profile)
            .with_source(source)
            .with_frequency(self.frequency)
            .with_cutoff(self.cutoff)
            .with_gain(self.gain)
            .inverted(self.invert)
            .start_suspended(!self.autoplay)
    }

    fn display_mode(&self) -> DisplayMode {
        if self.single_cycle {
            DisplayMode::SingleCycle
        } else {
            DisplayMode::Explicit {
                window_size: self.window,
                start_index: self.start,
            }
        }
    }
}

/// Logs go to a file; the terminal belongs to the TUI.
fn init_tracing(path: &Path) -> EyreResult<()> {
    let file = File::create(path)
        .wrap_err_with(|| format!("failed to create log file {}", path.display()))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("waveframe=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn main() -> EyreResult<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    if let Some(path) = &cli.log_file {
        init_tracing(path)?;
    }

    let engine = AudioEngine::with_default_output(cli.engine_config())
        .wrap_err("failed to start audio engine")?;
    let mode = cli.display_mode();

    let terminal = ratatui::init();
    let res = App::new(engine, mode).run(terminal);
    ratatui::restore();
    res
}
