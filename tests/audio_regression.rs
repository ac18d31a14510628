use waveframe::{
    detect_period,
    graph::node::{Ancestral, NodeKind},
    select_window, AudioEngine, ContextState, DisplayMode, EngineConfig, EngineError,
    SourceConfig,
};

const SR: f32 = 48_000.0;

fn running(config: EngineConfig) -> AudioEngine {
    AudioEngine::offline(config.with_sample_rate(SR).start_suspended(false)).unwrap()
}

fn render(engine: &AudioEngine, frames: usize) -> Vec<f32> {
    let mut out = vec![0.0f32; frames];
    engine.context().render(&mut out);
    out
}

fn captured(engine: &AudioEngine) -> Vec<f32> {
    let analyser = engine.analyser();
    let mut buffer = vec![0.0f32; analyser.buffer_length()];
    analyser.fill_buffer(&mut buffer);
    buffer
}

#[test]
fn default_engine_waits_for_resume() {
    let engine = AudioEngine::offline(EngineConfig::default()).unwrap();
    assert_eq!(engine.state(), ContextState::Suspended);

    let out = render(&engine, 1024);
    assert!(out.iter().all(|&s| s == 0.0));
    assert_eq!(engine.context().current_frame(), 0);

    engine.resume().unwrap();
    let out = render(&engine, 1024);
    assert!(out.iter().any(|s| s.abs() > 0.1));
    assert!(out.iter().all(|s| s.abs() <= 1.0));
}

#[test]
fn default_chain_has_expected_ancestry() {
    let engine = running(EngineConfig::default());
    let kinds: Vec<NodeKind> = engine.nodes().iter().map(|n| n.kind()).collect();
    assert_eq!(
        kinds,
        vec![NodeKind::Analyser, NodeKind::Gain, NodeKind::Filter, NodeKind::Oscillator]
    );

    assert!(engine.analyser().parent().is_none());
    assert!(engine.gain().parent().is_none());
    assert_eq!(
        engine.filter().parent().map(|p| p.kind()),
        Some(NodeKind::Gain)
    );
    assert_eq!(
        engine.source().parent().map(|p| p.kind()),
        Some(NodeKind::Filter)
    );
}

/// A loud sawtooth: the analyser clamps it to a steep trapezoid, so every
/// rising crossing clears the detection threshold on the first sample.
fn loud_saw(frequency: f32) -> EngineConfig {
    EngineConfig::default()
        .with_frequency(frequency)
        .with_gain(4.0)
}

#[test]
fn scope_frames_one_cycle_of_the_sawtooth() {
    // 1488 Hz at 48 kHz: about 32.3 samples per cycle
    let engine = running(loud_saw(1488.0));
    render(&engine, 4096);

    let buffer = captured(&engine);
    assert_eq!(buffer.len(), 2048);
    let period = detect_period(&buffer).unwrap();
    assert!(period.abs_diff(32) <= 1, "period {period}");

    let window = select_window(&buffer, DisplayMode::SingleCycle);
    assert_eq!(window.len, period);
    assert!(window.end() <= buffer.len());
}

#[test]
fn pulse_source_keeps_its_period() {
    let engine = running(
        EngineConfig::default()
            .with_source(SourceConfig::Pulse {
                duty: 0.5,
                harmonics: 16,
            })
            .with_frequency(375.0)
            .with_gain(0.5),
    );
    render(&engine, 4096);

    let buffer = captured(&engine);
    let period = detect_period(&buffer).unwrap();
    assert!(period.abs_diff(128) <= 1, "period {period}");
}

#[test]
fn frequency_change_lands_one_second_later() {
    let engine = running(loud_saw(1488.0));
    engine.set_frequency(2976.0, 1.0).unwrap();

    // just before the step
    render(&engine, SR as usize - 100);
    let before = detect_period(&captured(&engine)).unwrap();
    assert!(before.abs_diff(32) <= 1, "period {before}");

    // well after it
    render(&engine, 4096);
    let after = detect_period(&captured(&engine)).unwrap();
    assert!(after.abs_diff(16) <= 1, "period {after}");
}

#[test]
fn capture_tracks_the_newest_output_after_a_long_render() {
    // half level keeps every sample inside the capture's clamp
    let engine = running(EngineConfig::default().with_gain(0.5));
    let out = render(&engine, 40_000);

    assert_eq!(captured(&engine)[..], out[40_000 - 2048..]);
}

#[test]
fn overflowing_the_parameter_queue_is_reported() {
    let engine = running(EngineConfig::default());

    let accepted = (1..=300)
        .map(|i| engine.set_gain(i as f32 / 1000.0))
        .take_while(Result::is_ok)
        .count();
    assert_eq!(accepted, 256);
    assert!(matches!(
        engine.set_gain(0.9),
        Err(EngineError::EventQueueFull(_))
    ));
    assert!((engine.gain().gain() - 0.256).abs() < 1e-6);

    // the last accepted level is the one that plays
    let out = render(&engine, 4096);
    let peak = out.iter().fold(0.0f32, |peak, s| peak.max(s.abs()));
    assert!(peak > 0.2 && peak < 0.26, "peak {peak}");
}

#[test]
fn inverted_gain_flips_the_output() {
    let plain = running(EngineConfig::default());
    let inverted = running(EngineConfig::default().inverted(true));

    let a = render(&plain, 512);
    let b = render(&inverted, 512);
    for (x, y) in a.iter().zip(&b) {
        assert!((x + y).abs() < 1e-6);
    }

    inverted.set_inverted(false).unwrap();
    let a = render(&plain, 512);
    let b = render(&inverted, 512);
    assert_eq!(a, b);
}

#[test]
fn closed_engine_rejects_commands() {
    let engine = running(EngineConfig::default());
    engine.context().close();

    assert!(matches!(engine.resume(), Err(EngineError::ContextClosed)));
    assert!(matches!(
        engine.set_frequency(220.0, 0.0),
        Err(EngineError::ContextClosed)
    ));
    assert!(render(&engine, 64).iter().all(|&s| s == 0.0));
}
