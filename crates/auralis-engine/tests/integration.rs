//! End-to-end engine tests: scene control, block rendering, output formats

use auralis_core::{rms, BlockSize, Sample};
use auralis_engine::{EngineConfig, SpatialEngine};
use auralis_spatial::{
    AmbisonicOrder, AudioSource, DistanceModel, ListenerState, OutputBlock, OutputFormat,
    Position3D,
};

const BLOCK: usize = 128;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn config(format: OutputFormat) -> EngineConfig {
    EngineConfig {
        block_size: BlockSize::Samples128,
        format,
        max_sources: 8,
        ..Default::default()
    }
}

fn sine_block() -> Vec<Sample> {
    (0..BLOCK).map(|i| (i as f32 * 0.11).sin() * 0.5).collect()
}

fn source_at(x: f32, y: f32, z: f32) -> AudioSource {
    AudioSource {
        position: Position3D::new(x, y, z),
        distance_model: DistanceModel::Linear,
        ..Default::default()
    }
}

fn stereo_energies(output: &OutputBlock) -> (f32, f32) {
    match output {
        OutputBlock::Stereo { interleaved } => {
            let left: Vec<Sample> = interleaved.iter().step_by(2).copied().collect();
            let right: Vec<Sample> = interleaved.iter().skip(1).step_by(2).copied().collect();
            (rms(&left), rms(&right))
        }
        _ => panic!("expected stereo output"),
    }
}

#[test]
fn hard_right_source_lands_right() {
    // Source at (1,0,0), listener at origin facing (0,1,0): azimuth 90,
    // right channel carries more energy.
    init_logging();
    let (mut engine, mut handle) = SpatialEngine::new(config(OutputFormat::Stereo)).unwrap();
    let h = handle.add_source(source_at(1.0, 0.0, 0.0)).unwrap();

    let input = sine_block();
    let output = engine.render_block(&[(h, &input)]).unwrap();

    let (left, right) = stereo_energies(&output);
    assert!(
        right > left,
        "expected right-heavy output, got L={left} R={right}"
    );
}

#[test]
fn centered_source_is_balanced() {
    let (mut engine, mut handle) = SpatialEngine::new(config(OutputFormat::Stereo)).unwrap();
    let h = handle.add_source(source_at(0.0, 1.0, 0.0)).unwrap();

    let input = sine_block();
    let output = engine.render_block(&[(h, &input)]).unwrap();

    let (left, right) = stereo_energies(&output);
    assert!(left > 0.0);
    assert!(
        (left - right).abs() / left < 1e-3,
        "front source imbalance: L={left} R={right}"
    );
}

#[test]
fn commands_apply_at_block_boundaries() {
    let (mut engine, mut handle) = SpatialEngine::new(config(OutputFormat::Stereo)).unwrap();

    let h = handle.add_source(source_at(0.0, 1.0, 0.0)).unwrap();
    // Queued, not yet applied: the engine still sees an empty scene.
    assert_eq!(engine.source_count(), 0);

    engine.render_block(&[]).unwrap();
    assert_eq!(engine.source_count(), 1);

    handle.remove_source(h).unwrap();
    assert_eq!(engine.source_count(), 1);
    engine.render_block(&[]).unwrap();
    assert_eq!(engine.source_count(), 0);
}

#[test]
fn unknown_handle_renders_silence() {
    let (mut engine, mut handle) = SpatialEngine::new(config(OutputFormat::Stereo)).unwrap();
    let h = handle.add_source(source_at(0.0, 1.0, 0.0)).unwrap();
    handle.remove_source(h).unwrap();
    // Both the add and the remove apply at this boundary; the input buffer
    // arrives under a handle that is already stale.
    let input = sine_block();
    let output = engine.render_block(&[(h, &input)]).unwrap();

    let (left, right) = stereo_energies(&output);
    assert_eq!(left, 0.0);
    assert_eq!(right, 0.0);
}

#[test]
fn slot_reuse_bumps_generation() {
    let (_engine, mut handle) = SpatialEngine::new(config(OutputFormat::Stereo)).unwrap();
    let a = handle.add_source(source_at(0.0, 1.0, 0.0)).unwrap();
    handle.remove_source(a).unwrap();
    let b = handle.add_source(source_at(0.0, 1.0, 0.0)).unwrap();

    assert_eq!(a.slot(), b.slot());
    assert_ne!(a.generation(), b.generation());
    assert!(!handle.is_live(a));
    assert!(handle.is_live(b));
}

#[test]
fn every_format_honors_block_size() {
    let input = sine_block();
    let cases = [
        (OutputFormat::Stereo, 2),
        (OutputFormat::Binaural, 2),
        (OutputFormat::Ambisonics, 16),
        (OutputFormat::Surround51, 6),
        (OutputFormat::Surround71, 8),
    ];

    for (format, channels) in cases {
        let (mut engine, mut handle) = SpatialEngine::new(config(format)).unwrap();
        let h = handle.add_source(source_at(0.4, 0.6, 0.1)).unwrap();
        let output = engine.render_block(&[(h, &input)]).unwrap();

        assert_eq!(output.channel_count(), channels, "{format:?}");
        assert_eq!(output.samples_per_channel(), BLOCK, "{format:?}");
    }
}

#[test]
fn ambisonic_w_channel_tracks_source_signal() {
    // At the reference distance with unit gain the shaped signal equals the
    // input, so W is the input scaled by 1/sqrt(4 pi) regardless of azimuth.
    let mut cfg = config(OutputFormat::Ambisonics);
    cfg.ambisonic_order = AmbisonicOrder::Third;
    let (mut engine, mut handle) = SpatialEngine::new(cfg).unwrap();
    let h = handle.add_source(source_at(0.0, 1.0, 0.0)).unwrap();

    let input = sine_block();
    let output = engine.render_block(&[(h, &input)]).unwrap();

    match output {
        OutputBlock::Ambisonic { channels, format } => {
            assert_eq!(format.order, AmbisonicOrder::Third);
            assert_eq!(channels.len(), 16);
            let w_coeff = 0.282_094_8_f32;
            for (w, &x) in channels[0].iter().zip(&input) {
                assert!((w - x * w_coeff).abs() < 1e-4);
            }
        }
        _ => panic!("expected ambisonic output"),
    }
}

#[test]
fn surround_follows_the_source() {
    let (mut engine, mut handle) = SpatialEngine::new(config(OutputFormat::Surround51)).unwrap();
    // Azimuth 110 sits exactly on the right surround speaker.
    let h = handle
        .add_source(source_at(110.0_f32.to_radians().sin(), 110.0_f32.to_radians().cos(), 0.0))
        .unwrap();

    let input = sine_block();
    let output = engine.render_block(&[(h, &input)]).unwrap();

    match output {
        OutputBlock::Surround { channels, layout } => {
            assert_eq!(layout.name, "5.1");
            let energies: Vec<f32> = channels.iter().map(|ch| rms(ch)).collect();
            let loudest = energies
                .iter()
                .enumerate()
                .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
                .map(|(i, _)| i)
                .unwrap();
            assert_eq!(loudest, 5, "expected Rs to dominate: {energies:?}");
        }
        _ => panic!("expected surround output"),
    }
}

#[test]
fn listener_pose_changes_the_image() {
    let (mut engine, mut handle) = SpatialEngine::new(config(OutputFormat::Stereo)).unwrap();
    let h = handle.add_source(source_at(1.0, 0.0, 0.0)).unwrap();
    let input = sine_block();

    let output = engine.render_block(&[(h, &input)]).unwrap();
    let (l_before, r_before) = stereo_energies(&output);
    assert!(r_before > l_before);

    // Turn the listener to face the source: it becomes frontal.
    handle
        .set_listener(ListenerState {
            forward: Position3D::new(1.0, 0.0, 0.0),
            up: Position3D::new(0.0, 0.0, 1.0),
            ..Default::default()
        })
        .unwrap();
    let output = engine.render_block(&[(h, &input)]).unwrap();
    let (l_after, r_after) = stereo_energies(&output);

    let imbalance_before = (r_before - l_before).abs();
    let imbalance_after = (r_after - l_after).abs();
    assert!(
        imbalance_after < imbalance_before * 0.25,
        "turning toward the source should center it: {imbalance_before} -> {imbalance_after}"
    );
}

#[test]
fn room_swap_keeps_rendering() {
    let (mut engine, mut handle) = SpatialEngine::new(config(OutputFormat::Stereo)).unwrap();
    let h = handle.add_source(source_at(0.0, 1.0, 0.0)).unwrap();
    let input = sine_block();
    engine.render_block(&[(h, &input)]).unwrap();

    let mut dead_room = auralis_spatial::RoomModel::default();
    dead_room.rt60 = auralis_spatial::Bands3::splat(0.0);
    handle.set_room(dead_room.clone()).unwrap();

    let output = engine.render_block(&[(h, &input)]).unwrap();
    assert_eq!(engine.room_model(), &dead_room);
    match output {
        OutputBlock::Stereo { interleaved } => {
            assert!(interleaved.iter().all(|s| s.is_finite()));
            assert!(rms(&interleaved) > 0.0);
        }
        _ => panic!("expected stereo output"),
    }
}

#[test]
fn stats_count_blocks() {
    let (mut engine, handle) = SpatialEngine::new(config(OutputFormat::Stereo)).unwrap();
    for _ in 0..5 {
        engine.render_block(&[]).unwrap();
    }
    let stats = handle.stats();
    assert_eq!(stats.blocks, 5);
    assert!(stats.last_block_secs >= 0.0);
    assert!(stats.peak_block_secs >= stats.last_block_secs);
    assert!(stats.overruns <= stats.blocks);
}

#[test]
fn wrong_buffer_length_is_an_error() {
    let (mut engine, mut handle) = SpatialEngine::new(config(OutputFormat::Stereo)).unwrap();
    let h = handle.add_source(source_at(0.0, 1.0, 0.0)).unwrap();
    engine.render_block(&[]).unwrap();

    let short = vec![0.0_f32; BLOCK / 2];
    assert!(engine.render_block(&[(h, &short)]).is_err());
}
